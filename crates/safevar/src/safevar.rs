use std::cell::RefCell;
use std::collections::HashMap;
use std::hash::Hash as StdHash;

use revm_primitives::U256;

use crate::error::{Result, SafeVarError};

/// Every persistent field of a native contract implements `SafeField` so
/// the owning contract can commit/revert it without knowing its concrete
/// type. Fields never hold a reference back to their owner — the
/// contract iterates a borrowed list of its own fields, so there is no
/// pointer cycle to break.
pub trait SafeField {
    fn is_touched(&self) -> bool;
    fn commit(&self);
    fn revert(&self);
}

/// Transactional wrapper around a single persistent value. Reads return
/// the pending overlay if one exists, else the committed value — the
/// overlay is populated lazily on first write within a transaction.
#[derive(Debug)]
pub struct SafeVar<T: Clone> {
    committed: RefCell<T>,
    overlay: RefCell<Option<T>>,
}

impl<T: Clone> SafeVar<T> {
    pub fn new(value: T) -> Self {
        Self { committed: RefCell::new(value), overlay: RefCell::new(None) }
    }

    pub fn get(&self) -> T {
        match &*self.overlay.borrow() {
            Some(v) => v.clone(),
            None => self.committed.borrow().clone(),
        }
    }

    pub fn set(&self, value: T) {
        *self.overlay.borrow_mut() = Some(value);
    }
}

impl<T: Clone> SafeField for SafeVar<T> {
    fn is_touched(&self) -> bool {
        self.overlay.borrow().is_some()
    }

    fn commit(&self) {
        if let Some(v) = self.overlay.borrow_mut().take() {
            *self.committed.borrow_mut() = v;
        }
    }

    fn revert(&self) {
        self.overlay.borrow_mut().take();
    }
}

impl<T: Clone + Default> Default for SafeVar<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl SafeVar<U256> {
    /// Checked addition against the pending (or committed) value. Does
    /// not touch the field on overflow — a failed arithmetic op must
    /// not leave a spurious overlay behind for `commit()` to pick up.
    pub fn checked_add(&self, amount: U256) -> Result<()> {
        let next = self.get().checked_add(amount).ok_or(SafeVarError::ArithmeticOverflow)?;
        self.set(next);
        Ok(())
    }

    pub fn checked_sub(&self, amount: U256) -> Result<()> {
        let next = self.get().checked_sub(amount).ok_or(SafeVarError::ArithmeticUnderflow)?;
        self.set(next);
        Ok(())
    }
}

/// A SafeVar-wrapped associative container. Whole-map copy-on-write is
/// simpler than per-key overlays and is the right tradeoff for the
/// field counts native contracts in this core actually have (ERC-20-scale
/// balance/allowance tables, not millions of entries).
pub type SafeMap<K, V> = SafeVar<HashMap<K, V>>;

impl<K: StdHash + Eq + Clone, V: Clone> SafeVar<HashMap<K, V>> {
    pub fn map_get(&self, key: &K) -> Option<V> {
        self.get().get(key).cloned()
    }

    pub fn map_insert(&self, key: K, value: V) {
        let mut map = self.get();
        map.insert(key, value);
        self.set(map);
    }
}

/// A contract owning a set of `SafeField`s implements this to get
/// whole-contract commit/revert for free: only fields with a pending
/// overlay do any work, so cost is O(touched), not O(all fields).
pub trait NativeContract {
    fn fields(&self) -> Vec<&dyn SafeField>;

    fn commit(&self) {
        for field in self.fields() {
            if field.is_touched() {
                field.commit();
            }
        }
    }

    fn revert(&self) {
        for field in self.fields() {
            if field.is_touched() {
                field.revert();
            }
        }
    }

    /// How many fields this call wrote to, for a caller that charges gas
    /// per persistent write.
    fn touched_count(&self) -> usize {
        self.fields().iter().filter(|f| f.is_touched()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_before_write_returns_committed_value() {
        let v = SafeVar::new(10u64);
        assert_eq!(v.get(), 10);
        assert!(!v.is_touched());
    }

    #[test]
    fn write_is_visible_before_commit() {
        let v = SafeVar::new(10u64);
        v.set(20);
        assert_eq!(v.get(), 20);
        assert!(v.is_touched());
    }

    #[test]
    fn commit_promotes_overlay_and_clears_touch() {
        let v = SafeVar::new(10u64);
        v.set(20);
        v.commit();
        assert_eq!(v.get(), 20);
        assert!(!v.is_touched());
    }

    #[test]
    fn revert_drops_overlay_and_restores_committed() {
        let v = SafeVar::new(10u64);
        v.set(20);
        v.revert();
        assert_eq!(v.get(), 10);
        assert!(!v.is_touched());
    }

    #[test]
    fn map_get_and_insert_go_through_the_overlay() {
        let m: SafeMap<String, u64> = SafeVar::new(HashMap::new());
        m.map_insert("alice".to_string(), 100);
        assert_eq!(m.map_get(&"alice".to_string()), Some(100));
        assert!(m.is_touched());
        m.revert();
        assert_eq!(m.map_get(&"alice".to_string()), None);
    }

    struct Counter {
        value: SafeVar<u64>,
        name: SafeVar<String>,
    }

    impl NativeContract for Counter {
        fn fields(&self) -> Vec<&dyn SafeField> {
            vec![&self.value, &self.name]
        }
    }

    #[test]
    fn contract_commit_only_touches_dirty_fields() {
        let c = Counter { value: SafeVar::new(1), name: SafeVar::new("c".into()) };
        c.value.set(2);
        c.commit();
        assert_eq!(c.value.get(), 2);
        assert_eq!(c.name.get(), "c");
        assert!(!c.value.is_touched());
    }

    #[test]
    fn checked_add_overflow_leaves_committed_value_untouched() {
        let v: SafeVar<U256> = SafeVar::new(U256::MAX);
        let err = v.checked_add(U256::from(1u64)).unwrap_err();
        assert!(matches!(err, SafeVarError::ArithmeticOverflow));
        assert!(!v.is_touched());
        assert_eq!(v.get(), U256::MAX);
    }

    #[test]
    fn checked_sub_underflow_leaves_committed_value_untouched() {
        let v: SafeVar<U256> = SafeVar::new(U256::from(5u64));
        let err = v.checked_sub(U256::from(6u64)).unwrap_err();
        assert!(matches!(err, SafeVarError::ArithmeticUnderflow));
        assert!(!v.is_touched());
        assert_eq!(v.get(), U256::from(5u64));
    }

    #[test]
    fn checked_add_then_sub_round_trips() {
        let v: SafeVar<U256> = SafeVar::new(U256::from(10u64));
        v.checked_add(U256::from(5u64)).unwrap();
        v.checked_sub(U256::from(3u64)).unwrap();
        assert_eq!(v.get(), U256::from(12u64));
    }

    #[test]
    fn touched_count_reflects_only_written_fields() {
        let c = Counter { value: SafeVar::new(1), name: SafeVar::new("c".into()) };
        assert_eq!(c.touched_count(), 0);
        c.value.set(2);
        assert_eq!(c.touched_count(), 1);
        c.name.set("d".into());
        assert_eq!(c.touched_count(), 2);
        c.commit();
        assert_eq!(c.touched_count(), 0);
    }

    #[test]
    fn contract_revert_rolls_back_every_touched_field() {
        let c = Counter { value: SafeVar::new(1), name: SafeVar::new("c".into()) };
        c.value.set(2);
        c.name.set("d".into());
        c.revert();
        assert_eq!(c.value.get(), 1);
        assert_eq!(c.name.get(), "c");
    }
}
