use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chain_codec::storage;
use chain_crypto::{keccak256, Address};
use chain_kvstore::{prefix, KVStore, WriteBatch};
use parking_lot::RwLock;
use revm_primitives::U256;
use tracing::trace;

use crate::account::Account;
use crate::error::{AccountError, Result};

const CODE_FIELD_TAG: &[u8] = b"code";

fn contract_state_key(addr: &Address) -> Vec<u8> {
    let mut key = addr.as_bytes().to_vec();
    key.extend_from_slice(CODE_FIELD_TAG);
    key
}

/// Authoritative `address -> account` table. Owns the in-memory cache
/// between transactions; every mutating method here takes effect
/// immediately in the cache and marks the address dirty for the next
/// `flush`. Multi-transaction atomicity is the executor's job — it
/// calls `checkpoint`/`restore` around a frame so a reverted frame never
/// leaves a partial write behind.
pub struct AccountStore {
    kv: Arc<KVStore>,
    cache: RwLock<HashMap<Address, Account>>,
    touched: RwLock<HashSet<Address>>,
    dirty: RwLock<HashSet<Address>>,
}

/// A point-in-time capture of one address's full observable state,
/// returned by [`AccountStore::checkpoint`] and consumed by
/// [`AccountStore::restore`]. Opaque on purpose — the `touched` bit is
/// store bookkeeping, not part of `Account`'s on-disk shape.
#[derive(Debug, Clone)]
pub struct AccountSnapshot {
    account: Account,
    touched: bool,
}

impl AccountStore {
    pub fn new(kv: Arc<KVStore>) -> Self {
        Self {
            kv,
            cache: RwLock::new(HashMap::new()),
            touched: RwLock::new(HashSet::new()),
            dirty: RwLock::new(HashSet::new()),
        }
    }

    fn load(&self, addr: Address) -> Result<Account> {
        if let Some(acc) = self.cache.read().get(&addr) {
            return Ok(acc.clone());
        }
        let header = self.kv.get(prefix::ACCOUNTS, addr.as_bytes())?;
        let mut account = match header {
            Some(bytes) => {
                let mut buf = [0u8; 40];
                buf.copy_from_slice(&bytes);
                let (nonce, balance) = Account::decode_header(&buf);
                Account { nonce, balance, ..Account::new() }
            }
            None => Account::new(),
        };
        if let Some(blob) = self.kv.get(prefix::CONTRACT_STATE, &contract_state_key(&addr))? {
            let mut code_hash = [0u8; 32];
            code_hash.copy_from_slice(&blob[..32]);
            account.code_hash = code_hash;
            account.code = blob[32..].to_vec();
        }
        self.cache.write().insert(addr, account.clone());
        Ok(account)
    }

    fn mark_dirty(&self, addr: Address, account: Account) {
        self.cache.write().insert(addr, account);
        self.dirty.write().insert(addr);
        self.touched.write().insert(addr);
    }

    /// Applies a restored snapshot exactly, including whether `addr` was
    /// in `touched` at checkpoint time — unlike `mark_dirty`, this must
    /// be able to remove `addr` from `touched` again, or a restore after
    /// a `touch()` would leave the address permanently existing.
    fn restore_exact(&self, addr: Address, account: Account, touched: bool) {
        self.cache.write().insert(addr, account);
        self.dirty.write().insert(addr);
        if touched {
            self.touched.write().insert(addr);
        } else {
            self.touched.write().remove(&addr);
        }
    }

    /// Idempotent: makes `addr` visible to `exists` even with every
    /// field still at its zero value, without queuing a disk write.
    pub fn touch(&self, addr: Address) -> Result<()> {
        self.load(addr)?;
        self.touched.write().insert(addr);
        Ok(())
    }

    pub fn exists(&self, addr: Address) -> Result<bool> {
        if self.touched.read().contains(&addr) {
            return Ok(true);
        }
        Ok(!self.load(addr)?.is_empty())
    }

    pub fn balance_of(&self, addr: Address) -> Result<U256> {
        Ok(self.load(addr)?.balance)
    }

    pub fn nonce_of(&self, addr: Address) -> Result<u64> {
        Ok(self.load(addr)?.nonce)
    }

    pub fn code_hash_of(&self, addr: Address) -> Result<chain_crypto::Hash> {
        Ok(self.load(addr)?.code_hash)
    }

    pub fn get_code(&self, addr: Address) -> Result<Vec<u8>> {
        Ok(self.load(addr)?.code)
    }

    pub fn set_code(&self, addr: Address, code: Vec<u8>) -> Result<()> {
        let mut account = self.load(addr)?;
        account.code_hash = keccak256(&code);
        account.code = code;
        self.mark_dirty(addr, account);
        Ok(())
    }

    pub fn add_balance(&self, addr: Address, amount: U256) -> Result<()> {
        let mut account = self.load(addr)?;
        account.balance =
            account.balance.checked_add(amount).ok_or(AccountError::BalanceOverflow {
                addr,
                have: account.balance,
                amount,
            })?;
        self.mark_dirty(addr, account);
        Ok(())
    }

    pub fn sub_balance(&self, addr: Address, amount: U256) -> Result<()> {
        let mut account = self.load(addr)?;
        let next = account
            .balance
            .checked_sub(amount)
            .ok_or(AccountError::InsufficientBalance { addr, have: account.balance, need: amount })?;
        account.balance = next;
        self.mark_dirty(addr, account);
        Ok(())
    }

    /// Absolute balance overwrite — used only by the EVM host to apply
    /// a `revm::DatabaseCommit` diff, where the interpreter has already
    /// computed the post-call balance. Ordinary native transfers must
    /// go through `add_balance`/`sub_balance` instead so overflow and
    /// underflow stay checked.
    pub fn set_balance(&self, addr: Address, balance: U256) -> Result<()> {
        let mut account = self.load(addr)?;
        account.balance = balance;
        self.mark_dirty(addr, account);
        Ok(())
    }

    pub fn set_nonce(&self, addr: Address, nonce: u64) -> Result<()> {
        let mut account = self.load(addr)?;
        account.nonce = nonce;
        self.mark_dirty(addr, account);
        Ok(())
    }

    /// Captures `addr`'s full current state, including its `touched`
    /// membership, so a caller can restore it verbatim on revert — the
    /// account-level analogue of a SafeVar's committed value. Restoring
    /// only the `Account` fields and not `touched` would leave a
    /// previously-nonexistent address permanently `exists() == true`
    /// after any checkpoint/restore pair that called `touch` or wrote to
    /// it in between.
    pub fn checkpoint(&self, addr: Address) -> Result<AccountSnapshot> {
        let account = self.load(addr)?;
        let touched = self.touched.read().contains(&addr);
        Ok(AccountSnapshot { account, touched })
    }

    pub fn restore(&self, addr: Address, snapshot: AccountSnapshot) {
        self.restore_exact(addr, snapshot.account, snapshot.touched);
    }

    /// Drains the dirty set into a write batch; the caller is
    /// responsible for handing it to `KVStore::write_batch`.
    pub fn flush(&self) -> WriteBatch {
        let mut batch = WriteBatch::new();
        let dirty: Vec<Address> = self.dirty.write().drain().collect();
        let cache = self.cache.read();
        for addr in dirty {
            let account = cache.get(&addr).expect("dirty address must be cached");
            batch.put(prefix::ACCOUNTS, addr.as_bytes().to_vec(), account.encode_header().to_vec());
            if !account.code.is_empty() {
                let mut blob = Vec::with_capacity(32 + account.code.len());
                blob.extend_from_slice(&storage::encode_hash(&account.code_hash));
                blob.extend_from_slice(&account.code);
                batch.put(prefix::CONTRACT_STATE, contract_state_key(&addr), blob);
            }
        }
        trace!(entries = batch.len(), "account store flush");
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_store() -> (AccountStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let kv = Arc::new(KVStore::open(dir.path()).unwrap());
        (AccountStore::new(kv), dir)
    }

    #[test]
    fn fresh_account_has_zero_balance_and_does_not_exist() {
        let (store, _dir) = open_store();
        let addr = Address::new([1u8; 20]);
        assert_eq!(store.balance_of(addr).unwrap(), U256::ZERO);
        assert!(!store.exists(addr).unwrap());
    }

    #[test]
    fn touch_makes_account_exist_without_changing_fields() {
        let (store, _dir) = open_store();
        let addr = Address::new([2u8; 20]);
        store.touch(addr).unwrap();
        assert!(store.exists(addr).unwrap());
        assert_eq!(store.balance_of(addr).unwrap(), U256::ZERO);
    }

    #[test]
    fn add_then_sub_balance_round_trips() {
        let (store, _dir) = open_store();
        let addr = Address::new([3u8; 20]);
        store.add_balance(addr, U256::from(100u64)).unwrap();
        store.sub_balance(addr, U256::from(40u64)).unwrap();
        assert_eq!(store.balance_of(addr).unwrap(), U256::from(60u64));
    }

    #[test]
    fn sub_balance_below_zero_fails_without_mutating_state() {
        let (store, _dir) = open_store();
        let addr = Address::new([4u8; 20]);
        store.add_balance(addr, U256::from(10u64)).unwrap();
        let err = store.sub_balance(addr, U256::from(11u64)).unwrap_err();
        assert!(matches!(err, AccountError::InsufficientBalance { .. }));
        assert_eq!(store.balance_of(addr).unwrap(), U256::from(10u64));
    }

    #[test]
    fn checkpoint_and_restore_undo_mutations() {
        let (store, _dir) = open_store();
        let addr = Address::new([5u8; 20]);
        store.add_balance(addr, U256::from(50u64)).unwrap();
        let snapshot = store.checkpoint(addr).unwrap();
        store.add_balance(addr, U256::from(25u64)).unwrap();
        assert_eq!(store.balance_of(addr).unwrap(), U256::from(75u64));
        store.restore(addr, snapshot);
        assert_eq!(store.balance_of(addr).unwrap(), U256::from(50u64));
    }

    #[test]
    fn restore_undoes_touch_on_a_previously_nonexistent_address() {
        let (store, _dir) = open_store();
        let addr = Address::new([7u8; 20]);
        assert!(!store.exists(addr).unwrap());
        let snapshot = store.checkpoint(addr).unwrap();
        store.touch(addr).unwrap();
        assert!(store.exists(addr).unwrap());
        store.restore(addr, snapshot);
        assert!(!store.exists(addr).unwrap());
    }

    #[test]
    fn restore_keeps_an_already_touched_address_existing() {
        let (store, _dir) = open_store();
        let addr = Address::new([8u8; 20]);
        store.touch(addr).unwrap();
        let snapshot = store.checkpoint(addr).unwrap();
        store.add_balance(addr, U256::from(5u64)).unwrap();
        store.restore(addr, snapshot);
        assert!(store.exists(addr).unwrap());
        assert_eq!(store.balance_of(addr).unwrap(), U256::ZERO);
    }

    #[test]
    fn flush_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let addr = Address::new([6u8; 20]);
        {
            let kv = Arc::new(KVStore::open(dir.path()).unwrap());
            let store = AccountStore::new(kv.clone());
            store.add_balance(addr, U256::from(777u64)).unwrap();
            store.set_code(addr, vec![0x60, 0x00]).unwrap();
            kv.write_batch(store.flush()).unwrap();
        }
        {
            let kv = Arc::new(KVStore::open(dir.path()).unwrap());
            let store = AccountStore::new(kv);
            assert_eq!(store.balance_of(addr).unwrap(), U256::from(777u64));
            assert_eq!(store.get_code(addr).unwrap(), vec![0x60, 0x00]);
        }
    }
}
