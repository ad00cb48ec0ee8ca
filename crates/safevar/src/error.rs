use thiserror::Error;

#[derive(Error, Debug)]
pub enum SafeVarError {
    #[error("arithmetic overflow")]
    ArithmeticOverflow,

    #[error("arithmetic underflow")]
    ArithmeticUnderflow,

    #[error("division by zero")]
    DivisionByZero,
}

pub type Result<T> = std::result::Result<T, SafeVarError>;
