// Structured errors for conditions the engine needs to distinguish
// programmatically. Interpreter-level failures still funnel through the
// single abort path in `internals::outer`; this type exists so the code
// that detects them can use `?` instead of ad-hoc bool/sentinel returns.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VmError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{word} ?")]
    UndefinedWord { word: String },

    #[error("stack underflow in {word}")]
    StackUnderflow { word: &'static str },

    #[error("stack overflow in {word}")]
    StackOverflow { word: &'static str },

    #[error("division by zero")]
    DivisionByZero,

    #[error("no free thread slot")]
    NoFreeThreadSlot,

    #[error("invalid thread id {0}")]
    InvalidThreadId(i64),

    #[error("thread {0} already waited on")]
    AlreadyWaited(i64),

    #[error("throw: {0}")]
    UserThrow(i64),

    #[error("ill-formed number: {0}")]
    IllFormedNumber(String),

    #[error("{0}")]
    Other(String),
}

pub type VmResult<T> = Result<T, VmError>;
