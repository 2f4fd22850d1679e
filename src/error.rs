use thiserror::Error;

use crate::eval::EvalError;
use crate::includes::IncludeError;
use crate::scanner::ScanError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),
    #[error("Eval error: {0}")]
    Eval(#[from] EvalError),
    #[error("Include error: {0}")]
    Include(#[from] IncludeError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type InternalResult<T> = Result<T, Error>;

impl Error {
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Error::Internal(message.into())
    }
}
