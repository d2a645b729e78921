use std::io;

use backtrace::Backtrace;
use log::error;
use thiserror::Error;

/// All failures surfaced by the storage engine.
///
/// Callers are expected to react by category:
/// - `TransactionAborted`: roll back (abort) and restart the transaction.
/// - `Database`: the operation cannot proceed, surface it.
/// - `Io`: the operation is lost, the process is not.
/// - `InvalidArgument` / `NoSuchElement`: the request itself is wrong.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("transaction aborted: {0}")]
    TransactionAborted(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("no such element: {0}")]
    NoSuchElement(String),
}

impl DbError {
    pub fn aborted(msg: &str) -> DbError {
        DbError::TransactionAborted(msg.to_string())
    }

    pub fn db(msg: &str) -> DbError {
        DbError::Database(msg.to_string())
    }

    pub fn invalid(msg: &str) -> DbError {
        DbError::InvalidArgument(msg.to_string())
    }

    pub fn no_such(msg: &str) -> DbError {
        DbError::NoSuchElement(msg.to_string())
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, DbError::TransactionAborted(_))
    }

    pub fn show_backtrace(&self) {
        let bt = Backtrace::new();
        error!("error: [{}], backtrace: {:?}", self, bt);
    }
}
