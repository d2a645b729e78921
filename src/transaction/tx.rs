use core::fmt;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex,
};

use log::{debug, info};

use crate::{
    buffer_pool::BufferPool, error::DbError, types::SimpleResult, utils::HandyMutex,
};

static TRANSACTION_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a transaction, used as the lock holder token and as the
/// owner tag of dirty pages.
///
/// Ids increase monotonically, so a smaller id means an older
/// transaction.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId {
    id: u64,
}

impl TransactionId {
    pub fn new() -> Self {
        Self {
            id: TRANSACTION_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub fn get_id(&self) -> u64 {
        self.id
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "tx_{}", self.id)
    }
}

impl fmt::Debug for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TransactionStatus {
    Active,
    Aborted,
    Committed,
}

/// A running transaction bound to the buffer pool it works against.
///
/// Ending it (`commit` / `abort`) releases every page lock it holds.
pub struct Transaction {
    id: TransactionId,
    buffer_pool: Arc<BufferPool>,
    status: Mutex<TransactionStatus>,
}

impl Transaction {
    pub fn new(buffer_pool: Arc<BufferPool>) -> Self {
        let id = TransactionId::new();
        debug!("{} started", id);
        Self {
            id,
            buffer_pool,
            status: Mutex::new(TransactionStatus::Active),
        }
    }

    pub fn get_id(&self) -> TransactionId {
        self.id
    }

    pub fn get_status(&self) -> TransactionStatus {
        *self.status.lk()
    }

    /// Flush the pages dirtied by this transaction and release its
    /// locks.
    ///
    /// If a page write fails the locks are already gone and the pages
    /// flushed before the failure stay on disk. The transaction is still
    /// `Active` and the caller must `abort` it, which puts the on-disk
    /// image back in place of the pages that were not written.
    pub fn commit(&self) -> SimpleResult {
        self.complete(true)
    }

    /// Throw away the changes of this transaction (the cached pages are
    /// replaced by their on-disk images) and release its locks.
    pub fn abort(&self) -> SimpleResult {
        self.complete(false)
    }

    fn complete(&self, commit: bool) -> SimpleResult {
        let mut status = self.status.lk();
        if *status != TransactionStatus::Active {
            return Err(DbError::Database(format!(
                "{} already finished ({:?})",
                self.id, *status
            )));
        }

        self.buffer_pool.transaction_complete(self.id, commit)?;

        if commit {
            *status = TransactionStatus::Committed;
            info!("{} committed", self.id);
        } else {
            *status = TransactionStatus::Aborted;
            info!("{} aborted", self.id);
        }
        Ok(())
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({:?})", self.id, self.get_status())
    }
}
