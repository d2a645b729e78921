mod lock_manager;
mod tx;
mod wait_for_graph;

pub use lock_manager::{
    Lock, LockManager, LockWait, PageLock, Permission, FATAL_CONFLICT_THRESHOLD,
};
pub use tx::{Transaction, TransactionId, TransactionStatus};
pub(crate) use wait_for_graph::WaitForGraph;
