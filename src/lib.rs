pub mod buffer_pool;
pub mod catalog;
pub mod database;
pub mod error;
pub mod heap;
pub mod io;
pub mod operator;
pub mod storage;
pub mod transaction;
pub mod types;
pub mod utils;

mod log;

pub use buffer_pool::{BufferPool, DEFAULT_PAGES, DEFAULT_PAGE_SIZE};
pub use catalog::Catalog;
pub use database::Database;
pub use error::DbError;
pub use heap::{DbFile, DbFileIterator, HeapFile, HeapPage, PageId, TableId};
pub use storage::{Cell, Field, RecordId, Schema, Tuple, Type};
pub use transaction::{Permission, Transaction, TransactionId};
