use std::{path::Path, sync::Arc};

use crate::{
    buffer_pool::{BufferPool, DEFAULT_PAGES},
    catalog::Catalog,
    heap::TableId,
    transaction::{LockWait, Transaction},
    types::DbResult,
};

/// Everything a running database shares between transactions: the
/// catalog and the buffer pool.
///
/// Cloning is cheap, every clone refers to the same catalog and pool.
#[derive(Clone)]
pub struct Database {
    catalog: Arc<Catalog>,
    buffer_pool: Arc<BufferPool>,
}

impl Database {
    /// A database with an empty catalog and a buffer pool of `pages`
    /// pages.
    pub fn new(pages: usize) -> Self {
        Self::with_lock_wait(pages, LockWait::default())
    }

    pub fn with_lock_wait(pages: usize, lock_wait: LockWait) -> Self {
        let catalog = Arc::new(Catalog::new());
        let buffer_pool = Arc::new(BufferPool::with_lock_wait(catalog.clone(), pages, lock_wait));
        Self {
            catalog,
            buffer_pool,
        }
    }

    /// Open the tables described by a catalog file, see
    /// [`Catalog::load_schema`].
    pub fn load_schema<P: AsRef<Path>>(&self, catalog_file: P) -> DbResult<Vec<TableId>> {
        self.catalog.load_schema(catalog_file)
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn buffer_pool(&self) -> &Arc<BufferPool> {
        &self.buffer_pool
    }

    /// Start a new transaction against this database.
    pub fn begin(&self) -> Transaction {
        Transaction::new(self.buffer_pool.clone())
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new(DEFAULT_PAGES)
    }
}
