use std::sync::Arc;

use super::{HeapPage, PageId, TableId};
use crate::{
    buffer_pool::BufferPool,
    storage::{Schema, Tuple},
    transaction::TransactionId,
    types::{DbResult, Pod, SimpleResult},
};

/// The on-disk storage of one table, as seen by the buffer pool.
///
/// Page reads and writes go straight to disk. Tuple insertion and
/// deletion go through the buffer pool (and its locks), and hand back
/// the pages they modified so the pool can mark them dirty.
pub trait DbFile: Send + Sync {
    fn get_id(&self) -> TableId;

    fn get_schema(&self) -> &Arc<Schema>;

    fn read_page(&self, pid: &PageId) -> DbResult<HeapPage>;

    fn write_page(&self, page: &HeapPage) -> SimpleResult;

    fn num_pages(&self) -> DbResult<usize>;

    fn insert_tuple(
        &self,
        pool: &BufferPool,
        tid: TransactionId,
        tuple: Tuple,
    ) -> DbResult<Vec<Pod<HeapPage>>>;

    fn delete_tuple(
        &self,
        pool: &BufferPool,
        tid: TransactionId,
        tuple: &Tuple,
    ) -> DbResult<Vec<Pod<HeapPage>>>;

    /// A restartable scan of every tuple in the file, pages fetched
    /// read-only through `pool` on behalf of `tid`.
    fn iterator(self: Arc<Self>, pool: Arc<BufferPool>, tid: TransactionId)
        -> Box<dyn DbFileIterator>;
}

/// Pull-based cursor over the tuples of a `DbFile`.
///
/// `next` returns `Ok(None)` once the file is exhausted, and also
/// before `open` and after `close`.
pub trait DbFileIterator: Send {
    fn open(&mut self) -> SimpleResult;

    fn next(&mut self) -> DbResult<Option<Tuple>>;

    fn rewind(&mut self) -> SimpleResult;

    fn close(&mut self);
}
