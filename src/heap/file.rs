use std::{
    collections::hash_map::DefaultHasher,
    fmt,
    fs::{self, File, OpenOptions},
    hash::{Hash, Hasher},
    io::{Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard},
};

use log::{debug, info};

use super::{DbFile, DbFileIterator, HeapPage, PageId, TableId};
use crate::{
    buffer_pool::BufferPool,
    error::DbError,
    storage::{Schema, Tuple},
    transaction::{Permission, TransactionId},
    types::{DbResult, Pod, SimpleResult},
    utils::{HandyMutex, HandyRwLock},
};

/// A table stored as an unordered sequence of fixed-size pages.
pub struct HeapFile {
    file: Mutex<File>,

    path: PathBuf,

    schema: Arc<Schema>,

    table_id: TableId,

    // serialize insertions, so two transactions never append the same
    // page
    insert_latch: Mutex<()>,
}

// init functions
impl HeapFile {
    /// Create a new, empty heap file at `path`. An existing file is
    /// truncated.
    pub fn create<P: AsRef<Path>>(path: P, schema: &Schema) -> DbResult<Self> {
        Self::check_fits(schema)?;
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path.as_ref())?;
        Self::init(file, path.as_ref(), schema)
    }

    /// Open the heap file at `path`, creating it when missing.
    pub fn open<P: AsRef<Path>>(path: P, schema: &Schema) -> DbResult<Self> {
        Self::check_fits(schema)?;
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path.as_ref())?;
        Self::init(file, path.as_ref(), schema)
    }

    /// A page must hold at least one tuple of `schema`.
    fn check_fits(schema: &Schema) -> SimpleResult {
        if HeapPage::calculate_slots_count(schema) == 0 {
            return Err(DbError::InvalidArgument(format!(
                "a tuple of {} bytes doesn't fit in a page of {} bytes",
                schema.get_size(),
                BufferPool::get_page_size()
            )));
        }
        Ok(())
    }

    fn init(file: File, path: &Path, schema: &Schema) -> DbResult<Self> {
        let path = fs::canonicalize(path)?;

        // the id only has to be stable for a given file
        let mut hasher = DefaultHasher::new();
        path.hash(&mut hasher);
        let table_id = hasher.finish() as TableId;

        let heap_file = Self {
            file: Mutex::new(file),
            path,
            schema: Arc::new(schema.clone()),
            table_id,
            insert_latch: Mutex::new(()),
        };
        info!("heap file opened: {}", heap_file);
        Ok(heap_file)
    }
}

impl HeapFile {
    pub fn get_path(&self) -> &Path {
        &self.path
    }

    fn get_file(&self) -> MutexGuard<'_, File> {
        self.file.lk()
    }

    fn check_page(&self, pid: &PageId) -> SimpleResult {
        if pid.table_id != self.table_id {
            return Err(DbError::InvalidArgument(format!(
                "page {} doesn't belong to table {}",
                pid, self.table_id
            )));
        }

        let num_pages = self.num_pages()?;
        if pid.page_index as usize >= num_pages {
            return Err(DbError::InvalidArgument(format!(
                "page {} out of range, table {} has {} pages",
                pid, self.table_id, num_pages
            )));
        }
        Ok(())
    }
}

impl DbFile for HeapFile {
    fn get_id(&self) -> TableId {
        self.table_id
    }

    fn get_schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    fn read_page(&self, pid: &PageId) -> DbResult<HeapPage> {
        self.check_page(pid)?;

        let page_size = BufferPool::get_page_size();
        let mut buf = vec![0; page_size];
        {
            let mut file = self.get_file();
            file.seek(SeekFrom::Start(pid.offset(page_size)))?;
            file.read_exact(&mut buf).map_err(|e| {
                DbError::InvalidArgument(format!("read page {} failed: {}", pid, e))
            })?;
        }

        HeapPage::new(pid, &buf, &self.schema)
    }

    fn write_page(&self, page: &HeapPage) -> SimpleResult {
        let pid = page.get_pid();
        let data = page.get_page_data()?;

        let mut file = self.get_file();
        file.seek(SeekFrom::Start(pid.offset(BufferPool::get_page_size())))?;
        file.write_all(&data)?;
        file.flush()?;
        debug!("page {} written", pid);
        Ok(())
    }

    fn num_pages(&self) -> DbResult<usize> {
        let file_size = self.get_file().metadata()?.len() as usize;
        Ok(file_size / BufferPool::get_page_size())
    }

    /// Insert the tuple into the first page with a free slot, appending
    /// a new page when every page is full.
    fn insert_tuple(
        &self,
        pool: &BufferPool,
        tid: TransactionId,
        mut tuple: Tuple,
    ) -> DbResult<Vec<Pod<HeapPage>>> {
        if !tuple.conforms_to(&self.schema) {
            return Err(DbError::Database(format!(
                "tuple {} doesn't match the schema of table {} ({})",
                tuple, self.table_id, self.schema
            )));
        }
        // the page size may have shrunk since the file was opened
        Self::check_fits(&self.schema)?;

        let _latch = self.insert_latch.lk();

        let num_pages = self.num_pages()?;
        for page_index in 0..num_pages {
            let pid = PageId::new(self.table_id, page_index as u32);

            let held_before = pool.holds_lock(tid, &pid);
            let page_pod = pool.get_page(tid, &pid, Permission::ReadWrite)?;
            if page_pod.rl().empty_slots_count() > 0 {
                page_pod.wl().insert_tuple(&mut tuple)?;
                return Ok(vec![page_pod]);
            }

            // nothing was read from or written to this page, no need to
            // keep it locked
            if !held_before {
                pool.release_page(tid, &pid);
            }
        }

        // all pages are full, write an empty page at the end of the file
        // to claim its place
        let pid = PageId::new(self.table_id, num_pages as u32);
        let empty_page = HeapPage::new(&pid, &HeapPage::empty_page_data(), &self.schema)?;
        self.write_page(&empty_page)?;
        debug!("table {} grows to {} pages", self.table_id, num_pages + 1);

        let page_pod = pool.get_page(tid, &pid, Permission::ReadWrite)?;
        page_pod.wl().insert_tuple(&mut tuple)?;
        Ok(vec![page_pod])
    }

    fn delete_tuple(
        &self,
        pool: &BufferPool,
        tid: TransactionId,
        tuple: &Tuple,
    ) -> DbResult<Vec<Pod<HeapPage>>> {
        let rid = tuple
            .get_record_id()
            .ok_or_else(|| DbError::invalid("tuple has no record id"))?;
        self.check_page(&rid.pid)?;

        let page_pod = pool.get_page(tid, &rid.pid, Permission::ReadWrite)?;
        page_pod.wl().delete_tuple(tuple)?;
        Ok(vec![page_pod])
    }

    fn iterator(
        self: Arc<Self>,
        pool: Arc<BufferPool>,
        tid: TransactionId,
    ) -> Box<dyn DbFileIterator> {
        Box::new(HeapFileIterator::new(self, pool, tid))
    }
}

impl fmt::Display for HeapFile {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "<HeapFile, file: {:?}, id: {}>",
            self.path, self.table_id
        )
    }
}

/// Page-by-page scan of a heap file. Each page is fetched read-only and
/// its tuples are copied out before moving to the next one.
pub struct HeapFileIterator {
    file: Arc<HeapFile>,
    pool: Arc<BufferPool>,
    tid: TransactionId,

    // `None` while closed
    cursor: Option<Cursor>,
}

struct Cursor {
    next_page: usize,
    tuples: std::vec::IntoIter<Tuple>,
}

impl HeapFileIterator {
    pub fn new(file: Arc<HeapFile>, pool: Arc<BufferPool>, tid: TransactionId) -> Self {
        Self {
            file,
            pool,
            tid,
            cursor: None,
        }
    }
}

impl DbFileIterator for HeapFileIterator {
    fn open(&mut self) -> SimpleResult {
        self.cursor = Some(Cursor {
            next_page: 0,
            tuples: Vec::new().into_iter(),
        });
        Ok(())
    }

    fn next(&mut self) -> DbResult<Option<Tuple>> {
        let cursor = match self.cursor.as_mut() {
            Some(cursor) => cursor,
            None => return Ok(None),
        };

        loop {
            if let Some(tuple) = cursor.tuples.next() {
                return Ok(Some(tuple));
            }

            if cursor.next_page >= self.file.num_pages()? {
                return Ok(None);
            }

            let pid = PageId::new(self.file.get_id(), cursor.next_page as u32);
            let page_pod = self.pool.get_page(self.tid, &pid, Permission::ReadOnly)?;
            let tuples: Vec<Tuple> = page_pod.rl().tuples().cloned().collect();
            cursor.tuples = tuples.into_iter();
            cursor.next_page += 1;
        }
    }

    fn rewind(&mut self) -> SimpleResult {
        self.close();
        self.open()
    }

    fn close(&mut self) {
        self.cursor = None;
    }
}
