use std::{
    collections::{HashMap, VecDeque},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex, MutexGuard, RwLock,
    },
};

use log::{debug, info};

use crate::{
    catalog::Catalog,
    error::DbError,
    heap::{HeapPage, PageId, TableId},
    storage::Tuple,
    transaction::{LockManager, LockWait, Permission, TransactionId},
    types::{Pod, ResultPod, SimpleResult},
    utils::{HandyMutex, HandyRwLock},
};

pub const DEFAULT_PAGE_SIZE: usize = 4096;
static PAGE_SIZE: AtomicUsize = AtomicUsize::new(DEFAULT_PAGE_SIZE);

/// Default number of pages a buffer pool keeps in memory.
pub const DEFAULT_PAGES: usize = 50;

/// Cached pages plus the order they were admitted in, which is the
/// order eviction scans them.
struct PageCache {
    pages: HashMap<PageId, Pod<HeapPage>>,
    order: VecDeque<PageId>,
}

impl PageCache {
    fn new() -> Self {
        Self {
            pages: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    fn len(&self) -> usize {
        self.pages.len()
    }

    fn get(&self, pid: &PageId) -> Option<Pod<HeapPage>> {
        self.pages.get(pid).cloned()
    }

    fn contains(&self, pid: &PageId) -> bool {
        self.pages.contains_key(pid)
    }

    /// Insert or replace. A replaced page keeps its admission position.
    fn insert(&mut self, pid: PageId, page: Pod<HeapPage>) {
        if self.pages.insert(pid, page).is_none() {
            self.order.push_back(pid);
        }
    }

    fn remove(&mut self, pid: &PageId) -> Option<Pod<HeapPage>> {
        let page = self.pages.remove(pid)?;
        self.order.retain(|p| p != pid);
        Some(page)
    }

    /// The first clean page in admission order.
    fn find_victim(&self) -> Option<PageId> {
        self.order
            .iter()
            .find(|pid| {
                self.pages
                    .get(*pid)
                    .map_or(false, |page| page.rl().is_dirty().is_none())
            })
            .copied()
    }

    fn dirtied_by(&self, tid: TransactionId) -> Vec<(PageId, Pod<HeapPage>)> {
        self.order
            .iter()
            .filter_map(|pid| {
                let page = self.pages.get(pid)?;
                if page.rl().is_dirty() == Some(tid) {
                    Some((*pid, page.clone()))
                } else {
                    None
                }
            })
            .collect()
    }
}

/// BufferPool manages the reading and writing of pages into memory
/// from disk. Access methods call into it to retrieve pages, and it
/// fetches pages from the appropriate location.
///
/// The BufferPool is also responsible for locking; when a transaction
/// fetches a page, BufferPool checks that the transaction has the
/// appropriate locks to read/write the page.
///
/// At most `capacity` pages are cached. When a new page has to be
/// admitted into a full pool, the oldest clean page is evicted; dirty
/// pages are never evicted, the request fails instead.
pub struct BufferPool {
    catalog: Arc<Catalog>,

    lock_manager: LockManager,

    cache: Mutex<PageCache>,

    capacity: usize,

    lock_wait: LockWait,
}

impl BufferPool {
    pub fn new(catalog: Arc<Catalog>, capacity: usize) -> Self {
        Self::with_lock_wait(catalog, capacity, LockWait::default())
    }

    pub fn with_lock_wait(catalog: Arc<Catalog>, capacity: usize, lock_wait: LockWait) -> Self {
        Self {
            catalog,
            lock_manager: LockManager::new(),
            cache: Mutex::new(PageCache::new()),
            capacity,
            lock_wait,
        }
    }

    pub fn set_page_size(page_size: usize) {
        PAGE_SIZE.store(page_size, Ordering::Relaxed);
    }

    pub fn get_page_size() -> usize {
        PAGE_SIZE.load(Ordering::Relaxed)
    }

    pub fn reset_page_size() {
        Self::set_page_size(DEFAULT_PAGE_SIZE);
    }

    pub fn get_catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn lock_manager(&self) -> &LockManager {
        &self.lock_manager
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of pages currently cached.
    pub fn len(&self) -> usize {
        self.cache.lk().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `pid` is currently cached.
    pub fn is_cached(&self, pid: &PageId) -> bool {
        self.cache.lk().contains(pid)
    }

    /// Retrieve the specified page with the associated permissions.
    /// Will acquire a lock and may block if that lock is held by
    /// another transaction.
    ///
    /// The retrieved page is looked up in the buffer pool. If it is
    /// present, it is returned. If it is not present, it is added to
    /// the buffer pool and returned. If there is insufficient space in
    /// the buffer pool, a clean page is evicted and the new page is
    /// added in its place.
    pub fn get_page(&self, tid: TransactionId, pid: &PageId, perm: Permission) -> ResultPod<HeapPage> {
        self.lock_manager.acquire(pid, tid, perm, &self.lock_wait)?;

        let mut cache = self.cache.lk();
        if let Some(page) = cache.get(pid) {
            return Ok(page);
        }

        let page = self.catalog.get_db_file(pid.get_table_id())?.read_page(pid)?;
        self.make_room(&mut cache)?;

        let page_pod = Arc::new(RwLock::new(page));
        cache.insert(*pid, page_pod.clone());
        debug!("page {} loaded for {}", pid, tid);
        Ok(page_pod)
    }

    /// Evict a clean page if the pool is full.
    fn make_room(&self, cache: &mut MutexGuard<'_, PageCache>) -> SimpleResult {
        if cache.len() < self.capacity {
            return Ok(());
        }

        let victim = cache.find_victim().ok_or_else(|| {
            DbError::Database(format!(
                "cannot find a clean page to evict, all {} pages are dirty",
                cache.len()
            ))
        })?;

        if let Some(page) = cache.remove(&victim) {
            // only clean pages are picked, but a dirty one must not be
            // lost
            let page = page.rl();
            if page.is_dirty().is_some() {
                self.write_page(&page)?;
            }
        }
        debug!("page {} evicted", victim);
        Ok(())
    }

    /// Add a tuple to the specified table on behalf of transaction
    /// `tid`. Acquires a write lock on the page the tuple is added to
    /// and any other pages that are updated. May block if the lock(s)
    /// cannot be acquired.
    ///
    /// Every page modified by the operation is marked dirty and cached.
    pub fn insert_tuple(&self, tid: TransactionId, table_id: TableId, tuple: Tuple) -> SimpleResult {
        let file = self.catalog.get_db_file(table_id)?;
        let pages = file.insert_tuple(self, tid, tuple)?;
        self.cache_dirty_pages(tid, pages)
    }

    /// Remove the specified tuple from the buffer pool on behalf of
    /// transaction `tid`. The table is the one named by the tuple's
    /// record id.
    pub fn delete_tuple(&self, tid: TransactionId, tuple: &Tuple) -> SimpleResult {
        let rid = tuple
            .get_record_id()
            .ok_or_else(|| DbError::invalid("tuple has no record id"))?;
        let file = self
            .catalog
            .get_db_file(rid.pid.get_table_id())
            .map_err(|_| {
                DbError::InvalidArgument(format!("tuple {} belongs to no known table", rid))
            })?;
        let pages = file.delete_tuple(self, tid, tuple)?;
        self.cache_dirty_pages(tid, pages)
    }

    fn cache_dirty_pages(&self, tid: TransactionId, pages: Vec<Pod<HeapPage>>) -> SimpleResult {
        let mut cache = self.cache.lk();
        for page in pages {
            let pid = {
                let mut page = page.wl();
                page.mark_dirty(Some(tid));
                page.get_pid()
            };

            if !cache.contains(&pid) {
                self.make_room(&mut cache)?;
            }
            cache.insert(pid, page);
        }
        Ok(())
    }

    /// Commit or abort a given transaction; release all locks
    /// associated to the transaction.
    ///
    /// On commit the pages dirtied by `tid` are written to disk. On
    /// abort they are replaced by their on-disk image.
    ///
    /// A failed write stops the commit halfway: earlier pages are on disk
    /// and clean, the rest are still dirty and cached for `tid`, so a
    /// following abort restores exactly those.
    pub fn transaction_complete(&self, tid: TransactionId, commit: bool) -> SimpleResult {
        let mut cache = self.cache.lk();
        self.lock_manager.release_all(tid);

        let dirty_pages = cache.dirtied_by(tid);
        if commit {
            for (_, page) in dirty_pages.iter() {
                self.flush_page(page)?;
            }
        } else {
            for (pid, _) in dirty_pages.iter() {
                let page = self.catalog.get_db_file(pid.get_table_id())?.read_page(pid)?;
                cache.insert(*pid, Arc::new(RwLock::new(page)));
            }
        }

        info!(
            "{} {}, {} dirty pages {}",
            tid,
            if commit { "commits" } else { "aborts" },
            dirty_pages.len(),
            if commit { "flushed" } else { "restored" },
        );
        Ok(())
    }

    /// Release the lock on a page.
    ///
    /// Calling this is very risky, and may result in wrong behavior.
    /// Only safe when the page hasn't been read or written.
    pub fn release_page(&self, tid: TransactionId, pid: &PageId) {
        self.lock_manager.release(pid, tid);
    }

    pub fn holds_lock(&self, tid: TransactionId, pid: &PageId) -> bool {
        self.lock_manager.holds_lock(tid, pid)
    }

    /// Flush all dirty pages to disk.
    ///
    /// NB: Be careful using this routine -- it writes dirty data to disk
    /// so will break the no-steal policy if uncommitted transactions
    /// are running.
    pub fn flush_all_pages(&self) -> SimpleResult {
        let cache = self.cache.lk();
        for pid in cache.order.iter() {
            if let Some(page) = cache.pages.get(pid) {
                self.flush_page(page)?;
            }
        }
        Ok(())
    }

    /// Write all pages dirtied by the specified transaction to disk.
    pub fn flush_pages(&self, tid: TransactionId) -> SimpleResult {
        let cache = self.cache.lk();
        for (_, page) in cache.dirtied_by(tid) {
            self.flush_page(&page)?;
        }
        Ok(())
    }

    /// Remove the specific page id from the buffer pool without
    /// writing it.
    pub fn discard_page(&self, pid: &PageId) {
        if self.cache.lk().remove(pid).is_some() {
            debug!("page {} discarded", pid);
        }
    }

    /// Write the page to disk if it is dirty, and mark it clean.
    fn flush_page(&self, page: &Pod<HeapPage>) -> SimpleResult {
        let mut page = page.wl();
        if page.is_dirty().is_none() {
            return Ok(());
        }

        self.write_page(&page)?;
        page.mark_dirty(None);
        Ok(())
    }

    fn write_page(&self, page: &HeapPage) -> SimpleResult {
        let pid = page.get_pid();
        debug!("flushing page {}", pid);
        self.catalog.get_db_file(pid.get_table_id())?.write_page(page)
    }
}
