use core::fmt;
use std::{
    collections::{HashMap, HashSet},
    sync::{Condvar, Mutex},
    time::{Duration, Instant},
};

use log::{debug, warn};

use super::{TransactionId, WaitForGraph};
use crate::{error::DbError, heap::PageId, types::SimpleResult, utils::HandyMutex};

/// The priority heuristic stays silent until this many locks have been
/// granted, so a lightly loaded system never sees spurious aborts.
pub const FATAL_CONFLICT_THRESHOLD: usize = 100;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Lock {
    XLock,
    SLock,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Permission {
    ReadOnly,
    ReadWrite,
}

impl Permission {
    pub fn to_lock(&self) -> Lock {
        match self {
            Permission::ReadOnly => Lock::SLock,
            Permission::ReadWrite => Lock::XLock,
        }
    }
}

/// How long a transaction may wait for a page lock before it's aborted:
/// `retries` rounds of at most `interval` each.
#[derive(Debug, Clone, Copy)]
pub struct LockWait {
    pub retries: u32,
    pub interval: Duration,
}

impl LockWait {
    pub fn new(retries: u32, interval: Duration) -> Self {
        Self { retries, interval }
    }

    pub fn timeout(&self) -> Duration {
        self.interval * self.retries
    }
}

impl Default for LockWait {
    fn default() -> Self {
        Self {
            retries: 20,
            interval: Duration::from_millis(100),
        }
    }
}

/// Holders of the lock on a single page.
///
/// Invariant: either `exclusive` is `None`, or `shared` is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageLock {
    pub shared: HashSet<TransactionId>,
    pub exclusive: Option<TransactionId>,
}

impl PageLock {
    fn is_free(&self) -> bool {
        self.shared.is_empty() && self.exclusive.is_none()
    }

    fn holds(&self, tid: TransactionId) -> bool {
        self.exclusive == Some(tid) || self.shared.contains(&tid)
    }

    /// Other transactions standing in the way of a `lock` request from
    /// `tid`.
    fn blockers(&self, tid: TransactionId, lock: Lock) -> Vec<TransactionId> {
        let mut blockers = Vec::new();
        if let Some(x) = self.exclusive {
            if x != tid {
                blockers.push(x);
            }
        }

        if lock == Lock::XLock {
            blockers.extend(self.shared.iter().filter(|t| **t != tid).copied());
        }
        blockers
    }
}

struct LockTable {
    page_locks: HashMap<PageId, PageLock>,
    hold_pages: HashMap<TransactionId, HashSet<PageId>>,

    // number of grants so far, feeds the priority heuristic
    grants: usize,

    wait_for_graph: WaitForGraph,
}

impl LockTable {
    fn new() -> Self {
        Self {
            page_locks: HashMap::new(),
            hold_pages: HashMap::new(),
            grants: 0,
            wait_for_graph: WaitForGraph::new(),
        }
    }

    // Grant the lock if possible. This api is idempotent.
    //
    // # Return
    //
    // Return a bool value to indicate whether the lock is held by `tid`
    // afterwards.
    fn try_grant(&mut self, pid: &PageId, tid: TransactionId, lock: Lock) -> bool {
        if let Some(page_lock) = self.page_locks.get(pid) {
            match lock {
                Lock::SLock => {
                    if page_lock.holds(tid) {
                        return true;
                    }
                    if page_lock.exclusive.is_some() {
                        return false;
                    }
                }
                Lock::XLock => {
                    if page_lock.exclusive == Some(tid) {
                        return true;
                    }
                    if !page_lock.blockers(tid, lock).is_empty() {
                        return false;
                    }
                }
            }
        }

        let page_lock = self.page_locks.entry(*pid).or_default();
        match lock {
            Lock::SLock => {
                page_lock.shared.insert(tid);
            }
            Lock::XLock => {
                // fresh grant, or upgrade of the sole shared holder
                page_lock.shared.remove(&tid);
                page_lock.exclusive = Some(tid);
            }
        }

        self.hold_pages.entry(tid).or_default().insert(*pid);
        self.grants += 1;
        true
    }

    fn conflicts_fatally(&self, pid: &PageId, tid: TransactionId, lock: Lock) -> bool {
        if self.grants < FATAL_CONFLICT_THRESHOLD {
            return false;
        }

        match self.page_locks.get(pid) {
            Some(page_lock) => page_lock
                .blockers(tid, lock)
                .iter()
                .any(|holder| *holder < tid),
            None => false,
        }
    }

    /// Rebuild the outgoing edges of `tid` from the current holders and
    /// report a cycle through it.
    fn deadlocked(&mut self, pid: &PageId, tid: TransactionId, lock: Lock) -> bool {
        self.wait_for_graph.remove_waiter(tid);
        if let Some(page_lock) = self.page_locks.get(pid) {
            for holder in page_lock.blockers(tid, lock) {
                self.wait_for_graph.add_edge(tid, holder);
            }
        }

        match self.wait_for_graph.find_cycle(tid) {
            Some(cycle) => {
                warn!("deadlock detected, cycle: {:?}", cycle);
                true
            }
            None => false,
        }
    }

    fn release(&mut self, pid: &PageId, tid: TransactionId) {
        if let Some(page_lock) = self.page_locks.get_mut(pid) {
            page_lock.shared.remove(&tid);
            if page_lock.exclusive == Some(tid) {
                page_lock.exclusive = None;
            }
            if page_lock.is_free() {
                self.page_locks.remove(pid);
            }
        }

        if let Some(pages) = self.hold_pages.get_mut(&tid) {
            pages.remove(pid);
            if pages.is_empty() {
                self.hold_pages.remove(&tid);
            }
        }
    }

    fn release_all(&mut self, tid: TransactionId) {
        if let Some(pages) = self.hold_pages.remove(&tid) {
            for pid in pages {
                self.release(&pid, tid);
            }
        }
        self.wait_for_graph.remove_transaction(tid);
    }
}

impl fmt::Display for LockTable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut depiction = "\n".to_string();

        depiction.push_str("page_locks: {");
        for (pid, page_lock) in self.page_locks.iter() {
            depiction.push_str(&format!(
                "\n\t{:?} -> shared: {:?}, exclusive: {:?}",
                pid, page_lock.shared, page_lock.exclusive
            ));
        }
        depiction.push_str("\n}\n");

        depiction.push_str("hold_pages: {");
        for (tid, pages) in self.hold_pages.iter() {
            depiction.push_str(&format!("\n\t{:?} -> {:?}", tid, pages));
        }
        depiction.push_str("\n}\n");

        write!(f, "{}", depiction)
    }
}

/// Page-granularity shared/exclusive locks.
///
/// All bookkeeping sits behind one mutex; waiters park on `released`
/// which is signalled every time a lock goes away.
pub struct LockManager {
    table: Mutex<LockTable>,
    released: Condvar,
}

impl LockManager {
    pub fn new() -> Self {
        Self {
            table: Mutex::new(LockTable::new()),
            released: Condvar::new(),
        }
    }

    /// Grant the lock right away if nothing conflicts. Never blocks.
    pub fn try_acquire(&self, pid: &PageId, tid: TransactionId, perm: Permission) -> bool {
        self.table.lk().try_grant(pid, tid, perm.to_lock())
    }

    /// Whether `tid` should give up instead of waiting for `pid`: an
    /// older transaction (smaller id) holds a conflicting lock. Only
    /// active after `FATAL_CONFLICT_THRESHOLD` grants.
    pub fn conflicts_fatally(&self, pid: &PageId, tid: TransactionId, perm: Permission) -> bool {
        self.table.lk().conflicts_fatally(pid, tid, perm.to_lock())
    }

    /// Request a lock on the given page. This api is blocking.
    ///
    /// Waits until the lock is granted, the fatal conflict check fires,
    /// or `wait` runs out. The last two abort the transaction.
    pub fn acquire(
        &self,
        pid: &PageId,
        tid: TransactionId,
        perm: Permission,
        wait: &LockWait,
    ) -> SimpleResult {
        let lock = perm.to_lock();
        let deadline = Instant::now() + wait.timeout();

        let mut table = self.table.lk();
        loop {
            if table.try_grant(pid, tid, lock) {
                table.wait_for_graph.remove_waiter(tid);
                return Ok(());
            }

            let fatal = if cfg!(feature = "wait_for_graph") {
                table.deadlocked(pid, tid, lock)
            } else {
                table.conflicts_fatally(pid, tid, lock)
            };
            if fatal {
                table.wait_for_graph.remove_waiter(tid);
                return Err(DbError::TransactionAborted(format!(
                    "{} gives up {:?} on {:?}, fatal conflict",
                    tid, lock, pid
                )));
            }

            let now = Instant::now();
            if now >= deadline {
                table.wait_for_graph.remove_waiter(tid);
                let err = DbError::TransactionAborted(format!(
                    "{} timed out waiting for {:?} on {:?}",
                    tid, lock, pid
                ));
                debug!("lock table at timeout: {}", table);
                err.show_backtrace();
                return Err(err);
            }

            debug!("{} waits for {:?} on {:?}", tid, lock, pid);
            let timeout = wait.interval.min(deadline - now);
            let (guard, _) = self
                .released
                .wait_timeout(table, timeout)
                .map_err(|_| DbError::aborted("lock wait interrupted"))?;
            table = guard;
        }
    }

    pub fn release(&self, pid: &PageId, tid: TransactionId) {
        self.table.lk().release(pid, tid);
        self.released.notify_all();
    }

    /// Release every lock held by `tid`, called once when the
    /// transaction ends.
    pub fn release_all(&self, tid: TransactionId) {
        self.table.lk().release_all(tid);
        self.released.notify_all();
    }

    pub fn holds_lock(&self, tid: TransactionId, pid: &PageId) -> bool {
        self.table
            .lk()
            .page_locks
            .get(pid)
            .map_or(false, |page_lock| page_lock.holds(tid))
    }

    /// Snapshot of the holders of `pid`, `None` when unlocked.
    pub fn lock_state(&self, pid: &PageId) -> Option<PageLock> {
        self.table.lk().page_locks.get(pid).cloned()
    }

    pub fn locked_pages(&self, tid: TransactionId) -> Vec<PageId> {
        self.table
            .lk()
            .hold_pages
            .get(&tid)
            .map(|pages| pages.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Check the mutual exclusion invariant over the whole table.
    pub fn is_consistent(&self) -> bool {
        self.table
            .lk()
            .page_locks
            .values()
            .all(|page_lock| page_lock.exclusive.is_none() || page_lock.shared.is_empty())
    }
}

impl Default for LockManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LockManager {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.table.lk())
    }
}
