mod test_utils;

use std::{
    io,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use heapdb::{
    transaction::TransactionStatus,
    types::{DbResult, Pod, SimpleResult},
    utils::HandyRwLock,
    BufferPool, DbError, DbFile, DbFileIterator, HeapFile, HeapPage, PageId, Permission, Schema,
    TableId, TransactionId, Tuple,
};
use test_utils::{
    insert_int_tuples, new_database, new_empty_table, open_table, scan_table, scan_with, setup,
    sorted_keys,
};

#[test]
fn test_commit_is_durable() {
    let dir = setup();
    let db = new_database(20);
    let table_id = new_empty_table(&db, &dir, "t", 2);

    let tx = db.begin();
    for v in 0..10 {
        db.buffer_pool()
            .insert_tuple(tx.get_id(), table_id, Tuple::new_int_tuples(v, 2))
            .unwrap();
    }
    tx.commit().unwrap();
    assert_eq!(tx.get_status(), TransactionStatus::Committed);

    // same pool
    assert_eq!(sorted_keys(&scan_table(&db, table_id)), (0..10).collect::<Vec<_>>());

    // a fresh pool has to read it from disk
    let fresh = new_database(20);
    let fresh_table = open_table(&fresh, &dir.path().join("t.dat"), 2);
    assert_eq!(fresh_table, table_id);
    assert_eq!(sorted_keys(&scan_table(&fresh, fresh_table)), (0..10).collect::<Vec<_>>());
}

#[test]
fn test_abort_restores_inserts() {
    let dir = setup();
    let db = new_database(20);
    let table_id = new_empty_table(&db, &dir, "t", 2);
    insert_int_tuples(&db, table_id, 5, 2);

    let tx = db.begin();
    for v in 100..110 {
        db.buffer_pool()
            .insert_tuple(tx.get_id(), table_id, Tuple::new_int_tuples(v, 2))
            .unwrap();
    }
    // visible to the transaction itself
    assert_eq!(scan_with(&db, &tx, table_id).len(), 15);
    tx.abort().unwrap();
    assert_eq!(tx.get_status(), TransactionStatus::Aborted);

    assert_eq!(sorted_keys(&scan_table(&db, table_id)), vec![0, 1, 2, 3, 4]);

    let page = db
        .buffer_pool()
        .get_page(db.begin().get_id(), &PageId::new(table_id, 0), Permission::ReadOnly)
        .unwrap();
    assert_eq!(page.rl().is_dirty(), None);
}

#[test]
fn test_abort_restores_deletes() {
    let dir = setup();
    let db = new_database(20);
    let table_id = new_empty_table(&db, &dir, "t", 2);
    insert_int_tuples(&db, table_id, 5, 2);
    let tuples = scan_table(&db, table_id);

    let tx = db.begin();
    for t in tuples.iter() {
        db.buffer_pool().delete_tuple(tx.get_id(), t).unwrap();
    }
    assert!(scan_with(&db, &tx, table_id).is_empty());
    tx.abort().unwrap();

    assert_eq!(sorted_keys(&scan_table(&db, table_id)), vec![0, 1, 2, 3, 4]);
}

#[test]
fn test_locks_released_at_the_end() {
    let dir = setup();
    let db = new_database(20);
    let table_id = new_empty_table(&db, &dir, "t", 2);
    insert_int_tuples(&db, table_id, 5, 2);
    let pid = PageId::new(table_id, 0);

    for commit in [true, false].iter() {
        let tx = db.begin();
        db.buffer_pool()
            .get_page(tx.get_id(), &pid, Permission::ReadWrite)
            .unwrap();
        assert!(db.buffer_pool().holds_lock(tx.get_id(), &pid));

        if *commit {
            tx.commit().unwrap();
        } else {
            tx.abort().unwrap();
        }
        assert!(!db.buffer_pool().holds_lock(tx.get_id(), &pid));
        assert!(db.buffer_pool().lock_manager().lock_state(&pid).is_none());
    }
}

#[test]
fn test_complete_twice() {
    let _dir = setup();
    let db = new_database(20);

    let tx = db.begin();
    assert_eq!(tx.get_status(), TransactionStatus::Active);
    tx.commit().unwrap();
    assert!(matches!(tx.commit(), Err(DbError::Database(_))));
    assert!(matches!(tx.abort(), Err(DbError::Database(_))));
    assert_eq!(tx.get_status(), TransactionStatus::Committed);
}

#[test]
fn test_transaction_ids_increase() {
    let db = new_database(1);
    let a = db.begin();
    let b = db.begin();
    assert!(a.get_id() < b.get_id());
    assert_ne!(a.get_id(), b.get_id());
    a.commit().unwrap();
    b.commit().unwrap();
}

/// A heap file whose page writes can be switched to fail.
struct FlakyFile {
    inner: Arc<HeapFile>,
    fail_writes: AtomicBool,
}

impl DbFile for FlakyFile {
    fn get_id(&self) -> TableId {
        self.inner.get_id()
    }

    fn get_schema(&self) -> &Arc<Schema> {
        self.inner.get_schema()
    }

    fn read_page(&self, pid: &PageId) -> DbResult<HeapPage> {
        self.inner.read_page(pid)
    }

    fn write_page(&self, page: &HeapPage) -> SimpleResult {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DbError::Io(io::Error::new(io::ErrorKind::Other, "disk full")));
        }
        self.inner.write_page(page)
    }

    fn num_pages(&self) -> DbResult<usize> {
        self.inner.num_pages()
    }

    fn insert_tuple(
        &self,
        pool: &BufferPool,
        tid: TransactionId,
        tuple: Tuple,
    ) -> DbResult<Vec<Pod<HeapPage>>> {
        self.inner.insert_tuple(pool, tid, tuple)
    }

    fn delete_tuple(
        &self,
        pool: &BufferPool,
        tid: TransactionId,
        tuple: &Tuple,
    ) -> DbResult<Vec<Pod<HeapPage>>> {
        self.inner.delete_tuple(pool, tid, tuple)
    }

    fn iterator(
        self: Arc<Self>,
        pool: Arc<BufferPool>,
        tid: TransactionId,
    ) -> Box<dyn DbFileIterator> {
        self.inner.clone().iterator(pool, tid)
    }
}

/// A commit whose second page write fails: the first page is durable,
/// the transaction stays active, and aborting it restores the page that
/// was never written.
#[test]
fn test_failed_commit_then_abort() {
    let dir = setup();
    let db = new_database(20);
    let pool = db.buffer_pool();
    let good = new_empty_table(&db, &dir, "good", 2);

    let schema = Schema::small_int_schema(2, "");
    let flaky = Arc::new(FlakyFile {
        inner: Arc::new(HeapFile::create(dir.path().join("flaky.dat"), &schema).unwrap()),
        fail_writes: AtomicBool::new(false),
    });
    db.catalog().add_table(flaky.clone(), "flaky", "");
    let flaky_id = flaky.get_id();

    let tx = db.begin();
    pool.insert_tuple(tx.get_id(), good, Tuple::new_int_tuples(1, 2))
        .unwrap();
    pool.insert_tuple(tx.get_id(), flaky_id, Tuple::new_int_tuples(2, 2))
        .unwrap();

    flaky.fail_writes.store(true, Ordering::SeqCst);
    assert!(matches!(tx.commit(), Err(DbError::Io(_))));
    assert_eq!(tx.get_status(), TransactionStatus::Active);
    assert!(pool.lock_manager().locked_pages(tx.get_id()).is_empty());

    // the unwritten page is still cached as dirtied by the transaction
    let reader = db.begin();
    let page = pool
        .get_page(reader.get_id(), &PageId::new(flaky_id, 0), Permission::ReadOnly)
        .unwrap();
    assert_eq!(page.rl().is_dirty(), Some(tx.get_id()));
    reader.commit().unwrap();

    tx.abort().unwrap();
    assert_eq!(tx.get_status(), TransactionStatus::Aborted);
    flaky.fail_writes.store(false, Ordering::SeqCst);

    assert!(scan_table(&db, flaky_id).is_empty());
    assert_eq!(sorted_keys(&scan_table(&db, good)), vec![1]);

    let fresh = new_database(20);
    let fresh_good = open_table(&fresh, &dir.path().join("good.dat"), 2);
    assert_eq!(sorted_keys(&scan_table(&fresh, fresh_good)), vec![1]);
}
