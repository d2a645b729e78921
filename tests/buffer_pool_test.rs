mod test_utils;

use heapdb::{utils::HandyRwLock, DbError, DbFile, PageId, Permission, Tuple};
use test_utils::{new_database, open_table, scan_table, setup, write_full_table};

#[test]
fn test_cache_never_exceeds_capacity() {
    let dir = setup();
    let path = write_full_table(&dir.path().join("t.dat"), 2, 6, None);

    let db = new_database(3);
    let table_id = open_table(&db, &path, 2);
    let pool = db.buffer_pool();

    let tx = db.begin();
    for round in 0..2 {
        for page_index in 0..6 {
            let pid = PageId::new(table_id, page_index);
            pool.get_page(tx.get_id(), &pid, Permission::ReadOnly).unwrap();
            assert!(pool.len() <= pool.capacity(), "round {}, page {}", round, page_index);
            assert!(pool.is_cached(&pid));
        }
    }
    assert_eq!(pool.len(), 3);
    tx.commit().unwrap();
}

#[test]
fn test_evicts_first_clean_page() {
    let dir = setup();
    let path = write_full_table(&dir.path().join("t.dat"), 2, 4, None);

    let db = new_database(3);
    let table_id = open_table(&db, &path, 2);
    let pool = db.buffer_pool();
    let pid = |i| PageId::new(table_id, i);

    let tx = db.begin();
    let tid = tx.get_id();
    pool.get_page(tid, &pid(0), Permission::ReadWrite)
        .unwrap()
        .wl()
        .mark_dirty(Some(tid));
    pool.get_page(tid, &pid(1), Permission::ReadOnly).unwrap();
    pool.get_page(tid, &pid(2), Permission::ReadOnly).unwrap();

    // page 0 is the oldest but dirty, page 1 goes
    pool.get_page(tid, &pid(3), Permission::ReadOnly).unwrap();
    assert!(pool.is_cached(&pid(0)));
    assert!(!pool.is_cached(&pid(1)));
    assert!(pool.is_cached(&pid(2)));
    assert!(pool.is_cached(&pid(3)));

    // then page 2
    pool.get_page(tid, &pid(1), Permission::ReadOnly).unwrap();
    assert!(pool.is_cached(&pid(0)));
    assert!(!pool.is_cached(&pid(2)));
    assert_eq!(pool.len(), 3);

    tx.abort().unwrap();
}

#[test]
fn test_all_dirty_pool_refuses_new_pages() {
    let dir = setup();
    let path = write_full_table(&dir.path().join("t.dat"), 2, 3, None);

    let db = new_database(2);
    let table_id = open_table(&db, &path, 2);
    let pool = db.buffer_pool();

    let tx = db.begin();
    let tid = tx.get_id();
    for i in 0..2 {
        let page = pool
            .get_page(tid, &PageId::new(table_id, i), Permission::ReadWrite)
            .unwrap();
        page.wl().mark_dirty(Some(tid));
    }

    let result = pool.get_page(tid, &PageId::new(table_id, 2), Permission::ReadOnly);
    assert!(matches!(result, Err(DbError::Database(_))));
    assert_eq!(pool.len(), 2);

    // inserting needs a new page as well, since all pages are full
    let result = pool.insert_tuple(tid, table_id, Tuple::new_int_tuples(1, 2));
    assert!(matches!(result, Err(DbError::Database(_))));
    assert!(pool.len() <= 2);

    tx.abort().unwrap();

    // after the abort the pages are clean again
    let tx = db.begin();
    pool.get_page(tx.get_id(), &PageId::new(table_id, 2), Permission::ReadOnly)
        .unwrap();
    tx.commit().unwrap();
}

#[test]
fn test_flush_and_discard() {
    let dir = setup();
    let path = write_full_table(&dir.path().join("t.dat"), 2, 1, None);

    let db = new_database(10);
    let table_id = open_table(&db, &path, 2);
    let pool = db.buffer_pool();
    let pid = PageId::new(table_id, 0);

    let tx = db.begin();
    let tid = tx.get_id();
    let victim = scan_table(&db, table_id).remove(0);

    pool.delete_tuple(tid, &victim).unwrap();
    let page = pool.get_page(tid, &pid, Permission::ReadWrite).unwrap();
    assert_eq!(page.rl().is_dirty(), Some(tid));

    // discarding drops the change
    pool.discard_page(&pid);
    assert!(!pool.is_cached(&pid));
    let file = db.catalog().get_db_file(table_id).unwrap();
    let slots = file.read_page(&pid).unwrap().tuples_count();

    // flushing writes it
    pool.delete_tuple(tid, &victim).unwrap();
    pool.flush_pages(tid).unwrap();
    let page = pool.get_page(tid, &pid, Permission::ReadWrite).unwrap();
    assert_eq!(page.rl().is_dirty(), None);
    assert_eq!(file.read_page(&pid).unwrap().tuples_count(), slots - 1);

    tx.commit().unwrap();
}

#[test]
fn test_flush_all_pages() {
    let dir = setup();
    let path = write_full_table(&dir.path().join("t.dat"), 2, 2, None);

    let db = new_database(10);
    let table_id = open_table(&db, &path, 2);
    let pool = db.buffer_pool();
    let tuples = scan_table(&db, table_id);
    let total = tuples.len();

    let tx = db.begin();
    for t in tuples.iter().take(3) {
        pool.delete_tuple(tx.get_id(), t).unwrap();
    }
    pool.flush_all_pages().unwrap();

    // the change is on disk, even though the transaction never committed
    let other = new_database(10);
    let other_table = open_table(&other, &path, 2);
    assert_eq!(scan_table(&other, other_table).len(), total - 3);

    tx.commit().unwrap();
}
