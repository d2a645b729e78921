use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use heapdb::{
    transaction::LockWait, utils, Database, DbFile, HeapFile, HeapPage, PageId, Schema, TableId,
    Tuple,
};
use rand::prelude::*;
use tempfile::TempDir;

/// # Conduct the initialization
///
/// - Setting up log configurations.
/// - Create a scratch directory for the data files, removed on drop.
pub fn setup() -> TempDir {
    utils::init_log();
    tempfile::tempdir().unwrap()
}

/// A lock wait policy short enough to keep timeout tests fast: 5 x 20ms.
pub fn short_wait() -> LockWait {
    LockWait::new(5, Duration::from_millis(20))
}

pub fn new_database(pages: usize) -> Database {
    Database::with_lock_wait(pages, short_wait())
}

/// Register the heap file at `path` (created when missing) in the
/// catalog of `db`.
pub fn open_table(db: &Database, path: &Path, columns: usize) -> TableId {
    open_table_with_schema(db, path, &Schema::small_int_schema(columns, ""))
}

pub fn open_table_with_schema(db: &Database, path: &Path, schema: &Schema) -> TableId {
    let file = HeapFile::open(path, schema).unwrap();
    let table_id = file.get_id();
    db.catalog()
        .add_table(Arc::new(file), &format!("table_{}", table_id), "");
    table_id
}

pub fn new_empty_table(db: &Database, dir: &TempDir, name: &str, columns: usize) -> TableId {
    new_table_with_schema(db, dir, name, &Schema::small_int_schema(columns, ""))
}

pub fn new_table_with_schema(db: &Database, dir: &TempDir, name: &str, schema: &Schema) -> TableId {
    let path = dir.path().join(format!("{}.dat", name));
    let file = HeapFile::create(&path, schema).unwrap();
    let table_id = file.get_id();
    db.catalog().add_table(Arc::new(file), name, "");
    table_id
}

/// Write `pages` full pages of random int tuples straight to a new heap
/// file, bypassing the buffer pool.
///
/// # Arguments:
///
/// - int_tuples: This is a reference used to return all inserted
///   data. Only works when it's not None.
pub fn write_full_table(
    path: &Path,
    columns: usize,
    pages: usize,
    int_tuples: Option<&mut Vec<Vec<i32>>>,
) -> PathBuf {
    let schema = Schema::small_int_schema(columns, "");
    let file = HeapFile::create(path, &schema).unwrap();
    let slots = HeapPage::calculate_slots_count(&schema);

    let mut rng = rand::thread_rng();
    let mut rows = Vec::new();
    for page_index in 0..pages {
        let pid = PageId::new(file.get_id(), page_index as u32);
        let mut page = HeapPage::new(&pid, &HeapPage::empty_page_data(), file.get_schema()).unwrap();
        for _ in 0..slots {
            let row: Vec<i32> = (0..columns).map(|_| rng.gen_range(i32::MIN, i32::MAX)).collect();
            let mut tuple = Tuple::from_ints(&row);
            page.insert_tuple(&mut tuple).unwrap();
            rows.push(row);
        }
        file.write_page(&page).unwrap();
    }

    if let Some(int_tuples) = int_tuples {
        int_tuples.extend(rows);
    }
    path.to_path_buf()
}
