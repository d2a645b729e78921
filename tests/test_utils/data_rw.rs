use heapdb::{
    operator::{Operator, SeqScan},
    Database, TableId, Transaction, Tuple,
};

pub fn insert_tuples(db: &Database, table_id: TableId, tuples: Vec<Tuple>) {
    let tx = db.begin();
    for tuple in tuples {
        db.buffer_pool()
            .insert_tuple(tx.get_id(), table_id, tuple)
            .unwrap();
    }
    tx.commit().unwrap();
}

/// Insert `count` tuples with increasing values `0..count`, every cell
/// of a tuple holding the same value.
pub fn insert_int_tuples(db: &Database, table_id: TableId, count: usize, columns: usize) {
    let tuples = (0..count)
        .map(|v| Tuple::new_int_tuples(v as i32, columns))
        .collect();
    insert_tuples(db, table_id, tuples);
}

pub fn scan_with(db: &Database, tx: &Transaction, table_id: TableId) -> Vec<Tuple> {
    let mut scan = SeqScan::new(db.buffer_pool(), tx.get_id(), table_id, "t").unwrap();
    scan.open().unwrap();
    let tuples = scan.collect_tuples().unwrap();
    scan.close();
    tuples
}

/// Read the whole table in a transaction of its own.
pub fn scan_table(db: &Database, table_id: TableId) -> Vec<Tuple> {
    let tx = db.begin();
    let tuples = scan_with(db, &tx, table_id);
    tx.commit().unwrap();
    tuples
}

/// First cell of every tuple, sorted.
pub fn sorted_keys(tuples: &[Tuple]) -> Vec<i32> {
    let mut keys: Vec<i32> = tuples
        .iter()
        .map(|t| t.get_cell(0).get_int().unwrap())
        .collect();
    keys.sort_unstable();
    keys
}
