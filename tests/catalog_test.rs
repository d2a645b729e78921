mod test_utils;

use std::{fs, sync::Arc};

use heapdb::{Database, DbError, DbFile, HeapFile, Schema, Tuple, Type};
use test_utils::{new_database, scan_table, setup};

#[test]
fn test_load_schema() {
    let dir = setup();
    let catalog_file = dir.path().join("catalog.txt");
    fs::write(
        &catalog_file,
        "users (id int pk, name string, age INT)\n\nscores (user_id int, score int)\n",
    )
    .unwrap();

    let db = new_database(20);
    let ids = db.load_schema(&catalog_file).unwrap();
    assert_eq!(ids.len(), 2);

    let catalog = db.catalog();
    let users = catalog.get_table_id("users").unwrap();
    let scores = catalog.get_table_id("scores").unwrap();
    assert_eq!(ids, vec![users, scores]);

    assert_eq!(catalog.get_table_name(users).unwrap(), "users");
    assert_eq!(catalog.get_primary_key(users).unwrap(), "id");
    assert_eq!(catalog.get_primary_key(scores).unwrap(), "");

    let schema = catalog.get_schema(users).unwrap();
    assert_eq!(
        *schema,
        Schema::from_types(&[Type::Int, Type::String, Type::Int], &[])
    );
    assert_eq!(schema.get_field_name(1).unwrap(), "name");

    // the data files live next to the catalog
    assert!(dir.path().join("users.dat").exists());
    assert!(dir.path().join("scores.dat").exists());

    let mut table_ids = catalog.table_ids();
    table_ids.sort_unstable();
    let mut expected = vec![users, scores];
    expected.sort_unstable();
    assert_eq!(table_ids, expected);
}

#[test]
fn test_load_schema_keeps_data() {
    let dir = setup();
    let catalog_file = dir.path().join("catalog.txt");
    fs::write(&catalog_file, "pairs (a int, b int)\n").unwrap();

    {
        let db = new_database(20);
        db.load_schema(&catalog_file).unwrap();
        let table_id = db.catalog().get_table_id("pairs").unwrap();
        test_utils::insert_tuples(&db, table_id, vec![Tuple::from_ints(&[1, 2])]);
    }

    let db = new_database(20);
    db.load_schema(&catalog_file).unwrap();
    let table_id = db.catalog().get_table_id("pairs").unwrap();
    assert_eq!(scan_table(&db, table_id), vec![Tuple::from_ints(&[1, 2])]);
}

#[test]
fn test_load_invalid_schema() {
    let dir = setup();
    let db = Database::default();

    for content in ["t (a float)", "t (a int key)", "t a int", "t (a)"].iter() {
        let catalog_file = dir.path().join("catalog.txt");
        fs::write(&catalog_file, content).unwrap();
        let result = db.load_schema(&catalog_file);
        assert!(
            matches!(result, Err(DbError::InvalidArgument(_))),
            "content: {}",
            content
        );
    }

    assert!(db.load_schema(dir.path().join("missing.txt")).is_err());
}

#[test]
fn test_name_conflict_replaces_table() {
    let dir = setup();
    let db = new_database(20);
    let schema = Schema::small_int_schema(2, "");

    let first = Arc::new(HeapFile::create(dir.path().join("a.dat"), &schema).unwrap());
    let second = Arc::new(HeapFile::create(dir.path().join("b.dat"), &schema).unwrap());
    db.catalog().add_table(first.clone(), "t", "");
    db.catalog().add_table(second.clone(), "t", "int-column-0");

    assert_eq!(db.catalog().get_table_id("t").unwrap(), second.get_id());
    assert!(matches!(
        db.catalog().get_db_file(first.get_id()),
        Err(DbError::NoSuchElement(_))
    ));
    assert_eq!(db.catalog().table_ids(), vec![second.get_id()]);

    db.catalog().clear();
    assert!(matches!(
        db.catalog().get_table_id("t"),
        Err(DbError::NoSuchElement(_))
    ));
    assert!(db.catalog().get_schema(second.get_id()).is_err());
}
