use std::{
    collections::HashMap,
    fs,
    path::Path,
    sync::{Arc, RwLock},
};

use log::info;

use crate::{
    error::DbError,
    heap::{DbFile, HeapFile, TableId},
    storage::{Field, Schema, Type},
    types::DbResult,
    utils::HandyRwLock,
};

struct TableEntry {
    file: Arc<dyn DbFile>,
    name: String,
    primary_key: String,
}

/// The Catalog keeps track of all available tables in the database and
/// their associated schemas.
pub struct Catalog {
    tables: RwLock<HashMap<TableId, TableEntry>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
        }
    }

    /// Add a new table to the catalog.
    ///
    /// A table already registered under the same name (or with the same
    /// id) is replaced.
    ///
    /// `primary_key` is the name of the primary key field, empty when the
    /// table has none.
    pub fn add_table(&self, file: Arc<dyn DbFile>, name: &str, primary_key: &str) {
        let table_id = file.get_id();

        let mut tables = self.tables.wl();
        tables.retain(|_, entry| entry.name != name);
        tables.insert(
            table_id,
            TableEntry {
                file,
                name: name.to_string(),
                primary_key: primary_key.to_string(),
            },
        );
    }

    pub fn get_table_id(&self, name: &str) -> DbResult<TableId> {
        self.tables
            .rl()
            .iter()
            .find(|(_, entry)| entry.name == name)
            .map(|(id, _)| *id)
            .ok_or_else(|| DbError::NoSuchElement(format!("table {} does not exist", name)))
    }

    pub fn get_db_file(&self, table_id: TableId) -> DbResult<Arc<dyn DbFile>> {
        self.with_entry(table_id, |entry| entry.file.clone())
    }

    pub fn get_schema(&self, table_id: TableId) -> DbResult<Arc<Schema>> {
        self.with_entry(table_id, |entry| entry.file.get_schema().clone())
    }

    pub fn get_primary_key(&self, table_id: TableId) -> DbResult<String> {
        self.with_entry(table_id, |entry| entry.primary_key.clone())
    }

    pub fn get_table_name(&self, table_id: TableId) -> DbResult<String> {
        self.with_entry(table_id, |entry| entry.name.clone())
    }

    pub fn table_ids(&self) -> Vec<TableId> {
        self.tables.rl().keys().copied().collect()
    }

    /// Delete all tables from the catalog.
    pub fn clear(&self) {
        self.tables.wl().clear();
    }

    fn with_entry<T>(&self, table_id: TableId, f: impl FnOnce(&TableEntry) -> T) -> DbResult<T> {
        self.tables
            .rl()
            .get(&table_id)
            .map(f)
            .ok_or_else(|| DbError::NoSuchElement(format!("table {} does not exist", table_id)))
    }

    /// Read the schema from a file and create the appropriate tables in
    /// the database.
    ///
    /// Each non-blank line describes one table:
    ///
    /// ```text
    /// name (field type [pk], field type [pk], ...)
    /// ```
    ///
    /// The data of table `name` lives in `name.dat`, next to the catalog
    /// file. Returns the ids of the loaded tables, in file order.
    pub fn load_schema<P: AsRef<Path>>(&self, catalog_file: P) -> DbResult<Vec<TableId>> {
        let catalog_file = fs::canonicalize(catalog_file.as_ref())?;
        let base_folder = catalog_file
            .parent()
            .ok_or_else(|| DbError::invalid("catalog file has no parent directory"))?;

        let content = fs::read_to_string(&catalog_file)?;

        let mut table_ids = Vec::new();
        for line in content.lines().filter(|l| !l.trim().is_empty()) {
            let (name, schema, primary_key) = parse_table_line(line)?;

            let file = HeapFile::open(base_folder.join(format!("{}.dat", name)), &schema)?;
            let table_id = file.get_id();
            self.add_table(Arc::new(file), &name, &primary_key);
            info!("added table: {} with schema {}", name, schema);
            table_ids.push(table_id);
        }
        Ok(table_ids)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse `name (field type [pk], ...)` into the table name, its schema
/// and its primary key field (empty when absent).
fn parse_table_line(line: &str) -> DbResult<(String, Schema, String)> {
    let invalid = || DbError::InvalidArgument(format!("invalid catalog entry: {}", line));

    let open = line.find('(').ok_or_else(invalid)?;
    let close = line.rfind(')').ok_or_else(invalid)?;
    if close < open {
        return Err(invalid());
    }

    let name = line[..open].trim();
    if name.is_empty() {
        return Err(invalid());
    }

    let mut fields = Vec::new();
    let mut primary_key = String::new();
    for column in line[open + 1..close].split(',') {
        let parts: Vec<&str> = column.split_whitespace().collect();
        match parts.as_slice() {
            [field_name, t] => {
                fields.push(Field::new(field_name, Type::parse(t)?));
            }
            [field_name, t, annotation] => {
                fields.push(Field::new(field_name, Type::parse(t)?));
                if *annotation != "pk" {
                    return Err(DbError::InvalidArgument(format!(
                        "unknown annotation {} in catalog entry: {}",
                        annotation, line
                    )));
                }
                primary_key = field_name.to_string();
            }
            _ => return Err(invalid()),
        }
    }

    Ok((name.to_string(), Schema::new(fields), primary_key))
}
