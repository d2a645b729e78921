use std::fmt;

use super::{Field, Type};
use crate::{error::DbError, types::DbResult};

/// The layout of a tuple: an ordered list of typed, named fields.
///
/// Two schemas are equal when their field types match one by one, the
/// names are ignored.
#[derive(Debug, Clone)]
pub struct Schema {
    pub fields: Vec<Field>,
}

// Constructors
impl Schema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Build a schema from parallel arrays of types and names. Fields
    /// without a name get `"No.<index>"`.
    pub fn from_types(types: &[Type], names: &[&str]) -> Self {
        let fields = types
            .iter()
            .enumerate()
            .map(|(i, t)| match names.get(i) {
                Some(name) => Field::new(name, *t),
                None => Field::new(&format!("No.{}", i), *t),
            })
            .collect();
        Self { fields }
    }

    /// A schema of `width` int fields named `<prefix>int-column-<i>`.
    pub fn small_int_schema(width: usize, prefix: &str) -> Self {
        let fields = (0..width)
            .map(|i| Field::new(&format!("{}int-column-{}", prefix, i), Type::Int))
            .collect();
        Self { fields }
    }

    /// Concatenate two schemas, `a` first.
    pub fn merge(a: &Schema, b: &Schema) -> Self {
        let mut fields = a.fields.clone();
        fields.extend(b.fields.iter().cloned());
        Self { fields }
    }
}

impl Schema {
    /// get tuple size in bytes
    pub fn get_size(&self) -> usize {
        self.fields.iter().map(|f| f.t.size()).sum()
    }

    pub fn get_fields(&self) -> &Vec<Field> {
        &self.fields
    }

    pub fn fields_count(&self) -> usize {
        self.fields.len()
    }

    pub fn get_field_name(&self, i: usize) -> DbResult<&str> {
        self.fields
            .get(i)
            .map(|f| f.name.as_str())
            .ok_or_else(|| DbError::NoSuchElement(format!("field index {} out of range", i)))
    }

    pub fn get_field_type(&self, i: usize) -> DbResult<Type> {
        self.fields
            .get(i)
            .map(|f| f.t)
            .ok_or_else(|| DbError::NoSuchElement(format!("field index {} out of range", i)))
    }

    /// Index of the first field with the given name.
    pub fn field_index(&self, name: &str) -> DbResult<usize> {
        self.fields
            .iter()
            .position(|f| f.name == name)
            .ok_or_else(|| DbError::NoSuchElement(format!("no field named {}", name)))
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.fields.len() == other.fields.len()
            && self
                .fields
                .iter()
                .zip(other.fields.iter())
                .all(|(a, b)| a.t == b.t)
    }
}

impl Eq for Schema {}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let fields: Vec<String> = self.fields.iter().map(|field| field.to_string()).collect();
        write!(f, "{}", fields.join(", "))
    }
}
