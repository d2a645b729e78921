use std::fmt;

use crate::{error::DbError, types::DbResult};

/// Maximum number of bytes a string cell keeps on disk.
pub const STRING_LEN: usize = 128;

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Type {
    Int,
    String,
}

impl Type {
    /// Get the size of the type in bytes.
    pub fn size(&self) -> usize {
        match self {
            Type::Int => 4,
            // 4 bytes of length followed by the (padded) content
            Type::String => 4 + STRING_LEN,
        }
    }

    /// Parse the type name used in catalog files ("int", "string"),
    /// case insensitive.
    pub fn parse(name: &str) -> DbResult<Type> {
        match name.trim().to_lowercase().as_str() {
            "int" => Ok(Type::Int),
            "string" => Ok(Type::String),
            other => Err(DbError::InvalidArgument(format!("unknown type {}", other))),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::String => write!(f, "string"),
        }
    }
}
