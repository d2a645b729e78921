use std::fmt;

use super::Type;

#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub t: Type,
}

impl Field {
    pub fn new(field_name: &str, field_type: Type) -> Field {
        Field {
            name: field_name.to_string(),
            t: field_type,
        }
    }

    pub fn get_type(&self) -> Type {
        self.t
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}({})", self.name, self.t)
    }
}
