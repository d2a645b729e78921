mod field;
#[allow(clippy::module_inception)]
mod schema;
mod types;

pub use field::Field;
pub use schema::Schema;
pub use types::{Type, STRING_LEN};
