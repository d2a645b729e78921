mod cell;
#[allow(clippy::module_inception)]
mod tuple;

pub use cell::Cell;
pub use tuple::{RecordId, Tuple};
