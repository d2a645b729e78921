mod db_file;
mod file;
mod page;
mod page_id;

pub use db_file::{DbFile, DbFileIterator};
pub use file::{HeapFile, HeapFileIterator};
pub use page::HeapPage;
pub use page_id::{PageId, TableId};
