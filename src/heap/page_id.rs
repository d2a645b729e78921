use std::fmt;

pub type TableId = u32;

/// PageId identifies a unique page: the table it belongs to and its
/// position inside the table's file.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId {
    pub table_id: TableId,

    /// page_index represents the position of the page in the table
    /// file, start from 0
    pub page_index: u32,
}

impl PageId {
    pub fn new(table_id: TableId, page_index: u32) -> Self {
        Self {
            table_id,
            page_index,
        }
    }

    pub fn get_table_id(&self) -> TableId {
        self.table_id
    }

    /// Byte offset of the page inside its file.
    pub fn offset(&self, page_size: usize) -> u64 {
        self.page_index as u64 * page_size as u64
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}_{}", self.table_id, self.page_index)
    }
}

impl fmt::Debug for PageId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}
