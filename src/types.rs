use std::sync::{Arc, RwLock};

use crate::error::DbError;

pub type Pod<T> = Arc<RwLock<T>>;
pub type DbResult<T> = Result<T, DbError>;
pub type ResultPod<T> = DbResult<Pod<T>>;
pub type SimpleResult = DbResult<()>;
