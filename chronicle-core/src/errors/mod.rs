pub mod chronicle_error;
pub mod storage_error;

pub use chronicle_error::{ChronicleError, ChronicleResult};
pub use storage_error::StorageError;
