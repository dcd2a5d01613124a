pub mod context;
pub mod lag;
pub mod stats;
