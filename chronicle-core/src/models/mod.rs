pub mod entity;
pub mod relationship;
pub mod temporal_query;

pub use entity::{Entity, NewEntity};
pub use relationship::Relationship;
pub use temporal_query::{
    AsOf, Direction, EntityContext, LagEntry, LagStats, StoreStats, TxWindow,
};
