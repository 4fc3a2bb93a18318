mod policy;
mod resolver;
mod schema;
mod store;

pub use policy::{ConflictPolicy, TableWrite, WarehouseRow};
pub use resolver::resolve_song;
pub use schema::WAREHOUSE_SCHEMA;
pub use store::{FileLoad, TableCounts, Warehouse};
