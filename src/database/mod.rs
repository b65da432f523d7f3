// 数据库模块
// 类型化实体、存储契约和具体后端实现

pub mod entities;
pub mod postgres;
pub mod store;

#[cfg(test)]
pub mod memory;

pub use postgres::PgRideStore;
pub use store::{RideStore, RideTx, StoreError};
