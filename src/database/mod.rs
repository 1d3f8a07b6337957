pub mod connection;
#[cfg(test)]
pub mod memory;
pub mod postgres;
pub mod store;

pub use connection::*;
#[cfg(test)]
pub use memory::{FaultPoint, MemoryStore};
pub use postgres::SeaOrmStore;
pub use store::*;
