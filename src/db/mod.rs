pub mod gateway;

pub use gateway::{IntoIndexes, StoreError, StoreGateway};
