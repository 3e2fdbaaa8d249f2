pub mod acquirer;
pub mod in_memory;
pub mod redirect;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
