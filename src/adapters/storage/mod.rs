#[cfg(feature = "file-backend")]
pub mod file;
pub mod memory;

#[cfg(feature = "file-backend")]
pub use file::FileStorageNode;
pub use memory::InMemoryStorageNode;
