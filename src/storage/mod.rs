//! Append-blob access over the Blob service REST interface

mod account;
mod blob;
mod shared_key;

pub use account::StorageAccount;
pub use blob::BlobClient;
