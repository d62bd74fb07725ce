//! API module for Microsoft Graph and Azure Resource Manager

mod client;
pub mod directory;
pub mod management;

pub use client::{ApiClient, build_http_client};
pub use directory::DirectoryApi;
pub use management::ManagementApi;
