pub mod config;
pub mod errors;
pub mod execute;
pub mod http_request;
pub mod http_request_executor;
pub mod logger;
pub mod request_store;
pub mod storage;

pub use config::Config;
pub use errors::{GurlzError, Result};
pub use http_request::Request;
pub use request_store::RequestStore;
pub use storage::StorageManager;
