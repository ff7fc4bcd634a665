pub mod config;
pub mod error;
pub mod host;
pub mod model;
pub mod process_api;
pub mod reconcile;
pub mod storage;
