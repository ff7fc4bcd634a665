pub mod record_store;

pub use record_store::{ActiveSection, RecordStore, home_path};
