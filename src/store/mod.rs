//! Storage layer for posted records

mod record_store;

pub use record_store::RecordStore;
