pub mod adapters;
pub mod core;
pub mod s3_event;
