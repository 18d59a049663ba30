pub mod bundle;
pub mod config;
pub mod docs_metadata;
pub mod listing;
pub mod logging;
