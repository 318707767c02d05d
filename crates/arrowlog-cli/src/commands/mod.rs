pub mod common;
pub mod completions;
pub mod config;
pub mod create;
pub mod delete;
pub mod edit;
pub mod export;
pub mod list;
pub mod show;
pub mod stats;
pub mod sync;
