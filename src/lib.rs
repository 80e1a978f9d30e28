// gemextract - schema-driven document extraction with implicit cache cost accounting
// Author: kelexine (https://github.com/kelexine)

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod extraction;
pub mod metrics;
pub mod models;
pub mod pricing;
pub mod server;
pub mod utils;
