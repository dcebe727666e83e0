pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod mail;
pub mod processor;
pub mod store;

pub use error::Error;
