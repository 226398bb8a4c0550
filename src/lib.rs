pub mod cli;
pub mod config;
pub mod error;
pub mod feed;
pub mod render;
pub mod search;
pub mod security;
pub mod server;
pub mod storage;

pub use config::Config;
pub use error::{Error, Result};
pub use search::{SearchHandler, SearchOutcome, SearchRequest, SearchView};
