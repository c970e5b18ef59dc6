pub mod config;
pub mod error;
pub mod fetch;
pub mod pipeline;
pub mod prep;
pub mod process;
pub mod schema;
pub mod store;

pub use config::PipelineConfig;
pub use error::{PrepError, Result};
