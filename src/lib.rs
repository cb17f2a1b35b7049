pub mod aggregate;
pub mod assess;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod render;
pub mod report;
pub mod request;
pub mod status;
pub mod store;
pub mod util;

pub use error::{QcError, QcResult};
