// src/lib.rs

pub mod config;
pub mod error;
pub mod export;
pub mod fetch;
pub mod present;
pub mod process;

pub use error::{PipelineError, Result};
