// src/utils/mod.rs
//! Errors, logging setup and debug output shared by the extractor, client and warehouse.
pub mod error;
pub mod html_debug;
pub mod logging;

pub use error::{AppError, EdgarError, ExtractError, ParseCause, StorageError};
