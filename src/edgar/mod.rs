// src/edgar/mod.rs
pub mod client;
pub mod models;

pub use client::{EdgarClient, EdgarConfig, RetryPolicy};
pub use models::{CompanyTicker, FilingRef};
