//! Polls the quote service once and writes the rendered bid to a file.

pub mod config;
pub mod error;
pub mod models;
pub mod poller;

pub use poller::{render, Poller};
