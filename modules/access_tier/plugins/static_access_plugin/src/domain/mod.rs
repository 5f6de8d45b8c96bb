//! Domain layer for static access plugin.

pub mod client;
pub mod service;

pub use client::Client;
pub use service::Service;
