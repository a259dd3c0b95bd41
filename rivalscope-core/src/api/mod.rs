//! HTTP client for the competitor-intelligence backend.

pub mod client;

pub use client::ApiClient;
