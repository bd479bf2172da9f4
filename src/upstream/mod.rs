//! Upstream NLP services

mod client;

pub use client::{Upstream, UpstreamClient, UpstreamResponse, API_KEY_HEADER};
