//! HTTP API layer for clipstream.
//!
//! This crate provides the REST API and real-time streaming:
//!
//! - **Endpoints**: comments, reactions, notifications, subscriptions, videos
//! - **Extractors**: authenticated-user extraction from request extensions
//! - **Middleware**: bearer-token authentication
//! - **Streaming**: the room-keyed WebSocket channel registry
//!
//! Built on Axum 0.8 with Tower middleware stack.

// Allow dead_code for API compatibility fields in request structs
#![allow(dead_code)]

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;
pub mod streaming;

pub use endpoints::router;
pub use streaming::{ChannelRegistry, streaming_handler};
