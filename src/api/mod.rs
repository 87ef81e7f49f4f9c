//! API Module
//!
//! HTTP handlers and routing for the cache gateway REST API.
//!
//! # Endpoints
//! - `PUT /set` - Store a key-value pair
//! - `GET /get/:key` - Retrieve a value by key
//! - `DELETE /del/:key` - Delete a key
//! - `GET /exists/:key` - Check whether a key exists
//! - `POST /expire/:key` - Set a key's TTL
//! - `GET /ttl/:key` - Remaining TTL of a key
//! - `GET /stats` - Get cache statistics
//! - `GET /health` - Store health check

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
