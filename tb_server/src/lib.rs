//! Tournament bracket HTTP server.

pub mod api;
pub mod config;
pub mod logging;
