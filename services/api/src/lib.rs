//! Math Buddy API Library Crate
//!
//! This library contains the web service around the companion pipeline:
//! configuration, application state, handlers, and routing. The `api`
//! binary is a thin wrapper around this library.

pub mod config;
pub mod handlers;
pub mod models;
pub mod router;
pub mod state;
