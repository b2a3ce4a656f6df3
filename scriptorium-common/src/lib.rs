//! Domain model for the scriptorium blog API.
//!
//! Records mirror what the database stores, projections are what API
//! consumers see. Nothing in here performs I/O.

pub mod media;
pub mod model;
pub mod projection;
