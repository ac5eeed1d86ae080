//! Network Module
//!
//! One TCP connection shared by many callers.
//!
//! ## Architecture
//! - Multiplexer thread: owns the tag table and the write half
//! - Reader thread: owns the read half
//! - Callers talk to the multiplexer through channels only

mod connection;
mod mux;
mod reader;
mod transaction;

pub use connection::Conn;
