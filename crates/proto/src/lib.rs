//! Shared wire types for resourced IPC.
//!
//! This crate defines the protocol messages exchanged between resource
//! clients and the resourced daemon over Unix domain sockets. The protocol
//! uses binary framing with postcard encoding for efficiency.

#![warn(missing_docs)]

pub mod codec;
pub mod paths;
pub mod resources;
pub mod types;

pub use types::*;
