//! resourced daemon library: exclusive-ownership arbitration for shared
//! device resources, plus the IPC plumbing that exposes it.

#![warn(missing_docs)]

pub mod core;
pub mod ipc;
pub mod security;
pub mod service;

pub use resourced_proto as proto;
