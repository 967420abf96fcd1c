//! Ports for the Session Identity subsystem.
//!
//! Outbound dependencies are the shared `KeyValueStore` and `TimeSource`.

pub mod inbound;
