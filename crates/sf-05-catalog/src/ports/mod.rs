//! Ports for the Catalog subsystem.

pub mod inbound;
pub mod outbound;
