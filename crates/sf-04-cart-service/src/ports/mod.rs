//! Ports for the Cart Consistency Service.
//!
//! Outbound dependencies are the `CartStore` (sf-03) and the shared
//! `CatalogLookup`.

pub mod inbound;
