//! Ports Layer - Trait definitions for external dependencies
//!
//! Interfaces that adapters must implement. Following hexagonal architecture,
//! these traits abstract the price provider so the scheduler and store can be
//! tested without network access.

pub mod price_source;

pub use price_source::PriceSourcePort;

#[cfg(test)]
pub use price_source::MockPriceSourcePort;
