//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the chain engine and the systems it
//! drives. Each port is a trait implemented by an adapter in the
//! infrastructure layer.

mod bridge;
mod clock;

pub use bridge::{BridgeError, LifecycleBridge};
pub use clock::Clock;
