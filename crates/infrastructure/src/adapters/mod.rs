//! Adapters implementing the application ports.

mod reqwest_bridge;
mod system_clock;

pub use reqwest_bridge::ReqwestBridge;
pub use system_clock::SystemClock;
