//! Browser-driven remote for two hardware PWM duty-cycle outputs.
//!
//! A fixed control page is served over plain HTTP on one port. A WebSocket
//! endpoint on a second port upgrades connections by hand, decodes masked
//! client frames, and turns their JSON payloads into validated duty-cycle
//! writes. Both outputs are forced back to zero whenever the controlling
//! session ends, for any reason.

pub mod error;
pub mod http;
pub mod pwm;
pub mod server;
pub mod ws;

pub use error::SessionError;
