pub mod config;
pub mod dns;
pub mod dnssec;
pub mod error;
pub mod layer;
pub mod logging;

pub use config::ValidatorConfig;
pub use dns::DNSPacket;
pub use dnssec::{Outcome, Validator, YieldReason};
pub use layer::{Layer, LayerState, Pipeline};
