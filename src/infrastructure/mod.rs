pub mod config;
pub mod correlator;
pub mod events;
pub mod network;

pub use config::*;
pub use correlator::Correlator;
pub use events::{Dispatch, ResponseRouter};
pub use network::{ChannelTransport, LoopbackLink, RemoteLink, loopback};
