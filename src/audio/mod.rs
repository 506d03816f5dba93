//! Inbound audio handling: frame decoding and energy estimation.

pub mod energy;
pub mod frame;

pub use energy::mean_amplitude;
pub use frame::decode_frame;
