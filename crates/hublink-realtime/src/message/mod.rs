//! Wire message definitions and JSON framing.

pub mod envelope;
pub mod serializer;

pub use envelope::WireMessage;
