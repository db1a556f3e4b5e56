// Message module — addresses, envelopes and their wire form

pub mod address;
pub mod codec;
pub mod types;

pub use address::{Address, AddressError, Ancestors, IntoAddress};
pub use codec::{decode_message, CodecError, WireMessage};
pub use types::Message;
