//! Connection to the network element.
//!
//! - [`message`]: request and response frames of the `ue_get` exchange
//! - [`session`]: the WebSocket session ([`WsSession`]) and its event stream

pub mod message;
pub mod session;

#[cfg(test)]
pub(crate) mod element;

pub use message::{UeGetRequest, UeGetResponse};
pub use session::{SessionEvent, WsSession};
