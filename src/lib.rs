#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Session-layer engine for IPMI clients.
//!
//! The crate frames raw IPMI payloads for IPMI v1.5 and IPMI v2.0 (RMCP+)
//! sessions and unframes received session frames:
//! - v1.5 session headers (with and without auth code)
//! - RMCP+ session headers, including OEM explicit payloads
//! - RMCP+ session trailers (integrity pad + auth code)
//! - the Open Session / RAKP handshake state that decides how frames are protected
//!
//! It does not open sockets, run the RAKP key exchange, or interpret IPMI
//! commands. Integrity, confidentiality and v1.5 auth codes are pluggable
//! (see [`crypto`]); HMAC-SHA1-96, AES-CBC-128, MD5 and straight password are
//! provided.

mod client;
mod codec;
pub mod crypto;
mod debug;
mod error;
mod observe;
pub mod protocol;
mod session;
mod types;

pub use crate::client::{Client, ClientBuilder, InboundPayload};
pub use crate::error::{Error, Result};
pub use crate::protocol::{
    Session15, Session20, SessionAuth15, SessionHeader15, SessionHeader20, SessionTrailer,
};
pub use crate::session::{SessionContext, SessionState};
pub use crate::types::{AuthType, IpmiVersion, PayloadCode, PayloadType};
