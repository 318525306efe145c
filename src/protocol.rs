//! Session-layer wire formats.
//!
//! IPMI v1.5 frames are `header || payload`; RMCP+ (v2.0) frames are
//! `header || payload [|| trailer]`. The RMCP header below the session layer is
//! not handled here.

pub mod trailer;
pub mod v15;
pub mod v20;

pub use trailer::{SessionTrailer, integrity_pad_len};
pub use v15::{Session15, SessionAuth15, SessionHeader15};
pub use v20::{Session20, SessionHeader20};
