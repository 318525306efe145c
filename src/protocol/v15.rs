//! IPMI v1.5 session header and frame.

use crate::codec::{
    pack_bytes, pack_u8, pack_u32_le, unpack_array, unpack_bytes, unpack_u8, unpack_u32_le,
};
use crate::error::{Error, Result};
use crate::types::AuthType;

/// Header length when the auth type is None.
pub const SESSION_HEADER15_SIZE_MIN: usize = 10;
/// Header length when an auth code is present.
pub const SESSION_HEADER15_SIZE_MAX: usize = 26;
/// Length of the v1.5 auth code field.
pub const AUTH_CODE15_LEN: usize = 16;

/// Authentication part of a v1.5 session header.
///
/// The 16-byte auth code field exists on the wire iff the auth type is not None,
/// so the two are carried together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAuth15 {
    /// Auth type None, no auth code field.
    None,
    /// Any other auth type, followed by its auth code.
    ///
    /// Build with [`SessionAuth15::with_code`]; `auth_type` must not be [`AuthType::None`].
    Code {
        /// Negotiated auth type.
        auth_type: AuthType,
        /// Auth code bytes.
        code: [u8; AUTH_CODE15_LEN],
    },
}

impl SessionAuth15 {
    /// Pair an auth type with its code.
    pub fn with_code(auth_type: AuthType, code: [u8; AUTH_CODE15_LEN]) -> Result<Self> {
        if auth_type == AuthType::None {
            return Err(Error::InvalidArgument("auth type None cannot carry an auth code"));
        }
        Ok(Self::Code { auth_type, code })
    }

    /// Auth type written to byte 0.
    pub fn auth_type(&self) -> AuthType {
        match self {
            Self::None => AuthType::None,
            Self::Code { auth_type, .. } => *auth_type,
        }
    }

    /// Auth code, if present.
    pub fn auth_code(&self) -> Option<&[u8; AUTH_CODE15_LEN]> {
        match self {
            Self::None => None,
            Self::Code { code, .. } => Some(code),
        }
    }
}

/// IPMI v1.5 session header.
///
/// `0:AuthType(1) 1:Sequence(4) 5:SessionID(4) [9:AuthCode(16)] last:PayloadLength(1)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionHeader15 {
    /// Auth type and optional auth code.
    pub auth: SessionAuth15,
    /// Session sequence number (0 outside a session).
    pub sequence: u32,
    /// Session ID (0 outside a session).
    pub session_id: u32,
    /// Payload length in bytes.
    pub payload_length: u8,
}

impl SessionHeader15 {
    /// Packed length: 10, or 26 with an auth code.
    pub fn len(&self) -> usize {
        match self.auth {
            SessionAuth15::None => SESSION_HEADER15_SIZE_MIN,
            SessionAuth15::Code { .. } => SESSION_HEADER15_SIZE_MAX,
        }
    }

    /// Always false; a header is never empty.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Write the header at the start of `buf`, returning the bytes written.
    pub fn pack_into(&self, buf: &mut [u8]) -> Result<usize> {
        let off = pack_u8(self.auth.auth_type().as_u8(), buf, 0)?;
        let off = pack_u32_le(self.sequence, buf, off)?;
        let mut off = pack_u32_le(self.session_id, buf, off)?;
        if let Some(code) = self.auth.auth_code() {
            off = pack_bytes(code, buf, off)?;
        }
        pack_u8(self.payload_length, buf, off)
    }

    /// Serialize the header.
    pub fn pack(&self) -> Result<Vec<u8>> {
        let mut out = vec![0u8; self.len()];
        self.pack_into(&mut out)?;
        Ok(out)
    }

    /// Parse a header from the start of `msg`.
    pub fn unpack(msg: &[u8]) -> Result<Self> {
        if msg.len() < SESSION_HEADER15_SIZE_MIN {
            return Err(Error::BufferTooShort {
                offset: 0,
                needed: SESSION_HEADER15_SIZE_MIN,
                available: msg.len(),
            });
        }

        let (b, off) = unpack_u8(msg, 0)?;
        let auth_type =
            AuthType::from_u8(b).ok_or(Error::Protocol("unsupported session auth type"))?;
        let (sequence, off) = unpack_u32_le(msg, off)?;
        let (session_id, off) = unpack_u32_le(msg, off)?;

        let (auth, off) = if auth_type == AuthType::None {
            (SessionAuth15::None, off)
        } else {
            if msg.len() < SESSION_HEADER15_SIZE_MAX {
                return Err(Error::BufferTooShort {
                    offset: 0,
                    needed: SESSION_HEADER15_SIZE_MAX,
                    available: msg.len(),
                });
            }
            let (code, off) = unpack_array::<AUTH_CODE15_LEN>(msg, off)?;
            (SessionAuth15::Code { auth_type, code }, off)
        };

        let (payload_length, _) = unpack_u8(msg, off)?;
        Ok(Self {
            auth,
            sequence,
            session_id,
            payload_length,
        })
    }
}

/// A complete IPMI v1.5 session frame: header followed by the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session15 {
    /// Session header.
    pub header: SessionHeader15,
    /// Raw payload bytes.
    pub payload: Vec<u8>,
}

impl Session15 {
    /// Build a frame, deriving the header's payload length from `payload`.
    pub fn new(
        auth: SessionAuth15,
        sequence: u32,
        session_id: u32,
        payload: Vec<u8>,
    ) -> Result<Self> {
        let payload_length: u8 = payload
            .len()
            .try_into()
            .map_err(|_| Error::InvalidArgument("payload too large for an IPMI v1.5 session"))?;
        Ok(Self {
            header: SessionHeader15 {
                auth,
                sequence,
                session_id,
                payload_length,
            },
            payload,
        })
    }

    /// Serialize header and payload.
    pub fn pack(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.header.len() + self.payload.len());
        out.extend_from_slice(&self.header.pack()?);
        out.extend_from_slice(&self.payload);
        Ok(out)
    }

    /// Parse a frame. Bytes past the declared payload length are ignored.
    pub fn unpack(msg: &[u8]) -> Result<Self> {
        let header = SessionHeader15::unpack(msg).map_err(Error::header)?;
        let (payload, _) = unpack_bytes(msg, header.len(), header.payload_length as usize)?;
        Ok(Self {
            header,
            payload: payload.to_vec(),
        })
    }
}
