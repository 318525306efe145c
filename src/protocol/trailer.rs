//! RMCP+ session trailer.

use crate::codec::{pack_bytes, pack_u8, unpack_bytes, unpack_bytes_most, unpack_u8};
use crate::error::{Error, Result};

/// Next Header value for RMCP+ frames.
pub const NEXT_HEADER: u8 = 0x07;
/// Value of every integrity pad byte.
pub const INTEGRITY_PAD_BYTE: u8 = 0xFF;
/// Longest auth code any integrity algorithm produces.
pub const MAX_AUTH_CODE_LEN: usize = 16;

/// Pad size that brings `covered_len` (header + payload) to a multiple of 4.
pub fn integrity_pad_len(covered_len: usize) -> usize {
    (4 - covered_len % 4) % 4
}

/// RMCP+ session trailer.
///
/// `IntegrityPad(0-3, FFh) PadLength(1) NextHeader(1)=07h AuthCode(<=16)`
///
/// Present only on authenticated frames with a non-zero session ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTrailer {
    integrity_pad: Vec<u8>,
    pad_length: u8,
    next_header: u8,
    auth_code: Vec<u8>,
}

impl SessionTrailer {
    /// Trailer with `pad_len` FFh pad bytes and the given auth code.
    pub fn new(pad_len: usize, auth_code: Vec<u8>) -> Result<Self> {
        if pad_len > 3 {
            return Err(Error::InvalidArgument("integrity pad longer than 3 bytes"));
        }
        if auth_code.len() > MAX_AUTH_CODE_LEN {
            return Err(Error::InvalidArgument("auth code longer than 16 bytes"));
        }
        Ok(Self {
            integrity_pad: vec![INTEGRITY_PAD_BYTE; pad_len],
            pad_length: pad_len as u8,
            next_header: NEXT_HEADER,
            auth_code,
        })
    }

    /// Trailer padded for a frame with the given packed header and payload.
    pub fn for_frame(header: &[u8], payload: &[u8], auth_code: Vec<u8>) -> Result<Self> {
        Self::new(integrity_pad_len(header.len() + payload.len()), auth_code)
    }

    /// Integrity pad bytes as carried on the wire.
    pub fn integrity_pad(&self) -> &[u8] {
        &self.integrity_pad
    }

    /// Pad Length field.
    pub fn pad_length(&self) -> u8 {
        self.pad_length
    }

    /// Next Header field.
    pub fn next_header(&self) -> u8 {
        self.next_header
    }

    /// Integrity auth code.
    pub fn auth_code(&self) -> &[u8] {
        &self.auth_code
    }

    /// Replace the auth code, keeping the pad.
    pub fn set_auth_code(&mut self, auth_code: Vec<u8>) -> Result<()> {
        if auth_code.len() > MAX_AUTH_CODE_LEN {
            return Err(Error::InvalidArgument("auth code longer than 16 bytes"));
        }
        self.auth_code = auth_code;
        Ok(())
    }

    /// Packed length.
    pub fn len(&self) -> usize {
        self.integrity_pad.len() + 2 + self.auth_code.len()
    }

    /// Always false; pad length and next header are always present.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Serialize the trailer.
    pub fn pack(&self) -> Result<Vec<u8>> {
        let mut out = vec![0u8; self.len()];
        let off = pack_bytes(&self.integrity_pad, &mut out, 0)?;
        let off = pack_u8(self.pad_length, &mut out, off)?;
        let off = pack_u8(self.next_header, &mut out, off)?;
        pack_bytes(&self.auth_code, &mut out, off)?;
        Ok(out)
    }

    /// Bytes the integrity auth code covers: header, payload, pad, pad length and next header.
    pub fn integrity_data(&self, header: &[u8], payload: &[u8]) -> Vec<u8> {
        let mut data =
            Vec::with_capacity(header.len() + payload.len() + self.integrity_pad.len() + 2);
        data.extend_from_slice(header);
        data.extend_from_slice(payload);
        data.extend_from_slice(&self.integrity_pad);
        data.push(self.pad_length);
        data.push(self.next_header);
        data
    }

    /// Parse a trailer starting at `off` whose pad size the caller computed.
    ///
    /// Pad, pad length and next header are strict reads; the auth code takes
    /// whatever remains, up to 16 bytes, since its length depends on the
    /// negotiated integrity algorithm. Returns the trailer and the next offset.
    pub fn unpack(msg: &[u8], off: usize, pad_size: usize) -> Result<(Self, usize)> {
        let (integrity_pad, off) = unpack_bytes(msg, off, pad_size)?;
        let (pad_length, off) = unpack_u8(msg, off)?;
        let (next_header, off) = unpack_u8(msg, off)?;
        let (auth_code, off) = unpack_bytes_most(msg, off, MAX_AUTH_CODE_LEN);
        Ok((
            Self {
                integrity_pad: integrity_pad.to_vec(),
                pad_length,
                next_header,
                auth_code: auth_code.to_vec(),
            },
            off,
        ))
    }
}
