//! RMCP+ (IPMI v2.0) session header and frame.

use crate::codec::{
    pack_u8, pack_u16_le, pack_u32_le, unpack_bytes, unpack_u8, unpack_u16_le, unpack_u32_le,
};
use crate::error::{Error, Result};
use crate::protocol::trailer::{SessionTrailer, integrity_pad_len};
use crate::types::{AuthType, PayloadType};

/// Header length for every payload type except OEM explicit.
pub const SESSION_HEADER20_SIZE_MIN: usize = 12;
/// Header length for OEM explicit payloads.
pub const SESSION_HEADER20_SIZE_MAX: usize = 18;

// Byte 1: [7] encrypted, [6] authenticated, [5:0] payload type.
const ENCRYPTED_MASK: u8 = 0x80;
const AUTHENTICATED_MASK: u8 = 0x40;
const PAYLOAD_TYPE_MASK: u8 = 0x3F;

// OEM IANA is 3 bytes followed by a reserved byte.
const OEM_IANA_MASK: u32 = 0x00FF_FFFF;

/// IPMI v2.0 RMCP+ session header. The auth type byte is always 06h.
///
/// Non-OEM: `0:AuthType 1:Flags|PayloadType 2:SessionID(4) 6:Sequence(4) 10:PayloadLength(2)`
///
/// OEM explicit: `0:AuthType 1:Flags|PayloadType 2:OEMIANA(4) 6:OEMPayloadID(2)
/// 8:SessionID(4) 12:Sequence(4) 16:PayloadLength(2)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionHeader20 {
    /// Payload is encrypted.
    pub encrypted: bool,
    /// Payload is authenticated; with a non-zero session ID a trailer follows.
    pub authenticated: bool,
    /// Payload type, including OEM fields for OEM explicit payloads.
    pub payload_type: PayloadType,
    /// Managed system (BMC) session ID, 0 outside a session.
    pub session_id: u32,
    /// Session sequence number, 0 outside a session.
    pub sequence: u32,
    /// Payload length in bytes, after encryption.
    pub payload_length: u16,
}

impl SessionHeader20 {
    /// Packed length: 18 for OEM explicit payloads, 12 otherwise.
    pub fn len(&self) -> usize {
        if self.payload_type.is_oem() {
            SESSION_HEADER20_SIZE_MAX
        } else {
            SESSION_HEADER20_SIZE_MIN
        }
    }

    /// Always false; a header is never empty.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether a session trailer follows the payload.
    pub fn has_trailer(&self) -> bool {
        self.authenticated && self.session_id != 0
    }

    fn flags_byte(&self) -> u8 {
        let mut b = self.payload_type.code() & PAYLOAD_TYPE_MASK;
        if self.authenticated {
            b |= AUTHENTICATED_MASK;
        }
        if self.encrypted {
            b |= ENCRYPTED_MASK;
        }
        b
    }

    /// Write the header at the start of `buf`, returning the bytes written.
    pub fn pack_into(&self, buf: &mut [u8]) -> Result<usize> {
        let mut off = pack_u8(AuthType::RmcpPlus.as_u8(), buf, 0)?;
        off = pack_u8(self.flags_byte(), buf, off)?;
        if let PayloadType::Oem { iana, payload_id } = self.payload_type {
            off = pack_u32_le(iana & OEM_IANA_MASK, buf, off)?;
            off = pack_u16_le(payload_id, buf, off)?;
        }
        let off = pack_u32_le(self.session_id, buf, off)?;
        let off = pack_u32_le(self.sequence, buf, off)?;
        pack_u16_le(self.payload_length, buf, off)
    }

    /// Serialize the header.
    pub fn pack(&self) -> Result<Vec<u8>> {
        let mut out = vec![0u8; self.len()];
        self.pack_into(&mut out)?;
        Ok(out)
    }

    /// Parse a header from the start of `msg`.
    pub fn unpack(msg: &[u8]) -> Result<Self> {
        if msg.len() < SESSION_HEADER20_SIZE_MIN {
            return Err(Error::BufferTooShort {
                offset: 0,
                needed: SESSION_HEADER20_SIZE_MIN,
                available: msg.len(),
            });
        }

        let (auth_type, off) = unpack_u8(msg, 0)?;
        if auth_type != AuthType::RmcpPlus.as_u8() {
            return Err(Error::Protocol("unsupported RMCP+ auth type"));
        }

        let (flags, mut off) = unpack_u8(msg, off)?;
        let encrypted = flags & ENCRYPTED_MASK != 0;
        let authenticated = flags & AUTHENTICATED_MASK != 0;
        let mut payload_type = PayloadType::from_code(flags & PAYLOAD_TYPE_MASK);

        if payload_type.is_oem() {
            if msg.len() < SESSION_HEADER20_SIZE_MAX {
                return Err(Error::BufferTooShort {
                    offset: 0,
                    needed: SESSION_HEADER20_SIZE_MAX,
                    available: msg.len(),
                });
            }
            let (iana, next) = unpack_u32_le(msg, off)?;
            let (payload_id, next) = unpack_u16_le(msg, next)?;
            payload_type = PayloadType::Oem {
                iana: iana & OEM_IANA_MASK,
                payload_id,
            };
            off = next;
        }

        let (session_id, off) = unpack_u32_le(msg, off)?;
        let (sequence, off) = unpack_u32_le(msg, off)?;
        let (payload_length, _) = unpack_u16_le(msg, off)?;

        Ok(Self {
            encrypted,
            authenticated,
            payload_type,
            session_id,
            sequence,
            payload_length,
        })
    }
}

/// A complete RMCP+ session frame: header, payload and, when authenticated, a trailer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session20 {
    /// Session header.
    pub header: SessionHeader20,
    /// Session payload. For encrypted frames this is the confidentiality
    /// header, ciphertext and confidentiality trailer.
    pub payload: Vec<u8>,
    /// Integrity trailer, present iff `header.has_trailer()`.
    pub trailer: Option<SessionTrailer>,
}

impl Session20 {
    /// Serialize header, payload and trailer.
    pub fn pack(&self) -> Result<Vec<u8>> {
        let trailer_len = self.trailer.as_ref().map_or(0, SessionTrailer::len);
        let mut out = Vec::with_capacity(self.header.len() + self.payload.len() + trailer_len);
        out.extend_from_slice(&self.header.pack()?);
        out.extend_from_slice(&self.payload);
        if let Some(trailer) = &self.trailer {
            out.extend_from_slice(&trailer.pack()?);
        }
        Ok(out)
    }

    /// Parse a frame.
    pub fn unpack(msg: &[u8]) -> Result<Self> {
        let header = SessionHeader20::unpack(msg).map_err(Error::header)?;
        let header_size = header.len();
        let payload_size = header.payload_length as usize;
        let (payload, trailer_off) = unpack_bytes(msg, header_size, payload_size)?;

        let trailer = if header.has_trailer() {
            let pad_size = integrity_pad_len(header_size + payload_size);
            let (trailer, _) =
                SessionTrailer::unpack(msg, trailer_off, pad_size).map_err(Error::trailer)?;
            Some(trailer)
        } else {
            None
        };

        Ok(Self {
            header,
            payload: payload.to_vec(),
            trailer,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(payload_type: PayloadType) -> SessionHeader20 {
        SessionHeader20 {
            encrypted: false,
            authenticated: false,
            payload_type,
            session_id: 0,
            sequence: 0,
            payload_length: 0,
        }
    }

    #[test]
    fn pre_session_header_layout() {
        let h = SessionHeader20 {
            payload_length: 32,
            ..header(PayloadType::OpenSessionRequest)
        };
        let bytes = h.pack().expect("pack");
        assert_eq!(bytes, [0x06, 0x10, 0, 0, 0, 0, 0, 0, 0, 0, 0x20, 0x00]);
        assert_eq!(SessionHeader20::unpack(&bytes).expect("unpack"), h);
    }

    #[test]
    fn flags_share_byte_with_payload_type() {
        let h = SessionHeader20 {
            encrypted: true,
            authenticated: true,
            session_id: 0x0A0B_0C0D,
            sequence: 0x0000_0102,
            payload_length: 0x0304,
            ..header(PayloadType::Sol)
        };
        let bytes = h.pack().expect("pack");
        assert_eq!(bytes[1], 0xC1);
        assert_eq!(&bytes[2..6], &[0x0D, 0x0C, 0x0B, 0x0A]);
        assert_eq!(&bytes[6..10], &[0x02, 0x01, 0x00, 0x00]);
        assert_eq!(&bytes[10..12], &[0x04, 0x03]);

        let parsed = SessionHeader20::unpack(&bytes).expect("unpack");
        assert_eq!(parsed, h);
        assert_eq!(parsed.payload_type, PayloadType::Sol);
    }

    #[test]
    fn oem_header_layout() {
        let h = SessionHeader20 {
            session_id: 0x1111_1111,
            sequence: 0x2222_2222,
            payload_length: 0x0033,
            ..header(PayloadType::Oem {
                iana: 0x0002A2,
                payload_id: 0xBEEF,
            })
        };
        let bytes = h.pack().expect("pack");
        assert_eq!(bytes.len(), SESSION_HEADER20_SIZE_MAX);
        assert_eq!(bytes[1], 0x02);
        assert_eq!(&bytes[2..6], &[0xA2, 0x02, 0x00, 0x00]);
        assert_eq!(&bytes[6..8], &[0xEF, 0xBE]);
        assert_eq!(&bytes[8..12], &[0x11; 4]);
        assert_eq!(&bytes[12..16], &[0x22; 4]);
        assert_eq!(&bytes[16..18], &[0x33, 0x00]);
        assert_eq!(SessionHeader20::unpack(&bytes).expect("unpack"), h);
    }

    #[test]
    fn every_payload_type_round_trips() {
        let mut types: Vec<PayloadType> = (0u8..0x40).map(PayloadType::from_code).collect();
        types.push(PayloadType::Oem {
            iana: 0x00_ABCD,
            payload_id: 0x1234,
        });
        for payload_type in types {
            let h = header(payload_type);
            let bytes = h.pack().expect("pack");
            assert_eq!(SessionHeader20::unpack(&bytes).expect("unpack"), h);
        }
    }

    #[test]
    fn oem_iana_reserved_byte_is_zero() {
        let h = header(PayloadType::Oem {
            iana: 0xFF00_0001,
            payload_id: 0,
        });
        let bytes = h.pack().expect("pack");
        assert_eq!(&bytes[2..6], &[0x01, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn short_headers_are_rejected() {
        let err = SessionHeader20::unpack(&[0x06, 0x00, 0, 0, 0, 0, 0, 0, 0, 0, 0]).unwrap_err();
        assert!(err.is_buffer_too_short());

        let mut oem = vec![0x06, 0x02];
        oem.extend_from_slice(&[0u8; 14]);
        let err = SessionHeader20::unpack(&oem).unwrap_err();
        assert!(matches!(err, Error::BufferTooShort { needed: 18, .. }));
    }

    #[test]
    fn wrong_auth_type_is_rejected() {
        let err = SessionHeader20::unpack(&[0x00; 12]).unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }

    #[test]
    fn unauthenticated_frame_has_no_trailer() {
        let frame = Session20 {
            header: SessionHeader20 {
                payload_length: 3,
                session_id: 0x55,
                ..header(PayloadType::Ipmi)
            },
            payload: vec![1, 2, 3],
            trailer: None,
        };
        let mut bytes = frame.pack().expect("pack");
        // Trailing garbage is not read as a trailer.
        bytes.extend_from_slice(&[0xFF, 0x01, 0x07]);
        let parsed = Session20::unpack(&bytes).expect("unpack");
        assert_eq!(parsed, frame);
    }

    #[test]
    fn authenticated_frame_with_zero_session_id_has_no_trailer() {
        let frame = Session20 {
            header: SessionHeader20 {
                authenticated: true,
                payload_length: 1,
                ..header(PayloadType::Rakp3)
            },
            payload: vec![0xAB],
            trailer: None,
        };
        let bytes = frame.pack().expect("pack");
        assert_eq!(Session20::unpack(&bytes).expect("unpack").trailer, None);
    }

    #[test]
    fn authenticated_frame_round_trip() {
        let h = SessionHeader20 {
            authenticated: true,
            session_id: 0x0200_0000,
            sequence: 9,
            payload_length: 5,
            ..header(PayloadType::Ipmi)
        };
        let header_bytes = h.pack().expect("pack");
        let payload = vec![1, 2, 3, 4, 5];
        let trailer = SessionTrailer::for_frame(&header_bytes, &payload, vec![0x5A; 12])
            .expect("trailer");
        assert_eq!(trailer.pad_length(), 3);

        let frame = Session20 {
            header: h,
            payload,
            trailer: Some(trailer),
        };
        let bytes = frame.pack().expect("pack");
        assert_eq!(bytes.len(), 12 + 5 + 3 + 2 + 12);
        assert_eq!(Session20::unpack(&bytes).expect("unpack"), frame);
    }

    #[test]
    fn truncated_payload_and_trailer_fail() {
        let h = SessionHeader20 {
            authenticated: true,
            session_id: 1,
            payload_length: 4,
            ..header(PayloadType::Ipmi)
        };
        let mut bytes = h.pack().expect("pack");
        bytes.extend_from_slice(&[0u8; 3]);
        let err = Session20::unpack(&bytes).unwrap_err();
        assert!(err.is_buffer_too_short());

        // Payload complete, trailer cut before next header.
        bytes.push(0);
        bytes.push(0x00);
        let err = Session20::unpack(&bytes).unwrap_err();
        assert!(matches!(err, Error::SessionTrailer(_)));
        assert!(err.is_buffer_too_short());
    }
}
