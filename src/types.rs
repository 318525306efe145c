/// Authentication type carried in byte 0 of every session header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AuthType {
    /// No authentication code.
    None = 0x00,
    /// MD2 auth code.
    Md2 = 0x01,
    /// MD5 auth code.
    Md5 = 0x02,
    /// Straight password/key.
    Password = 0x04,
    /// OEM proprietary.
    Oem = 0x05,
    /// RMCP+ session format (IPMI v2.0).
    RmcpPlus = 0x06,
}

impl AuthType {
    /// Wire value.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Decode a wire value, `None` for reserved values.
    pub fn from_u8(b: u8) -> Option<Self> {
        Some(match b {
            0x00 => Self::None,
            0x01 => Self::Md2,
            0x02 => Self::Md5,
            0x04 => Self::Password,
            0x05 => Self::Oem,
            0x06 => Self::RmcpPlus,
            _ => return None,
        })
    }
}

/// Session protocol generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IpmiVersion {
    /// IPMI v1.5 ("legacy") sessions.
    V15,
    /// IPMI v2.0 RMCP+ sessions.
    #[default]
    V20,
}

/// Payload type of an RMCP+ session frame (IPMI v2.0 Table 13-16).
///
/// The OEM explicit type carries the fields that only exist in its header form,
/// so a header can never hold OEM fields for a non-OEM payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadType {
    /// Standard IPMI message.
    Ipmi,
    /// Serial over LAN.
    Sol,
    /// OEM explicit payload.
    Oem {
        /// OEM IANA enterprise number (24 bits used).
        iana: u32,
        /// OEM-defined payload ID.
        payload_id: u16,
    },
    /// RMCP+ Open Session Request.
    OpenSessionRequest,
    /// RMCP+ Open Session Response.
    OpenSessionResponse,
    /// RAKP Message 1.
    Rakp1,
    /// RAKP Message 2.
    Rakp2,
    /// RAKP Message 3.
    Rakp3,
    /// RAKP Message 4.
    Rakp4,
    /// Any 6-bit payload type without a variant of its own (OEM payloads
    /// 20h-27h, reserved values). See [`PayloadCode`].
    Other(PayloadCode),
}

/// A 6-bit payload type code that no named [`PayloadType`] variant covers.
///
/// Only obtainable through [`PayloadCode::new`] or by parsing, so
/// `PayloadType::Other` never aliases a named variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PayloadCode(u8);

impl PayloadCode {
    /// `None` if `code` does not fit 6 bits or has a named variant.
    pub fn new(code: u8) -> Option<Self> {
        match PayloadType::from_code(code) {
            PayloadType::Other(other) if code <= PAYLOAD_TYPE_MASK => Some(other),
            _ => None,
        }
    }

    /// The 6-bit wire value.
    pub fn get(self) -> u8 {
        self.0
    }
}

const PAYLOAD_TYPE_MASK: u8 = 0x3F;

impl PayloadType {
    /// Wire value of the OEM explicit payload type.
    pub const OEM_CODE: u8 = 0x02;

    /// The 6-bit wire value.
    pub fn code(self) -> u8 {
        match self {
            Self::Ipmi => 0x00,
            Self::Sol => 0x01,
            Self::Oem { .. } => Self::OEM_CODE,
            Self::OpenSessionRequest => 0x10,
            Self::OpenSessionResponse => 0x11,
            Self::Rakp1 => 0x12,
            Self::Rakp2 => 0x13,
            Self::Rakp3 => 0x14,
            Self::Rakp4 => 0x15,
            Self::Other(code) => code.get(),
        }
    }

    /// Whether frames of this type carry the OEM IANA / payload ID header fields.
    pub fn is_oem(self) -> bool {
        matches!(self, Self::Oem { .. })
    }

    /// Decode a 6-bit wire value. OEM explicit decodes with zeroed OEM fields;
    /// the header fills them in.
    pub(crate) fn from_code(code: u8) -> Self {
        match code & PAYLOAD_TYPE_MASK {
            0x00 => Self::Ipmi,
            0x01 => Self::Sol,
            Self::OEM_CODE => Self::Oem {
                iana: 0,
                payload_id: 0,
            },
            0x10 => Self::OpenSessionRequest,
            0x11 => Self::OpenSessionResponse,
            0x12 => Self::Rakp1,
            0x13 => Self::Rakp2,
            0x14 => Self::Rakp3,
            0x15 => Self::Rakp4,
            other => Self::Other(PayloadCode(other)),
        }
    }
}
