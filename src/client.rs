use core::fmt;

use crate::crypto::{AuthCodeGenerator, Confidentiality, Integrity, ct_eq};
use crate::error::{Error, Result};
use crate::observe::{self, Direction};
use crate::protocol::{Session15, Session20, SessionAuth15, SessionHeader20};
use crate::session::SessionContext;
use crate::types::{IpmiVersion, PayloadType};

/// A received RMCP+ payload, decrypted and verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundPayload {
    /// Payload type from the session header.
    pub payload_type: PayloadType,
    /// Session ID from the session header.
    pub session_id: u32,
    /// Sequence number from the session header.
    pub sequence: u32,
    /// Raw payload bytes for the command layer.
    pub payload: Vec<u8>,
}

/// Session-layer endpoint of one IPMI connection.
///
/// `Client` owns the [`SessionContext`] and the negotiated algorithms, turns raw
/// command payloads into session frames and back. It never touches the
/// network; the transport hands it bytes and sends what it returns.
///
/// One exchange at a time: both directions take `&mut self`, and the caller
/// advances sequence numbers and handshake state between exchanges through
/// [`Client::context_mut`].
pub struct Client {
    version: IpmiVersion,
    context: SessionContext,
    auth_code: Option<Box<dyn AuthCodeGenerator + Send>>,
    integrity: Option<Box<dyn Integrity + Send>>,
    confidentiality: Option<Box<dyn Confidentiality + Send>>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("version", &self.version)
            .field("context", &self.context)
            .field("auth_code", &self.auth_code.is_some())
            .field("integrity", &self.integrity.is_some())
            .field("confidentiality", &self.confidentiality.is_some())
            .finish()
    }
}

/// Builder for [`Client`].
#[derive(Default)]
pub struct ClientBuilder {
    version: IpmiVersion,
    auth_code: Option<Box<dyn AuthCodeGenerator + Send>>,
    integrity: Option<Box<dyn Integrity + Send>>,
    confidentiality: Option<Box<dyn Confidentiality + Send>>,
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("version", &self.version)
            .field("auth_code", &self.auth_code.is_some())
            .field("integrity", &self.integrity.is_some())
            .field("confidentiality", &self.confidentiality.is_some())
            .finish()
    }
}

impl ClientBuilder {
    /// Create a new builder (IPMI v2.0, no algorithms).
    pub fn new() -> Self {
        Self::default()
    }

    /// Select the session protocol generation.
    pub fn version(mut self, version: IpmiVersion) -> Self {
        self.version = version;
        self
    }

    /// Set the v1.5 auth code algorithm used once a v1.5 session is active.
    pub fn auth_code_generator(
        mut self,
        generator: impl AuthCodeGenerator + Send + 'static,
    ) -> Self {
        self.auth_code = Some(Box::new(generator));
        self
    }

    /// Set the negotiated RMCP+ integrity algorithm.
    ///
    /// Without one, active-session frames go out unauthenticated.
    pub fn integrity(mut self, integrity: impl Integrity + Send + 'static) -> Self {
        self.integrity = Some(Box::new(integrity));
        self
    }

    /// Set the negotiated RMCP+ confidentiality algorithm.
    ///
    /// Without one, active-session frames go out unencrypted.
    pub fn confidentiality(
        mut self,
        confidentiality: impl Confidentiality + Send + 'static,
    ) -> Self {
        self.confidentiality = Some(Box::new(confidentiality));
        self
    }

    /// Build the [`Client`] with a fresh session context.
    pub fn build(self) -> Result<Client> {
        match self.version {
            IpmiVersion::V15 if self.integrity.is_some() || self.confidentiality.is_some() => {
                return Err(Error::InvalidArgument(
                    "integrity and confidentiality apply to IPMI v2.0 sessions only",
                ));
            }
            IpmiVersion::V20 if self.auth_code.is_some() => {
                return Err(Error::InvalidArgument(
                    "auth code generators apply to IPMI v1.5 sessions only",
                ));
            }
            _ => {}
        }

        Ok(Client {
            version: self.version,
            context: SessionContext::new(),
            auth_code: self.auth_code,
            integrity: self.integrity,
            confidentiality: self.confidentiality,
        })
    }
}

impl Client {
    /// Create a [`ClientBuilder`].
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Session protocol generation.
    pub fn version(&self) -> IpmiVersion {
        self.version
    }

    /// Current session state.
    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    /// Session state, for advancing the handshake and sequence numbers between exchanges.
    pub fn context_mut(&mut self) -> &mut SessionContext {
        &mut self.context
    }

    /// Frame an outbound payload for the transport.
    ///
    /// `payload_type` is only meaningful for IPMI v2.0; v1.5 frames carry no payload type.
    pub fn build_outbound_frame(
        &mut self,
        payload_type: PayloadType,
        raw_payload: &[u8],
    ) -> Result<Vec<u8>> {
        let result = match self.version {
            IpmiVersion::V15 => self.gen_session15(raw_payload).and_then(|s| s.pack()),
            IpmiVersion::V20 => self
                .gen_session20(payload_type, raw_payload)
                .and_then(|s| s.pack()),
        };
        match &result {
            Ok(frame) => {
                crate::debug::dump_hex("session frame (out)", frame);
                observe::record_frame_ok(Direction::Outbound, self.version, frame.len());
            }
            Err(err) => observe::record_frame_err(Direction::Outbound, self.version, err),
        }
        result
    }

    /// Unframe an inbound frame from the transport, returning the payload for the command layer.
    pub fn parse_inbound_frame(&mut self, frame: &[u8]) -> Result<Vec<u8>> {
        crate::debug::dump_hex("session frame (in)", frame);
        let result = match self.version {
            IpmiVersion::V15 => self.parse_inbound_session15(frame).map(|s| s.payload),
            IpmiVersion::V20 => self.parse_inbound_session20(frame).map(|p| p.payload),
        };
        match &result {
            Ok(_) => observe::record_frame_ok(Direction::Inbound, self.version, frame.len()),
            Err(err) => observe::record_frame_err(Direction::Inbound, self.version, err),
        }
        result
    }

    /// Build an IPMI v1.5 frame for `raw_payload`.
    ///
    /// Outside an authenticated session the header has auth type None and zero
    /// session ID and sequence. Inside one, it carries the session's ID and
    /// sequence and an auth code over the raw payload.
    pub fn gen_session15(&self, raw_payload: &[u8]) -> Result<Session15> {
        if !self.context.v15_authenticated() {
            return Session15::new(SessionAuth15::None, 0, 0, raw_payload.to_vec());
        }

        let generator = self
            .auth_code
            .as_ref()
            .ok_or(Error::InvalidArgument("no v1.5 auth code generator configured"))?;
        let session_id = self.context.v15_session_id();
        let sequence = self.context.v15_sequence();

        let code = generator.generate_auth_code(session_id, sequence, raw_payload)?;
        crate::debug::dump_hex("session 15 authcode", &code);
        let auth = SessionAuth15::with_code(self.context.v15_auth_type(), code)?;

        Session15::new(auth, sequence, session_id, raw_payload.to_vec())
    }

    /// Build an RMCP+ frame for `raw_payload`.
    ///
    /// Before the session is active, frames are unauthenticated and
    /// unencrypted with session ID and sequence 0. Once active, they carry the
    /// BMC session ID and current sequence, the payload is encrypted first so
    /// the header length covers the ciphertext, and the trailer is computed
    /// over the packed header and the final payload. An active session without
    /// both algorithms configured is an error; frames never fall back to plaintext.
    pub fn gen_session20(
        &self,
        payload_type: PayloadType,
        raw_payload: &[u8],
    ) -> Result<Session20> {
        let mut header = SessionHeader20 {
            encrypted: false,
            authenticated: false,
            payload_type,
            session_id: 0,
            sequence: 0,
            payload_length: 0,
        };

        let protection = if self.context.state().is_active() {
            Some(self.active_algorithms()?)
        } else {
            None
        };
        if protection.is_some() {
            header.authenticated = true;
            header.encrypted = true;
            header.session_id = self.context.bmc_session_id();
            header.sequence = self.context.sequence();
        }

        let payload = match protection {
            Some((_, confidentiality)) => confidentiality.encrypt_payload(raw_payload)?,
            None => raw_payload.to_vec(),
        };
        header.payload_length = payload
            .len()
            .try_into()
            .map_err(|_| Error::InvalidArgument("payload too large for an RMCP+ session"))?;
        crate::debug::dump_hex("session payload (final)", &payload);

        let header_bytes = header.pack()?;
        crate::debug::dump_hex("session header", &header_bytes);

        let trailer = match protection {
            Some((integrity, _)) if header.has_trailer() => {
                Some(integrity.generate_session_trailer(&header_bytes, &payload)?)
            }
            _ => None,
        };

        Ok(Session20 {
            header,
            payload,
            trailer,
        })
    }

    /// Algorithms an active RMCP+ session protects every frame with.
    fn active_algorithms(
        &self,
    ) -> Result<(&(dyn Integrity + Send), &(dyn Confidentiality + Send))> {
        let integrity = self
            .integrity
            .as_deref()
            .ok_or(Error::InvalidArgument("no integrity algorithm configured"))?;
        let confidentiality = self
            .confidentiality
            .as_deref()
            .ok_or(Error::InvalidArgument("no confidentiality algorithm configured"))?;
        Ok((integrity, confidentiality))
    }

    /// Parse an IPMI v1.5 frame, checking its auth code when the session is authenticated.
    pub fn parse_inbound_session15(&self, frame: &[u8]) -> Result<Session15> {
        let session = Session15::unpack(frame)?;
        if !self.context.v15_authenticated() {
            return Ok(session);
        }

        let (auth_type, code) = match &session.header.auth {
            SessionAuth15::Code { auth_type, code } => (*auth_type, code),
            SessionAuth15::None if session.header.session_id == 0 => return Ok(session),
            SessionAuth15::None => {
                return Err(Error::Protocol("unauthenticated frame in an authenticated session"));
            }
        };
        if auth_type != self.context.v15_auth_type() {
            return Err(Error::Protocol("unexpected session auth type"));
        }

        let generator = self
            .auth_code
            .as_ref()
            .ok_or(Error::InvalidArgument("no v1.5 auth code generator configured"))?;
        let expected = generator.generate_auth_code(
            session.header.session_id,
            session.header.sequence,
            &session.payload,
        )?;
        if !ct_eq(code, &expected) {
            return Err(Error::AuthenticationFailed("invalid session auth code"));
        }

        Ok(session)
    }

    /// Parse an RMCP+ frame, verifying its trailer and decrypting its payload as flagged.
    pub fn parse_inbound_session20(&self, frame: &[u8]) -> Result<InboundPayload> {
        let session = Session20::unpack(frame)?;
        let header = session.header;

        if self.context.state().is_active()
            && header.session_id != 0
            && !(header.authenticated && header.encrypted)
        {
            return Err(Error::Protocol("unprotected frame in an active session"));
        }

        if let Some(trailer) = &session.trailer {
            let integrity = self
                .integrity
                .as_ref()
                .ok_or(Error::Protocol("authenticated frame without an integrity algorithm"))?;
            let header_bytes = frame
                .get(..header.len())
                .ok_or(Error::Protocol("frame shorter than its header"))?;
            integrity.verify_session_trailer(header_bytes, &session.payload, trailer)?;
        }

        let payload = if header.encrypted {
            let confidentiality = self
                .confidentiality
                .as_ref()
                .ok_or(Error::Protocol("encrypted frame without a confidentiality algorithm"))?;
            confidentiality.decrypt_payload(&session.payload)?
        } else {
            session.payload
        };
        crate::debug::dump_hex("session payload (in)", &payload);

        Ok(InboundPayload {
            payload_type: header.payload_type,
            session_id: header.session_id,
            sequence: header.sequence,
            payload,
        })
    }
}
