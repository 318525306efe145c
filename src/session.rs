use crate::error::{Error, Result};
use crate::types::AuthType;

/// Progress of the RMCP+ Open Session / RAKP handshake.
///
/// States only move forward one step at a time. A failed handshake goes back
/// to `PreSession` through [`SessionContext::reset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum SessionState {
    /// No handshake in progress.
    #[default]
    PreSession = 0x00,
    /// Open Session Request sent.
    OpenSessionSent = 0x01,
    /// Open Session Response received.
    OpenSessionReceived = 0x02,
    /// RAKP Message 1 sent.
    Rakp1Sent = 0x03,
    /// RAKP Message 2 received.
    Rakp2Received = 0x04,
    /// RAKP Message 3 sent.
    Rakp3Sent = 0x05,
    /// RAKP Message 4 verified; frames are authenticated and encrypted.
    Active = 0x06,
    /// Close Session sent.
    CloseSent = 0x07,
}

impl SessionState {
    /// The only state this one may advance to.
    pub fn successor(self) -> Option<Self> {
        Some(match self {
            Self::PreSession => Self::OpenSessionSent,
            Self::OpenSessionSent => Self::OpenSessionReceived,
            Self::OpenSessionReceived => Self::Rakp1Sent,
            Self::Rakp1Sent => Self::Rakp2Received,
            Self::Rakp2Received => Self::Rakp3Sent,
            Self::Rakp3Sent => Self::Active,
            Self::Active => Self::CloseSent,
            Self::CloseSent => return None,
        })
    }

    fn predecessor(self) -> Option<Self> {
        Some(match self {
            Self::PreSession => return None,
            Self::OpenSessionSent => Self::PreSession,
            Self::OpenSessionReceived => Self::OpenSessionSent,
            Self::Rakp1Sent => Self::OpenSessionReceived,
            Self::Rakp2Received => Self::Rakp1Sent,
            Self::Rakp3Sent => Self::Rakp2Received,
            Self::Active => Self::Rakp3Sent,
            Self::CloseSent => Self::Active,
        })
    }

    /// Whether the handshake has completed and the session is usable.
    pub fn is_active(self) -> bool {
        self == Self::Active
    }
}

#[derive(Debug, Clone, Copy)]
struct V15Mode {
    active: bool,
    auth_type: AuthType,
    session_id: u32,
    sequence: u32,
}

#[derive(Debug, Clone, Copy, Default)]
struct V20Mode {
    state: SessionState,
    console_session_id: u32,
    bmc_session_id: u32,
    sequence: u32,
}

/// Per-connection session state.
///
/// Frame generation reads this; only the caller mutates it, between exchanges.
/// Sequence numbers and session IDs are embedded exactly as stored.
#[derive(Debug, Clone, Copy)]
pub struct SessionContext {
    v15: V15Mode,
    v20: V20Mode,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionContext {
    /// Fresh context: v1.5 inactive, v2.0 in `PreSession`.
    pub fn new() -> Self {
        Self {
            v15: V15Mode {
                active: false,
                auth_type: AuthType::None,
                session_id: 0,
                sequence: 0,
            },
            v20: V20Mode::default(),
        }
    }

    // IPMI v1.5

    /// Mark the v1.5 session active (after Activate Session) with its negotiated auth type.
    pub fn activate_v15(&mut self, auth_type: AuthType, session_id: u32, sequence: u32) {
        self.v15 = V15Mode {
            active: true,
            auth_type,
            session_id,
            sequence,
        };
    }

    /// Drop back to session-less v1.5 framing.
    pub fn deactivate_v15(&mut self) {
        self.v15.active = false;
    }

    /// Set the v1.5 outbound sequence number.
    pub fn set_v15_sequence(&mut self, sequence: u32) {
        self.v15.sequence = sequence;
    }

    /// Whether a v1.5 session is active.
    pub fn v15_active(&self) -> bool {
        self.v15.active
    }

    /// Negotiated v1.5 auth type.
    pub fn v15_auth_type(&self) -> AuthType {
        self.v15.auth_type
    }

    /// v1.5 session ID.
    pub fn v15_session_id(&self) -> u32 {
        self.v15.session_id
    }

    /// v1.5 outbound sequence number.
    pub fn v15_sequence(&self) -> u32 {
        self.v15.sequence
    }

    /// Whether outbound v1.5 headers carry an auth code.
    pub fn v15_authenticated(&self) -> bool {
        self.v15.active && self.v15.auth_type != AuthType::None
    }

    // IPMI v2.0

    /// Current handshake state.
    pub fn state(&self) -> SessionState {
        self.v20.state
    }

    /// Remote console session ID proposed in the Open Session Request.
    pub fn console_session_id(&self) -> u32 {
        self.v20.console_session_id
    }

    /// Managed system session ID assigned by the BMC.
    pub fn bmc_session_id(&self) -> u32 {
        self.v20.bmc_session_id
    }

    /// Outbound v2.0 sequence number.
    pub fn sequence(&self) -> u32 {
        self.v20.sequence
    }

    /// Set the outbound v2.0 sequence number.
    pub fn set_sequence(&mut self, sequence: u32) {
        self.v20.sequence = sequence;
    }

    /// Move to the next v2.0 sequence number, returning it.
    pub fn advance_sequence(&mut self) -> u32 {
        self.v20.sequence = self.v20.sequence.wrapping_add(1);
        self.v20.sequence
    }

    /// Advance the handshake to `to`, which must be the current state's successor.
    pub fn advance(&mut self, to: SessionState) -> Result<()> {
        let expected = to.predecessor().ok_or(Error::InvalidArgument(
            "PreSession is only reachable through reset",
        ))?;
        let from = self.v20.state;
        if from != expected {
            return Err(Error::InvalidState {
                expected,
                actual: from,
            });
        }
        self.v20.state = to;
        crate::observe::record_transition(from, to);
        Ok(())
    }

    /// Open Session Request sent with the console's session ID.
    pub fn open_session_sent(&mut self, console_session_id: u32) -> Result<()> {
        self.advance(SessionState::OpenSessionSent)?;
        self.v20.console_session_id = console_session_id;
        Ok(())
    }

    /// Open Session Response accepted; record the BMC's session ID.
    pub fn open_session_received(&mut self, bmc_session_id: u32) -> Result<()> {
        self.advance(SessionState::OpenSessionReceived)?;
        self.v20.bmc_session_id = bmc_session_id;
        Ok(())
    }

    /// RAKP Message 1 sent.
    pub fn rakp1_sent(&mut self) -> Result<()> {
        self.advance(SessionState::Rakp1Sent)
    }

    /// RAKP Message 2 received and verified.
    pub fn rakp2_received(&mut self) -> Result<()> {
        self.advance(SessionState::Rakp2Received)
    }

    /// RAKP Message 3 sent.
    pub fn rakp3_sent(&mut self) -> Result<()> {
        self.advance(SessionState::Rakp3Sent)
    }

    /// RAKP Message 4 verified; frames from here on use the live session ID and sequence.
    pub fn activate(&mut self, initial_sequence: u32) -> Result<()> {
        self.advance(SessionState::Active)?;
        self.v20.sequence = initial_sequence;
        Ok(())
    }

    /// Close Session sent.
    pub fn close_sent(&mut self) -> Result<()> {
        self.advance(SessionState::CloseSent)
    }

    /// Abandon the handshake or closed session and start over from `PreSession`.
    pub fn reset(&mut self) {
        let from = self.v20.state;
        self.v20 = V20Mode::default();
        if from != SessionState::PreSession {
            crate::observe::record_transition(from, SessionState::PreSession);
        }
    }
}
