use crate::error::Error;
use crate::session::SessionState;
use crate::types::IpmiVersion;

/// Which way a frame travelled.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Direction {
    Outbound,
    Inbound,
}

#[cfg(any(feature = "metrics", feature = "tracing"))]
impl Direction {
    fn as_str(self) -> &'static str {
        match self {
            Self::Outbound => "outbound",
            Self::Inbound => "inbound",
        }
    }
}

#[cfg(any(feature = "metrics", feature = "tracing"))]
fn version_str(version: IpmiVersion) -> &'static str {
    match version {
        IpmiVersion::V15 => "v1.5",
        IpmiVersion::V20 => "v2.0",
    }
}

pub(crate) fn record_frame_ok(direction: Direction, version: IpmiVersion, frame_len: usize) {
    let _ = (direction, version, frame_len);

    #[cfg(feature = "metrics")]
    {
        metrics::counter!(
            "ipmi_session_frames_total",
            "direction" => direction.as_str(),
            "version" => version_str(version),
            "outcome" => "ok"
        )
        .increment(1);
        metrics::histogram!("ipmi_session_frame_bytes", "direction" => direction.as_str())
            .record(frame_len as f64);
    }

    #[cfg(feature = "tracing")]
    {
        tracing::debug!(
            direction = direction.as_str(),
            version = version_str(version),
            frame_len,
            "ipmi session frame ok"
        );
    }
}

pub(crate) fn record_frame_err(direction: Direction, version: IpmiVersion, err: &Error) {
    let _ = (direction, version, err);

    #[cfg(feature = "metrics")]
    {
        metrics::counter!(
            "ipmi_session_frames_total",
            "direction" => direction.as_str(),
            "version" => version_str(version),
            "outcome" => "err"
        )
        .increment(1);
        metrics::counter!("ipmi_session_frame_errors_total", "kind" => err.kind()).increment(1);
    }

    #[cfg(feature = "tracing")]
    {
        tracing::warn!(
            direction = direction.as_str(),
            version = version_str(version),
            error = %err,
            "ipmi session frame failed"
        );
    }
}

pub(crate) fn record_transition(from: SessionState, to: SessionState) {
    let _ = (from, to);

    #[cfg(feature = "metrics")]
    {
        if to == SessionState::Active {
            metrics::counter!("ipmi_session_activations_total").increment(1);
        }
    }

    #[cfg(feature = "tracing")]
    {
        tracing::debug!(from = ?from, to = ?to, "ipmi session state changed");
    }
}
