//! Unified error type for Tabula.

use tabula_protocol::ProtocolError;
use tabula_rules::RulesError;
use tabula_session::SessionError;
use tabula_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant generates the `From` impls,
/// so `?` converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum TabulaError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, framing).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The rules refused a player count or declare broken bounds.
    #[error(transparent)]
    Rules(#[from] RulesError),

    /// A session could not be run.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The server closed the connection while the client expected more.
    #[error("connection closed by server")]
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::Connect {
            addr: "127.0.0.1:9".into(),
            source: std::io::Error::from(std::io::ErrorKind::ConnectionRefused),
        };
        let tabula_err: TabulaError = err.into();
        assert!(matches!(tabula_err, TabulaError::Transport(_)));
        assert!(tabula_err.to_string().contains("127.0.0.1:9"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidMessage("bad".into());
        let tabula_err: TabulaError = err.into();
        assert!(matches!(tabula_err, TabulaError::Protocol(_)));
    }

    #[test]
    fn test_from_rules_error() {
        let err = RulesError::InvalidBounds { min: 3, max: 2 };
        let tabula_err: TabulaError = err.into();
        assert!(matches!(tabula_err, TabulaError::Rules(_)));
        assert!(tabula_err.to_string().contains("min 3"));
    }

    #[test]
    fn test_from_session_error() {
        let err = SessionError::AdmissionClosed;
        let tabula_err: TabulaError = err.into();
        assert!(matches!(tabula_err, TabulaError::Session(_)));
    }
}
