//! Messages that must have crossed the wire before a Finished may.
//!
//! 在 Finished 之前必须已经传输的消息。

use crate::error::{HandshakeError, Result};
use crate::protocol::version::{HandshakePhase, ProtocolVersion};
use std::collections::BTreeSet;
use std::fmt;

/// A message whose arrival (or departure) gates a Finished message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Prerequisite {
    Certificate,
    CertificateVerify,
    ChangeCipherSpec,
}

impl fmt::Display for Prerequisite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prerequisite::Certificate => f.write_str("Certificate"),
            Prerequisite::CertificateVerify => f.write_str("CertificateVerify"),
            Prerequisite::ChangeCipherSpec => f.write_str("ChangeCipherSpec"),
        }
    }
}

/// Outstanding prerequisites, tracked separately per direction.
///
/// The surrounding handshake registers what it still expects, and marks each
/// message once it has been sent or received.
///
/// 按方向分别跟踪尚未满足的前置消息。
///
/// 外层握手登记仍在等待的消息，并在每条消息发送或接收后将其标记完成。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingMessages {
    inbound: BTreeSet<Prerequisite>,
    outbound: BTreeSet<Prerequisite>,
}

impl PendingMessages {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a message the peer still has to send.
    pub fn expect_inbound(&mut self, message: Prerequisite) -> &mut Self {
        self.inbound.insert(message);
        self
    }

    /// Registers a message the local side still has to send.
    pub fn expect_outbound(&mut self, message: Prerequisite) -> &mut Self {
        self.outbound.insert(message);
        self
    }

    pub fn mark_received(&mut self, message: Prerequisite) {
        self.inbound.remove(&message);
    }

    pub fn mark_sent(&mut self, message: Prerequisite) {
        self.outbound.remove(&message);
    }

    pub fn is_inbound_pending(&self, message: Prerequisite) -> bool {
        self.inbound.contains(&message)
    }

    pub fn is_outbound_pending(&self, message: Prerequisite) -> bool {
        self.outbound.contains(&message)
    }

    /// Fails if the peer's Finished would arrive ahead of a message it must
    /// follow.
    ///
    /// Before TLS 1.3 a registered ChangeCipherSpec must have been received. On
    /// a full handshake a pending Certificate or CertificateVerify is also an
    /// ordering violation.
    ///
    /// 若对端的 Finished 将先于其必须跟随的消息到达，则返回错误。
    pub fn check_inbound(&self, version: ProtocolVersion, phase: HandshakePhase) -> Result<()> {
        if !version.is_tls13() && self.is_inbound_pending(Prerequisite::ChangeCipherSpec) {
            return Err(HandshakeError::unexpected(
                "Missing ChangeCipherSpec message",
            ));
        }
        if phase == HandshakePhase::Full {
            for message in [Prerequisite::Certificate, Prerequisite::CertificateVerify] {
                if self.is_inbound_pending(message) {
                    return Err(HandshakeError::unexpected(format!(
                        "Unexpected Finished handshake message, {message} still pending"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Fails if the local Finished would be sent ahead of the local
    /// Certificate or CertificateVerify.
    pub fn check_outbound(&self, phase: HandshakePhase) -> Result<()> {
        if phase == HandshakePhase::Full {
            for message in [Prerequisite::Certificate, Prerequisite::CertificateVerify] {
                if self.is_outbound_pending(message) {
                    return Err(HandshakeError::unexpected(format!(
                        "{message} must be sent before Finished"
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_cipher_spec_gates_legacy_versions_only() {
        let mut pending = PendingMessages::new();
        pending.expect_inbound(Prerequisite::ChangeCipherSpec);

        let err = pending
            .check_inbound(ProtocolVersion::Tls12, HandshakePhase::Resumption)
            .unwrap_err();
        assert!(matches!(err, HandshakeError::UnexpectedMessage(ref m) if m.contains("ChangeCipherSpec")));
        assert!(pending.check_inbound(ProtocolVersion::Tls13, HandshakePhase::Full).is_ok());

        pending.mark_received(Prerequisite::ChangeCipherSpec);
        assert!(pending.check_inbound(ProtocolVersion::Tls12, HandshakePhase::Full).is_ok());
    }

    #[test]
    fn certificate_verify_gates_full_handshakes() {
        let mut pending = PendingMessages::new();
        pending
            .expect_inbound(Prerequisite::Certificate)
            .expect_inbound(Prerequisite::CertificateVerify);

        assert!(pending.check_inbound(ProtocolVersion::Tls13, HandshakePhase::Full).is_err());
        assert!(pending.check_inbound(ProtocolVersion::Tls13, HandshakePhase::Resumption).is_ok());

        pending.mark_received(Prerequisite::Certificate);
        assert!(pending.check_inbound(ProtocolVersion::Tls12, HandshakePhase::Full).is_err());
        pending.mark_received(Prerequisite::CertificateVerify);
        assert!(pending.check_inbound(ProtocolVersion::Tls12, HandshakePhase::Full).is_ok());
    }

    #[test]
    fn outbound_is_tracked_separately() {
        let mut pending = PendingMessages::new();
        pending.expect_outbound(Prerequisite::CertificateVerify);
        assert!(pending.check_inbound(ProtocolVersion::Tls12, HandshakePhase::Full).is_ok());
        assert!(pending.check_outbound(HandshakePhase::Full).is_err());
        pending.mark_sent(Prerequisite::CertificateVerify);
        assert!(pending.check_outbound(HandshakePhase::Full).is_ok());
    }
}
