use crate::crypto::suite::CipherSuite;
use crate::error::{HandshakeError, Result};
use crate::protocol::version::{HandshakePhase, HandshakeRole, ProtocolVersion};
use serde::{Deserialize, Serialize};

/// The outcome of negotiation the Finished exchange runs under.
///
/// Loadable from any serde format; `phase` defaults to a full handshake and
/// `secure_renegotiation` to off.
///
/// Finished 交换所依据的协商结果。
///
/// 可通过任意 serde 格式加载；`phase` 默认为完整握手，`secure_renegotiation` 默认关闭。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NegotiatedParams {
    pub version: ProtocolVersion,
    pub cipher_suite: CipherSuite,
    pub role: HandshakeRole,
    #[serde(default)]
    pub phase: HandshakePhase,
    /// Keep both verify_data values for the renegotiation_info extension
    /// (RFC 5746).
    #[serde(default)]
    pub secure_renegotiation: bool,
}

impl NegotiatedParams {
    pub fn new(version: ProtocolVersion, cipher_suite: CipherSuite, role: HandshakeRole) -> Self {
        Self {
            version,
            cipher_suite,
            role,
            phase: HandshakePhase::Full,
            secure_renegotiation: false,
        }
    }

    /// Like [`NegotiatedParams::new`], from the two-byte version on the wire.
    pub fn from_wire(version: u16, cipher_suite: CipherSuite, role: HandshakeRole) -> Result<Self> {
        Ok(Self::new(ProtocolVersion::from_wire(version)?, cipher_suite, role))
    }

    pub fn with_phase(mut self, phase: HandshakePhase) -> Self {
        self.phase = phase;
        self
    }

    pub fn with_secure_renegotiation(mut self, enabled: bool) -> Self {
        self.secure_renegotiation = enabled;
        self
    }

    /// Rejects suites that cannot run under the negotiated version.
    ///
    /// TLS 1.3 suites need TLS 1.3, and AEAD suites need TLS 1.2 or later.
    ///
    /// 拒绝无法在已协商版本下运行的密码套件。
    pub fn validate(&self) -> Result<()> {
        let tls13_suite = self.cipher_suite.info().tls13_only;
        let aead_too_early = self.cipher_suite.is_aead() && !self.version.supports_aead();
        if tls13_suite != self.version.is_tls13() || aead_too_early {
            return Err(HandshakeError::configuration(format!(
                "{:?} cannot be used with {}",
                self.cipher_suite, self.version
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suite_must_match_version() {
        let params = NegotiatedParams::new(
            ProtocolVersion::Tls12,
            CipherSuite::TLS_AES_128_GCM_SHA256,
            HandshakeRole::Initiator,
        );
        assert!(matches!(params.validate(), Err(HandshakeError::Configuration(_))));

        let params = NegotiatedParams::new(
            ProtocolVersion::Tls13,
            CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256,
            HandshakeRole::Responder,
        );
        assert!(params.validate().is_err());

        let params = NegotiatedParams::new(
            ProtocolVersion::Dtls12,
            CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256,
            HandshakeRole::Responder,
        );
        assert!(params.validate().is_ok());

        for version in [
            ProtocolVersion::Ssl30,
            ProtocolVersion::Tls10,
            ProtocolVersion::Tls11,
            ProtocolVersion::Dtls10,
        ] {
            let params = NegotiatedParams::new(
                version,
                CipherSuite::TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384,
                HandshakeRole::Initiator,
            );
            assert!(
                matches!(params.validate(), Err(HandshakeError::Configuration(_))),
                "{version}"
            );
            let params = NegotiatedParams::new(
                version,
                CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA,
                HandshakeRole::Initiator,
            );
            assert!(params.validate().is_ok(), "{version}");
        }
    }

    #[test]
    fn unknown_wire_version() {
        let err = NegotiatedParams::from_wire(
            0x0002,
            CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA,
            HandshakeRole::Initiator,
        )
        .unwrap_err();
        assert!(matches!(err, HandshakeError::UnsupportedVersion(_)));
    }
}
