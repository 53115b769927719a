//! Negotiated protocol parameters the Finished exchange depends on.
//!
//! 完成消息交换所依赖的已协商协议参数。

use crate::error::{HandshakeError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A protocol version selected during negotiation.
///
/// 协商期间选定的协议版本。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProtocolVersion {
    Ssl30,
    Tls10,
    Tls11,
    Tls12,
    Tls13,
    Dtls10,
    Dtls12,
}

impl ProtocolVersion {
    /// The two-byte identifier carried in hello messages.
    pub fn wire_id(self) -> u16 {
        match self {
            ProtocolVersion::Ssl30 => 0x0300,
            ProtocolVersion::Tls10 => 0x0301,
            ProtocolVersion::Tls11 => 0x0302,
            ProtocolVersion::Tls12 => 0x0303,
            ProtocolVersion::Tls13 => 0x0304,
            ProtocolVersion::Dtls10 => 0xfeff,
            ProtocolVersion::Dtls12 => 0xfefd,
        }
    }

    /// Maps a wire identifier back to a version.
    ///
    /// Unknown identifiers (SSL 2.0, drafts, future versions) fail with
    /// `UnsupportedVersion`.
    pub fn from_wire(id: u16) -> Result<Self> {
        match id {
            0x0300 => Ok(ProtocolVersion::Ssl30),
            0x0301 => Ok(ProtocolVersion::Tls10),
            0x0302 => Ok(ProtocolVersion::Tls11),
            0x0303 => Ok(ProtocolVersion::Tls12),
            0x0304 => Ok(ProtocolVersion::Tls13),
            0xfeff => Ok(ProtocolVersion::Dtls10),
            0xfefd => Ok(ProtocolVersion::Dtls12),
            other => Err(HandshakeError::UnsupportedVersion(format!("{other:#06x}"))),
        }
    }

    pub fn is_tls13(self) -> bool {
        matches!(self, ProtocolVersion::Tls13)
    }

    /// AEAD record protection first appears in TLS 1.2 and DTLS 1.2.
    pub(crate) fn supports_aead(self) -> bool {
        !self.uses_legacy_transcript()
    }

    /// True for every version whose PRF needs the MD5/SHA-1 transcript pair.
    pub(crate) fn uses_legacy_transcript(self) -> bool {
        matches!(
            self,
            ProtocolVersion::Ssl30
                | ProtocolVersion::Tls10
                | ProtocolVersion::Tls11
                | ProtocolVersion::Dtls10
        )
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProtocolVersion::Ssl30 => "SSLv3",
            ProtocolVersion::Tls10 => "TLSv1",
            ProtocolVersion::Tls11 => "TLSv1.1",
            ProtocolVersion::Tls12 => "TLSv1.2",
            ProtocolVersion::Tls13 => "TLSv1.3",
            ProtocolVersion::Dtls10 => "DTLSv1.0",
            ProtocolVersion::Dtls12 => "DTLSv1.2",
        };
        f.write_str(name)
    }
}

/// Which end of the handshake a processor speaks for.
///
/// 处理器所代表的握手端。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandshakeRole {
    /// The client.
    Initiator,
    /// The server.
    Responder,
}

impl HandshakeRole {
    pub fn peer(self) -> Self {
        match self {
            HandshakeRole::Initiator => HandshakeRole::Responder,
            HandshakeRole::Responder => HandshakeRole::Initiator,
        }
    }
}

impl fmt::Display for HandshakeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandshakeRole::Initiator => f.write_str("client"),
            HandshakeRole::Responder => f.write_str("server"),
        }
    }
}

/// Whether the Finished exchange closes a full or an abbreviated handshake.
///
/// 完成消息交换结束的是完整握手还是简化（恢复）握手。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HandshakePhase {
    #[default]
    Full,
    Resumption,
}

/// Traffic direction of a key transition, from the local endpoint's view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Read,
    Write,
}

/// The role whose Finished message travels first for the given parameters.
///
/// Pre-1.3 full handshakes start with the client; abbreviated ones with the
/// server. TLS 1.3 servers always send their Finished first.
///
/// 对于给定参数，首先发送 Finished 消息的角色。
pub fn first_finished_sender(version: ProtocolVersion, phase: HandshakePhase) -> HandshakeRole {
    if version.is_tls13() {
        return HandshakeRole::Responder;
    }
    match phase {
        HandshakePhase::Full => HandshakeRole::Initiator,
        HandshakePhase::Resumption => HandshakeRole::Responder,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_ids_map_back() -> Result<()> {
        for version in [
            ProtocolVersion::Ssl30,
            ProtocolVersion::Tls10,
            ProtocolVersion::Tls11,
            ProtocolVersion::Tls12,
            ProtocolVersion::Tls13,
            ProtocolVersion::Dtls10,
            ProtocolVersion::Dtls12,
        ] {
            assert_eq!(ProtocolVersion::from_wire(version.wire_id())?, version);
        }
        Ok(())
    }

    #[test]
    fn unknown_wire_id_is_unsupported() {
        let err = ProtocolVersion::from_wire(0x0200).unwrap_err();
        assert!(matches!(err, HandshakeError::UnsupportedVersion(ref v) if v == "0x0200"));
    }

    #[test]
    fn flight_order() {
        use HandshakePhase::*;
        use HandshakeRole::*;
        assert_eq!(first_finished_sender(ProtocolVersion::Tls12, Full), Initiator);
        assert_eq!(first_finished_sender(ProtocolVersion::Tls12, Resumption), Responder);
        assert_eq!(first_finished_sender(ProtocolVersion::Ssl30, Full), Initiator);
        assert_eq!(first_finished_sender(ProtocolVersion::Tls13, Full), Responder);
        assert_eq!(first_finished_sender(ProtocolVersion::Tls13, Resumption), Responder);
    }
}
