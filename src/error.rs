use crate::protocol::version::HandshakeRole;
use thiserror::Error;

/// The taxonomy tag of a [`HandshakeError`].
///
/// [`HandshakeError`] 的分类标签。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnsupportedVersion,
    LengthMismatch,
    VerifyDataMismatch,
    UnexpectedMessage,
    KeyDerivationFailure,
    Configuration,
}

/// TLS alert descriptions a caller may send when tearing down a connection.
///
/// 调用方在拆除连接时可以发送的 TLS 警报描述。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AlertDescription {
    UnexpectedMessage = 10,
    BadRecordMac = 20,
    HandshakeFailure = 40,
    IllegalParameter = 47,
    DecodeError = 50,
    DecryptError = 51,
    ProtocolVersion = 70,
    InternalError = 80,
}

impl AlertDescription {
    /// Convert to raw u8 byte.
    pub fn to_u8(self) -> u8 {
        self as u8
    }
}

/// Every failure the Finished processor can surface.
///
/// All of them are terminal for the handshake: the processor never retries,
/// the caller maps the error to an alert and tears the connection down.
///
/// Finished 处理器可能产生的所有错误。
///
/// 所有错误对握手而言都是终止性的：处理器从不重试，
/// 由调用方将错误映射为警报并拆除连接。
#[derive(Debug, Error)]
pub enum HandshakeError {
    #[error("unsupported protocol version: {0}")]
    UnsupportedVersion(String),

    #[error("inappropriate Finished message: need {expected} but received {actual} bytes of verify_data")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("the {sender} Finished message cannot be verified")]
    VerifyDataMismatch { sender: HandshakeRole },

    #[error("unexpected message: {0}")]
    UnexpectedMessage(String),

    #[error("key derivation failed: {0}")]
    KeyDerivationFailure(String),

    #[error("invalid configuration: {0}")]
    Configuration(String),
}

impl HandshakeError {
    pub(crate) fn unexpected(context: impl Into<String>) -> Self {
        HandshakeError::UnexpectedMessage(context.into())
    }

    pub(crate) fn key_derivation(context: impl Into<String>) -> Self {
        HandshakeError::KeyDerivationFailure(context.into())
    }

    pub(crate) fn configuration(context: impl Into<String>) -> Self {
        HandshakeError::Configuration(context.into())
    }

    /// Returns the taxonomy tag of this error.
    ///
    /// 返回该错误的分类标签。
    pub fn kind(&self) -> ErrorKind {
        match self {
            HandshakeError::UnsupportedVersion(_) => ErrorKind::UnsupportedVersion,
            HandshakeError::LengthMismatch { .. } => ErrorKind::LengthMismatch,
            HandshakeError::VerifyDataMismatch { .. } => ErrorKind::VerifyDataMismatch,
            HandshakeError::UnexpectedMessage(_) => ErrorKind::UnexpectedMessage,
            HandshakeError::KeyDerivationFailure(_) => ErrorKind::KeyDerivationFailure,
            HandshakeError::Configuration(_) => ErrorKind::Configuration,
        }
    }

    /// The fatal alert conventionally sent to the peer for this error.
    ///
    /// 针对该错误通常发送给对端的致命警报。
    pub fn alert(&self) -> AlertDescription {
        match self.kind() {
            ErrorKind::UnsupportedVersion => AlertDescription::ProtocolVersion,
            ErrorKind::LengthMismatch => AlertDescription::DecodeError,
            ErrorKind::VerifyDataMismatch => AlertDescription::DecryptError,
            ErrorKind::UnexpectedMessage => AlertDescription::UnexpectedMessage,
            ErrorKind::KeyDerivationFailure | ErrorKind::Configuration => {
                AlertDescription::InternalError
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, HandshakeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alerts_follow_error_kind() {
        let cases = [
            (
                HandshakeError::UnsupportedVersion("0x0200".into()),
                AlertDescription::ProtocolVersion,
            ),
            (
                HandshakeError::LengthMismatch {
                    expected: 12,
                    actual: 11,
                },
                AlertDescription::DecodeError,
            ),
            (
                HandshakeError::VerifyDataMismatch {
                    sender: HandshakeRole::Initiator,
                },
                AlertDescription::DecryptError,
            ),
            (
                HandshakeError::unexpected("Finished before CertificateVerify"),
                AlertDescription::UnexpectedMessage,
            ),
            (
                HandshakeError::key_derivation("HKDF expand"),
                AlertDescription::InternalError,
            ),
        ];

        for (error, alert) in cases {
            assert_eq!(error.alert(), alert, "{error}");
        }
        assert_eq!(AlertDescription::DecryptError.to_u8(), 51);
    }

    #[test]
    fn display_carries_context() {
        let err = HandshakeError::LengthMismatch {
            expected: 36,
            actual: 12,
        };
        assert_eq!(
            err.to_string(),
            "inappropriate Finished message: need 36 but received 12 bytes of verify_data"
        );
        let err = HandshakeError::VerifyDataMismatch {
            sender: HandshakeRole::Responder,
        };
        assert_eq!(err.to_string(), "the server Finished message cannot be verified");
    }
}
