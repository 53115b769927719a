use crate::crypto::ct::constant_time_eq;
use crate::crypto::suite::CipherSuite;
use crate::error::{HandshakeError, Result};
use crate::protocol::version::ProtocolVersion;
use std::fmt;

/// Handshake type code of the Finished message (RFC 5246 §7.4).
pub const FINISHED_TYPE: u8 = 20;

/// Largest body a u24 handshake length can announce.
const MAX_HANDSHAKE_BODY: usize = 0x00ff_ffff;

/// The MAC binding a handshake transcript to a Finished message.
///
/// Equality is evaluated in constant time.
///
/// 将握手记录与 Finished 消息绑定的 MAC。相等比较以常量时间进行。
#[derive(Clone, Eq)]
pub struct VerifyData(Vec<u8>);

impl VerifyData {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl PartialEq for VerifyData {
    fn eq(&self, other: &Self) -> bool {
        constant_time_eq(&self.0, &other.0)
    }
}

impl AsRef<[u8]> for VerifyData {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for VerifyData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VerifyData({})", hex::encode(&self.0))
    }
}

/// The body of a Finished handshake message: the verify data, verbatim.
///
/// Finished 握手消息的消息体：原样的 verify data。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedMessage {
    pub verify_data: VerifyData,
}

impl FinishedMessage {
    pub fn new(verify_data: VerifyData) -> Self {
        Self { verify_data }
    }

    pub fn encode(&self) -> Vec<u8> {
        self.verify_data.as_bytes().to_vec()
    }

    /// Parses a Finished body whose length must equal `expected_len`.
    ///
    /// The expected length comes from the negotiated parameters, never from
    /// the wire. Any other length fails with `LengthMismatch`.
    ///
    /// 解析 Finished 消息体，其长度必须等于 `expected_len`。
    /// 期望长度来自协商参数而非线路数据，其他长度均返回 `LengthMismatch`。
    pub fn decode(bytes: &[u8], expected_len: usize) -> Result<Self> {
        if bytes.len() != expected_len {
            return Err(HandshakeError::LengthMismatch {
                expected: expected_len,
                actual: bytes.len(),
            });
        }
        Ok(Self::new(VerifyData::new(bytes)))
    }
}

impl fmt::Display for FinishedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\"Finished\": {{")?;
        writeln!(f, "  \"verify data\": {{")?;
        for (row, chunk) in self.verify_data.as_bytes().chunks(16).enumerate() {
            let bytes: Vec<String> = chunk.iter().map(|b| format!("{b:02X}")).collect();
            writeln!(f, "    {:04X}: {}", row * 16, bytes.join(" "))?;
        }
        writeln!(f, "  }}")?;
        write!(f, "}}")
    }
}

/// Handshake messages as they enter the transcript.
///
/// 进入握手记录的握手消息。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeMessage {
    Finished(FinishedMessage),
    /// Any earlier handshake message, carried opaquely.
    Opaque { msg_type: u8, body: Vec<u8> },
}

impl HandshakeMessage {
    pub fn msg_type(&self) -> u8 {
        match self {
            HandshakeMessage::Finished(_) => FINISHED_TYPE,
            HandshakeMessage::Opaque { msg_type, .. } => *msg_type,
        }
    }

    /// `msg_type(1) || length(u24) || body`, the form hashed into the transcript.
    ///
    /// Fails with `Configuration` when the body does not fit the u24 length.
    pub fn to_framed_bytes(&self) -> Result<Vec<u8>> {
        let body = match self {
            HandshakeMessage::Finished(finished) => finished.encode(),
            HandshakeMessage::Opaque { body, .. } => body.clone(),
        };
        if body.len() > MAX_HANDSHAKE_BODY {
            return Err(HandshakeError::configuration(format!(
                "handshake body of {} bytes exceeds the u24 length field",
                body.len()
            )));
        }

        let len = body.len() as u32;
        let mut framed = Vec::with_capacity(4 + body.len());
        framed.push(self.msg_type());
        framed.extend_from_slice(&len.to_be_bytes()[1..]);
        framed.extend_from_slice(&body);
        Ok(framed)
    }
}

/// Verify data length fixed by the negotiated version and suite.
///
/// 由协商的版本与密码套件确定的 verify data 长度。
pub fn expected_verify_data_len(version: ProtocolVersion, suite: CipherSuite) -> usize {
    let info = suite.info();
    match version {
        ProtocolVersion::Ssl30 => 36,
        ProtocolVersion::Tls13 => info.hash_length,
        _ => info.verify_data_length,
    }
}
