//! Running hash over the handshake messages exchanged so far.
//!
//! Versions up to TLS 1.1 keep an MD5 and a SHA-1 state side by side; TLS 1.2
//! and later keep the single hash of the negotiated cipher suite.
//!
//! 对迄今为止交换的握手消息进行的滚动哈希。
//!
//! TLS 1.1 及更早版本并行维护 MD5 与 SHA-1 状态；
//! TLS 1.2 及之后版本只维护已协商密码套件的哈希。
use crate::crypto::suite::{CipherSuite, HashAlgorithm};
use crate::error::Result;
use crate::protocol::message::HandshakeMessage;
use crate::protocol::version::ProtocolVersion;
use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha384};

/// Snapshot of the MD5 and SHA-1 running states, for SSL 3.0 verify data.
#[derive(Debug, Clone)]
pub struct LegacyHashes {
    pub md5: Md5,
    pub sha1: Sha1,
}

/// The transcript contract the Finished processor depends on.
///
/// `digest` never consumes the running state: the processor snapshots the
/// transcript before the peer's Finished is hashed, then keeps appending.
///
/// Finished 处理器所依赖的握手记录接口。
///
/// `digest` 从不消耗滚动状态：处理器在对端 Finished 被哈希之前获取快照，之后继续追加。
pub trait TranscriptHasher {
    fn update(&mut self, bytes: &[u8]);

    /// Current transcript hash. `MD5 || SHA-1` (36 bytes) for legacy versions.
    fn digest(&self) -> Vec<u8>;

    /// Running MD5/SHA-1 states, when the transcript keeps them.
    fn legacy_hashes(&self) -> Option<LegacyHashes>;

    /// Appends a handshake message in its framed wire form.
    fn update_message(&mut self, message: &HandshakeMessage) -> Result<()> {
        self.update(&message.to_framed_bytes()?);
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum RunningHash {
    Legacy(LegacyHashes),
    Sha256(Sha256),
    Sha384(Sha384),
}

#[derive(Debug, Clone)]
pub struct Transcript {
    running: RunningHash,
}

impl Transcript {
    /// Creates an empty transcript whose hash follows `version` and `suite`.
    ///
    /// 创建一个空的握手记录，其哈希由 `version` 与 `suite` 决定。
    pub fn new(version: ProtocolVersion, suite: CipherSuite) -> Self {
        let running = if version.uses_legacy_transcript() {
            RunningHash::Legacy(LegacyHashes {
                md5: Md5::new(),
                sha1: Sha1::new(),
            })
        } else {
            match suite.hash_algorithm() {
                HashAlgorithm::Sha256 => RunningHash::Sha256(Sha256::new()),
                HashAlgorithm::Sha384 => RunningHash::Sha384(Sha384::new()),
            }
        };
        Self { running }
    }

    /// Creates a transcript already holding `handshake_bytes`, the messages
    /// exchanged before the Finished phase.
    pub fn with_history(
        version: ProtocolVersion,
        suite: CipherSuite,
        handshake_bytes: &[u8],
    ) -> Self {
        let mut transcript = Self::new(version, suite);
        transcript.update(handshake_bytes);
        transcript
    }
}

impl TranscriptHasher for Transcript {
    fn update(&mut self, bytes: &[u8]) {
        match &mut self.running {
            RunningHash::Legacy(hashes) => {
                hashes.md5.update(bytes);
                hashes.sha1.update(bytes);
            }
            RunningHash::Sha256(hasher) => hasher.update(bytes),
            RunningHash::Sha384(hasher) => hasher.update(bytes),
        }
    }

    fn digest(&self) -> Vec<u8> {
        match &self.running {
            RunningHash::Legacy(hashes) => {
                let mut out = hashes.md5.clone().finalize().to_vec();
                out.extend_from_slice(&hashes.sha1.clone().finalize());
                out
            }
            RunningHash::Sha256(hasher) => hasher.clone().finalize().to_vec(),
            RunningHash::Sha384(hasher) => hasher.clone().finalize().to_vec(),
        }
    }

    fn legacy_hashes(&self) -> Option<LegacyHashes> {
        match &self.running {
            RunningHash::Legacy(hashes) => Some(hashes.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_does_not_consume_state() {
        let mut transcript = Transcript::new(ProtocolVersion::Tls12, CipherSuite::TLS_AES_128_GCM_SHA256);
        transcript.update(b"\x01\x00\x00\x05hello");
        let first = transcript.digest();
        assert_eq!(first, transcript.digest());

        transcript.update(b"\x02\x00\x00\x05world");
        assert_ne!(first, transcript.digest());
        assert_eq!(
            hex::encode(transcript.digest()),
            "4c3ce044db0939614f1a5c77e23832a01f175ae4d0ce867d6b5f2e55b3cf36c6"
        );
    }

    #[test]
    fn hash_follows_version_and_suite() {
        let legacy = Transcript::new(ProtocolVersion::Tls10, CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA);
        assert_eq!(legacy.digest().len(), 16 + 20);
        assert!(legacy.legacy_hashes().is_some());

        let sha384 = Transcript::new(
            ProtocolVersion::Tls12,
            CipherSuite::TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384,
        );
        assert_eq!(sha384.digest().len(), 48);
        assert!(sha384.legacy_hashes().is_none());
    }

    #[test]
    fn incremental_and_bulk_updates_agree() {
        let mut incremental = Transcript::new(ProtocolVersion::Ssl30, CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA);
        incremental.update(b"\x01\x00\x00\x05hello");
        incremental.update(b"\x02\x00\x00\x05world");
        let bulk = Transcript::with_history(
            ProtocolVersion::Ssl30,
            CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA,
            b"\x01\x00\x00\x05hello\x02\x00\x00\x05world",
        );
        assert_eq!(incremental.digest(), bulk.digest());
    }
}
