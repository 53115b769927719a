//! Verify-data generators, one per protocol family.
//!
//! Each generator MACs the transcript with the base secret handed out by the
//! key schedule. The same call serves both directions: a producer computes
//! its own MAC, a consumer recomputes the peer's.
//!
//! 按协议族划分的 verify data 生成器。
//!
//! 每个生成器都使用密钥调度提供的基础密钥对握手记录计算 MAC。
//! 同一调用同时服务于两个方向：生产方计算自身的 MAC，消费方重新计算对端的 MAC。

use crate::crypto::hkdf::{hkdf_expand_label, hmac_hash};
use crate::crypto::keys::Secret;
use crate::crypto::prf::{tls10_prf, tls12_prf};
use crate::crypto::suite::CipherSuiteInfo;
use crate::error::{HandshakeError, Result};
use crate::protocol::message::VerifyData;
use crate::protocol::transcript::TranscriptHasher;
use crate::protocol::version::{HandshakeRole, ProtocolVersion};
use md5::Md5;
use sha1::{Digest, Sha1};
use zeroize::Zeroize;

const SSL30_CLIENT_SENDER: &[u8] = b"CLNT";
const SSL30_SERVER_SENDER: &[u8] = b"SRVR";
const SSL30_PAD1: u8 = 0x36;
const SSL30_PAD2: u8 = 0x5c;
const SSL30_MD5_PAD_LEN: usize = 48;
const SSL30_SHA1_PAD_LEN: usize = 40;

const CLIENT_FINISHED_LABEL: &[u8] = b"client finished";
const SERVER_FINISHED_LABEL: &[u8] = b"server finished";

/// Everything a generator reads besides the role.
pub struct VerifyDataInput<'a> {
    pub transcript: &'a dyn TranscriptHasher,
    /// The Finished base secret of the sender being computed.
    pub base_secret: &'a Secret,
    pub suite: CipherSuiteInfo,
}

/// The verify-data construction selected by the negotiated version.
///
/// 由协商版本选定的 verify data 构造方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyDataScheme {
    Ssl30,
    /// TLS 1.0, TLS 1.1 and DTLS 1.0.
    Tls10,
    /// TLS 1.2 and DTLS 1.2.
    Tls12,
    Tls13,
}

impl VerifyDataScheme {
    pub fn for_version(version: ProtocolVersion) -> Result<Self> {
        Ok(match version {
            ProtocolVersion::Ssl30 => VerifyDataScheme::Ssl30,
            ProtocolVersion::Tls10 | ProtocolVersion::Tls11 | ProtocolVersion::Dtls10 => {
                VerifyDataScheme::Tls10
            }
            ProtocolVersion::Tls12 | ProtocolVersion::Dtls12 => VerifyDataScheme::Tls12,
            ProtocolVersion::Tls13 => VerifyDataScheme::Tls13,
        })
    }

    /// Computes the verify data for the Finished message seen from `role`.
    ///
    /// A producer passes `is_validating = false` and gets its own Finished; a
    /// consumer passes `true` and gets the value the peer must have sent.
    ///
    /// 从 `role` 的视角计算 Finished 消息的 verify data。
    /// 生产方传入 `is_validating = false` 得到自身的 Finished；
    /// 消费方传入 `true` 得到对端应当发送的值。
    pub fn create_verify_data(
        self,
        input: &VerifyDataInput<'_>,
        role: HandshakeRole,
        is_validating: bool,
    ) -> Result<VerifyData> {
        let sender = finished_sender(role, is_validating);
        match self {
            VerifyDataScheme::Ssl30 => ssl30_verify_data(input, sender),
            VerifyDataScheme::Tls10 => {
                let seed = input.transcript.digest();
                let mut output = vec![0u8; input.suite.verify_data_length];
                tls10_prf(
                    input.base_secret.expose(),
                    finished_label(sender),
                    &seed,
                    &mut output,
                )?;
                Ok(VerifyData::new(output))
            }
            VerifyDataScheme::Tls12 => {
                let seed = input.transcript.digest();
                let mut output = vec![0u8; input.suite.verify_data_length];
                tls12_prf(
                    input.suite.hash_algorithm,
                    input.base_secret.expose(),
                    finished_label(sender),
                    &seed,
                    &mut output,
                )?;
                Ok(VerifyData::new(output))
            }
            VerifyDataScheme::Tls13 => {
                let hash = input.suite.hash_algorithm;
                let mut finished_key = hkdf_expand_label(
                    hash,
                    input.base_secret.expose(),
                    b"finished",
                    &[],
                    hash.output_len(),
                )?;
                let mac = hmac_hash(hash, &finished_key, &input.transcript.digest());
                finished_key.zeroize();
                Ok(VerifyData::new(mac?))
            }
        }
    }
}

/// The role whose Finished message is being computed.
///
/// Producing yields the local role; validating yields the peer.
///
/// 正在计算其 Finished 消息的角色：生产时为本端，验证时为对端。
pub fn finished_sender(role: HandshakeRole, is_validating: bool) -> HandshakeRole {
    if is_validating { role.peer() } else { role }
}

fn finished_label(sender: HandshakeRole) -> &'static [u8] {
    match sender {
        HandshakeRole::Initiator => CLIENT_FINISHED_LABEL,
        HandshakeRole::Responder => SERVER_FINISHED_LABEL,
    }
}

fn ssl30_verify_data(input: &VerifyDataInput<'_>, sender: HandshakeRole) -> Result<VerifyData> {
    let hashes = input.transcript.legacy_hashes().ok_or_else(|| {
        HandshakeError::key_derivation("SSL 3.0 Finished needs the MD5/SHA-1 transcript")
    })?;
    let sender_bytes = match sender {
        HandshakeRole::Initiator => SSL30_CLIENT_SENDER,
        HandshakeRole::Responder => SSL30_SERVER_SENDER,
    };
    let master = input.base_secret.expose();

    let md5_inner = hashes
        .md5
        .chain_update(sender_bytes)
        .chain_update(master)
        .chain_update([SSL30_PAD1; SSL30_MD5_PAD_LEN])
        .finalize();
    let md5_outer = Md5::new()
        .chain_update(master)
        .chain_update([SSL30_PAD2; SSL30_MD5_PAD_LEN])
        .chain_update(md5_inner)
        .finalize();

    let sha1_inner = hashes
        .sha1
        .chain_update(sender_bytes)
        .chain_update(master)
        .chain_update([SSL30_PAD1; SSL30_SHA1_PAD_LEN])
        .finalize();
    let sha1_outer = Sha1::new()
        .chain_update(master)
        .chain_update([SSL30_PAD2; SSL30_SHA1_PAD_LEN])
        .chain_update(sha1_inner)
        .finalize();

    let mut out = md5_outer.to_vec();
    out.extend_from_slice(&sha1_outer);
    Ok(VerifyData::new(out))
}
