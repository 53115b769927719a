//! Secrets and the key schedules that feed the Finished exchange.
//!
//! A [`KeyScheduler`] supplies the base secret each Finished MAC is keyed
//! with, and installs new traffic keys once a Finished message has moved the
//! connection to its next phase.
//!
//! 为 Finished 交换提供密钥的秘密值与密钥调度。
//!
//! [`KeyScheduler`] 提供每个 Finished MAC 所使用的基础密钥，
//! 并在 Finished 消息推动连接进入下一阶段后安装新的流量密钥。

use crate::crypto::ct::constant_time_eq;
use crate::crypto::hkdf::{derive_secret, hkdf_expand_label, hkdf_extract};
use crate::crypto::prf::{ssl30_key_block, tls10_prf, tls12_prf};
use crate::crypto::suite::{CipherSuite, CipherSuiteInfo, HashAlgorithm};
use crate::error::{HandshakeError, Result};
use crate::protocol::version::{Direction, HandshakeRole, ProtocolVersion};
use std::fmt;
use tracing::trace;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Length of the pre-1.3 master secret.
pub const MASTER_SECRET_LEN: usize = 48;

/// Opaque key material, wiped from memory when dropped.
///
/// 不透明的密钥材料，在释放时从内存中清除。
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Secret(Vec<u8>);

impl Secret {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn expose(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl PartialEq for Secret {
    fn eq(&self, other: &Self) -> bool {
        constant_time_eq(&self.0, &other.0)
    }
}

impl Eq for Secret {}

impl From<Vec<u8>> for Secret {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret([REDACTED; {} bytes])", self.0.len())
    }
}

/// Record protection material for one direction of traffic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrafficKeys {
    /// The TLS 1.3 traffic secret the keys were expanded from.
    pub traffic_secret: Option<Secret>,
    /// Empty for AEAD suites.
    pub mac_key: Secret,
    pub key: Secret,
    pub iv: Secret,
}

/// Named secrets of the TLS 1.3 schedule that follow the Finished messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretLabel {
    ClientApplicationTraffic,
    ServerApplicationTraffic,
    ExporterMaster,
    ResumptionMaster,
}

impl SecretLabel {
    pub fn label(self) -> &'static [u8] {
        match self {
            SecretLabel::ClientApplicationTraffic => b"c ap traffic",
            SecretLabel::ServerApplicationTraffic => b"s ap traffic",
            SecretLabel::ExporterMaster => b"exp master",
            SecretLabel::ResumptionMaster => b"res master",
        }
    }

    /// The application traffic secret used by `sender`.
    pub fn application_traffic(sender: HandshakeRole) -> Self {
        match sender {
            HandshakeRole::Initiator => SecretLabel::ClientApplicationTraffic,
            HandshakeRole::Responder => SecretLabel::ServerApplicationTraffic,
        }
    }
}

/// The key-schedule collaborator of the Finished processor.
///
/// Finished 处理器的密钥调度协作者。
pub trait KeyScheduler {
    /// The secret the Finished MAC of `sender` is keyed with.
    ///
    /// The master secret before TLS 1.3; the sender's handshake traffic
    /// secret in TLS 1.3.
    ///
    /// `sender` 的 Finished MAC 所用的密钥。TLS 1.3 之前为主密钥，
    /// TLS 1.3 中为发送方的握手流量密钥。
    fn finished_base_secret(&self, sender: HandshakeRole) -> Result<&Secret>;

    /// Derives a named secret bound to `transcript_hash`.
    fn derive_secret(&mut self, label: SecretLabel, transcript_hash: &[u8]) -> Result<Secret>;

    /// Installs traffic keys derived from `secret` for `direction`.
    ///
    /// 为 `direction` 安装由 `secret` 派生的流量密钥。
    fn transition_traffic_keys(&mut self, direction: Direction, secret: &Secret) -> Result<()>;

    /// Keys currently installed for `direction`, if any.
    fn traffic_keys(&self, direction: Direction) -> Option<&TrafficKeys>;
}

/// Key schedule for SSL 3.0 through TLS 1.2.
///
/// Both directions derive from the master secret; a transition expands the
/// key block and installs the half owned by the local role (write) or the
/// peer (read).
///
/// SSL 3.0 至 TLS 1.2 的密钥调度。
///
/// 两个方向都由主密钥派生；切换时展开密钥块，
/// 并安装本端角色（写）或对端（读）所拥有的那一半。
#[derive(Debug)]
pub struct PrfKeySchedule {
    version: ProtocolVersion,
    suite: CipherSuiteInfo,
    role: HandshakeRole,
    master_secret: Secret,
    client_random: [u8; 32],
    server_random: [u8; 32],
    read_keys: Option<TrafficKeys>,
    write_keys: Option<TrafficKeys>,
}

impl PrfKeySchedule {
    pub fn new(
        version: ProtocolVersion,
        suite: CipherSuite,
        role: HandshakeRole,
        master_secret: Secret,
        client_random: [u8; 32],
        server_random: [u8; 32],
    ) -> Result<Self> {
        if version.is_tls13() {
            return Err(HandshakeError::UnsupportedVersion(format!(
                "{version} has no PRF key schedule"
            )));
        }
        if master_secret.len() != MASTER_SECRET_LEN {
            return Err(HandshakeError::key_derivation(format!(
                "master secret must be {MASTER_SECRET_LEN} bytes, got {}",
                master_secret.len()
            )));
        }
        Ok(Self {
            version,
            suite: suite.info(),
            role,
            master_secret,
            client_random,
            server_random,
            read_keys: None,
            write_keys: None,
        })
    }

    /// Derives the 48-byte master secret from the pre-master secret.
    ///
    /// 由预主密钥派生 48 字节的主密钥。
    pub fn derive_master_secret(
        version: ProtocolVersion,
        suite: CipherSuite,
        pre_master_secret: &[u8],
        client_random: &[u8; 32],
        server_random: &[u8; 32],
    ) -> Result<Secret> {
        let seed = [client_random.as_slice(), server_random.as_slice()].concat();
        let mut master = vec![0u8; MASTER_SECRET_LEN];
        match version {
            ProtocolVersion::Ssl30 => {
                master = ssl30_key_block(
                    pre_master_secret,
                    client_random,
                    server_random,
                    MASTER_SECRET_LEN,
                )?;
            }
            ProtocolVersion::Tls10 | ProtocolVersion::Tls11 | ProtocolVersion::Dtls10 => {
                tls10_prf(pre_master_secret, b"master secret", &seed, &mut master)?;
            }
            ProtocolVersion::Tls12 | ProtocolVersion::Dtls12 => {
                tls12_prf(
                    suite.hash_algorithm(),
                    pre_master_secret,
                    b"master secret",
                    &seed,
                    &mut master,
                )?;
            }
            ProtocolVersion::Tls13 => {
                return Err(HandshakeError::UnsupportedVersion(format!(
                    "{version} has no master secret PRF"
                )));
            }
        }
        Ok(Secret::new(master))
    }

    fn key_block(&self, secret: &Secret) -> Result<(TrafficKeys, TrafficKeys)> {
        let mac_len = self.suite.mac_key_length;
        let key_len = self.suite.key_length;
        // CBC suites from TLS 1.1 on carry an explicit per-record IV.
        let implicit_iv = mac_len == 0
            || matches!(self.version, ProtocolVersion::Ssl30 | ProtocolVersion::Tls10);
        let iv_len = if implicit_iv {
            self.suite.fixed_iv_length
        } else {
            0
        };
        let total = 2 * (mac_len + key_len + iv_len);

        let mut block = match self.version {
            ProtocolVersion::Ssl30 => ssl30_key_block(
                secret.expose(),
                &self.server_random,
                &self.client_random,
                total,
            )?,
            version => {
                let seed = [self.server_random.as_slice(), self.client_random.as_slice()].concat();
                let mut block = vec![0u8; total];
                if version.uses_legacy_transcript() {
                    tls10_prf(secret.expose(), b"key expansion", &seed, &mut block)?;
                } else {
                    tls12_prf(
                        self.suite.hash_algorithm,
                        secret.expose(),
                        b"key expansion",
                        &seed,
                        &mut block,
                    )?;
                }
                block
            }
        };

        let mut offset = 0;
        let mut take = |len: usize| {
            let part = Secret::new(&block[offset..offset + len]);
            offset += len;
            part
        };
        let client_mac = take(mac_len);
        let server_mac = take(mac_len);
        let client_key = take(key_len);
        let server_key = take(key_len);
        let client_iv = take(iv_len);
        let server_iv = take(iv_len);
        block.zeroize();

        Ok((
            TrafficKeys {
                traffic_secret: None,
                mac_key: client_mac,
                key: client_key,
                iv: client_iv,
            },
            TrafficKeys {
                traffic_secret: None,
                mac_key: server_mac,
                key: server_key,
                iv: server_iv,
            },
        ))
    }
}

impl KeyScheduler for PrfKeySchedule {
    fn finished_base_secret(&self, _sender: HandshakeRole) -> Result<&Secret> {
        Ok(&self.master_secret)
    }

    fn derive_secret(&mut self, label: SecretLabel, _transcript_hash: &[u8]) -> Result<Secret> {
        Err(HandshakeError::key_derivation(format!(
            "{label:?} is not defined before TLS 1.3"
        )))
    }

    fn transition_traffic_keys(&mut self, direction: Direction, secret: &Secret) -> Result<()> {
        let (client, server) = self.key_block(secret)?;
        let owner = match direction {
            Direction::Write => self.role,
            Direction::Read => self.role.peer(),
        };
        let keys = match owner {
            HandshakeRole::Initiator => client,
            HandshakeRole::Responder => server,
        };
        trace!(version = %self.version, ?direction, owner = %owner, "installed key block half");
        match direction {
            Direction::Read => self.read_keys = Some(keys),
            Direction::Write => self.write_keys = Some(keys),
        }
        Ok(())
    }

    fn traffic_keys(&self, direction: Direction) -> Option<&TrafficKeys> {
        match direction {
            Direction::Read => self.read_keys.as_ref(),
            Direction::Write => self.write_keys.as_ref(),
        }
    }
}

/// The TLS 1.3 key schedule from the handshake secret onwards (RFC 8446 §7.1).
///
/// TLS 1.3 从握手密钥开始的密钥调度。
#[derive(Debug)]
pub struct Tls13KeySchedule {
    suite: CipherSuiteInfo,
    role: HandshakeRole,
    handshake_secret: Secret,
    client_handshake_traffic: Secret,
    server_handshake_traffic: Secret,
    master_secret: Option<Secret>,
    read_keys: Option<TrafficKeys>,
    write_keys: Option<TrafficKeys>,
}

impl Tls13KeySchedule {
    /// Runs the schedule up to the handshake traffic secrets.
    ///
    /// `hello_transcript_hash` is `Transcript-Hash(ClientHello..ServerHello)`.
    /// Without a PSK the early secret is extracted from zeros.
    ///
    /// 将密钥调度推进到握手流量密钥。
    pub fn new(
        suite: CipherSuite,
        role: HandshakeRole,
        psk: Option<&[u8]>,
        shared_secret: &[u8],
        hello_transcript_hash: &[u8],
    ) -> Result<Self> {
        let info = suite.info();
        if !info.tls13_only {
            return Err(HandshakeError::UnsupportedVersion(format!(
                "{suite:?} is not a TLS 1.3 cipher suite"
            )));
        }
        let hash = info.hash_algorithm;
        let zeros = vec![0u8; hash.output_len()];

        let early_secret = Secret::new(hkdf_extract(hash, None, psk.unwrap_or(&zeros)));
        let derived = Secret::new(derive_secret(
            hash,
            early_secret.expose(),
            b"derived",
            &hash.empty_hash(),
        )?);
        let handshake_secret =
            Secret::new(hkdf_extract(hash, Some(derived.expose()), shared_secret));

        let client_handshake_traffic = Secret::new(derive_secret(
            hash,
            handshake_secret.expose(),
            b"c hs traffic",
            hello_transcript_hash,
        )?);
        let server_handshake_traffic = Secret::new(derive_secret(
            hash,
            handshake_secret.expose(),
            b"s hs traffic",
            hello_transcript_hash,
        )?);

        Ok(Self {
            suite: info,
            role,
            handshake_secret,
            client_handshake_traffic,
            server_handshake_traffic,
            master_secret: None,
            read_keys: None,
            write_keys: None,
        })
    }

    fn hash(&self) -> HashAlgorithm {
        self.suite.hash_algorithm
    }

    fn master_secret(&mut self) -> Result<&Secret> {
        if self.master_secret.is_none() {
            let hash = self.hash();
            let derived = Secret::new(derive_secret(
                hash,
                self.handshake_secret.expose(),
                b"derived",
                &hash.empty_hash(),
            )?);
            let zeros = vec![0u8; hash.output_len()];
            let master = Secret::new(hkdf_extract(hash, Some(derived.expose()), &zeros));
            self.master_secret = Some(master);
        }
        self.master_secret
            .as_ref()
            .ok_or_else(|| HandshakeError::key_derivation("master secret unavailable"))
    }
}

impl KeyScheduler for Tls13KeySchedule {
    fn finished_base_secret(&self, sender: HandshakeRole) -> Result<&Secret> {
        Ok(match sender {
            HandshakeRole::Initiator => &self.client_handshake_traffic,
            HandshakeRole::Responder => &self.server_handshake_traffic,
        })
    }

    fn derive_secret(&mut self, label: SecretLabel, transcript_hash: &[u8]) -> Result<Secret> {
        let hash = self.hash();
        let master = self.master_secret()?;
        let secret = derive_secret(hash, master.expose(), label.label(), transcript_hash)?;
        Ok(Secret::new(secret))
    }

    fn transition_traffic_keys(&mut self, direction: Direction, secret: &Secret) -> Result<()> {
        let hash = self.hash();
        let key = hkdf_expand_label(hash, secret.expose(), b"key", &[], self.suite.key_length)?;
        let iv = hkdf_expand_label(hash, secret.expose(), b"iv", &[], self.suite.fixed_iv_length)?;
        let keys = TrafficKeys {
            traffic_secret: Some(secret.clone()),
            mac_key: Secret::new(Vec::new()),
            key: Secret::new(key),
            iv: Secret::new(iv),
        };
        trace!(role = %self.role, ?direction, "installed TLS 1.3 traffic keys");
        match direction {
            Direction::Read => self.read_keys = Some(keys),
            Direction::Write => self.write_keys = Some(keys),
        }
        Ok(())
    }

    fn traffic_keys(&self, direction: Direction) -> Option<&TrafficKeys> {
        match direction {
            Direction::Read => self.read_keys.as_ref(),
            Direction::Write => self.write_keys.as_ref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unhex(s: &str) -> Vec<u8> {
        hex::decode(s).unwrap()
    }

    // RFC 8448 §3, simple 1-RTT handshake.
    const ECDHE_SHARED: &str = "8bd4054fb55b9d63fdfbacf9f04b9f0d35e6d63f537563efd46272900f89492d";
    const HELLO_HASH: &str = "860c06edc07858ee8e78f0e7428c58edd6b43f2ca3e6e95f02ed063cf0e1cad8";
    const SERVER_FINISHED_HASH: &str =
        "9608102a0f1ccc6db6250b7b7e417b1a000eaada3daae4777a7686c9ff83df13";

    fn rfc8448_schedule(role: HandshakeRole) -> Tls13KeySchedule {
        Tls13KeySchedule::new(
            CipherSuite::TLS_AES_128_GCM_SHA256,
            role,
            None,
            &unhex(ECDHE_SHARED),
            &unhex(HELLO_HASH),
        )
        .unwrap()
    }

    #[test]
    fn secret_debug_is_redacted() {
        let secret = Secret::new(vec![0x42; 48]);
        assert_eq!(format!("{secret:?}"), "Secret([REDACTED; 48 bytes])");
    }

    #[test]
    fn tls13_handshake_traffic_secrets_match_rfc8448() -> Result<()> {
        let schedule = rfc8448_schedule(HandshakeRole::Initiator);
        assert_eq!(
            hex::encode(schedule.handshake_secret.expose()),
            "1dc826e93606aa6fdc0aadc12f741b01046aa6b99f691ed221a9f0ca043fbeac"
        );
        assert_eq!(
            hex::encode(schedule.finished_base_secret(HandshakeRole::Initiator)?.expose()),
            "b3eddb126e067f35a780b3abf45e2d8f3b1a950738f52e9600746a0e27a55a21"
        );
        assert_eq!(
            hex::encode(schedule.finished_base_secret(HandshakeRole::Responder)?.expose()),
            "b67b7d690cc16c4e75e54213cb2d37b4e9c912bcded9105d42befd59d391ad38"
        );
        Ok(())
    }

    #[test]
    fn tls13_application_secrets_match_rfc8448() -> Result<()> {
        let mut schedule = rfc8448_schedule(HandshakeRole::Initiator);
        let context = unhex(SERVER_FINISHED_HASH);

        let server_ap = schedule.derive_secret(SecretLabel::ServerApplicationTraffic, &context)?;
        assert_eq!(
            hex::encode(schedule.master_secret()?.expose()),
            "18df06843d13a08bf2a449844c5f8a478001bc4d4c627984d5a41da8d0402919"
        );
        assert_eq!(
            hex::encode(server_ap.expose()),
            "a11af9f05531f856ad47116b45a950328204b4f44bfb6b3a4b4f1f3fcb631643"
        );
        let client_ap = schedule.derive_secret(SecretLabel::ClientApplicationTraffic, &context)?;
        assert_eq!(
            hex::encode(client_ap.expose()),
            "9e40646ce79a7f9dc05af8889bce6552875afa0b06df0087f792ebb7c17504a5"
        );

        schedule.transition_traffic_keys(Direction::Read, &server_ap)?;
        let keys = schedule.traffic_keys(Direction::Read).unwrap();
        assert_eq!(hex::encode(keys.key.expose()), "9f02283b6c9c07efc26bb9f2ac92e356");
        assert_eq!(hex::encode(keys.iv.expose()), "cf782b88dd83549aadf1e984");
        assert!(schedule.traffic_keys(Direction::Write).is_none());
        Ok(())
    }

    #[test]
    fn tls13_schedule_rejects_legacy_suite() {
        let err = Tls13KeySchedule::new(
            CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA,
            HandshakeRole::Initiator,
            None,
            &[0; 32],
            &[0; 32],
        )
        .unwrap_err();
        assert!(matches!(err, HandshakeError::UnsupportedVersion(_)));
    }

    fn prf_pair(version: ProtocolVersion, suite: CipherSuite) -> (PrfKeySchedule, PrfKeySchedule) {
        let master =
            PrfKeySchedule::derive_master_secret(version, suite, &[0x03; 48], &[0x11; 32], &[0x22; 32])
                .unwrap();
        let client = PrfKeySchedule::new(
            version,
            suite,
            HandshakeRole::Initiator,
            master.clone(),
            [0x11; 32],
            [0x22; 32],
        )
        .unwrap();
        let server = PrfKeySchedule::new(
            version,
            suite,
            HandshakeRole::Responder,
            master,
            [0x11; 32],
            [0x22; 32],
        )
        .unwrap();
        (client, server)
    }

    #[test]
    fn prf_write_keys_mirror_peer_read_keys() -> Result<()> {
        for (version, suite) in [
            (ProtocolVersion::Ssl30, CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA),
            (ProtocolVersion::Tls10, CipherSuite::TLS_RSA_WITH_AES_256_CBC_SHA),
            (ProtocolVersion::Tls11, CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA),
            (ProtocolVersion::Tls12, CipherSuite::TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384),
        ] {
            let (mut client, mut server) = prf_pair(version, suite);
            let master = client.finished_base_secret(HandshakeRole::Initiator)?.clone();
            client.transition_traffic_keys(Direction::Write, &master)?;
            server.transition_traffic_keys(Direction::Read, &master)?;
            assert_eq!(
                client.traffic_keys(Direction::Write),
                server.traffic_keys(Direction::Read),
                "{version}"
            );

            server.transition_traffic_keys(Direction::Write, &master)?;
            assert_ne!(
                client.traffic_keys(Direction::Write),
                server.traffic_keys(Direction::Write),
                "{version}"
            );
        }
        Ok(())
    }

    #[test]
    fn prf_key_sizes_follow_suite_and_version() -> Result<()> {
        let (mut tls10, _) = prf_pair(ProtocolVersion::Tls10, CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA);
        let master = tls10.master_secret.clone();
        tls10.transition_traffic_keys(Direction::Write, &master)?;
        let keys = tls10.traffic_keys(Direction::Write).unwrap();
        assert_eq!((keys.mac_key.len(), keys.key.len(), keys.iv.len()), (20, 16, 16));

        let (mut tls12, _) = prf_pair(ProtocolVersion::Tls12, CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA);
        tls12.transition_traffic_keys(Direction::Write, &master)?;
        let keys = tls12.traffic_keys(Direction::Write).unwrap();
        assert_eq!((keys.mac_key.len(), keys.key.len(), keys.iv.len()), (20, 16, 0));

        let (mut gcm, _) = prf_pair(
            ProtocolVersion::Tls12,
            CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256,
        );
        gcm.transition_traffic_keys(Direction::Write, &master)?;
        let keys = gcm.traffic_keys(Direction::Write).unwrap();
        assert_eq!((keys.mac_key.len(), keys.key.len(), keys.iv.len()), (0, 16, 4));
        Ok(())
    }

    #[test]
    fn prf_schedule_has_no_tls13_secrets() {
        let (mut client, _) = prf_pair(ProtocolVersion::Tls12, CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA);
        assert!(client.derive_secret(SecretLabel::ResumptionMaster, &[0; 32]).is_err());
        assert!(PrfKeySchedule::new(
            ProtocolVersion::Tls13,
            CipherSuite::TLS_AES_128_GCM_SHA256,
            HandshakeRole::Initiator,
            Secret::new(vec![0; 48]),
            [0; 32],
            [0; 32],
        )
        .is_err());
    }
}
