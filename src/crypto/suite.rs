//! Cipher-suite facts the Finished exchange needs: the PRF/HKDF hash, the
//! verify_data length, and the traffic key sizes for key transitions.
//!
//! 完成消息交换所需的密码套件信息：PRF/HKDF 哈希、verify_data 长度，
//! 以及密钥切换所需的流量密钥长度。

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha384};

/// Hash function bound to a negotiated cipher suite.
///
/// 与已协商密码套件绑定的哈希函数。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HashAlgorithm {
    Sha256,
    Sha384,
}

impl HashAlgorithm {
    pub fn output_len(self) -> usize {
        match self {
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha384 => 48,
        }
    }

    pub fn digest(self, data: &[u8]) -> Vec<u8> {
        match self {
            HashAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
            HashAlgorithm::Sha384 => Sha384::digest(data).to_vec(),
        }
    }

    /// `Hash("")`, the context of the "derived" secrets in the TLS 1.3 schedule.
    pub fn empty_hash(self) -> Vec<u8> {
        self.digest(&[])
    }
}

/// The cipher suites this crate knows how to finish a handshake for.
///
/// 本 crate 支持完成握手的密码套件。
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CipherSuite {
    TLS_RSA_WITH_AES_128_CBC_SHA,
    TLS_RSA_WITH_AES_256_CBC_SHA,
    TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256,
    TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384,
    TLS_AES_128_GCM_SHA256,
    TLS_AES_256_GCM_SHA384,
    TLS_CHACHA20_POLY1305_SHA256,
}

/// Static properties of a [`CipherSuite`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CipherSuiteInfo {
    pub id: u16,
    /// Hash for the TLS 1.2 PRF, the transcript and TLS 1.3 HKDF.
    pub hash_algorithm: HashAlgorithm,
    pub hash_length: usize,
    /// Finished verify_data length before TLS 1.3 (RFC 5246 §7.4.9).
    pub verify_data_length: usize,
    pub mac_key_length: usize,
    pub key_length: usize,
    /// Implicit IV for TLS 1.2 and earlier; full nonce length for TLS 1.3.
    pub fixed_iv_length: usize,
    pub tls13_only: bool,
}

impl CipherSuite {
    pub fn info(self) -> CipherSuiteInfo {
        let (id, hash_algorithm, mac_key_length, key_length, fixed_iv_length, tls13_only) =
            match self {
                CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA => {
                    (0x002f, HashAlgorithm::Sha256, 20, 16, 16, false)
                }
                CipherSuite::TLS_RSA_WITH_AES_256_CBC_SHA => {
                    (0x0035, HashAlgorithm::Sha256, 20, 32, 16, false)
                }
                CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256 => {
                    (0xc02f, HashAlgorithm::Sha256, 0, 16, 4, false)
                }
                CipherSuite::TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384 => {
                    (0xc02c, HashAlgorithm::Sha384, 0, 32, 4, false)
                }
                CipherSuite::TLS_AES_128_GCM_SHA256 => {
                    (0x1301, HashAlgorithm::Sha256, 0, 16, 12, true)
                }
                CipherSuite::TLS_AES_256_GCM_SHA384 => {
                    (0x1302, HashAlgorithm::Sha384, 0, 32, 12, true)
                }
                CipherSuite::TLS_CHACHA20_POLY1305_SHA256 => {
                    (0x1303, HashAlgorithm::Sha256, 0, 32, 12, true)
                }
            };

        CipherSuiteInfo {
            id,
            hash_algorithm,
            hash_length: hash_algorithm.output_len(),
            verify_data_length: 12,
            mac_key_length,
            key_length,
            fixed_iv_length,
            tls13_only,
        }
    }

    pub fn hash_algorithm(self) -> HashAlgorithm {
        self.info().hash_algorithm
    }

    /// AEAD suites carry no separate MAC key.
    pub fn is_aead(self) -> bool {
        self.info().mac_key_length == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_lengths_match_digests() {
        for hash in [HashAlgorithm::Sha256, HashAlgorithm::Sha384] {
            assert_eq!(hash.digest(b"abc").len(), hash.output_len());
        }
        assert_eq!(
            hex::encode(HashAlgorithm::Sha256.empty_hash()),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn suite_info() {
        let info = CipherSuite::TLS_AES_256_GCM_SHA384.info();
        assert_eq!(info.id, 0x1302);
        assert_eq!(info.hash_length, 48);
        assert!(info.tls13_only);

        let info = CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA.info();
        assert_eq!(info.hash_algorithm, HashAlgorithm::Sha256);
        assert_eq!(info.verify_data_length, 12);
        assert!(!info.tls13_only);

        assert!(!CipherSuite::TLS_RSA_WITH_AES_256_CBC_SHA.is_aead());
        assert!(CipherSuite::TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384.is_aead());
        assert!(CipherSuite::TLS_CHACHA20_POLY1305_SHA256.is_aead());
    }
}
