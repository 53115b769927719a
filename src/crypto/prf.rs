//! Pre-TLS 1.3 pseudorandom functions.
//!
//! ```text
//! TLS 1.2:      PRF(secret, label, seed) = P_<hash>(secret, label + seed)
//! TLS 1.0/1.1:  PRF(secret, label, seed) = P_MD5(S1, label + seed) XOR
//!                                          P_SHA-1(S2, label + seed)
//!
//! P_hash(secret, seed) = HMAC_hash(secret, A(1) + seed) ||
//!                        HMAC_hash(secret, A(2) + seed) || ...
//! A(0) = seed, A(i) = HMAC_hash(secret, A(i-1))
//! ```
//!
//! 1.3 之前版本的伪随机函数。

use crate::crypto::suite::HashAlgorithm;
use crate::error::{HandshakeError, Result};
use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use md5::Md5;
use sha1::{Digest, Sha1};
use sha2::{Sha256, Sha384};
use zeroize::Zeroize;

/// TLS 1.2 PRF, keyed to the cipher suite's hash. Fills `output` completely.
///
/// TLS 1.2 伪随机函数，使用密码套件指定的哈希。
pub fn tls12_prf(
    hash: HashAlgorithm,
    secret: &[u8],
    label: &[u8],
    seed: &[u8],
    output: &mut [u8],
) -> Result<()> {
    let label_and_seed = [label, seed].concat();
    match hash {
        HashAlgorithm::Sha256 => p_hash::<Hmac<Sha256>>(secret, &label_and_seed, output),
        HashAlgorithm::Sha384 => p_hash::<Hmac<Sha384>>(secret, &label_and_seed, output),
    }
}

/// TLS 1.0/1.1 PRF (RFC 2246 §5).
///
/// The secret is split into two halves that overlap by one byte when its
/// length is odd.
///
/// TLS 1.0/1.1 伪随机函数。密钥被拆分为两半，长度为奇数时两半重叠一个字节。
pub fn tls10_prf(secret: &[u8], label: &[u8], seed: &[u8], output: &mut [u8]) -> Result<()> {
    let half = secret.len().div_ceil(2);
    let s1 = &secret[..half];
    let s2 = &secret[secret.len() - half..];
    let label_and_seed = [label, seed].concat();

    p_hash::<Hmac<Md5>>(s1, &label_and_seed, output)?;

    let mut sha_stream = vec![0u8; output.len()];
    p_hash::<Hmac<Sha1>>(s2, &label_and_seed, &mut sha_stream)?;
    for (out, sha) in output.iter_mut().zip(sha_stream.iter()) {
        *out ^= sha;
    }
    sha_stream.zeroize();
    Ok(())
}

/// SSL 3.0 key block (RFC 6101 §6.2.2):
/// `MD5(ms + SHA('A' + ms + server_random + client_random)) + MD5(ms + SHA('BB' + ...)) + ...`
pub fn ssl30_key_block(
    master_secret: &[u8],
    server_random: &[u8],
    client_random: &[u8],
    len: usize,
) -> Result<Vec<u8>> {
    // 'A' through 'Z' yields at most 26 MD5 blocks.
    if len > 26 * 16 {
        return Err(HandshakeError::key_derivation(format!(
            "SSL 3.0 key block of {len} bytes exceeds 416"
        )));
    }

    let mut block = Vec::with_capacity(len + 16);
    let mut round = 0u8;
    while block.len() < len {
        let prefix = vec![b'A' + round; usize::from(round) + 1];
        let inner = Sha1::new()
            .chain_update(&prefix)
            .chain_update(master_secret)
            .chain_update(server_random)
            .chain_update(client_random)
            .finalize();
        let outer = Md5::new()
            .chain_update(master_secret)
            .chain_update(inner)
            .finalize();
        block.extend_from_slice(&outer);
        round += 1;
    }
    block.truncate(len);
    Ok(block)
}

fn p_hash<M>(secret: &[u8], seed: &[u8], output: &mut [u8]) -> Result<()>
where
    M: Mac + KeyInit + Clone,
{
    let keyed = <M as Mac>::new_from_slice(secret)
        .map_err(|_| HandshakeError::key_derivation("HMAC key error for P_hash"))?;

    let mut a = seed.to_vec();
    let mut filled = 0;
    while filled < output.len() {
        let mut mac_a = keyed.clone();
        mac_a.update(&a);
        a = mac_a.finalize().into_bytes().to_vec();

        let mut mac_p = keyed.clone();
        mac_p.update(&a);
        mac_p.update(seed);
        let block = mac_p.finalize().into_bytes();

        let take = block.len().min(output.len() - filled);
        output[filled..filled + take].copy_from_slice(&block[..take]);
        filled += take;
    }
    a.zeroize();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "9bbe436ba940f017b17652849a71db35";
    const SEED: &str = "a0ba9f936cda311827a6f796ffd5198c";

    fn unhex(s: &str) -> Vec<u8> {
        hex::decode(s).unwrap()
    }

    #[test]
    fn tls12_sha256_published_vector() -> Result<()> {
        let mut output = [0u8; 100];
        tls12_prf(
            HashAlgorithm::Sha256,
            &unhex(SECRET),
            b"test label",
            &unhex(SEED),
            &mut output,
        )?;
        assert_eq!(
            hex::encode(output),
            "e3f229ba727be17b8d122620557cd453c2aab21d07c3d495329b52d4e61edb5a\
             6b301791e90d35c9c9a46b4e14baf9af0fa022f7077def17abfd3797c0564bab\
             4fbc91666e9def9b97fce34f796789baa48082d122ee42c5a72e5a5110fff701\
             87347b66"
        );
        Ok(())
    }

    #[test]
    fn tls12_shorter_output_is_prefix() -> Result<()> {
        let mut long = [0u8; 64];
        let mut short = [0u8; 12];
        tls12_prf(HashAlgorithm::Sha384, b"secret", b"label", b"seed", &mut long)?;
        tls12_prf(HashAlgorithm::Sha384, b"secret", b"label", b"seed", &mut short)?;
        assert_eq!(&long[..12], &short[..]);
        Ok(())
    }

    #[test]
    fn tls12_hash_changes_output() -> Result<()> {
        let mut a = [0u8; 32];
        let mut b = [0u8; 32];
        tls12_prf(HashAlgorithm::Sha256, b"secret", b"label", b"seed", &mut a)?;
        tls12_prf(HashAlgorithm::Sha384, b"secret", b"label", b"seed", &mut b)?;
        assert_ne!(a, b);
        Ok(())
    }

    #[test]
    fn tls10_known_answer() -> Result<()> {
        let mut output = [0u8; 32];
        tls10_prf(&unhex(SECRET), b"test label", &unhex(SEED), &mut output)?;
        assert_eq!(
            hex::encode(output),
            "661740e6f98bc901efd2738502a71c03f76dd2f86298549b1148eff06714cf0f"
        );
        Ok(())
    }

    #[test]
    fn tls10_odd_secret_halves_overlap() -> Result<()> {
        let mut output = [0u8; 16];
        tls10_prf(&[1, 2, 3, 4, 5], b"test label", &unhex(SEED), &mut output)?;
        assert_eq!(hex::encode(output), "60d83fc7f44562fd5f54dcd658614ce8");
        Ok(())
    }

    #[test]
    fn ssl30_key_block_known_answer() -> Result<()> {
        let master: Vec<u8> = (0u8..48).collect();
        let block = ssl30_key_block(&master, &[0x11; 32], &[0x22; 32], 40)?;
        assert_eq!(
            hex::encode(block),
            "e3cdc731e4c550f4dd3d673e3341b13373ccd4f19a02a58559bda110416bd50589601ec712f3749b"
        );
        Ok(())
    }

    #[test]
    fn ssl30_key_block_is_bounded() {
        assert!(ssl30_key_block(&[0; 48], &[0; 32], &[0; 32], 417).is_err());
    }
}
