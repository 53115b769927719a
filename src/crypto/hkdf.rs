//! HKDF primitives for the TLS 1.3 key schedule (RFC 8446 §7.1).
//!
//! ```text
//! HKDF-Expand-Label(Secret, Label, Context, Length) =
//!     HKDF-Expand(Secret, HkdfLabel, Length)
//!
//! struct {
//!     uint16 length = Length;
//!     opaque label<7..255> = "tls13 " + Label;
//!     opaque context<0..255> = Context;
//! } HkdfLabel;
//!
//! Derive-Secret(Secret, Label, Messages) =
//!     HKDF-Expand-Label(Secret, Label, Transcript-Hash(Messages), Hash.length)
//! ```

use crate::crypto::suite::HashAlgorithm;
use crate::error::{HandshakeError, Result};
use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use sha2::{Sha256, Sha384};

const TLS13_LABEL_PREFIX: &[u8] = b"tls13 ";

/// HKDF-Extract. A missing salt is treated as `Hash.length` zero bytes.
pub fn hkdf_extract(hash: HashAlgorithm, salt: Option<&[u8]>, ikm: &[u8]) -> Vec<u8> {
    match hash {
        HashAlgorithm::Sha256 => Hkdf::<Sha256>::extract(salt, ikm).0.to_vec(),
        HashAlgorithm::Sha384 => Hkdf::<Sha384>::extract(salt, ikm).0.to_vec(),
    }
}

/// HKDF-Expand with a raw `info` string.
pub fn hkdf_expand(hash: HashAlgorithm, prk: &[u8], info: &[u8], length: usize) -> Result<Vec<u8>> {
    let mut okm = vec![0u8; length];
    let expanded = match hash {
        HashAlgorithm::Sha256 => Hkdf::<Sha256>::from_prk(prk)
            .map_err(|_| HandshakeError::key_derivation("PRK shorter than SHA-256 output"))?
            .expand(info, &mut okm),
        HashAlgorithm::Sha384 => Hkdf::<Sha384>::from_prk(prk)
            .map_err(|_| HandshakeError::key_derivation("PRK shorter than SHA-384 output"))?
            .expand(info, &mut okm),
    };
    expanded.map_err(|_| {
        HandshakeError::key_derivation(format!("HKDF expand of {length} bytes is too long"))
    })?;
    Ok(okm)
}

/// HKDF-Expand-Label. `label` is given without the "tls13 " prefix.
pub fn hkdf_expand_label(
    hash: HashAlgorithm,
    secret: &[u8],
    label: &[u8],
    context: &[u8],
    length: usize,
) -> Result<Vec<u8>> {
    let info = build_hkdf_label(length, label, context)?;
    hkdf_expand(hash, secret, &info, length)
}

/// Derive-Secret over an already computed transcript hash.
pub fn derive_secret(
    hash: HashAlgorithm,
    secret: &[u8],
    label: &[u8],
    transcript_hash: &[u8],
) -> Result<Vec<u8>> {
    hkdf_expand_label(hash, secret, label, transcript_hash, hash.output_len())
}

/// HMAC with the suite hash, as used for TLS 1.3 verify_data.
pub fn hmac_hash(hash: HashAlgorithm, key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    match hash {
        HashAlgorithm::Sha256 => {
            let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(key)
                .map_err(|_| HandshakeError::key_derivation("HMAC-SHA256 key error"))?;
            mac.update(data);
            Ok(mac.finalize().into_bytes().to_vec())
        }
        HashAlgorithm::Sha384 => {
            let mut mac = <Hmac<Sha384> as Mac>::new_from_slice(key)
                .map_err(|_| HandshakeError::key_derivation("HMAC-SHA384 key error"))?;
            mac.update(data);
            Ok(mac.finalize().into_bytes().to_vec())
        }
    }
}

fn build_hkdf_label(length: usize, label: &[u8], context: &[u8]) -> Result<Vec<u8>> {
    let length = u16::try_from(length)
        .map_err(|_| HandshakeError::key_derivation("HkdfLabel length exceeds u16"))?;
    let full_label_len = TLS13_LABEL_PREFIX.len() + label.len();
    if full_label_len > 255 || context.len() > 255 {
        return Err(HandshakeError::key_derivation(
            "HkdfLabel label or context exceeds 255 bytes",
        ));
    }

    let mut hkdf_label = Vec::with_capacity(2 + 1 + full_label_len + 1 + context.len());
    hkdf_label.extend_from_slice(&length.to_be_bytes());
    hkdf_label.push(full_label_len as u8);
    hkdf_label.extend_from_slice(TLS13_LABEL_PREFIX);
    hkdf_label.extend_from_slice(label);
    hkdf_label.push(context.len() as u8);
    hkdf_label.extend_from_slice(context);
    Ok(hkdf_label)
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 8448 §3, server handshake traffic secret and its finished key.
    const SERVER_HS_TRAFFIC: &str =
        "b67b7d690cc16c4e75e54213cb2d37b4e9c912bcded9105d42befd59d391ad38";
    const SERVER_FINISHED_KEY: &str =
        "008d3b66f816ea559f96b537e885c31fc068bf492c652f01f288a1d8cdc19fc8";

    #[test]
    fn finished_key_matches_rfc8448() -> Result<()> {
        let secret = hex::decode(SERVER_HS_TRAFFIC).unwrap();
        let key = hkdf_expand_label(HashAlgorithm::Sha256, &secret, b"finished", &[], 32)?;
        assert_eq!(hex::encode(key), SERVER_FINISHED_KEY);
        Ok(())
    }

    #[test]
    fn hkdf_label_layout() -> Result<()> {
        let info = build_hkdf_label(32, b"finished", &[])?;
        assert_eq!(&info[..2], &[0x00, 0x20]);
        assert_eq!(info[2] as usize, b"tls13 finished".len());
        assert_eq!(&info[3..17], b"tls13 finished");
        assert_eq!(info[17], 0);
        assert_eq!(info.len(), 18);
        Ok(())
    }

    #[test]
    fn oversized_context_is_rejected() {
        let err = hkdf_expand_label(HashAlgorithm::Sha256, &[0; 32], b"finished", &[0; 256], 32)
            .unwrap_err();
        assert!(matches!(err, HandshakeError::KeyDerivationFailure(_)));
    }

    #[test]
    fn short_prk_is_rejected() {
        assert!(hkdf_expand(HashAlgorithm::Sha384, &[0; 32], b"", 48).is_err());
    }

    #[test]
    fn extract_output_has_hash_length() {
        assert_eq!(hkdf_extract(HashAlgorithm::Sha256, None, &[0; 32]).len(), 32);
        assert_eq!(hkdf_extract(HashAlgorithm::Sha384, Some(&[1; 48]), b"ikm").len(), 48);
    }
}
