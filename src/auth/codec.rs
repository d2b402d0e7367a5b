// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wire codec for signed tokens.
//!
//! A token is `base64url(timestamp_be[4] ‖ compact_signature)`. The first
//! four bytes are the signed message; everything after them is signature
//! material. Encoding emits padded base64url; decoding also accepts the
//! unpadded form some clients produce.

use base64ct::{Base64Url, Base64UrlUnpadded, Encoding};

use super::AuthError;

/// Length of the big-endian unix timestamp prefix.
pub const TIMESTAMP_LEN: usize = 4;

/// A decoded token: timestamp bytes plus the raw signature that covers them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawToken {
    pub timestamp_bytes: [u8; TIMESTAMP_LEN],
    pub signature: Vec<u8>,
}

impl RawToken {
    /// Build a token from a unix timestamp (seconds) and signature bytes.
    pub fn new(timestamp: u32, signature: Vec<u8>) -> Self {
        Self {
            timestamp_bytes: timestamp.to_be_bytes(),
            signature,
        }
    }

    /// The signed timestamp, in unix seconds.
    pub fn timestamp(&self) -> u32 {
        u32::from_be_bytes(self.timestamp_bytes)
    }
}

/// Decode a transport token into its timestamp and signature parts.
///
/// # Errors
/// `AuthError::MalformedToken` if the input is not base64url or is shorter
/// than the timestamp prefix.
pub fn decode(token: &str) -> Result<RawToken, AuthError> {
    let bytes = Base64Url::decode_vec(token)
        .or_else(|_| Base64UrlUnpadded::decode_vec(token))
        .map_err(|_| AuthError::MalformedToken)?;

    if bytes.len() < TIMESTAMP_LEN {
        return Err(AuthError::MalformedToken);
    }

    let (ts, sig) = bytes.split_at(TIMESTAMP_LEN);
    let mut timestamp_bytes = [0u8; TIMESTAMP_LEN];
    timestamp_bytes.copy_from_slice(ts);

    Ok(RawToken {
        timestamp_bytes,
        signature: sig.to_vec(),
    })
}

/// Encode timestamp and signature bytes into a transport token.
pub fn encode(timestamp_bytes: &[u8; TIMESTAMP_LEN], signature: &[u8]) -> String {
    let mut bytes = Vec::with_capacity(TIMESTAMP_LEN + signature.len());
    bytes.extend_from_slice(timestamp_bytes);
    bytes.extend_from_slice(signature);
    Base64Url::encode_string(&bytes)
}

impl std::fmt::Display for RawToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&encode(&self.timestamp_bytes, &self.signature))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{
        engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD},
        Engine,
    };

    #[test]
    fn splits_timestamp_from_signature() {
        let token = encode(&1_700_000_000u32.to_be_bytes(), &[7u8; 65]);
        let raw = decode(&token).unwrap();
        assert_eq!(raw.timestamp(), 1_700_000_000);
        assert_eq!(raw.signature, vec![7u8; 65]);
    }

    #[test]
    fn matches_padded_url_safe_alphabet() {
        let mut bytes = 1_234_567u32.to_be_bytes().to_vec();
        bytes.extend_from_slice(&[0xfb, 0xff, 0xfe]);
        let expected = URL_SAFE.encode(&bytes);

        let raw = RawToken::new(1_234_567, vec![0xfb, 0xff, 0xfe]);
        assert_eq!(raw.to_string(), expected);
    }

    #[test]
    fn accepts_unpadded_input() {
        let mut bytes = 42u32.to_be_bytes().to_vec();
        bytes.push(0xaa);
        let unpadded = URL_SAFE_NO_PAD.encode(&bytes);

        let raw = decode(&unpadded).unwrap();
        assert_eq!(raw.timestamp(), 42);
        assert_eq!(raw.signature, vec![0xaa]);
    }

    #[test]
    fn bare_timestamp_has_empty_signature() {
        let token = URL_SAFE.encode(9u32.to_be_bytes());
        let raw = decode(&token).unwrap();
        assert_eq!(raw.timestamp(), 9);
        assert!(raw.signature.is_empty());
    }

    #[test]
    fn rejects_short_input() {
        let token = URL_SAFE.encode([1u8, 2, 3]);
        assert_eq!(decode(&token), Err(AuthError::MalformedToken));
        assert_eq!(decode(""), Err(AuthError::MalformedToken));
    }

    #[test]
    fn rejects_non_base64url() {
        assert_eq!(decode("not base64!"), Err(AuthError::MalformedToken));
        // standard alphabet characters are not url-safe
        assert_eq!(decode("ab+/cd=="), Err(AuthError::MalformedToken));
    }
}
