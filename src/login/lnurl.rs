// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! LNURL encoding and LUD-04 signature checks.
//!
//! An LNURL is the bech32 encoding (hrp `lnurl`, upper-case, no length
//! limit) of a plain URL. Wallets scan it, decode the callback URL, sign the
//! raw `k1` bytes with their linking key and call back with `sig` (DER) and
//! `key` (compressed pubkey).

use k256::ecdsa::{signature::hazmat::PrehashVerifier, Signature};
use serde::Serialize;
use url::Url;

use crate::auth::{AuthError, Pubkey};

const LNURL_HRP: &str = "lnurl";
const CHARSET: &[u8; 32] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";
const GENERATOR: [u32; 5] = [0x3b6a57b2, 0x26508e6d, 0x1ea119fa, 0x3d4233dd, 0x2a1462b3];

/// Path of the wallet callback, relative to `PUBLIC_URL`.
const CALLBACK_PATH: [&str; 3] = ["v1", "lnauth", "callback"];

/// LNURL JSON status response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "UPPERCASE")]
pub enum LnurlResponse {
    Ok,
    Error { reason: String },
}

impl LnurlResponse {
    pub fn error(reason: impl Into<String>) -> Self {
        LnurlResponse::Error {
            reason: reason.into(),
        }
    }
}

fn polymod(values: &[u8]) -> u32 {
    let mut chk: u32 = 1;
    for value in values {
        let top = chk >> 25;
        chk = ((chk & 0x1ff_ffff) << 5) ^ u32::from(*value);
        for (i, generator) in GENERATOR.iter().enumerate() {
            if (top >> i) & 1 == 1 {
                chk ^= generator;
            }
        }
    }
    chk
}

fn hrp_expand(hrp: &str) -> Vec<u8> {
    let bytes = hrp.as_bytes();
    let mut out: Vec<u8> = bytes.iter().map(|b| b >> 5).collect();
    out.push(0);
    out.extend(bytes.iter().map(|b| b & 31));
    out
}

/// Regroup 8-bit bytes into 5-bit groups, zero-padding the tail.
fn to_base32(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() * 8 / 5 + 1);
    let mut acc: u32 = 0;
    let mut bits = 0u32;
    for byte in data {
        acc = ((acc << 8) | u32::from(*byte)) & 0xfff;
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(((acc >> bits) & 31) as u8);
        }
    }
    if bits > 0 {
        out.push(((acc << (5 - bits)) & 31) as u8);
    }
    out
}

/// Bech32-encode 5-bit `data` under a lower-case `hrp`.
pub fn bech32_encode(hrp: &str, data: &[u8]) -> String {
    let mut values = hrp_expand(hrp);
    values.extend_from_slice(data);
    values.extend_from_slice(&[0u8; 6]);
    let checksum = polymod(&values) ^ 1;

    let mut out = String::with_capacity(hrp.len() + 1 + data.len() + 6);
    out.push_str(hrp);
    out.push('1');
    for group in data {
        out.push(CHARSET[usize::from(*group)] as char);
    }
    for i in 0..6 {
        let group = (checksum >> (5 * (5 - i))) & 31;
        out.push(CHARSET[group as usize] as char);
    }
    out
}

/// Encode a URL as an upper-case `LNURL1…` string.
pub fn encode_lnurl(url: &Url) -> String {
    bech32_encode(LNURL_HRP, &to_base32(url.as_str().as_bytes())).to_uppercase()
}

/// The callback endpoint under `public_url`, keeping any path prefix.
pub fn callback_base(public_url: &Url) -> Url {
    let mut url = public_url.clone();
    url.set_query(None);
    url.set_fragment(None);
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().extend(CALLBACK_PATH);
    }
    url
}

/// The full login URL a wallet calls for challenge `k1`.
pub fn login_url(callback_base: &Url, k1: &str) -> Url {
    let mut url = callback_base.clone();
    url.query_pairs_mut()
        .append_pair("tag", "login")
        .append_pair("k1", k1)
        .append_pair("action", "login");
    url
}

/// Verify a LUD-04 callback: `sig_hex` is a DER signature by `key_hex`
/// over the raw 32 bytes of `k1_hex`.
///
/// High-S signatures are normalized before verification; some wallets emit
/// them.
pub fn verify_k1_signature(k1_hex: &str, sig_hex: &str, key_hex: &str) -> Result<Pubkey, AuthError> {
    let k1 = hex::decode(k1_hex).map_err(|_| AuthError::ChallengeNotFound)?;
    if k1.len() != 32 {
        return Err(AuthError::ChallengeNotFound);
    }

    let pubkey = Pubkey::parse(key_hex).map_err(|_| AuthError::InvalidSignature)?;
    let verifying_key = pubkey
        .verifying_key()
        .map_err(|_| AuthError::InvalidSignature)?;

    let der = hex::decode(sig_hex).map_err(|_| AuthError::InvalidSignature)?;
    let signature = Signature::from_der(&der).map_err(|_| AuthError::InvalidSignature)?;
    let signature = signature.normalize_s().unwrap_or(signature);

    verifying_key
        .verify_prehash(&k1, &signature)
        .map_err(|_| AuthError::InvalidSignature)?;

    Ok(pubkey)
}
