//! drand quicknet beacon verification and round arithmetic.
//!
//! Quicknet runs the unchained `bls-unchained-g1-rfc9380` scheme: signatures
//! live on G1, the public key on G2, and a round's message depends only on
//! the round number.

use drand_verify::{G2PubkeyRfc, Pubkey};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Quicknet public key (G2, 96 bytes), hex encoded.
pub const QUICKNET_PK_HEX: &str = "83cf0f2896adee7eb8b5f01fcad3912212c437e0073e911fb90022d3e760183c8c4b450b6a0a6c3ac6a5776a2d1064510d1fec758c921cc22b0e17e63aaf4bcb5ed66304de9cf809bd274ca73bab4af5a6e9c76a4bc09e76eae8991ef5ece45a";

#[derive(Error, Debug, PartialEq)]
pub enum VerifyError {
    #[error("invalid pubkey length (expected 96 bytes)")]
    InvalidPubkeyLength,
    #[error("invalid pubkey (failed to parse G2 point)")]
    InvalidPubkey,
    #[error("pairing check errored: {0}")]
    Pairing(String),
    #[error("signature does not match round {round}")]
    InvalidSignature { round: u64 },
}

/// Check `signature` against `round` and return `sha256(signature)`.
pub fn verify_beacon(
    pubkey_bytes: &[u8],
    round: u64,
    signature: &[u8],
) -> Result<[u8; 32], VerifyError> {
    let pk_fixed: [u8; 96] = pubkey_bytes
        .try_into()
        .map_err(|_| VerifyError::InvalidPubkeyLength)?;
    let pk = G2PubkeyRfc::from_fixed(pk_fixed).map_err(|_| VerifyError::InvalidPubkey)?;

    // unchained: no previous signature
    let valid = pk
        .verify(round, &[], signature)
        .map_err(|e| VerifyError::Pairing(format!("{e:?}")))?;
    if !valid {
        return Err(VerifyError::InvalidSignature { round });
    }

    Ok(Sha256::digest(signature).into())
}

/// Latest drand round published at `now`. Round 1 is emitted at genesis;
/// zero means the network has not started yet.
pub fn current_round(genesis_time: u64, period_seconds: u64, now: u64) -> u64 {
    if now < genesis_time || period_seconds == 0 {
        return 0;
    }
    (now - genesis_time) / period_seconds + 1
}

/// The first round whose signature cannot be known at `now`.
pub fn next_round(genesis_time: u64, period_seconds: u64, now: u64) -> u64 {
    current_round(genesis_time, period_seconds, now) + 1
}
