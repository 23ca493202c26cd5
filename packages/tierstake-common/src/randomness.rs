use cosmwasm_std::Uint256;
use sha2::{Digest, Sha256};

/// Derive the id of a randomness request.
///
/// `request_id = hex( sha256( consumer_address_bytes || nonce_u64_be || block_height_u64_be ) )`
///
/// The nonce is the consumer's round counter, so a consumer never issues the
/// same id twice and ids of different consumers cannot collide.
pub fn derive_request_id(consumer: &str, nonce: u64, block_height: u64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(consumer.as_bytes());
    hasher.update(nonce.to_be_bytes());
    hasher.update(block_height.to_be_bytes());
    hex::encode(hasher.finalize())
}

/// Interpret 32 bytes of beacon randomness as a big-endian 256-bit integer.
pub fn random_value_from_bytes(randomness: &[u8; 32]) -> Uint256 {
    Uint256::from_be_bytes(*randomness)
}
