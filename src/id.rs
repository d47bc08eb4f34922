//! Short URL-safe identifier generation for new tags and articles.

use uuid::Uuid;

const ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// Generate a short, URL-safe unique identifier.
///
/// The 128 bits of a v4 UUID rendered in a 64-symbol alphabet: 22
/// characters carrying the full UUID entropy.
pub fn short_id() -> String {
    encode(Uuid::new_v4().as_u128())
}

fn encode(mut bits: u128) -> String {
    let mut out = String::with_capacity(22);
    for _ in 0..22 {
        out.push(ALPHABET[(bits & 0x3f) as usize] as char);
        bits >>= 6;
    }
    out
}
