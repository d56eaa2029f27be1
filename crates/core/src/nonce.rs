//! Time-bucketed anti-forgery tokens.
//!
//! A nonce is the truncated HMAC-SHA256 of `tick|user|action`, where the
//! tick advances every half lifetime. A nonce verifies during the tick it was
//! issued in and the one after, so its real lifetime is between half and one
//! full lifetime.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::types::Timestamp;

type HmacSha256 = Hmac<Sha256>;

/// Action name guarding every mutating admin endpoint.
pub const NONCE_ACTION: &str = "tcd_ajax_nonce";

/// Default nonce lifetime (one day).
pub const DEFAULT_NONCE_LIFETIME_SECS: i64 = 86_400;

/// Hex characters kept from the digest.
const NONCE_LEN: usize = 10;

fn tick(now: Timestamp, lifetime_secs: i64) -> i64 {
    let half = (lifetime_secs / 2).max(1);
    let secs = now.timestamp();
    secs.div_euclid(half) + i64::from(secs.rem_euclid(half) != 0)
}

fn digest(secret: &[u8], tick: i64, user: &str, action: &str) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(format!("{tick}|{user}|{action}").as_bytes());
    let bytes = mac.finalize().into_bytes();
    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    Some(hex[..NONCE_LEN].to_string())
}

/// Issue a nonce for `user` and `action`.
pub fn create_nonce(
    secret: &[u8],
    user: &str,
    action: &str,
    now: Timestamp,
    lifetime_secs: i64,
) -> String {
    digest(secret, tick(now, lifetime_secs), user, action).unwrap_or_default()
}

/// Check a nonce against the current and previous tick.
pub fn verify_nonce(
    secret: &[u8],
    nonce: &str,
    user: &str,
    action: &str,
    now: Timestamp,
    lifetime_secs: i64,
) -> bool {
    if nonce.len() != NONCE_LEN {
        return false;
    }
    let current = tick(now, lifetime_secs);
    [current, current - 1].into_iter().any(|t| {
        digest(secret, t, user, action).is_some_and(|expected| constant_time_eq(&expected, nonce))
    })
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    a.len() == b.len()
        && a.bytes()
            .zip(b.bytes())
            .fold(0u8, |acc, (x, y)| acc | (x ^ y))
            == 0
}
