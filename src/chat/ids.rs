//! Identifier generation for sessions and messages

use rand::rngs::OsRng;
use rand::{Rng, TryRngCore};

/// Prefix carried by every generated identifier
pub const ID_PREFIX: &str = "chat_";

/// Generate a collision-resistant identifier
///
/// Uses the operating system CSPRNG laid out as a UUID v4. If the OS source
/// is unavailable, falls back to the current time in milliseconds plus two
/// thread-local random words. Uniqueness is best-effort, not guaranteed.
///
/// # Examples
///
/// ```
/// use chatbridge::chat::generate_unique_id;
///
/// let id = generate_unique_id();
/// assert!(id.starts_with("chat_"));
/// ```
pub fn generate_unique_id() -> String {
    let mut bytes = [0u8; 16];
    match OsRng.try_fill_bytes(&mut bytes) {
        Ok(()) => {
            let uuid = uuid::Builder::from_random_bytes(bytes).into_uuid();
            format!("{}{}", ID_PREFIX, uuid)
        }
        Err(e) => {
            tracing::warn!("OS random source unavailable, using fallback ids: {}", e);
            fallback_id()
        }
    }
}

fn fallback_id() -> String {
    let mut rng = rand::rng();
    format!(
        "{}{}_{}{}",
        ID_PREFIX,
        chrono::Utc::now().timestamp_millis(),
        to_base36(rng.random::<u64>()),
        to_base36(rng.random::<u64>())
    )
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ids_are_prefixed() {
        assert!(generate_unique_id().starts_with(ID_PREFIX));
        assert!(fallback_id().starts_with(ID_PREFIX));
    }

    #[test]
    fn test_no_collisions_in_practical_sample() {
        let ids: HashSet<String> = (0..10_000).map(|_| generate_unique_id()).collect();
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn test_fallback_no_collisions_in_practical_sample() {
        let ids: HashSet<String> = (0..10_000).map(|_| fallback_id()).collect();
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn test_to_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
    }
}
