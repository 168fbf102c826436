//! Item identifiers
//!
//! Two generators are provided:
//!
//! - [`IdGenerator::next`] derives an id from the current millisecond
//!   timestamp. Ids are base-36, zero-padded and hyphen-grouped
//!   (`00LQX-J2K8A`), so they sort lexically in creation order.
//! - [`IdGenerator::random`] builds ids from random blocks and retries
//!   until the id is not already taken.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use rand::Rng;

/// Width of the zero-padded base-36 timestamp
const TIMESTAMP_WIDTH: usize = 10;

/// Number of characters before the hyphen
const GROUP_SPLIT: usize = 5;

/// Alphabet used by random ids
pub const RANDOM_ALPHABET: &[u8] = b"ABCDEF1234567890";

/// Last timestamp handed out, process-wide
static LAST_TIMESTAMP: AtomicI64 = AtomicI64::new(0);

/// Identifier generator
pub struct IdGenerator;

impl IdGenerator {
    /// Generate a new timestamp id
    ///
    /// Spins on the clock until it moves past the last issued timestamp,
    /// so ids are strictly increasing within the process.
    pub fn next() -> String {
        format_timestamp(next_timestamp())
    }

    /// Generate a random id of `length` characters in blocks of
    /// `blocksize`, optionally prefixed
    ///
    /// Blocks (and the prefix) are separated by a single space. A new id is
    /// drawn whenever `exists` reports a collision.
    pub fn random(
        length: usize,
        blocksize: usize,
        prefix: &str,
        exists: impl Fn(&str) -> bool,
    ) -> String {
        let blocksize = blocksize.max(1);
        let blocks = length / blocksize;
        let mut rng = rand::thread_rng();

        loop {
            let mut parts = Vec::with_capacity(blocks + 1);
            if !prefix.is_empty() {
                parts.push(prefix.to_string());
            }
            for _ in 0..blocks {
                let block: String = (0..blocksize)
                    .map(|_| RANDOM_ALPHABET[rng.gen_range(0..RANDOM_ALPHABET.len())] as char)
                    .collect();
                parts.push(block);
            }

            let id = parts.join(" ");
            if !exists(&id) {
                return id;
            }
        }
    }
}

/// Read the clock until it exceeds the last issued timestamp, then record it
fn next_timestamp() -> i64 {
    loop {
        let last = LAST_TIMESTAMP.load(Ordering::SeqCst);
        let mut now = Utc::now().timestamp_millis();
        while now <= last {
            std::hint::spin_loop();
            now = Utc::now().timestamp_millis();
        }
        if LAST_TIMESTAMP
            .compare_exchange(last, now, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            return now;
        }
    }
}

/// Format a millisecond timestamp as a grouped, upper-case base-36 id
pub fn format_timestamp(millis: i64) -> String {
    let encoded = format!(
        "{:0>width$}",
        to_base36(millis.max(0) as u128),
        width = TIMESTAMP_WIDTH
    );
    let (head, tail) = encoded.split_at(GROUP_SPLIT);
    format!("{}-{}", head, tail)
}

/// Upper-case base-36 encoding
pub(crate) fn to_base36(mut value: u128) -> String {
    const DIGITS: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}
