use rust_decimal::Decimal;
use sha2::{Digest, Sha256};
use tally_core::{round_cents, OwnerId};

use crate::util::normalize_text;

/// Digest length in bytes (128 bits, 32 hex characters).
pub const FINGERPRINT_BYTES: usize = 16;

const SEPARATOR: char = '\u{1f}';

/// Content identity of a transaction: the same owner, amount (to the cent) and
/// normalized text always hash the same, regardless of when or how often it is
/// submitted. This is a duplicate-detection key, not a security boundary.
pub fn fingerprint(
    owner: &OwnerId,
    amount: Decimal,
    description: &str,
    original_text: Option<&str>,
) -> String {
    let canonical = canonical_form(owner, amount, description, original_text);
    let digest = Sha256::digest(canonical.as_bytes());
    hex::encode(&digest[..FINGERPRINT_BYTES])
}

/// The normalized string that gets hashed. `10` and `10.00` render identically.
pub fn canonical_form(
    owner: &OwnerId,
    amount: Decimal,
    description: &str,
    original_text: Option<&str>,
) -> String {
    format!(
        "{owner}{SEPARATOR}{amount:.2}{SEPARATOR}{description}{SEPARATOR}{original}",
        owner = owner.as_str().trim(),
        amount = round_cents(amount),
        description = normalize_text(description),
        original = normalize_text(original_text.unwrap_or_default()),
    )
}
