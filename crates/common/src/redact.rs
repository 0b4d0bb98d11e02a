/// Placeholder printed instead of a secret value.
pub const REDACTED: &str = "[REDACTED]";

/// Mask a secret for logs and `Debug` output.
///
/// Keys long enough to be real keep their last four characters so operators can
/// tell two keys apart; anything shorter is fully masked.
#[must_use]
pub fn redact_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() < 12 {
        return REDACTED.to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("…{tail}")
}
