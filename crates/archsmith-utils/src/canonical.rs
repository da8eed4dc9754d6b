//! Content digests and canonical JSON.

use anyhow::{Context, Result};
use serde::Serialize;

/// BLAKE3 digest of `bytes` as lowercase hex.
#[must_use]
pub fn blake3_hex(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

/// Serialize `value` as RFC 8785 (JCS) canonical JSON.
///
/// # Errors
///
/// Returns an error if the value cannot be represented as JSON.
pub fn to_canonical_json<T: Serialize>(value: &T) -> Result<String> {
    let json_value = serde_json::to_value(value).context("Failed to convert value to JSON")?;
    let json_bytes = serde_json_canonicalizer::to_vec(&json_value)
        .context("Failed to canonicalize JSON")?;
    String::from_utf8(json_bytes).context("Canonical JSON is not valid UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_json_sorts_keys() -> Result<()> {
        let value = json!({"b": 1, "a": [true, null], "c": "x"});
        assert_eq!(to_canonical_json(&value)?, r#"{"a":[true,null],"b":1,"c":"x"}"#);
        Ok(())
    }

    #[test]
    fn test_blake3_hex_is_stable() {
        let a = blake3_hex(b"architecture");
        assert_eq!(a.len(), 64);
        assert_eq!(a, blake3_hex(b"architecture"));
        assert_ne!(a, blake3_hex(b"architecture!"));
    }
}
