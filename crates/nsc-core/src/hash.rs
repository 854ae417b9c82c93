//! Stable hashing of serializable values.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::errors::NscError;
use crate::serde::to_canonical_json_bytes;

/// Computes a stable SHA256 hash for the provided serializable value.
pub fn stable_hash_string<T: Serialize>(value: &T) -> Result<String, NscError> {
    let bytes = to_canonical_json_bytes(value)?;
    let digest = Sha256::digest(&bytes);
    Ok(format!("{:x}", digest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_order_does_not_change_hash() {
        let a = json!({"workers": 2, "tolerance": 1e-6});
        let b = json!({"tolerance": 1e-6, "workers": 2});
        assert_eq!(stable_hash_string(&a).unwrap(), stable_hash_string(&b).unwrap());
    }
}
