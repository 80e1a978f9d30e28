// Cache identity derivation
// Author: kelexine (https://github.com/kelexine)

use crate::models::canonical_model;
use sha2::{Digest, Sha256};

const ID_PREFIX: &str = "cache_";

/// Derive the cache identity for a payload.
///
/// Pure function of (canonical model, system prompt, content). Each field is
/// length-prefixed before hashing so that shifting text between fields never
/// yields the same identity. A missing system prompt hashes like an empty one.
pub fn resolve_identity(model: &str, system_prompt: Option<&str>, content: &str) -> String {
    let model = canonical_model(model);
    let mut hasher = Sha256::new();

    for field in [
        model.as_bytes(),
        system_prompt.unwrap_or_default().as_bytes(),
        content.as_bytes(),
    ] {
        hasher.update((field.len() as u64).to_le_bytes());
        hasher.update(field);
    }

    let digest = hasher.finalize();
    format!("{}{}", ID_PREFIX, hex::encode(&digest[..16]))
}
