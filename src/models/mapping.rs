// Model name canonicalisation and model-class detection
// Author: kelexine (https://github.com/kelexine)

use serde::{Deserialize, Serialize};

/// Size class of a model, used to pick the minimum cacheable payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelClass {
    Pro,
    Standard,
}

impl ModelClass {
    /// Classify a model name. Any `-` separated segment equal to `pro` marks a pro-class model.
    pub fn of(model: &str) -> Self {
        let canonical = canonical_model(model);
        if canonical.split('-').any(|segment| segment == "pro") {
            ModelClass::Pro
        } else {
            ModelClass::Standard
        }
    }
}

/// Canonicalise a model identifier so that equivalent spellings share cache identity and pricing.
///
/// - surrounding whitespace is trimmed and the name is lowercased
/// - the REST resource prefix `models/` is dropped
/// - a trailing `-YYYYMMDD` release date is stripped
///
/// The rules are applied until nothing changes, so the result is a fixed point:
/// `canonical_model(&canonical_model(m)) == canonical_model(m)`.
pub fn canonical_model(model: &str) -> String {
    let mut current = model.to_string();
    loop {
        let next = canonical_step(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn canonical_step(model: &str) -> String {
    let lowered = model.trim().to_ascii_lowercase();
    let name = lowered.strip_prefix("models/").unwrap_or(&lowered);
    strip_date_suffix(name).to_string()
}

/// Strip date suffix from model names (e.g., "gemini-2.5-pro-20250617" -> "gemini-2.5-pro")
fn strip_date_suffix(model: &str) -> &str {
    // Date suffixes are 8 digits at the end: YYYYMMDD
    if model.len() > 9 && model.as_bytes()[model.len() - 9] == b'-' {
        let suffix = &model[model.len() - 8..];
        if suffix.bytes().all(|c| c.is_ascii_digit()) {
            return &model[..model.len() - 9];
        }
    }
    model
}
