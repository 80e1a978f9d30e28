// Model name canonicalisation tests
// Author: kelexine (https://github.com/kelexine)

use gemextract::models::{canonical_model, ModelClass};
use gemextract::pricing::PriceDimension;

#[test]
fn test_canonical_forms() {
    assert_eq!(canonical_model("gemini-2.5-flash"), "gemini-2.5-flash");
    assert_eq!(canonical_model("models/gemini-2.5-flash"), "gemini-2.5-flash");
    assert_eq!(canonical_model("GEMINI-2.5-PRO"), "gemini-2.5-pro");
    assert_eq!(canonical_model("gemini-2.5-pro-20250617"), "gemini-2.5-pro");
}

#[test]
fn test_unknown_models_pass_through() {
    assert_eq!(canonical_model("m1"), "m1");
    assert_eq!(canonical_model("model-a"), "model-a");
}

#[test]
fn test_model_classes() {
    assert_eq!(ModelClass::of("gemini-2.5-pro"), ModelClass::Pro);
    assert_eq!(ModelClass::of("models/gemini-1.5-pro-20240514"), ModelClass::Pro);
    assert_eq!(ModelClass::of("gemini-2.0-flash"), ModelClass::Standard);
    assert_eq!(ModelClass::of("m1"), ModelClass::Standard);
}

#[test]
fn test_pricing_uses_canonical_names() {
    let price = PriceDimension::per_model(0.3, [("models/Gemini-2.5-Pro", 1.25)]);
    assert_eq!(price.resolve("gemini-2.5-pro"), 1.25);
    assert_eq!(price.resolve("gemini-2.5-pro-20250617"), 1.25);
    assert_eq!(price.resolve("gemini-2.5-flash"), 0.3);
}
