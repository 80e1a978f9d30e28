//! Model naming helpers shared by pricing and cache identity.
//!
//! - `mapping`: canonical model identifiers and model-class detection

// Author: kelexine (https://github.com/kelexine)

pub mod mapping;

pub use mapping::{canonical_model, ModelClass};
