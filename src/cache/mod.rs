// Cache management module
// Author: kelexine (https://github.com/kelexine)

pub mod clock;
pub mod estimator;
pub mod identity;
pub mod ledger;
pub mod models;

pub use clock::{Clock, ManualClock, SystemClock};
pub use estimator::{CharHeuristic, TokenEstimator};
pub use identity::resolve_identity;
pub use ledger::CacheLedger;
pub use models::{CacheAdvice, CacheConfig, CacheEntry, CacheStats};
