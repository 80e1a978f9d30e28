// Pricing module
// Author: kelexine (https://github.com/kelexine)

mod table;

pub use table::{PriceDimension, PricingTable, PricingUpdate};
