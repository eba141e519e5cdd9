//! Mock upstream: seeded trader profiles and the trade/quote generator.

mod generator;
mod profiles;

pub use generator::{FeedEvent, TradeFeed};
pub use profiles::seed_profiles;
