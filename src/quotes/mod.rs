//! Quote sourcing: pluggable price providers plus a short-TTL cache.

mod cache;
mod client;

pub use cache::QuoteCache;
pub use client::{
    base_price, synthetic_quote, HttpQuoteSource, QuoteSource, StaticQuoteSource,
    SyntheticQuoteSource,
};
