//! Price discovery, extraction, and aggregation across Kuwaiti retailer and
//! food-delivery sites.

pub mod adapter;
pub mod aggregate;
pub mod discover;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod normalize;
pub mod types;

pub use adapter::{PriceSource, SiteAdapter};
pub use aggregate::{AggregateOptions, Aggregator};
pub use discover::{DiscoveryEndpoints, SourceDiscoverer};
pub use error::ScraperError;
pub use extract::{page_group_label, PriceExtractor};
pub use fetch::{FetchResult, FetchSettings, HttpFetcher};
pub use types::{
    AggregationResult, ExtractedItem, Query, ResultItem, SourceMeta, SourceOutcome, SourceReport,
};
