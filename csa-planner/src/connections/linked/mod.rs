//! Linked Connections source.
//!
//! A Linked Connections server publishes a timetable as a chain of JSON-LD
//! pages, each holding the connections departing in a short interval and
//! linking to its neighbours through `hydra:previous` and `hydra:next`.
//!
//! - `types`: raw JSON-LD page DTOs
//! - `convert`: DTO to domain conversion
//! - `cache`: page cache keyed by URL
//! - `client`: HTTP client with caching and concurrency limits
//! - `source`: the paginating [`ConnectionSource`](super::ConnectionSource)

mod cache;
mod client;
mod convert;
mod source;
mod types;

pub use cache::{CacheConfig, PageCache};
pub use client::{LinkedConnectionsClient, LinkedConnectionsConfig, PageFetcher};
pub use convert::{ConversionError, ConvertedPage, convert_page};
pub use source::LinkedConnectionsSource;
pub use types::{LinkedConnection, LinkedConnectionsPage};
