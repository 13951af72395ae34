//! Paginated fetching
//!
//! Many SaaS APIs expose list endpoints as numbered pages. The fetcher requests
//! every page in bounded concurrent batches and collects the records found under
//! a given key into one `Table`.

pub mod batch;
pub mod pagination;
pub mod source;
pub mod types;

pub use batch::{plan_batches, BatchFetcher};
pub use pagination::{harvest_pages, PageCount};
pub use source::{HttpJsonSource, JsonSource};
pub use types::{FetchConfig, FetchError, FetchReport, Headers, PageErrorPolicy};

use crate::table::Table;

/// Fetch pages `1..=total_pages` of `url_prefix` over HTTP, `batch_size` at a time.
///
/// The HTTP client lives for this call only.
pub async fn fetch_all(
    url_prefix: &str,
    headers: &Headers,
    total_pages: u32,
    array_key: &str,
    batch_size: usize,
) -> Result<Table, FetchError> {
    let config = FetchConfig {
        batch_size,
        ..FetchConfig::default()
    };
    let source = HttpJsonSource::new(config.timeout())?;
    BatchFetcher::new(source, config)
        .fetch_all(url_prefix, headers, total_pages, array_key)
        .await
}
