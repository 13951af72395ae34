use crate::fetch::source::JsonSource;
use crate::fetch::types::{FetchConfig, FetchError, FetchReport, Headers, PageErrorPolicy};
use crate::table::Table;
use futures::future::{join_all, try_join_all};
use serde_json::Value;
use std::ops::RangeInclusive;
use tracing::{debug, info, warn};

/// Split pages `1..=total_pages` into contiguous batches of at most `batch_size`
pub fn plan_batches(total_pages: u32, batch_size: usize) -> Result<Vec<RangeInclusive<u32>>, FetchError> {
    if batch_size == 0 {
        return Err(FetchError::InvalidBatchSize);
    }
    let size = u32::try_from(batch_size).unwrap_or(u32::MAX);

    let mut batches = Vec::new();
    let mut start = 1u32;
    while start <= total_pages {
        let end = start.saturating_add(size - 1).min(total_pages);
        batches.push(start..=end);
        if end == total_pages {
            break;
        }
        start = end + 1;
    }
    Ok(batches)
}

/// Fetches every page of a paginated endpoint, one bounded batch at a time.
///
/// Requests inside a batch run concurrently; the next batch starts only after
/// the current one has fully resolved, so at most `batch_size` requests are in
/// flight. Rows come out in page order whatever order responses arrive in.
pub struct BatchFetcher<S> {
    source: S,
    config: FetchConfig,
}

impl<S: JsonSource> BatchFetcher<S> {
    pub fn new(source: S, config: FetchConfig) -> Self {
        BatchFetcher { source, config }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetch `url_prefix + page` for every page and collect the records under `array_key`
    pub async fn fetch_all(
        &self,
        url_prefix: &str,
        headers: &Headers,
        total_pages: u32,
        array_key: &str,
    ) -> Result<Table, FetchError> {
        Ok(self
            .fetch_report(url_prefix, headers, total_pages, array_key)
            .await?
            .table)
    }

    /// Like `fetch_all`, also reporting batch count and skipped pages
    pub async fn fetch_report(
        &self,
        url_prefix: &str,
        headers: &Headers,
        total_pages: u32,
        array_key: &str,
    ) -> Result<FetchReport, FetchError> {
        let batches = plan_batches(total_pages, self.config.batch_size)?;
        let mut table = Table::new();
        let mut skipped_pages = Vec::new();

        for batch in &batches {
            info!(
                start = batch.start(),
                end = batch.end(),
                "fetching pages {} to {}",
                batch.start(),
                batch.end()
            );

            let pages = self
                .fetch_batch(url_prefix, headers, batch.clone(), array_key, &mut skipped_pages)
                .await?;

            for record in pages.into_iter().flatten() {
                table.push_record(record);
            }
        }

        Ok(FetchReport {
            table,
            requested_pages: total_pages,
            batches: batches.len(),
            skipped_pages,
        })
    }

    /// Fetch one batch concurrently; results are in page order
    async fn fetch_batch(
        &self,
        url_prefix: &str,
        headers: &Headers,
        pages: RangeInclusive<u32>,
        array_key: &str,
        skipped_pages: &mut Vec<u32>,
    ) -> Result<Vec<Vec<Value>>, FetchError> {
        let requests = pages
            .clone()
            .map(|page| self.fetch_page(url_prefix, headers, page, array_key));

        match self.config.on_page_error {
            // Dropping the joined future on the first error cancels the rest of the batch
            PageErrorPolicy::Abort => try_join_all(requests).await,
            PageErrorPolicy::Skip => {
                let results = join_all(requests).await;
                let mut kept = Vec::with_capacity(results.len());
                for (page, result) in pages.zip(results) {
                    match result {
                        Ok(records) => kept.push(records),
                        Err(err) => {
                            warn!(page, error = %err, "skipping page");
                            skipped_pages.push(page);
                        }
                    }
                }
                Ok(kept)
            }
        }
    }

    async fn fetch_page(
        &self,
        url_prefix: &str,
        headers: &Headers,
        page: u32,
        array_key: &str,
    ) -> Result<Vec<Value>, FetchError> {
        let url = format!("{}{}", url_prefix, page);
        let body = self.get_with_retry(&url, headers).await?;
        let records = extract_records(&url, body, array_key)?;
        debug!(page, records = records.len(), "fetched page");
        Ok(records)
    }

    async fn get_with_retry(&self, url: &str, headers: &Headers) -> Result<Value, FetchError> {
        let mut attempt = 0u32;
        loop {
            match self.source.get_json(url, headers).await {
                Ok(body) => return Ok(body),
                Err(err) if err.is_retryable() && attempt < self.config.max_retries => {
                    let delay = self
                        .config
                        .retry_backoff()
                        .saturating_mul(2u32.saturating_pow(attempt));
                    attempt += 1;
                    warn!(url, attempt, error = %err, "retrying in {:?}", delay);
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Take the array under `key` out of a page body
fn extract_records(url: &str, body: Value, key: &str) -> Result<Vec<Value>, FetchError> {
    let missing = || FetchError::MissingKey {
        url: url.to_string(),
        key: key.to_string(),
    };

    let Value::Object(mut obj) = body else {
        return Err(missing());
    };

    match obj.remove(key) {
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(FetchError::NotAnArray {
            url: url.to_string(),
            key: key.to_string(),
        }),
        None => Err(missing()),
    }
}
