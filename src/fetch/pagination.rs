use crate::fetch::source::JsonSource;
use crate::fetch::types::Headers;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Pagination totals reported by an API's first page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCount {
    pub total_pages: u32,
    pub total_entries: u64,
}

/// Read `total_pages` and `total_entries` from page 1 of a Harvest-style endpoint.
///
/// `url` is the same prefix the fetcher appends page numbers to. Any failure is
/// logged and reported as `None`.
pub async fn harvest_pages<S: JsonSource + ?Sized>(
    source: &S,
    url: &str,
    headers: &Headers,
) -> Option<PageCount> {
    let first_page = format!("{}1", url);

    let body = match source.get_json(&first_page, headers).await {
        Ok(body) => body,
        Err(err) => {
            warn!(url = %first_page, error = %err, "error retrieving total pages");
            return None;
        }
    };

    match serde_json::from_value::<PageCount>(body) {
        Ok(count) => Some(count),
        Err(err) => {
            warn!(url = %first_page, error = %err, "response has no usable pagination totals");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::types::FetchError;
    use async_trait::async_trait;
    use serde_json::{json, Value};

    struct OnePage(Result<Value, u16>);

    #[async_trait]
    impl JsonSource for OnePage {
        async fn get_json(&self, url: &str, _headers: &Headers) -> Result<Value, FetchError> {
            assert!(url.ends_with("page=1"));
            self.0.clone().map_err(|status| FetchError::Status {
                url: url.to_string(),
                status,
            })
        }
    }

    #[tokio::test]
    async fn test_reads_totals() {
        let source = OnePage(Ok(json!({
            "time_entries": [],
            "total_pages": 12,
            "total_entries": 1180
        })));

        let count = harvest_pages(&source, "https://api.test/v2/time_entries?page=", &Headers::new()).await;

        assert_eq!(
            count,
            Some(PageCount {
                total_pages: 12,
                total_entries: 1180
            })
        );
    }

    #[tokio::test]
    async fn test_failures_give_none() {
        let missing = OnePage(Ok(json!({"time_entries": []})));
        assert_eq!(harvest_pages(&missing, "x?page=", &Headers::new()).await, None);

        let unauthorized = OnePage(Err(401));
        assert_eq!(harvest_pages(&unauthorized, "x?page=", &Headers::new()).await, None);
    }
}
