use crate::record::{Fosa, FosaDetail, SummaryEntry};
use crate::FosasError;
use futures::future::join_all;
use log::{debug, info, warn};

/// Aggregation endpoint serving the cross-site summary and per-post details.
pub const API_BASE: &str = "https://contentapi.volcanica.org";

/// Category retained from the summary collection.
pub const FOSAS_KIND: &str = "fosas";

/// Client for the remote content service. Two operations are consumed: the
/// summary list and per-record details. No auth, no pagination.
pub struct ContentClient {
    http: reqwest::Client,
    base: String,
}

impl Default for ContentClient {
    fn default() -> Self {
        Self::new(API_BASE)
    }
}

impl ContentClient {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: base.into(),
        }
    }

    fn summary_url(&self) -> String {
        format!("{}/wp-json/content/v1/summary", self.base)
    }

    fn detail_url(&self, host: &str, kind: &str, id: u64) -> String {
        format!("{}/wp-json/content/v1/posts/{}/{}/{}", self.base, host, kind, id)
    }

    /// Fetches the summary collection: one entry per record across all
    /// source hosts, each carrying `(host, type, id)`.
    pub async fn fetch_summary(&self) -> Result<Vec<SummaryEntry>, FosasError> {
        let body = self
            .http
            .get(self.summary_url())
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let entries: Vec<SummaryEntry> = serde_json::from_str(&body)?;
        Ok(entries)
    }

    /// Fetches the full detail for one summary entry. A `null` body or a
    /// 404 yields `Ok(None)`: the entry simply produces no record.
    pub async fn fetch_detail(
        &self,
        host: &str,
        kind: &str,
        id: u64,
    ) -> Result<Option<FosaDetail>, FosasError> {
        let response = self.http.get(self.detail_url(host, kind, id)).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let detail = response.error_for_status()?.json::<Option<FosaDetail>>().await?;
        Ok(detail)
    }

    /// Full load: summary, filtered to the fosas category, then every
    /// detail fetched concurrently. Detail failures are logged and dropped;
    /// partial results are accepted silently. Only a failed summary fetch
    /// surfaces as an error.
    pub async fn load_fosas(&self) -> Result<Vec<Fosa>, FosasError> {
        let summary = self.fetch_summary().await?;
        let wanted: Vec<SummaryEntry> = summary
            .into_iter()
            .filter(|entry| entry.kind == FOSAS_KIND)
            .collect();

        info!("summary fetched — {} entries in category '{}'", wanted.len(), FOSAS_KIND);

        let details = join_all(wanted.into_iter().map(|entry| async move {
            match self.fetch_detail(&entry.host, &entry.kind, entry.id).await {
                Ok(Some(detail)) => {
                    debug!("fosa detail {}/{}: {:?}", entry.host, entry.id, detail);
                    Some(Fosa::from_parts(entry, detail))
                }
                Ok(None) => {
                    warn!("empty detail for {}/{}/{}", entry.host, entry.kind, entry.id);
                    None
                }
                Err(e) => {
                    warn!(
                        "detail fetch failed for {}/{}/{}: {}",
                        entry.host, entry.kind, entry.id, e
                    );
                    None
                }
            }
        }))
        .await;

        let fosas: Vec<Fosa> = details.into_iter().flatten().collect();
        info!("{} fosas loaded", fosas.len());
        Ok(fosas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_url_shape() {
        let client = ContentClient::new("https://example.org");
        assert_eq!(
            client.detail_url("a.org", "fosas", 7),
            "https://example.org/wp-json/content/v1/posts/a.org/fosas/7"
        );
    }

    #[test]
    fn test_summary_url_shape() {
        let client = ContentClient::new("https://example.org");
        assert_eq!(
            client.summary_url(),
            "https://example.org/wp-json/content/v1/summary"
        );
    }
}
