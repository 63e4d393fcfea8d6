use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::schema::Provider;

/// Trait that every upstream match-data provider must implement.
#[async_trait]
pub trait MatchSource: Send + Sync {
    /// Return every match of an event, in the provider's own schema.
    async fn fetch_matches(&self, event_key: &str, api_key: &str) -> Result<Vec<Value>>;

    /// Which schema the returned matches follow.
    fn provider(&self) -> Provider;

    /// Human-readable name for logging.
    fn name(&self) -> &str {
        self.provider().name()
    }
}

pub(crate) fn http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .context("Failed to build HTTP client")
}

/// `{base}/event/{event_key}/matches`, with the event key percent-encoded.
pub(crate) fn event_matches_url(base: &Url, event_key: &str) -> Result<Url> {
    let event_key = event_key.trim();
    if event_key.is_empty() {
        anyhow::bail!("Event key must not be empty");
    }
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| anyhow!("Invalid provider base URL: {}", base))?
        .pop_if_empty()
        .extend(["event", event_key, "matches"]);
    Ok(url)
}

/// GET a JSON array of matches.
pub(crate) async fn get_match_list(
    http: &Client,
    url: Url,
    headers: &[(&str, &str)],
    source: &str,
) -> Result<Vec<Value>> {
    debug!("Fetching matches from {}", url);

    let mut req = http.get(url);
    for (name, value) in headers {
        req = req.header(*name, *value);
    }
    let resp = req
        .send()
        .await
        .with_context(|| format!("{} request failed", source))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("{} error {}: {}", source, status, body);
    }

    let raw: Value = resp
        .json()
        .await
        .with_context(|| format!("Failed to parse {} response", source))?;

    match raw {
        Value::Array(matches) => Ok(matches),
        other => anyhow::bail!("{} returned a non-list match response: {}", source, other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_matches_url() {
        let base = Url::parse("https://www.thebluealliance.com/api/v3").unwrap();
        let url = event_matches_url(&base, "2025paca").unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.thebluealliance.com/api/v3/event/2025paca/matches"
        );
    }

    #[test]
    fn test_event_matches_url_trailing_slash() {
        let base = Url::parse("https://theorangealliance.org/api/").unwrap();
        let url = event_matches_url(&base, " 1920-FIM-CMP1 ").unwrap();
        assert_eq!(
            url.as_str(),
            "https://theorangealliance.org/api/event/1920-FIM-CMP1/matches"
        );
    }

    #[test]
    fn test_event_key_is_encoded() {
        let base = Url::parse("https://example.com/api").unwrap();
        let url = event_matches_url(&base, "a/b c").unwrap();
        assert_eq!(url.as_str(), "https://example.com/api/event/a%2Fb%20c/matches");
    }

    #[test]
    fn test_empty_event_key_rejected() {
        let base = Url::parse("https://example.com/api").unwrap();
        assert!(event_matches_url(&base, "  ").is_err());
    }
}
