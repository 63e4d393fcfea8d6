use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use url::Url;

use super::provider::{event_matches_url, get_match_list, http_client, MatchSource};
use super::schema::Provider;

/// Sent as `X-Application-Origin`, which the API requires on every request.
const APPLICATION_ORIGIN: &str = "opr-calc";

/// Match provider backed by The Orange Alliance API (FTC).
pub struct TheOrangeAlliance {
    http: Client,
    base_url: Url,
}

impl TheOrangeAlliance {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(TheOrangeAlliance {
            http: http_client(timeout)?,
            base_url: Url::parse(base_url)
                .with_context(|| format!("Invalid TOA API URL: {}", base_url))?,
        })
    }
}

#[async_trait]
impl MatchSource for TheOrangeAlliance {
    fn provider(&self) -> Provider {
        Provider::Toa
    }

    async fn fetch_matches(&self, event_key: &str, api_key: &str) -> Result<Vec<Value>> {
        let url = event_matches_url(&self.base_url, event_key)?;
        get_match_list(
            &self.http,
            url,
            &[
                ("X-TOA-Key", api_key.trim()),
                ("X-Application-Origin", APPLICATION_ORIGIN),
            ],
            self.name(),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name() {
        let toa = TheOrangeAlliance::new("https://theorangealliance.org/api", Duration::from_secs(1)).unwrap();
        assert_eq!(toa.name(), "TheOrangeAlliance");
        assert_eq!(toa.provider(), Provider::Toa);
    }
}
