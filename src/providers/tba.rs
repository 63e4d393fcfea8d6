use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use url::Url;

use super::provider::{event_matches_url, get_match_list, http_client, MatchSource};
use super::schema::Provider;

/// Match provider backed by The Blue Alliance API v3 (FRC).
/// Docs: <https://www.thebluealliance.com/apidocs/v3>
pub struct TheBlueAlliance {
    http: Client,
    base_url: Url,
}

impl TheBlueAlliance {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(TheBlueAlliance {
            http: http_client(timeout)?,
            base_url: Url::parse(base_url)
                .with_context(|| format!("Invalid TBA API URL: {}", base_url))?,
        })
    }
}

#[async_trait]
impl MatchSource for TheBlueAlliance {
    fn provider(&self) -> Provider {
        Provider::Tba
    }

    async fn fetch_matches(&self, event_key: &str, api_key: &str) -> Result<Vec<Value>> {
        let url = event_matches_url(&self.base_url, event_key)?;
        get_match_list(
            &self.http,
            url,
            &[("X-TBA-Auth-Key", api_key.trim())],
            self.name(),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_base_url() {
        assert!(TheBlueAlliance::new("not a url", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn test_name() {
        let tba = TheBlueAlliance::new("https://www.thebluealliance.com/api/v3", Duration::from_secs(1)).unwrap();
        assert_eq!(tba.name(), "TheBlueAlliance");
        assert_eq!(tba.provider(), Provider::Tba);
    }
}
