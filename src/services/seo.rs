//! SEO URL submission side-channel
//!
//! Forwards a URL list to each configured indexing service. Failures are
//! logged per service; the admin surface only needs a best-effort summary.

use serde_json::json;
use tokio::time::Duration;
use tracing::{info, warn};

/// Submit URLs to every configured indexing endpoint. Returns how many
/// endpoints accepted the batch.
pub async fn submit_urls(client: &reqwest::Client, endpoints: &[String], urls: &[String]) -> usize {
    let mut accepted = 0;

    for endpoint in endpoints {
        let result = client
            .post(endpoint)
            .json(&json!({ "urlList": urls }))
            .timeout(Duration::from_secs(30))
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                info!(endpoint = %endpoint, count = urls.len(), "seo submission accepted");
                accepted += 1;
            }
            Ok(response) => {
                warn!(endpoint = %endpoint, status = %response.status(), "seo submission rejected");
            }
            Err(err) => {
                warn!(endpoint = %endpoint, error = %err, "seo submission failed");
            }
        }
    }

    accepted
}
