//! Environment-driven configuration

use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    /// Seller's share of an order's gross amount, in percent.
    pub seller_earning_percent: i64,
    /// Shared secret for the payment gateway webhook. Unset means the
    /// webhook endpoint rejects everything (fail closed).
    pub payment_webhook_secret: Option<String>,
    /// Push broadcast side-channel endpoint. Unset disables the notifier.
    pub push_endpoint_url: Option<String>,
    /// Comma-separated indexing service endpoints for SEO submission.
    pub seo_submit_urls: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let seller_earning_percent = env::var("SELLER_EARNING_PERCENT")
            .ok()
            .and_then(|value| value.parse::<i64>().ok())
            .filter(|percent| (0..=100).contains(percent))
            .unwrap_or(85);

        Self {
            database_url: env::var("DATABASE_URL").unwrap_or_default(),
            jwt_secret: env::var("JWT_SECRET").unwrap_or_default(),
            seller_earning_percent,
            payment_webhook_secret: env::var("PAYMENT_WEBHOOK_SECRET")
                .ok()
                .filter(|secret| !secret.trim().is_empty()),
            push_endpoint_url: env::var("PUSH_ENDPOINT_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            seo_submit_urls: env::var("SEO_SUBMIT_URLS")
                .unwrap_or_default()
                .split(',')
                .map(|url| url.trim().to_string())
                .filter(|url| !url.is_empty())
                .collect(),
        }
    }
}
