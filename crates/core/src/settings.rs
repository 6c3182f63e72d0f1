use std::path::Path;

use reqwest::Url;
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::{Result, TapError};

pub const DEFAULT_WEBHOOK_URL: &str =
    "https://poc-shopify-wheat.vercel.app/webhook/shopify-events";
pub const DEFAULT_SHOP_NAME: &str = "default";

/// Settings as the host supplies them; every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub webhook_url: Option<String>,
    pub shop_name: Option<String>,
    /// Send captured context signals as a `Cookie` header. Defaults to on.
    pub forward_cookies: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSettings {
    pub webhook_url: Url,
    pub shop_name: String,
    pub forward_cookies: bool,
}

impl Settings {
    /// Load settings from a JSON file
    pub async fn load(path: &Path) -> Result<Self> {
        let json_content = fs::read_to_string(path).await?;
        let settings: Settings = serde_json::from_str(&json_content)?;
        Ok(settings)
    }

    /// Fields set in `other` replace fields in `self`.
    pub fn merge(self, other: Settings) -> Self {
        Self {
            webhook_url: other.webhook_url.or(self.webhook_url),
            shop_name: other.shop_name.or(self.shop_name),
            forward_cookies: other.forward_cookies.or(self.forward_cookies),
        }
    }

    /// Apply defaults. Empty strings count as unset.
    pub fn resolve(&self) -> Result<ResolvedSettings> {
        let raw_url = non_empty(&self.webhook_url).unwrap_or(DEFAULT_WEBHOOK_URL);
        let webhook_url = Url::parse(raw_url).map_err(|e| TapError::InvalidSettings {
            reason: format!("webhook URL '{}': {}", raw_url, e),
        })?;

        if !matches!(webhook_url.scheme(), "http" | "https") {
            return Err(TapError::InvalidSettings {
                reason: format!("webhook URL '{}' must use http or https", raw_url),
            });
        }

        Ok(ResolvedSettings {
            webhook_url,
            shop_name: non_empty(&self.shop_name)
                .unwrap_or(DEFAULT_SHOP_NAME)
                .to_string(),
            forward_cookies: self.forward_cookies.unwrap_or(true),
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
