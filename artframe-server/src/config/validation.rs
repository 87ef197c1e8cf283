use thiserror::Error;

use super::models::Config;

#[derive(Debug, Error)]
pub enum ConfigGuardRailError {
    #[error("cache.memory_capacity must be at least 1")]
    ZeroMemoryCapacity,
    #[error("{field} must be greater than zero")]
    ZeroDuration { field: &'static str },
    #[error("{field} must be an http(s) URL, got '{value}'")]
    NotHttpUrl { field: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint<S: Into<String>, H: Into<String>>(
        &mut self,
        message: S,
        hint: H,
    ) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn extend(&mut self, other: ConfigWarnings) {
        self.items.extend(other.items);
    }
}

pub fn apply_guard_rails(
    config: &Config,
) -> Result<ConfigWarnings, ConfigGuardRailError> {
    let mut warnings = ConfigWarnings::default();
    let asset = &config.asset;

    if asset.memory_cache_capacity == 0 {
        return Err(ConfigGuardRailError::ZeroMemoryCapacity);
    }
    for (field, value) in [
        ("catalog.expiry", asset.metadata_expiry),
        ("http.request_timeout", asset.request_timeout),
        ("http.client_timeout", asset.http_timeout),
    ] {
        if value.is_zero() {
            return Err(ConfigGuardRailError::ZeroDuration { field });
        }
    }
    for (field, value) in [
        ("catalog.url", &asset.catalog_url),
        ("catalog.base_url", &asset.base_url),
    ] {
        if !(value.starts_with("http://") || value.starts_with("https://")) {
            return Err(ConfigGuardRailError::NotHttpUrl {
                field,
                value: value.clone(),
            });
        }
    }

    if asset.prefetch_window >= asset.memory_cache_capacity {
        warnings.push_with_hint(
            format!(
                "prefetch.window ({}) is not smaller than cache.memory_capacity ({}); \
                 look-ahead images will evict each other from memory",
                asset.prefetch_window, asset.memory_cache_capacity
            ),
            "Keep the memory capacity at least one larger than the prefetch window",
        );
    }
    if asset.http_timeout > asset.request_timeout {
        warnings.push(format!(
            "http.client_timeout ({}) exceeds http.request_timeout ({}); \
             slow fetches will surface as request timeouts",
            humantime::format_duration(asset.http_timeout),
            humantime::format_duration(asset.request_timeout)
        ));
    }

    Ok(warnings)
}
