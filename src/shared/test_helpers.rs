#[cfg(test)]
use std::sync::Arc;
#[cfg(test)]
use std::time::Duration;

#[cfg(test)]
use axum::Router;

#[cfg(test)]
use crate::core::config::S3Config;
#[cfg(test)]
use crate::core::i18n::I18n;
#[cfg(test)]
use crate::core::middleware::{normalize_failures, normalize_success};

/// Catalogs bundled with the binary
#[cfg(test)]
pub fn test_i18n() -> Arc<I18n> {
    Arc::new(I18n::load().expect("bundled locales must load"))
}

/// Wrap a router in both normalizers, the way the API router is served
#[cfg(test)]
pub fn with_pipeline(router: Router, i18n: Arc<I18n>) -> Router {
    normalize_failures(normalize_success(router, i18n.clone()), i18n)
}

#[cfg(test)]
pub fn test_s3_config(environment_prefix: &str) -> S3Config {
    S3Config {
        access_key: "test-access-key".to_string(),
        secret_key: "test-secret-key".to_string(),
        region: "ap-southeast-1".to_string(),
        bucket: "bpk-test".to_string(),
        endpoint: None,
        environment_prefix: environment_prefix.to_string(),
        request_timeout: Duration::from_secs(30),
    }
}
