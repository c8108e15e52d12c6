//! Message catalogs and per-request language resolution.
//!
//! Catalogs are JSON files under `locales/{lang}/{namespace}.json`, embedded at
//! build time. Messages are addressed as `namespace.KEY` and may interpolate
//! arguments with Jinja syntax (`{{ extension }}`).

use std::collections::{BTreeMap, HashMap};

use axum::http::{header::ACCEPT_LANGUAGE, HeaderMap, Uri};
use minijinja::Environment;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

/// Language used when the request does not name a supported one
pub const FALLBACK_LANGUAGE: &str = "id";

const LANG_QUERY_PARAM: &str = "lang";
const LANG_HEADER: &str = "x-lang";

const EMBEDDED_CATALOGS: &[(&str, &str, &str)] = &[
    (
        "id",
        "general",
        include_str!("../../locales/id/general.json"),
    ),
    (
        "en",
        "general",
        include_str!("../../locales/en/general.json"),
    ),
];

#[derive(Debug, Error)]
pub enum I18nError {
    #[error("Invalid catalog '{lang}/{namespace}': {source}")]
    InvalidCatalog {
        lang: String,
        namespace: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Fallback language '{0}' has no catalog")]
    MissingFallback(String),
}

pub struct I18n {
    messages: HashMap<String, HashMap<String, String>>,
    fallback: String,
    env: Environment<'static>,
}

impl std::fmt::Debug for I18n {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut languages: Vec<_> = self.messages.keys().collect();
        languages.sort();
        f.debug_struct("I18n")
            .field("languages", &languages)
            .field("fallback", &self.fallback)
            .finish()
    }
}

impl I18n {
    /// Load the catalogs embedded in the binary
    pub fn load() -> Result<Self, I18nError> {
        Self::from_catalogs(EMBEDDED_CATALOGS.iter().copied(), FALLBACK_LANGUAGE)
    }

    /// Build from `(lang, namespace, json)` triples
    pub fn from_catalogs<'a>(
        catalogs: impl IntoIterator<Item = (&'a str, &'a str, &'a str)>,
        fallback: &str,
    ) -> Result<Self, I18nError> {
        let mut messages: HashMap<String, HashMap<String, String>> = HashMap::new();

        for (lang, namespace, source) in catalogs {
            let value: Value =
                serde_json::from_str(source).map_err(|source| I18nError::InvalidCatalog {
                    lang: lang.to_string(),
                    namespace: namespace.to_string(),
                    source,
                })?;

            let table = messages.entry(lang.to_lowercase()).or_default();
            flatten_into(table, namespace, &value);
        }

        if !messages.contains_key(fallback) {
            return Err(I18nError::MissingFallback(fallback.to_string()));
        }

        Ok(Self {
            messages,
            fallback: fallback.to_string(),
            env: Environment::new(),
        })
    }

    pub fn fallback_language(&self) -> &str {
        &self.fallback
    }

    pub fn supports(&self, lang: &str) -> bool {
        self.messages.contains_key(lang)
    }

    /// Translate a key without arguments
    pub fn t(&self, lang: &str, key: &str) -> String {
        self.translate(lang, key, &BTreeMap::new())
    }

    /// Translate a key, interpolating `args`.
    ///
    /// Falls back to the fallback language, then to the key itself.
    pub fn translate(&self, lang: &str, key: &str, args: &BTreeMap<&str, String>) -> String {
        let Some(template) = self.lookup(lang, key) else {
            warn!("Missing translation for '{}' ({})", key, lang);
            return key.to_string();
        };

        if !template.contains("{{") {
            return template.to_string();
        }

        match self.env.render_str(template, args) {
            Ok(rendered) => rendered,
            Err(e) => {
                warn!("Failed to render translation '{}': {}", key, e);
                template.to_string()
            }
        }
    }

    fn lookup(&self, lang: &str, key: &str) -> Option<&str> {
        self.messages
            .get(lang)
            .and_then(|table| table.get(key))
            .or_else(|| {
                self.messages
                    .get(&self.fallback)
                    .and_then(|table| table.get(key))
            })
            .map(String::as_str)
    }

    /// Pick the request language: `?lang=`, then `Accept-Language`, then
    /// `x-lang`. The first candidate naming a supported language wins.
    pub fn resolve_language(&self, uri: &Uri, headers: &HeaderMap) -> String {
        let from_query = uri.query().and_then(|query| {
            query.split('&').find_map(|pair| {
                let (name, value) = pair.split_once('=')?;
                (name == LANG_QUERY_PARAM).then(|| value.to_string())
            })
        });

        let from_accept_language = headers
            .get(ACCEPT_LANGUAGE)
            .and_then(|v| v.to_str().ok())
            .map(parse_accept_language)
            .unwrap_or_default();

        let from_header = headers
            .get(LANG_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        from_query
            .into_iter()
            .chain(from_accept_language)
            .chain(from_header)
            .find_map(|candidate| self.match_language(&candidate))
            .unwrap_or_else(|| self.fallback.clone())
    }

    fn match_language(&self, candidate: &str) -> Option<String> {
        let normalized = candidate.trim().to_lowercase();
        if self.supports(&normalized) {
            return Some(normalized);
        }

        let primary = normalized.split(['-', '_']).next()?;
        self.supports(primary).then(|| primary.to_string())
    }
}

/// Flatten nested catalog objects into `namespace.KEY.SUBKEY` entries
fn flatten_into(table: &mut HashMap<String, String>, prefix: &str, value: &Value) {
    match value {
        Value::Object(map) => {
            for (key, value) in map {
                flatten_into(table, &format!("{}.{}", prefix, key), value);
            }
        }
        Value::String(message) => {
            table.insert(prefix.to_string(), message.clone());
        }
        other => {
            table.insert(prefix.to_string(), other.to_string());
        }
    }
}

/// Languages from an `Accept-Language` header, highest quality first
fn parse_accept_language(header: &str) -> Vec<String> {
    let mut entries: Vec<(String, f32)> = header
        .split(',')
        .filter_map(|entry| {
            let mut parts = entry.split(';');
            let tag = parts.next()?.trim();
            if tag.is_empty() || tag == "*" {
                return None;
            }

            let quality = parts
                .find_map(|p| p.trim().strip_prefix("q="))
                .and_then(|q| q.parse::<f32>().ok())
                .unwrap_or(1.0);

            Some((tag.to_string(), quality))
        })
        .collect();

    entries.sort_by(|a, b| b.1.total_cmp(&a.1));
    entries.into_iter().map(|(tag, _)| tag).collect()
}
