use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};

/// Normalized key identifying the database a schema cache entry belongs to.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionIdentity(Arc<str>);

impl ConnectionIdentity {
    /// Builds an identity from a `key=value;key=value` connection string.
    ///
    /// Keys are lower-cased, whitespace is trimmed, empty segments are dropped
    /// and segments are sorted so equivalent strings collapse to one key.
    /// Strings that are not in that form are used verbatim after trimming.
    pub fn from_connection_string(conn_str: &str) -> Self {
        let mut segments = Vec::new();
        for segment in conn_str.split(';') {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            match segment.split_once('=') {
                Some((key, value)) => {
                    segments.push(format!("{}={}", key.trim().to_lowercase(), value.trim()))
                }
                None => return Self::from_cache_key(conn_str),
            }
        }

        if segments.is_empty() {
            return Self::from_cache_key(conn_str);
        }

        segments.sort();
        Self(Arc::from(segments.join(";")))
    }

    /// Uses an explicit, caller-chosen cache key.
    pub fn from_cache_key(key: &str) -> Self {
        Self(Arc::from(key.trim()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConnectionIdentity {
    fn from(s: &str) -> Self {
        Self::from_connection_string(s)
    }
}

impl From<String> for ConnectionIdentity {
    fn from(s: String) -> Self {
        Self::from_connection_string(&s)
    }
}
