//! Parsing for `Key=Value;Key=Value` service connection strings

use std::fmt;

/// Error type for connection string parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStringError {
    Empty,
    MalformedSegment(String),
    MissingKey(String),
}

impl fmt::Display for ConnectionStringError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStringError::Empty => write!(f, "Connection string is empty"),
            ConnectionStringError::MalformedSegment(segment) => {
                write!(f, "Malformed connection string segment '{}'", segment)
            }
            ConnectionStringError::MissingKey(key) => {
                write!(f, "Connection string is missing '{}'", key)
            }
        }
    }
}

impl std::error::Error for ConnectionStringError {}

/// A parsed connection string. Key lookup is case-insensitive.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionString {
    entries: Vec<(String, String)>,
}

impl ConnectionString {
    pub fn parse(raw: &str) -> Result<Self, ConnectionStringError> {
        let mut entries = Vec::new();
        for segment in raw.split(';') {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            // Values may contain '=' (base64 padding), so split on the first one only
            let (key, value) = segment
                .split_once('=')
                .ok_or_else(|| ConnectionStringError::MalformedSegment(redact(segment)))?;
            let key = key.trim();
            if key.is_empty() {
                return Err(ConnectionStringError::MalformedSegment(redact(segment)));
            }
            entries.push((key.to_string(), value.trim().to_string()));
        }

        if entries.is_empty() {
            return Err(ConnectionStringError::Empty);
        }
        Ok(Self { entries })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn require(&self, key: &str) -> Result<&str, ConnectionStringError> {
        self.get(key)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ConnectionStringError::MissingKey(key.to_string()))
    }
}

impl fmt::Debug for ConnectionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (key, value) in &self.entries {
            if is_secret(key) {
                map.entry(key, &"***");
            } else {
                map.entry(key, value);
            }
        }
        map.finish()
    }
}

fn is_secret(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    key.contains("key") || key.contains("signature")
}

fn redact(segment: &str) -> String {
    match segment.split_once('=') {
        Some((key, _)) if is_secret(key) => format!("{}=***", key),
        _ => segment.chars().take(32).collect(),
    }
}
