//! `Key=Value;Key=Value` connection strings used by Service Bus and Storage

use crate::error::ConnectionStringError;

/// Parsed connection string. Key lookup is case-insensitive.
#[derive(Debug, Clone)]
pub struct ConnectionString {
    pairs: Vec<(String, String)>,
}

impl ConnectionString {
    pub fn parse(input: &str) -> Result<Self, ConnectionStringError> {
        let mut pairs = Vec::new();

        for segment in input.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            // Values may themselves contain '=' (base64 padding).
            let (key, value) = segment
                .split_once('=')
                .ok_or_else(|| ConnectionStringError::Malformed(segment.to_string()))?;
            pairs.push((key.trim().to_string(), value.trim().to_string()));
        }

        Ok(Self { pairs })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn require(&self, key: &'static str) -> Result<&str, ConnectionStringError> {
        self.get(key)
            .filter(|v| !v.is_empty())
            .ok_or(ConnectionStringError::MissingKey(key))
    }
}
