//! External-service connector patterns
//!
//! Service detection is a pluggable pattern table, not a general
//! capability analysis: an import matching `module_prefix` arms the
//! pattern for that unit, and a dotted call path whose trailing name is
//! `connect_call` counts as a usage. Anything subtler (aliasing, indirect
//! handles) is out of reach for a name-based walker and stays undetected.

/// One known third-party connector shape.
#[derive(Debug, Clone)]
pub struct ServicePattern {
    /// Import target that arms the pattern, e.g. `snowflake.connector`.
    pub module_prefix: String,
    /// Display name for the synthetic service node.
    pub service: String,
    /// Trailing call name that marks a usage, e.g. `connect`.
    pub connect_call: String,
}

impl ServicePattern {
    pub fn new(module_prefix: &str, service: &str, connect_call: &str) -> Self {
        ServicePattern {
            module_prefix: module_prefix.to_string(),
            service: service.to_string(),
            connect_call: connect_call.to_string(),
        }
    }

    /// Whether an import target arms this pattern. `snowflake`,
    /// `snowflake.connector`, and `snowflake.connector.connect` all arm
    /// the snowflake pattern.
    pub fn matches_import(&self, module: &str) -> bool {
        module == self.module_prefix
            || module
                .strip_prefix(self.module_prefix.as_str())
                .is_some_and(|rest| rest.starts_with('.'))
            || self
                .module_prefix
                .strip_prefix(module)
                .is_some_and(|rest| rest.starts_with('.'))
    }

    /// Whether a dotted call path looks like a usage of this service:
    /// the trailing name is the connect call and the leading segment is
    /// one of the connector module's segments (so both
    /// `snowflake.connector.connect(...)` and `connector.connect(...)`
    /// match once the pattern is armed).
    pub fn matches_call(&self, path: &str) -> bool {
        let first = path.split('.').next().unwrap_or(path);
        let last = path.rsplit('.').next().unwrap_or(path);
        last == self.connect_call && self.module_prefix.split('.').any(|seg| seg == first)
    }
}

/// Connectors recognized out of the box.
pub fn default_patterns() -> Vec<ServicePattern> {
    vec![
        ServicePattern::new("snowflake.connector", "snowflake", "connect"),
        ServicePattern::new("psycopg2", "postgres", "connect"),
        ServicePattern::new("redis", "redis", "Redis"),
        ServicePattern::new("boto3", "aws", "client"),
    ]
}
