//! Endpoint Configuration
//!
//! Design Decision: a plain data struct, constructed explicitly by the embedding application
//!
//! Rationale: unlike the teacher's `McpConfig`, which resolves API keys from environment
//! variables and config directories, an endpoint has nothing to discover — its separator,
//! timeout, and encoding are properties of the protocol the embedding application already knows
//! it wants. No env/file resolution layer is carried over.

use std::time::Duration;

/// Text encoding used for the framed body. `Utf8` covers every case this crate's test suite and
/// the source implementation exercise; the field exists so a future codec (e.g. a binary
/// MessagePack body) has somewhere to declare itself without changing the `EntityReader`/
/// `EntityWriter` trait signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Utf8,
}

impl Default for Encoding {
    fn default() -> Self {
        Encoding::Utf8
    }
}

/// Configuration shared by every call made through an [`crate::endpoint::Endpoint`].
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    /// Separator between a namespace and a method name in `call`/`notify` method strings.
    /// Defaults to `/`, matching the source implementation.
    pub namespace_separator: String,
    /// Default timeout applied to outbound `call`s that don't specify their own. `None` means
    /// calls wait indefinitely unless overridden per call.
    pub default_call_timeout: Option<Duration>,
    pub encoding: Encoding,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        EndpointConfig {
            namespace_separator: "/".to_string(),
            default_call_timeout: None,
            encoding: Encoding::default(),
        }
    }
}

impl EndpointConfig {
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_call_timeout = Some(timeout);
        self
    }

    pub fn with_namespace_separator(mut self, separator: impl Into<String>) -> Self {
        self.namespace_separator = separator.into();
        self
    }

    /// Split a full method string (`"namespace<sep>method"`) into its namespace and method parts.
    /// A string with no separator belongs to the empty (`""`) namespace.
    pub fn split_method<'a>(&self, full: &'a str) -> (&'a str, &'a str) {
        match full.split_once(self.namespace_separator.as_str()) {
            Some((ns, method)) => (ns, method),
            None => ("", full),
        }
    }

    pub fn join_method(&self, namespace: &str, method: &str) -> String {
        if namespace.is_empty() {
            method.to_string()
        } else {
            format!("{namespace}{}{method}", self.namespace_separator)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_method_uses_configured_separator() {
        let config = EndpointConfig::default();
        assert_eq!(config.split_method("math/add"), ("math", "add"));
        assert_eq!(config.split_method("ping"), ("", "ping"));
    }

    #[test]
    fn join_method_omits_separator_for_empty_namespace() {
        let config = EndpointConfig::default();
        assert_eq!(config.join_method("", "ping"), "ping");
        assert_eq!(config.join_method("math", "add"), "math/add");
    }

    #[test]
    fn custom_separator_is_honored() {
        let config = EndpointConfig::default().with_namespace_separator(".");
        assert_eq!(config.join_method("math", "add"), "math.add");
        assert_eq!(config.split_method("math.add"), ("math", "add"));
    }
}
