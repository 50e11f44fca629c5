//! Interception table: which runtime components may handle a runtime-level event.
//!
//! Loaded once from JSON and validated against the registered components, so
//! an unknown component name fails the build instead of a dispatch.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::error::ConfigError;

/// Runtime component that may intercept runtime-level events.
#[async_trait]
pub trait Interceptor: Send + Sync + 'static {
    /// Handles `event` through `method`. `Ok(true)` stops the chain.
    async fn intercept(&self, method: &str, event: &str, args: &[Value]) -> anyhow::Result<bool>;
}

/// One `component.method` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handler {
    pub component: String,
    pub method: String,
}

impl fmt::Display for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.component, self.method)
    }
}

#[derive(Deserialize)]
struct InterceptionFile {
    #[serde(default)]
    interception: HashMap<String, Vec<String>>,
}

/// Parsed interception table: event name → ordered handlers.
///
/// # Example
/// ```
/// use skillvisor::Interception;
///
/// let table = Interception::from_json(
///     r#"{ "interception": { "runtimeDidLogin": ["custodian.onLogin", "dnd.recheck"] } }"#,
/// )
/// .unwrap();
///
/// let names: Vec<String> = table
///     .handlers("runtimeDidLogin")
///     .iter()
///     .map(ToString::to_string)
///     .collect();
/// assert_eq!(names, ["custodian.onLogin", "dnd.recheck"]);
/// assert!(table.handlers("runtimeDidInit").is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Interception {
    table: HashMap<String, Vec<Handler>>,
}

impl Interception {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let file: InterceptionFile = serde_json::from_str(json)?;
        let mut table = HashMap::with_capacity(file.interception.len());
        for (event, handlers) in file.interception {
            let parsed = handlers
                .into_iter()
                .map(|h| match h.split_once('.') {
                    Some((c, m)) if !c.is_empty() && !m.is_empty() => Ok(Handler {
                        component: c.to_string(),
                        method: m.to_string(),
                    }),
                    _ => Err(ConfigError::MalformedHandler {
                        event: event.clone(),
                        handler: h,
                    }),
                })
                .collect::<Result<Vec<_>, _>>()?;
            table.insert(event, parsed);
        }
        Ok(Self { table })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Handlers registered for `event`, in chain order.
    pub fn handlers(&self, event: &str) -> &[Handler] {
        self.table.get(event).map(Vec::as_slice).unwrap_or_default()
    }

    /// Fails on the first handler whose component is not known.
    pub fn validate(&self, is_known: impl Fn(&str) -> bool) -> Result<(), ConfigError> {
        for (event, handlers) in &self.table {
            if let Some(h) = handlers.iter().find(|h| !is_known(&h.component)) {
                return Err(ConfigError::UnknownComponent {
                    event: event.clone(),
                    handler: h.to_string(),
                    component: h.component.clone(),
                });
            }
        }
        Ok(())
    }
}
