//! Configuration types for the binding transport, progress handles and the demo task.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{NotifyError, Result};

/// How the local transport delivers connection events to listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Delivery {
    /// Deliver on the caller's thread, before `connect` returns.
    Inline,
    /// Deliver from a freshly spawned thread, like a platform binder callback.
    #[default]
    Threaded,
}

/// Binding transport settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Start the hosted worker when the first handle binds.
    pub auto_create: bool,
    /// Connection event delivery mode.
    pub delivery: Delivery,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            auto_create: true,
            delivery: Delivery::Threaded,
        }
    }
}

/// Per-handle settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandleConfig {
    /// Log every forward and every skipped duplicate at debug level.
    pub log_forwards: bool,
}

/// Settings for the `demo` subcommand's simulated task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Number of work units in the simulated task.
    pub total: u64,
    /// Worker threads (0 = number of CPUs).
    pub threads: usize,
    /// Simulated time per work unit in milliseconds.
    pub step_delay_ms: u64,
    /// Show an indeterminate phase before counting starts.
    pub indeterminate_first: bool,
    /// Crash and restart the worker once this many units are done.
    pub crash_at: Option<u64>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            total: 200,
            threads: 0,
            step_delay_ms: 10,
            indeterminate_first: false,
            crash_at: None,
        }
    }
}

impl DemoConfig {
    /// Resolve the thread count, substituting the CPU count for 0.
    pub fn effective_threads(&self) -> usize {
        if self.threads == 0 {
            num_cpus::get()
        } else {
            self.threads
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Transport settings.
    pub transport: TransportConfig,
    /// Handle settings.
    pub handle: HandleConfig,
    /// Demo task settings.
    pub demo: DemoConfig,
}

impl AppConfig {
    /// Parse a configuration from TOML text. Missing fields take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        log::debug!("Loaded configuration from {}", path.display());
        Self::from_toml_str(&text)
    }

    /// Render the configuration as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.demo.total > i32::MAX as u64 {
            return Err(NotifyError::Config(format!(
                "demo.total must not exceed {}, got {}",
                i32::MAX,
                self.demo.total
            )));
        }
        if let Some(crash_at) = self.demo.crash_at {
            if crash_at > self.demo.total {
                return Err(NotifyError::Config(format!(
                    "demo.crash_at ({}) is past demo.total ({})",
                    crash_at, self.demo.total
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert!(config.transport.auto_create);
        assert_eq!(config.transport.delivery, Delivery::Threaded);
        assert!(!config.handle.log_forwards);
        assert_eq!(config.demo.total, 200);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [transport]
            delivery = "inline"

            [demo]
            total = 50
            "#,
        )
        .unwrap();

        assert_eq!(config.transport.delivery, Delivery::Inline);
        assert!(config.transport.auto_create);
        assert_eq!(config.demo.total, 50);
        assert_eq!(config.demo.step_delay_ms, 10);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = AppConfig::from_toml_str("[demo]\ntotal = 10\ncrash_at = 20\n").unwrap_err();
        assert!(matches!(err, NotifyError::Config(_)));

        let err = AppConfig::from_toml_str("[demo]\ntotal = 3000000000\n").unwrap_err();
        assert!(matches!(err, NotifyError::Config(_)));

        let err = AppConfig::from_toml_str("[transport]\ndelivery = \"carrier-pigeon\"\n")
            .unwrap_err();
        assert!(matches!(err, NotifyError::Config(_)));
    }

    #[test]
    fn test_file_round_trip() {
        let mut config = AppConfig::default();
        config.demo.crash_at = Some(40);
        config.handle.log_forwards = true;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(config.to_toml_string().unwrap().as_bytes()).unwrap();

        let loaded = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file() {
        let err = AppConfig::from_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, NotifyError::Io(_)));
    }

    #[test]
    fn test_effective_threads() {
        let demo = DemoConfig {
            threads: 3,
            ..Default::default()
        };
        assert_eq!(demo.effective_threads(), 3);
        assert_eq!(DemoConfig::default().effective_threads(), num_cpus::get());
    }
}
