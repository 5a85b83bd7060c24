use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Whether a service runs detached or owns the container lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceRole {
    /// Spawned fire-and-forget before the foreground service; monitored,
    /// and subordinate to the foreground service's lifetime.
    Background,
    /// The service the supervisor blocks on. Exactly one per stack.
    Foreground,
}

/// Declarative description of one child service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[serde(rename_all = "camelCase")]
#[builder(setter(into, strip_option))]
pub struct ServiceSpec {
    /// Name used in logs, errors, and test assertions.
    pub name: String,
    pub role: ServiceRole,
    pub command: String,
    #[serde(default)]
    #[builder(default)]
    #[builder(setter(custom))]
    pub args: Vec<String>,
    /// TCP port the service is expected to bind. Declared metadata only;
    /// the supervisor never verifies binding.
    #[serde(default)]
    #[builder(default)]
    pub bind_port: Option<u16>,
    /// Merged over the supervisor's own environment; override wins.
    #[serde(default)]
    #[builder(default)]
    #[builder(setter(custom))]
    pub env: HashMap<String, String>,
    #[serde(default)]
    #[builder(default)]
    pub working_directory: Option<PathBuf>,
}

impl ServiceSpec {
    pub fn builder() -> ServiceSpecBuilder {
        ServiceSpecBuilder::default()
    }
}

impl ServiceSpecBuilder {
    pub fn args<S: ToString, I: IntoIterator<Item = S>>(&mut self, iter: I) -> &mut Self {
        let args: Vec<String> = iter.into_iter().map(|s| s.to_string()).collect();
        self.args = Some(args);
        self
    }

    pub fn env<T: ToString>(&mut self, key: T, value: T) -> &mut Self {
        let map = self.env.get_or_insert_with(HashMap::new);
        map.insert(key.to_string(), value.to_string());

        self
    }

    pub fn env_multi<T: ToString, I: IntoIterator<Item = (T, T)>>(&mut self, iter: I) -> &mut Self {
        let env = self.env.get_or_insert_with(HashMap::new);
        for (key, value) in iter {
            env.insert(key.to_string(), value.to_string());
        }
        self
    }
}

/// Top-level supervisor configuration: the ordered service stack plus the
/// shutdown grace period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupervisorConfig {
    pub services: Vec<ServiceSpec>,

    /// How long children get to exit voluntarily after a termination
    /// request before they are force-killed (in milliseconds).
    #[serde(default = "default_grace_period_ms")]
    pub grace_period_ms: u64,
}

impl SupervisorConfig {
    pub fn new(services: Vec<ServiceSpec>) -> Self {
        Self {
            services,
            grace_period_ms: default_grace_period_ms(),
        }
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> anyhow::Result<()> {
        let foreground = self
            .services
            .iter()
            .filter(|s| s.role == ServiceRole::Foreground)
            .count();
        if foreground != 1 {
            return Err(anyhow::anyhow!(
                "expected exactly one foreground service, found {foreground}"
            ));
        }

        if let Some(spec) = self.services.iter().find(|s| s.command.is_empty()) {
            let role = match spec.role {
                ServiceRole::Background => "background",
                ServiceRole::Foreground => "foreground",
            };
            return Err(anyhow::anyhow!(
                "{role} service '{}' has an empty command",
                spec.name
            ));
        }

        if self.grace_period_ms == 0 {
            return Err(anyhow::anyhow!("gracePeriodMs must be greater than zero"));
        }

        Ok(())
    }

    /// Get the grace period as Duration.
    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }
}

// Default value functions for serde
fn default_grace_period_ms() -> u64 {
    10_000
}
