//! Human- and machine-readable dumps of registry and resolver state.
//!
//! Meant for debug overlays and log output; the text form lists each
//! registered capability with the liveness of its service, and each pending
//! consumer with what it is still waiting for.

use std::fmt;

#[cfg(feature = "config")]
use serde::Serialize;

use crate::registry::ServiceRegistry;
use crate::resolver::DependencyResolver;

/// One registered capability.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize))]
pub struct ServiceReport {
    pub capability: String,
    pub service_type: String,
    pub alive: bool,
}

/// State of a [`ServiceRegistry`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize))]
pub struct RegistryReport {
    pub services: Vec<ServiceReport>,
}

impl RegistryReport {
    pub fn capture(registry: &ServiceRegistry) -> Self {
        let services = registry
            .entries()
            .into_iter()
            .map(|entry| ServiceReport {
                capability: entry.capability.short_name().to_string(),
                service_type: entry.type_name.to_string(),
                alive: entry.alive,
            })
            .collect();
        Self { services }
    }

    /// Entries whose service has been dropped without being withdrawn.
    pub fn stale(&self) -> impl Iterator<Item = &ServiceReport> {
        self.services.iter().filter(|service| !service.alive)
    }

    #[cfg(feature = "config")]
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for RegistryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Registered Services")?;
        writeln!(f, "-------------------")?;
        for service in &self.services {
            let state = if service.alive { "alive" } else { "expired" };
            writeln!(f, "[{}] {}", service.capability, state)?;
            if service.alive {
                writeln!(f, "\t-> {}", service.service_type)?;
            }
        }
        Ok(())
    }
}

/// One pending consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize))]
pub struct ConsumerReport {
    pub consumer: String,
    pub alive: bool,
    pub has_config: bool,
    pub missing: Vec<String>,
}

/// State of a [`DependencyResolver`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize))]
pub struct ResolverReport {
    pub config: String,
    pub attached: bool,
    pub pending: Vec<ConsumerReport>,
}

impl ResolverReport {
    pub fn capture(resolver: &DependencyResolver) -> Self {
        let pending = resolver
            .pending_entries()
            .into_iter()
            .map(|entry| ConsumerReport {
                consumer: entry.consumer.concrete().short_name().to_string(),
                alive: entry.alive,
                has_config: entry.missing.is_some(),
                missing: entry
                    .missing
                    .unwrap_or_default()
                    .iter()
                    .map(|capability| capability.short_name().to_string())
                    .collect(),
            })
            .collect();
        Self {
            config: resolver.config().name().to_string(),
            attached: resolver.is_attached(),
            pending,
        }
    }

    #[cfg(feature = "config")]
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for ResolverReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Pending Consumers ({})", self.config)?;
        writeln!(f, "-------------------")?;
        for consumer in &self.pending {
            if !consumer.alive {
                writeln!(f, "{} (expired)", consumer.consumer)?;
            } else if !consumer.has_config {
                writeln!(f, "{} (no config entry)", consumer.consumer)?;
            } else {
                writeln!(f, "{} waiting for: {}", consumer.consumer, consumer.missing.join(", "))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DependencyConfig, DependencyConsumer, DependencyContainer, DependencyList};
    use std::sync::Arc;

    trait Audio: Send + Sync {}
    trait Saves: Send + Sync {}
    struct Mixer;
    impl Audio for Mixer {}

    struct Hud;
    impl DependencyConsumer for Hud {
        fn inject_dependencies(&self, _dependencies: DependencyContainer) {}
    }

    #[test]
    fn test_registry_report_text() {
        let registry = ServiceRegistry::new();
        let mixer: Arc<dyn Audio> = Arc::new(Mixer);
        registry.register_service::<dyn Audio>(&mixer).unwrap();

        let report = RegistryReport::capture(&registry);
        let text = report.to_string();
        assert!(text.starts_with("Registered Services\n"));
        assert!(text.contains("[Audio] alive"));
        assert_eq!(report.stale().count(), 0);

        drop(mixer);
        let report = RegistryReport::capture(&registry);
        assert!(report.to_string().contains("[Audio] expired"));
        assert_eq!(report.stale().count(), 1);
    }

    #[test]
    fn test_resolver_report_lists_missing() {
        let config = DependencyConfig::builder()
            .named("Hud")
            .add::<Hud>(DependencyList::new().depends_on::<dyn Audio>().depends_on::<dyn Saves>())
            .build()
            .unwrap();
        let registry = ServiceRegistry::new();
        let resolver = DependencyResolver::new(registry.clone(), config);
        let mixer: Arc<dyn Audio> = Arc::new(Mixer);
        registry.register_service::<dyn Audio>(&mixer).unwrap();

        let hud = Arc::new(Hud);
        resolver.register_for_dependencies(&hud);

        let report = ResolverReport::capture(&resolver);
        assert!(report.attached);
        assert_eq!(report.pending.len(), 1);
        assert_eq!(report.pending[0].missing, vec!["Saves".to_string()]);
        assert!(report.to_string().contains("Hud waiting for: Saves"));
    }

    #[cfg(feature = "config")]
    #[test]
    fn test_report_json() {
        let registry = ServiceRegistry::new();
        let mixer: Arc<dyn Audio> = Arc::new(Mixer);
        registry.register_service::<dyn Audio>(&mixer).unwrap();

        let json = RegistryReport::capture(&registry).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["services"][0]["capability"], "Audio");
        assert_eq!(value["services"][0]["alive"], true);
    }
}
