use super::{AkkarBommer2010, BooreAtkinson2008, Gsim};
use crate::domain::{ConfigResult, HazardError};
use std::collections::BTreeMap;
use std::sync::Arc;

pub type GsimConstructor = fn() -> Arc<dyn Gsim>;

/// Read-only map from GSIM name to constructor. Built once and passed to
/// whatever needs to resolve models by name.
#[derive(Debug, Clone, Default)]
pub struct GsimRegistry {
    constructors: BTreeMap<&'static str, GsimConstructor>,
}

impl GsimRegistry {
    pub fn builtin() -> Self {
        Self::default()
            .with("AkkarBommer2010", || Arc::new(AkkarBommer2010))
            .with("BooreAtkinson2008", || Arc::new(BooreAtkinson2008))
    }

    pub fn with(mut self, name: &'static str, constructor: GsimConstructor) -> Self {
        self.constructors.insert(name, constructor);
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.constructors.keys().copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    pub fn resolve(&self, name: &str) -> ConfigResult<Arc<dyn Gsim>> {
        self.constructors
            .get(name)
            .map(|constructor| constructor())
            .ok_or_else(|| {
                HazardError::configuration(
                    "CONFIG.UNKNOWN_GSIM",
                    format!(
                        "unknown GSIM '{name}', available: {}",
                        self.names().collect::<Vec<_>>().join(", ")
                    ),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::GsimRegistry;
    use crate::domain::HazardErrorCategory;

    #[test]
    fn builtin_registry_resolves_known_models() {
        let registry = GsimRegistry::builtin();
        assert_eq!(
            registry.names().collect::<Vec<_>>(),
            vec!["AkkarBommer2010", "BooreAtkinson2008"]
        );
        let gsim = registry.resolve("BooreAtkinson2008").expect("known gsim");
        assert_eq!(gsim.name(), "BooreAtkinson2008");
    }

    #[test]
    fn unknown_names_are_configuration_errors() {
        let error = GsimRegistry::builtin()
            .resolve("Sadigh1997")
            .expect_err("unknown gsim");
        assert_eq!(error.category(), HazardErrorCategory::ConfigurationError);
        assert!(error.message().contains("Sadigh1997"));
        assert!(error.message().contains("AkkarBommer2010"));
    }

    #[test]
    fn registries_can_be_extended_for_tests() {
        let registry = GsimRegistry::default()
            .with("Mock", || std::sync::Arc::new(crate::gsim::AkkarBommer2010));
        assert!(registry.contains("Mock"));
        assert!(!registry.contains("AkkarBommer2010"));
    }
}
