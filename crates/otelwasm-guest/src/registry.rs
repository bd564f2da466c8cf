//! Plugin registry: the single slot holding a module instance's extension.
//!
//! Registration happens once, during module initialization. A second
//! registration is rejected and the first one stays active. A registration
//! that exposes no capability poisons the slot so that no export can run
//! against a half-initialized module.

use std::sync::OnceLock;

use crate::capability::Extension;
use crate::error::GuestError;
use crate::signal::Capabilities;

enum Slot {
    Active(Box<dyn Extension>),
    Poisoned(String),
}

/// Write-once holder of the active [`Extension`].
#[derive(Default)]
pub struct PluginRegistry {
    slot: OnceLock<Slot>,
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.slot.get() {
            None => "empty".to_string(),
            Some(Slot::Active(ext)) => format!("active({})", ext.name()),
            Some(Slot::Poisoned(reason)) => format!("poisoned({reason})"),
        };
        f.debug_struct("PluginRegistry")
            .field("state", &state)
            .finish()
    }
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the module's extension.
    ///
    /// Returns the capability set that is now callable.
    pub fn register(&self, extension: Box<dyn Extension>) -> Result<Capabilities, GuestError> {
        if let Some(existing) = self.slot.get() {
            return Err(Self::occupied(existing, extension.name()));
        }

        let name = extension.name().to_string();
        let capabilities = extension.capabilities();

        let rejection = if name.trim().is_empty() {
            Some("extension name must not be empty".to_string())
        } else if capabilities.is_empty() {
            Some(format!("extension {name} declares no capabilities"))
        } else {
            None
        };

        if let Some(reason) = rejection {
            // Losing the race to another writer still leaves the slot occupied.
            let _ = self.slot.set(Slot::Poisoned(reason.clone()));
            tracing::error!(extension = %name, "registration rejected: {reason}");
            return Err(GuestError::EmptyRegistration(reason));
        }

        match self.slot.set(Slot::Active(extension)) {
            Ok(()) => {
                tracing::info!(
                    extension = %name,
                    capabilities = %capabilities,
                    "extension registered"
                );
                Ok(capabilities)
            }
            Err(_) => match self.slot.get() {
                Some(existing) => Err(Self::occupied(existing, &name)),
                None => Err(GuestError::NotRegistered),
            },
        }
    }

    /// The active extension, for the bridge.
    pub fn active(&self) -> Result<&dyn Extension, GuestError> {
        match self.slot.get() {
            Some(Slot::Active(ext)) => Ok(ext.as_ref()),
            Some(Slot::Poisoned(reason)) => Err(GuestError::RegistryPoisoned(reason.clone())),
            None => Err(GuestError::NotRegistered),
        }
    }

    pub fn is_registered(&self) -> bool {
        matches!(self.slot.get(), Some(Slot::Active(_)))
    }

    fn occupied(existing: &Slot, rejected: &str) -> GuestError {
        match existing {
            Slot::Active(active) => {
                tracing::warn!(
                    active = %active.name(),
                    rejected = %rejected,
                    "second registration rejected"
                );
                GuestError::AlreadyRegistered {
                    active: active.name().to_string(),
                    rejected: rejected.to_string(),
                }
            }
            Slot::Poisoned(reason) => GuestError::RegistryPoisoned(reason.clone()),
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{ProcessOutput, TracesProcessor};
    use crate::signal::Capability;
    use opentelemetry_proto::tonic::trace::v1::TracesData;

    struct Named(&'static str);

    impl TracesProcessor for Named {
        fn process_traces(&self, traces: &TracesData) -> ProcessOutput<TracesData> {
            ProcessOutput::ok(traces.clone())
        }
    }

    impl Extension for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn as_traces_processor(&self) -> Option<&dyn TracesProcessor> {
            Some(self)
        }
    }

    struct Hollow;

    impl Extension for Hollow {
        fn name(&self) -> &str {
            "hollow"
        }
    }

    #[test]
    fn test_new_registry_is_empty() {
        let registry = PluginRegistry::new();
        assert!(!registry.is_registered());
        assert!(matches!(registry.active(), Err(GuestError::NotRegistered)));
    }

    #[test]
    fn test_register_returns_capabilities() {
        let registry = PluginRegistry::new();
        let caps = registry.register(Box::new(Named("first"))).unwrap();
        assert!(caps.contains(Capability::TracesProcessor));
        assert!(registry.is_registered());
        assert_eq!(registry.active().unwrap().name(), "first");
    }

    #[test]
    fn test_second_registration_rejected_first_wins() {
        let registry = PluginRegistry::new();
        registry.register(Box::new(Named("first"))).unwrap();

        for _ in 0..3 {
            let err = registry.register(Box::new(Named("second"))).unwrap_err();
            match err {
                GuestError::AlreadyRegistered { active, rejected } => {
                    assert_eq!(active, "first");
                    assert_eq!(rejected, "second");
                }
                other => panic!("expected AlreadyRegistered, got: {other:?}"),
            }
            assert_eq!(registry.active().unwrap().name(), "first");
        }
    }

    #[test]
    fn test_empty_registration_fails_and_poisons() {
        let registry = PluginRegistry::new();
        let err = registry.register(Box::new(Hollow)).unwrap_err();
        assert!(matches!(err, GuestError::EmptyRegistration(_)));
        assert!(!registry.is_registered());
        assert!(matches!(
            registry.active(),
            Err(GuestError::RegistryPoisoned(_))
        ));

        // A valid extension cannot rescue a poisoned registry.
        let err = registry.register(Box::new(Named("late"))).unwrap_err();
        assert!(matches!(err, GuestError::RegistryPoisoned(_)));
        assert!(registry.active().is_err());
    }

    #[test]
    fn test_blank_name_is_empty_registration() {
        let registry = PluginRegistry::new();
        let err = registry.register(Box::new(Named("  "))).unwrap_err();
        assert!(matches!(err, GuestError::EmptyRegistration(_)));
    }

    #[test]
    fn test_debug_reports_state() {
        let registry = PluginRegistry::new();
        assert!(format!("{registry:?}").contains("empty"));
        registry.register(Box::new(Named("dbg"))).unwrap();
        assert!(format!("{registry:?}").contains("active(dbg)"));
    }
}
