//! One module instance: the registry, the host it talks to, and its config.

use crate::bridge::Bridge;
use crate::capability::Extension;
use crate::config::BridgeConfig;
use crate::error::GuestError;
use crate::host::HostEnv;
use crate::registry::PluginRegistry;

pub struct GuestModule<H: HostEnv> {
    registry: PluginRegistry,
    host: H,
    config: BridgeConfig,
}

impl<H: HostEnv> std::fmt::Debug for GuestModule<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuestModule")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<H: HostEnv> GuestModule<H> {
    /// Validate `config` and register `extension` into a fresh registry.
    pub fn initialize<E: Extension>(
        host: H,
        config: BridgeConfig,
        extension: E,
    ) -> Result<Self, GuestError> {
        config.validate()?;
        let registry = PluginRegistry::new();
        registry.register(Box::new(extension))?;
        Ok(Self {
            registry,
            host,
            config,
        })
    }

    /// Initialization at the module boundary, where no caller can receive
    /// an error: log it and abort the instance.
    ///
    /// The failure is only visible if a subscriber is installed, so call
    /// [`crate::logging::init`] first. `export_plugin!` does.
    pub fn initialize_or_abort<E, F>(host: H, config: BridgeConfig, make: F) -> Self
    where
        E: Extension,
        F: FnOnce(&H) -> Result<E, GuestError>,
    {
        match make(&host).and_then(|extension| Self::initialize(host, config, extension)) {
            Ok(module) => module,
            Err(e) => {
                tracing::error!("module initialization failed: {e}");
                std::process::abort();
            }
        }
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn bridge(&self) -> Bridge<'_, H> {
        Bridge::new(&self.registry, &self.host, &self.config)
    }
}
