//! Host accessors visible to the guest.
//!
//! The host owns the shutdown flag and the extension's configuration; the
//! guest only reads them. Every read goes back to the host.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// What the guest can ask of its host.
pub trait HostEnv: Send + Sync {
    /// Current value of the host's shutdown flag.
    fn shutdown_requested(&self) -> bool;

    /// Configuration document for the extension, if the host supplies one.
    fn plugin_config(&self) -> Option<Vec<u8>> {
        None
    }
}

impl<H: HostEnv + ?Sized> HostEnv for &H {
    fn shutdown_requested(&self) -> bool {
        (**self).shutdown_requested()
    }

    fn plugin_config(&self) -> Option<Vec<u8>> {
        (**self).plugin_config()
    }
}

impl<H: HostEnv + ?Sized> HostEnv for Arc<H> {
    fn shutdown_requested(&self) -> bool {
        (**self).shutdown_requested()
    }

    fn plugin_config(&self) -> Option<Vec<u8>> {
        (**self).plugin_config()
    }
}

// ─── In-process host ────────────────────────────────────────────────────

/// Host that lives in the same process as the guest.
///
/// Used when the bridge is embedded natively and by the test suites.
#[derive(Debug, Default)]
pub struct LocalHost {
    shutdown: AtomicBool,
    config: Option<Vec<u8>>,
    queries: AtomicU64,
}

impl LocalHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_plugin_config(mut self, config: impl Into<Vec<u8>>) -> Self {
        self.config = Some(config.into());
        self
    }

    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    pub fn reset(&self) {
        self.shutdown.store(false, Ordering::SeqCst);
    }

    /// Number of times the guest has read the shutdown flag.
    pub fn shutdown_queries(&self) -> u64 {
        self.queries.load(Ordering::SeqCst)
    }
}

impl HostEnv for LocalHost {
    fn shutdown_requested(&self) -> bool {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.shutdown.load(Ordering::SeqCst)
    }

    fn plugin_config(&self) -> Option<Vec<u8>> {
        self.config.clone()
    }
}

// ─── WASM host ──────────────────────────────────────────────────────────

#[cfg(target_arch = "wasm32")]
mod imports {
    #[link(wasm_import_module = "opentelemetry.io/wasm")]
    extern "C" {
        pub fn get_shutdown_requested() -> i32;
        /// Copies up to `cap` bytes of the config into `ptr` and returns the
        /// full length, or a negative value when there is no config.
        pub fn get_plugin_config(ptr: *mut u8, cap: u32) -> i32;
    }
}

/// Host reached through the sandbox's imported functions.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default, Clone, Copy)]
pub struct WasmHost;

#[cfg(target_arch = "wasm32")]
impl HostEnv for WasmHost {
    fn shutdown_requested(&self) -> bool {
        unsafe { imports::get_shutdown_requested() != 0 }
    }

    fn plugin_config(&self) -> Option<Vec<u8>> {
        let len = unsafe { imports::get_plugin_config(std::ptr::null_mut(), 0) };
        if len < 0 {
            return None;
        }
        let mut buf = vec![0u8; len as usize];
        let written = unsafe { imports::get_plugin_config(buf.as_mut_ptr(), len as u32) };
        if written < 0 {
            return None;
        }
        buf.truncate(written.min(len) as usize);
        Some(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_host_flag() {
        let host = LocalHost::new();
        assert!(!host.shutdown_requested());
        host.request_shutdown();
        assert!(host.shutdown_requested());
        host.reset();
        assert!(!host.shutdown_requested());
        assert_eq!(host.shutdown_queries(), 3);
    }

    #[test]
    fn test_local_host_config() {
        assert!(LocalHost::new().plugin_config().is_none());
        let host = LocalHost::new().with_plugin_config(r#"{"key":"v"}"#);
        assert_eq!(host.plugin_config().unwrap(), br#"{"key":"v"}"#.to_vec());
    }

    #[test]
    fn test_reference_forwards() {
        let host = LocalHost::new();
        let by_ref: &LocalHost = &host;
        host.request_shutdown();
        assert!(HostEnv::shutdown_requested(&by_ref));
    }
}
