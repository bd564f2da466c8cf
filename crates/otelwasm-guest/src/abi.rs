//! Export-side glue between the sandbox ABI and the bridge.
//!
//! The host passes payloads through guest memory: it reserves a buffer with
//! `guest_alloc`, writes the encoded batch, calls `process_telemetry`, and
//! releases both the input and the returned response with `guest_free`.
//! Responses are returned as `ptr << 32 | len`.
//!
//! Contract failures halt the instance. Everything else is answered with a
//! status in the response.

use prost::Message;

use crate::capability::Status;
use crate::error::GuestError;
use crate::host::HostEnv;
use crate::module::GuestModule;
use crate::signal::Signal;
use crate::wire::ProcessResponse;

/// Run the receiver export for `signal`; returns when the receiver does.
pub fn start_receiver<H: HostEnv>(module: &GuestModule<H>, signal: Signal) {
    if let Err(e) = module.bridge().start_receiver(signal) {
        fatal(e);
    }
}

/// Capability bits for `get_supported_telemetry`.
pub fn supported<H: HostEnv>(module: &GuestModule<H>) -> u32 {
    match module.bridge().supported() {
        Ok(caps) => caps.bits(),
        Err(e) => fatal(e),
    }
}

/// Encode the answer to one `process_telemetry` call.
///
/// Only fatal errors are returned as `Err`; the export aborts on them.
pub fn respond<H: HostEnv>(
    module: &GuestModule<H>,
    signal: u32,
    payload: &[u8],
) -> Result<Vec<u8>, GuestError> {
    let response = Signal::try_from(signal).and_then(|s| module.bridge().process(s, payload));
    match response {
        Ok(response) => Ok(response.encode_to_vec()),
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => Ok(ProcessResponse::failed(&Status::error(e.to_string())).encode_to_vec()),
    }
}

/// Log a boundary failure and abort the instance.
///
/// Needs [`crate::logging::init`] to have run for the error to be seen.
pub fn fatal(error: GuestError) -> ! {
    tracing::error!(error = %error, "fatal host/guest contract failure");
    std::process::abort()
}

// ─── Guest memory ───────────────────────────────────────────────────────

/// Reserve `len` zeroed bytes for the host to write into.
pub fn alloc(len: u32) -> *mut u8 {
    let buf = vec![0u8; len as usize].into_boxed_slice();
    Box::into_raw(buf) as *mut u8
}

/// Release a buffer from [`alloc`] or a returned response.
///
/// # Safety
///
/// `ptr` and `len` must describe exactly one buffer handed out by this
/// module and not yet freed.
pub unsafe fn free(ptr: *mut u8, len: u32) {
    if ptr.is_null() {
        return;
    }
    let slice = std::ptr::slice_from_raw_parts_mut(ptr, len as usize);
    drop(Box::from_raw(slice));
}

/// Hand ownership of `bytes` to the host as a packed pointer/length pair.
#[cfg(target_arch = "wasm32")]
pub fn leak(bytes: Vec<u8>) -> u64 {
    let len = bytes.len() as u64;
    let ptr = Box::into_raw(bytes.into_boxed_slice()) as *mut u8 as u32 as u64;
    (ptr << 32) | len
}

/// Body of the `process_telemetry` export.
///
/// # Safety
///
/// `ptr` must point to `len` readable bytes in guest memory.
#[cfg(target_arch = "wasm32")]
pub unsafe fn process_telemetry<H: HostEnv>(
    module: &GuestModule<H>,
    signal: u32,
    ptr: *const u8,
    len: u32,
) -> u64 {
    let payload: &[u8] = if ptr.is_null() || len == 0 {
        &[]
    } else {
        std::slice::from_raw_parts(ptr, len as usize)
    };
    match respond(module, signal, payload) {
        Ok(bytes) => leak(bytes),
        Err(e) => fatal(e),
    }
}

/// Generate the module's exports around an extension constructor.
///
/// `$make` is called once, with the host, on the first export call (or on
/// `initialize_plugin`), and must return `Result<impl Extension, GuestError>`.
/// Nothing is generated for non-wasm targets.
#[macro_export]
macro_rules! export_plugin {
    ($make:expr) => {
        #[cfg(target_arch = "wasm32")]
        mod __otelwasm_exports {
            #[allow(unused_imports)]
            use super::*;
            use $crate::host::WasmHost;
            use $crate::module::GuestModule;
            use $crate::signal::Signal;

            static MODULE: ::std::sync::OnceLock<GuestModule<WasmHost>> =
                ::std::sync::OnceLock::new();

            fn module() -> &'static GuestModule<WasmHost> {
                MODULE.get_or_init(|| {
                    let config = $crate::config::BridgeConfig::from_env();
                    $crate::logging::init(&config.log_filter);
                    GuestModule::initialize_or_abort(WasmHost, config, $make)
                })
            }

            #[no_mangle]
            pub extern "C" fn initialize_plugin() {
                module();
            }

            #[no_mangle]
            pub extern "C" fn start_traces_receiver() {
                $crate::abi::start_receiver(module(), Signal::Traces)
            }

            #[no_mangle]
            pub extern "C" fn start_metrics_receiver() {
                $crate::abi::start_receiver(module(), Signal::Metrics)
            }

            #[no_mangle]
            pub extern "C" fn start_logs_receiver() {
                $crate::abi::start_receiver(module(), Signal::Logs)
            }

            #[no_mangle]
            pub extern "C" fn process_telemetry(signal: u32, ptr: u32, len: u32) -> u64 {
                unsafe { $crate::abi::process_telemetry(module(), signal, ptr as *const u8, len) }
            }

            #[no_mangle]
            pub extern "C" fn get_supported_telemetry() -> u32 {
                $crate::abi::supported(module())
            }

            #[no_mangle]
            pub extern "C" fn guest_alloc(len: u32) -> u32 {
                $crate::abi::alloc(len) as u32
            }

            #[no_mangle]
            pub extern "C" fn guest_free(ptr: u32, len: u32) {
                unsafe { $crate::abi::free(ptr as *mut u8, len) }
            }
        }
    };
}
