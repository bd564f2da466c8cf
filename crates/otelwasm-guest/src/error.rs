//! Guest bridge error types.

use thiserror::Error;

use crate::signal::Capability;

#[derive(Error, Debug)]
pub enum GuestError {
    #[error("empty registration: {0}")]
    EmptyRegistration(String),

    #[error("extension already registered: {active} (rejected {rejected})")]
    AlreadyRegistered { active: String, rejected: String },

    #[error("registry poisoned by failed registration: {0}")]
    RegistryPoisoned(String),

    #[error("no extension registered")]
    NotRegistered,

    #[error("extension {extension} does not implement {capability}")]
    UnboundCapability {
        extension: String,
        capability: Capability,
    },

    #[error("unknown signal discriminator: {0}")]
    UnknownSignal(u32),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("receiver started from inside an async runtime; use Bridge::drive instead")]
    NestedRuntime,

    #[error("runtime error: {0}")]
    Runtime(#[from] std::io::Error),

    #[error("payload decode error: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GuestError {
    /// Whether this error is a host/guest contract or init failure that must
    /// halt the module instance instead of being reported per call.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            GuestError::EmptyRegistration(_)
                | GuestError::AlreadyRegistered { .. }
                | GuestError::RegistryPoisoned(_)
                | GuestError::NotRegistered
                | GuestError::UnboundCapability { .. }
                | GuestError::UnknownSignal(_)
                | GuestError::Config(_)
                | GuestError::NestedRuntime
                | GuestError::Runtime(_)
        )
    }
}
