use thiserror::Error;

/// Why a required attribute could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    #[error("required attribute `{field}` is missing")]
    MissingField { field: &'static str },

    #[error("attribute `{field}` has the wrong shape: expected {expected}, got {found}")]
    WrongShape {
        field: &'static str,
        expected: &'static str,
        found: String,
    },
}

/// Failure reported by the remote data service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The request never produced an HTTP response (DNS, TLS, timeout, ...).
    #[error("transport error: {0}")]
    Transport(String),

    /// The target record does not exist (already deleted, or never existed).
    #[error("{entity} {id} not found")]
    NotFound { entity: String, id: String },

    #[error("remote returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("could not decode response: {0}")]
    Decode(String),
}

/// A refresh that did not produce a snapshot. The previous snapshot stays in place.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefreshError {
    #[error("query failed: {0}")]
    Remote(#[from] RemoteError),

    #[error("record {index} is malformed: {source}")]
    Mapping {
        index: usize,
        #[source]
        source: MappingError,
    },
}

/// Rejection from the single-flight dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("`{running}` is still in progress")]
    Busy { running: &'static str },

    #[error("background job `{job}` crashed: {message}")]
    Crashed { job: &'static str, message: String },
}

/// Errors surfaced by [`crate::session::SolutionManager`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("not connected to an organization")]
    NotConnected,

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// Loading or saving persisted settings failed.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("settings file {path} is invalid: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("could not serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}
