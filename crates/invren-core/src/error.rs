//! Error types for the invren-core library.

use thiserror::Error;

/// Main error type for the invren library.
#[derive(Error, Debug)]
pub enum InvrenError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Text acquisition error.
    #[error("text source error: {0}")]
    TextSource(#[from] TextSourceError),

    /// Per-document pipeline error.
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Remote extraction boundary error.
    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    /// Naming error.
    #[error("naming error: {0}")]
    Naming(#[from] NamingError),

    /// Batch orchestration error.
    #[error("batch error: {0}")]
    Batch(#[from] BatchError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors detected while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read a configuration file.
    #[error("failed to read config {path}: {reason}")]
    Read { path: String, reason: String },

    /// Failed to parse a configuration file.
    #[error("failed to parse config {path}: {reason}")]
    Parse { path: String, reason: String },

    /// Fiscal calendar start month outside 1..=12.
    #[error("invalid quarter start month {month} for entity {entity}")]
    InvalidQuarterStart { entity: String, month: u32 },

    /// A configured regex pattern does not compile.
    #[error("invalid pattern `{pattern}` in {context}: {reason}")]
    InvalidPattern {
        pattern: String,
        context: String,
        reason: String,
    },

    /// A folder template references an unknown placeholder.
    #[error("unknown placeholder `{placeholder}` in folder template for entity {entity}")]
    UnknownPlaceholder { entity: String, placeholder: String },

    /// Entity id not present in the configuration store.
    #[error("unknown entity: {0}")]
    UnknownEntity(String),
}

/// Errors from the OCR text boundary.
#[derive(Error, Debug)]
pub enum TextSourceError {
    /// The source does not exist.
    #[error("source not found: {0}")]
    NotFound(String),

    /// The source exists but yielded no usable text.
    #[error("no usable text in {0}")]
    Empty(String),

    /// The source could not be read or decoded.
    #[error("failed to read {source_name}: {reason}")]
    Unreadable { source_name: String, reason: String },
}

/// Errors from a single document's processing pipeline.
///
/// Note that a missing or unparseable invoice date is NOT an error here: the
/// pipeline degrades to a name without a quarter suffix instead.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// OCR produced no usable text; extraction was never attempted.
    #[error("OCR produced no usable text for {0}")]
    OcrFailure(String),

    /// The requested entity has no configuration.
    #[error("unknown entity: {0}")]
    UnknownEntity(String),
}

/// Typed failure from the remote extraction boundary.
///
/// The split between terminal and transient is decided where the failure is
/// observed, never by inspecting message text downstream.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// Retrying cannot help.
    #[error("terminal remote failure: {0}")]
    Terminal(#[from] TerminalFailure),

    /// Retrying may succeed.
    #[error("transient remote failure: {0}")]
    Transient(#[from] TransientFailure),
}

impl RemoteError {
    /// Whether the orchestrator may retry this failure.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RemoteError::Transient(_))
    }
}

/// Remote failures that no amount of retrying can fix.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TerminalFailure {
    /// Malformed or unprocessable input document.
    #[error("invalid input: {0}")]
    BadInput(String),

    /// Authentication or authorization failure.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The document or entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),
}

/// Remote failures worth retrying with backoff.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransientFailure {
    /// The remote did not answer in time.
    #[error("timeout: {0}")]
    Timeout(String),

    /// Server-side fault.
    #[error("server error: {0}")]
    ServerError(String),

    /// The remote asked us to slow down.
    #[error("rate limited: {0}")]
    RateLimited(String),
}

/// Errors from name conflict resolution.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NamingError {
    /// Every candidate up to the bound collided with an existing name.
    #[error("could not find a free variant of `{name}` after {attempts} attempts")]
    ConflictExhausted { name: String, attempts: u32 },
}

/// Errors from batch orchestration as a whole (per-document failures are
/// recorded inside the batch result instead).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BatchError {
    /// The request exceeds the batch size cap and truncation was not asked for.
    #[error("batch of {count} documents exceeds the maximum of {max}")]
    TooManyDocuments { count: usize, max: usize },
}

/// Result type for the invren library.
pub type Result<T> = std::result::Result<T, InvrenError>;
