// Domain errors - Error types for the editing session

use std::fmt;

/// Broad classification of domain errors, used by callers to decide whether
/// to retry, report, or skip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad ranges or parameters; state unchanged
    Validation,
    /// Overlap on an exclusive track; operation skipped or rejected
    Conflict,
    /// Operation not allowed in the current session state
    State,
    /// Analysis or renderer collaborator failed
    CollaboratorFailure,
    /// Invariant violation inside the crate
    Internal,
}

/// Domain-specific error types
#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Invalid arguments provided
    BadArgs(String),
    /// Duration must be positive and finite
    InvalidDuration(f64),
    /// Session duration is already fixed to a different value
    DurationAlreadyResolved { current: f64, requested: f64 },
    /// Parameter value outside its declared range
    OutOfRange {
        parameter: String,
        value: f64,
        min: f64,
        max: f64,
    },
    /// No such effect parameter
    UnknownParameter(String),
    /// Parameter value has the wrong type
    ParameterTypeMismatch { parameter: String, expected: String },
    /// Clip range is empty, negative, or outside the session bounds
    InvalidRange { start: f64, end: f64, reason: String },
    /// Split point not strictly inside the clip
    SplitOutOfRange {
        clip_id: String,
        time: f64,
        start: f64,
        end: f64,
    },
    /// Clip would overlap another clip on an exclusive track
    OverlapNotAllowed { track: String, conflicting: String },
    /// Clip id not present in any track
    ClipNotFound(String),
    /// Clip is locked against edits
    ClipLocked(String),
    /// Session is exporting or otherwise unable to accept the event
    SessionBusy(String),
    /// No media loaded yet
    NoMediaLoaded,
    /// Suggestion payload failed structural validation
    MalformedSuggestion(String),
    /// Analysis collaborator failed
    AnalysisFailed(String),
    /// Renderer collaborator failed
    RenderFailed(String),
    /// Project storage failed
    StorageFailed(String),
    /// Internal error
    InternalError(String),
}

impl DomainError {
    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::BadArgs(_)
            | DomainError::InvalidDuration(_)
            | DomainError::OutOfRange { .. }
            | DomainError::UnknownParameter(_)
            | DomainError::ParameterTypeMismatch { .. }
            | DomainError::InvalidRange { .. }
            | DomainError::SplitOutOfRange { .. }
            | DomainError::ClipNotFound(_) => ErrorKind::Validation,
            DomainError::OverlapNotAllowed { .. } | DomainError::ClipLocked(_) => {
                ErrorKind::Conflict
            }
            DomainError::DurationAlreadyResolved { .. }
            | DomainError::SessionBusy(_)
            | DomainError::NoMediaLoaded => ErrorKind::State,
            DomainError::MalformedSuggestion(_)
            | DomainError::AnalysisFailed(_)
            | DomainError::RenderFailed(_)
            | DomainError::StorageFailed(_) => ErrorKind::CollaboratorFailure,
            DomainError::InternalError(_) => ErrorKind::Internal,
        }
    }

    /// Whether the caller may retry the same request later
    pub fn is_retryable(&self) -> bool {
        matches!(self, DomainError::SessionBusy(_))
            || self.kind() == ErrorKind::CollaboratorFailure
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainError::BadArgs(msg) => write!(f, "Bad arguments: {}", msg),
            DomainError::InvalidDuration(d) => {
                write!(f, "Invalid duration: {} (must be positive)", d)
            }
            DomainError::DurationAlreadyResolved { current, requested } => write!(
                f,
                "Duration already resolved to {:.3}s, cannot change to {:.3}s",
                current, requested
            ),
            DomainError::OutOfRange {
                parameter,
                value,
                min,
                max,
            } => write!(
                f,
                "Parameter '{}' value {} out of range [{}, {}]",
                parameter, value, min, max
            ),
            DomainError::UnknownParameter(name) => write!(f, "Unknown parameter: {}", name),
            DomainError::ParameterTypeMismatch {
                parameter,
                expected,
            } => write!(f, "Parameter '{}' expects {}", parameter, expected),
            DomainError::InvalidRange { start, end, reason } => write!(
                f,
                "Invalid range [{:.3}, {:.3}): {}",
                start, end, reason
            ),
            DomainError::SplitOutOfRange {
                clip_id,
                time,
                start,
                end,
            } => write!(
                f,
                "Split time {:.3}s is outside clip {} ({:.3}s..{:.3}s)",
                time, clip_id, start, end
            ),
            DomainError::OverlapNotAllowed { track, conflicting } => write!(
                f,
                "Overlap not allowed on {} track (conflicts with clip {})",
                track, conflicting
            ),
            DomainError::ClipNotFound(id) => write!(f, "Clip not found: {}", id),
            DomainError::ClipLocked(id) => write!(f, "Clip is locked: {}", id),
            DomainError::SessionBusy(msg) => write!(f, "Session busy: {}", msg),
            DomainError::NoMediaLoaded => write!(f, "No media loaded"),
            DomainError::MalformedSuggestion(msg) => write!(f, "Malformed suggestion: {}", msg),
            DomainError::AnalysisFailed(msg) => write!(f, "Analysis failed: {}", msg),
            DomainError::RenderFailed(msg) => write!(f, "Render failed: {}", msg),
            DomainError::StorageFailed(msg) => write!(f, "Project storage failed: {}", msg),
            DomainError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for DomainError {}
