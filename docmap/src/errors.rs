use backtrace::Backtrace;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;
use std::sync::Arc;

/// Error kinds for docmap operations.
///
/// Each kind names a category of failure so callers can branch on the
/// category without parsing messages.
///
/// # Examples
///
/// ```rust,ignore
/// use docmap::errors::{DocmapError, ErrorKind, DocmapResult};
///
/// fn example() -> DocmapResult<()> {
///     Err(DocmapError::new("Distance field must not be empty", ErrorKind::ValidationError))
/// }
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    // Validation Errors - raised by value constructors and builders
    /// Generic validation error
    ValidationError,
    /// Invalid field name
    InvalidFieldName,
    /// Invalid data type for operation
    InvalidDataType,

    // Operation Errors
    /// The operation is not valid in the current context
    InvalidOperation,
    /// The requested resource was not found
    NotFound,

    // Mapping Errors
    /// Error mapping an object to or from a document
    ObjectMappingError,

    // Lifecycle Errors
    /// An entity callback failed
    CallbackError,
    /// The auditing handler failed to stamp an entity
    AuditingError,

    // Generic/Internal Errors - used as fallback
    /// Internal error (usually indicates a bug)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::ValidationError => write!(f, "Validation error"),
            ErrorKind::InvalidFieldName => write!(f, "Invalid field name"),
            ErrorKind::InvalidDataType => write!(f, "Invalid data type"),
            ErrorKind::InvalidOperation => write!(f, "Invalid operation"),
            ErrorKind::NotFound => write!(f, "Not found"),
            ErrorKind::ObjectMappingError => write!(f, "Object mapping error"),
            ErrorKind::CallbackError => write!(f, "Callback error"),
            ErrorKind::AuditingError => write!(f, "Auditing error"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Custom docmap error type.
///
/// `DocmapError` carries a message, an [ErrorKind] and an optional cause, and
/// captures a backtrace at construction time for debugging.
///
/// # Examples
///
/// ```rust,ignore
/// use docmap::errors::{DocmapError, ErrorKind};
///
/// let cause = DocmapError::new("auditor lookup failed", ErrorKind::AuditingError);
/// let err = DocmapError::new_with_cause("before-convert callback failed", ErrorKind::CallbackError, cause);
/// ```
#[derive(Clone)]
pub struct DocmapError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<DocmapError>>,
    backtrace: Arc<Backtrace>,
}

impl DocmapError {
    /// Creates a new `DocmapError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        DocmapError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: Arc::new(Backtrace::new()),
        }
    }

    /// Creates a new `DocmapError` that wraps an underlying cause.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: DocmapError) -> Self {
        DocmapError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: Arc::new(Backtrace::new()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&DocmapError> {
        self.cause.as_deref()
    }
}

impl Display for DocmapError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for DocmapError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => write!(f, "{}\n{:?}", self.message, self.backtrace),
        }
    }
}

impl Error for DocmapError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for docmap operations.
pub type DocmapResult<T> = Result<T, DocmapError>;

impl From<std::fmt::Error> for DocmapError {
    fn from(err: std::fmt::Error) -> Self {
        DocmapError::new(
            &format!("Formatting error: {}", err),
            ErrorKind::InternalError,
        )
    }
}

impl From<String> for DocmapError {
    fn from(msg: String) -> Self {
        DocmapError::new(&msg, ErrorKind::InternalError)
    }
}

impl From<&str> for DocmapError {
    fn from(msg: &str) -> Self {
        DocmapError::new(msg, ErrorKind::InternalError)
    }
}
