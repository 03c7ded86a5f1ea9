use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

pub type StdErrorBoxed = Box<dyn std::error::Error + Send + Sync + 'static>;

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn invalid_operation(name: impl Into<String>) -> Error {
        Error(ErrorKind::InvalidOperation { name: name.into() }.into())
    }

    pub fn invalid_data(element: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidData {
                element: element.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    /// A request for a result position that cannot exist, even after full
    /// materialization. Recoverable by the caller adjusting parameters.
    pub fn out_of_range(context: impl Into<String>, index: usize, available: usize) -> Error {
        Error(
            ErrorKind::OutOfRange {
                context: context.into(),
                index,
                available,
            }
            .into(),
        )
    }

    /// A failure while pulling from the storage layer's result source.
    pub fn source_failure<E>(context: impl Into<String>, source: E) -> Error
    where
        E: Into<StdErrorBoxed>,
    {
        Error(
            ErrorKind::Source {
                context: context.into(),
                source: source.into(),
            }
            .into(),
        )
    }

    pub fn job_failed(identifier: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::Job {
                identifier: identifier.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn cancelled(identifier: impl Into<String>) -> Error {
        Error(
            ErrorKind::Cancelled {
                identifier: identifier.into(),
            }
            .into(),
        )
    }

    /// Re-surfaces a previously recorded failure to another waiter.
    pub fn resurfaced(context: impl Into<String>, original: &Error) -> Error {
        Error::source_failure(context, original.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("invalid operation {name}")]
    InvalidOperation { name: String },

    #[error("invalid data from '{element}': {message}")]
    InvalidData { element: String, message: String },

    #[error("{context}: position {index} out of range ({available} results available)")]
    OutOfRange {
        context: String,
        index: usize,
        available: usize,
    },

    #[error("result source failure in '{context}': {source}")]
    Source {
        context: String,
        source: StdErrorBoxed,
    },

    #[error("search job '{identifier}' failed: {message}")]
    Job { identifier: String, message: String },

    #[error("search job '{identifier}' was cancelled before completing")]
    Cancelled { identifier: String },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}
