use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
/// Coalescion service error.
pub enum Error<E> {
    /// The upstream fetch for this key failed, passed through untouched
    Upstream(E),
    /// The service was shut down before this request could be served
    ShuttingDown,
    /// The outcome never arrived, for example because the upstream call panicked
    RecvError,
}

impl<E: fmt::Display> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Upstream(error) => write!(f, "Upstream fetch failed: {error}"),
            Error::ShuttingDown => write!(f, "Service is shutting down"),
            Error::RecvError => write!(f, "Unable to receive data from the channel"),
        }
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for Error<E> {}
