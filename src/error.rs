/// Errors surfaced by [`Emitter::emit`](crate::Emitter::emit) and the
/// configuration setters.
///
/// Every error is reported synchronously by the call that triggered it.
/// After an error the emitter is in an unspecified state and must be
/// discarded.
#[derive(Debug, thiserror::Error)]
pub enum EmitterError {
    /// The event stream violated the document grammar.
    #[error("unexpected event: {0}")]
    UnexpectedEvent(&'static str),
    /// A `%YAML` directive named a version this emitter does not produce.
    #[error("incompatible %YAML directive: {major}.{minor}")]
    IncompatibleVersion { major: i32, minor: i32 },
    /// Two `%TAG` directives in one document share a handle.
    #[error("duplicate %TAG directive for handle {0:?}")]
    DuplicateTagDirective(String),
    /// A configuration value or event field is out of range or malformed.
    #[error("{0}")]
    InvalidArgument(&'static str),
    /// Internal dispatch reached a state that the event analysis should
    /// have made impossible.
    #[error("invalid emitter state: {0}")]
    InvalidState(&'static str),
    /// The output sink failed; the error is passed through unchanged.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
