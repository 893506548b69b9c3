use crate::location::SourceLocation;

/// Every failure mode the HOIL front end (lexer through code
/// generator) can surface, matching the error kinds in `SPEC_FULL.md`
/// §7 that apply above the byte-codec layer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A malformed token: bad escape framing, unterminated block
    /// comment or string, stray character.
    #[error("{location}: syntax error: {message}")]
    Syntax {
        /// Where the bad token starts.
        location: SourceLocation,
        /// Human-readable description. Wording is not part of the
        /// contract (`SPEC_FULL.md` §7).
        message: String,
    },
    /// The parser found a well-formed token where the grammar didn't
    /// expect one, or ran out of tokens mid-construct.
    #[error("{location}: parse error: {message}")]
    Parse {
        /// Where the offending token starts.
        location: SourceLocation,
        /// Human-readable description.
        message: String,
    },
    /// Duplicate symbol, unknown name, wrong arity, wrong branch
    /// target.
    #[error("{location}: {message}")]
    Semantic {
        /// The declaration or statement responsible.
        location: SourceLocation,
        /// Human-readable description.
        message: String,
    },
    /// Type incompatibility, non-boolean branch condition, void/value
    /// return mismatch.
    #[error("{location}: type error: {message}")]
    Type {
        /// The expression or statement responsible.
        location: SourceLocation,
        /// Human-readable description.
        message: String,
    },
    /// An invariant the front end itself is responsible for
    /// maintaining was violated (allocation failure bubbled up from
    /// `coil-format`, an unreachable code path).
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// The source location attached to this error, if it carries one.
    ///
    /// `Internal` errors carry none — they are, by construction, bugs
    /// in this crate rather than problems with the user's source.
    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            Error::Syntax { location, .. }
            | Error::Parse { location, .. }
            | Error::Semantic { location, .. }
            | Error::Type { location, .. } => Some(location),
            Error::Internal(_) => None,
        }
    }
}

impl From<coil_format::Error> for Error {
    fn from(e: coil_format::Error) -> Self {
        Error::Internal(e.to_string())
    }
}
