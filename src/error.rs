use std::fmt;

use smol_str::SmolStr;

/// One frame of a parse failure.
///
/// The innermost frame is raised first; every enclosing layer (codec, field,
/// object, section, file) wraps it with its own context, so the chain reads
/// outside-in: `BadField("SZ")` caused by `BadTerm("Bad uint")`.
#[derive(Debug)]
pub enum ParseError {
    /// An expected structural character was not found.
    MissingDelimiter(char),
    /// A forbidden character was encountered.
    UnexpectedCharacter(char),
    /// Something went wrong while handling a named field.
    BadField(SmolStr, Option<Box<ParseError>>),
    /// Something went wrong while handling the i-th (1-based) list element.
    BadArray(usize, Option<Box<ParseError>>),
    /// A primitive value failed to parse.
    BadTerm(&'static str),
    /// A user callback rejected the parse with a fatal message.
    Callback(String),
    /// Catch-all: unterminated section, bad section name, i/o failure.
    Misc(String),
}

impl ParseError {
    pub(crate) fn bad_field(tag: impl AsRef<str>, cause: ParseError) -> Self {
        ParseError::BadField(SmolStr::new(tag.as_ref()), Some(Box::new(cause)))
    }

    pub(crate) fn bad_array(index: usize, cause: ParseError) -> Self {
        ParseError::BadArray(index, Some(Box::new(cause)))
    }

    /// The wrapped inner error, if this frame carries one.
    pub fn cause(&self) -> Option<&ParseError> {
        match self {
            ParseError::BadField(_, cause) | ParseError::BadArray(_, cause) => cause.as_deref(),
            _ => None,
        }
    }

    /// Flattens the chain into one frame per line, innermost last.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        let mut frame = Some(self);
        while let Some(err) = frame {
            if !out.is_empty() {
                out.push('\n');
            }
            use fmt::Write;
            let _ = write!(out, "{err}");
            frame = err.cause();
        }
        out
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::MissingDelimiter(ch) => write!(f, "missing delimiter '{ch}'"),
            ParseError::UnexpectedCharacter(ch) => write!(f, "unexpected character '{ch}'"),
            ParseError::BadField(tag, _) => write!(f, "bad field \"{tag}\""),
            ParseError::BadArray(index, _) => write!(f, "bad array item {index}"),
            ParseError::BadTerm(reason) => write!(f, "bad term: {reason}"),
            ParseError::Callback(message) => write!(f, "callback error: {message}"),
            ParseError::Misc(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause().map(|err| err as &(dyn std::error::Error + 'static))
    }
}

/// A fatal rejection raised from inside a user callback.
///
/// Returning `Ok(false)` from a load callback skips the rest of the section;
/// returning `Err(CallbackError)` aborts the whole parse and surfaces through
/// the `on_error` sink.
#[derive(Debug, Clone)]
pub struct CallbackError {
    pub message: String,
}

impl CallbackError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CallbackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CallbackError {}

impl From<&str> for CallbackError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for CallbackError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

/// The single error report delivered to the `on_error` sink.
///
/// Carries the failing line's number and raw text plus the full cause chain;
/// `info` is the pre-rendered human-readable summary.
#[derive(Debug)]
pub struct FileError {
    pub info: String,
    pub line_number: u64,
    pub line_data: String,
    pub cause: ParseError,
}

impl FileError {
    pub(crate) fn new(line_number: u64, line_data: String, cause: ParseError) -> Self {
        let info = format!(
            "Failed to parse PGEX file (line {line_number})\n{}",
            cause.describe()
        );
        Self {
            info,
            line_number,
            line_data,
            cause,
        }
    }
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.info)
    }
}

impl std::error::Error for FileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.cause)
    }
}
