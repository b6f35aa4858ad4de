//
// errors.rs
//
// Copyright (C) 2026 Posit Software, PBC. All rights reserved.
//
//

use std::fmt;

use crate::funcview::Arg;

pub type Result<T> = std::result::Result<T, Error>;

/// Engine errors. None of these are fatal: the policy is to substitute
/// placeholders for `InvalidArgs`, rebuild for `OutOfSync`, and report and
/// continue for the rest.
pub enum Error {
    /// An operation assumed the inferior sat at a recognised entry point.
    InvalidEntry {
        function: Option<String>,
    },
    /// Argument extraction faulted; the placeholder list is carried along
    /// so the backtrace renderer stays total.
    InvalidArgs {
        placeholders: Vec<Arg>,
    },
    /// A stop event contained nothing the engine recognises.
    UnexpectedStop,
    /// The virtual stack no longer matches the inferior stack.
    OutOfSync,
    /// The user declined a destructive session-wide action.
    UserAbort,
    /// A fault in the inferior-access layer.
    Scry(scry::Error),
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Scry(source) => Some(source),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidEntry { function } => match function {
                Some(function) => {
                    write!(f, "function '{function}' is not a valid entry point to a Lisp")
                },
                None => write!(f, "not stopped at a recognised entry point"),
            },

            Error::InvalidArgs { placeholders } => {
                write!(
                    f,
                    "could not extract {} args from the frame",
                    placeholders.len()
                )
            },

            Error::UnexpectedStop => {
                write!(f, "stop event contained nothing the engine recognises")
            },

            Error::OutOfSync => {
                write!(f, "virtual Lisp stack is out of sync with the inferior")
            },

            Error::UserAbort => {
                write!(f, "user skipped cleanup")
            },

            Error::Scry(error) => {
                write!(f, "{error}")
            },
        }
    }
}

// NOTE: Debug is the same as Display, matching anyhow error formatters.
impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl From<scry::Error> for Error {
    fn from(error: scry::Error) -> Self {
        Error::Scry(error)
    }
}
