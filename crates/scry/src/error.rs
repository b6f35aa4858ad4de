//
// error.rs
//
// Copyright (C) 2026 Posit Software, PBC. All rights reserved.
//
//

use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

pub enum Error {
    /// The inferior faulted while the host evaluated an expression or read
    /// memory on our behalf.
    MemoryFault {
        expression: String,
    },
    /// The requested variable does not exist in the frame.
    MissingVariable {
        name: String,
    },
    /// A Lisp symbol lookup came back empty.
    MissingSymbol {
        name: String,
    },
    /// The value's tag matched none of the variants we know how to read.
    UnknownTag {
        rendered: String,
    },
    /// An accessor was called on the wrong Lisp variant.
    UnexpectedVariant {
        expected: &'static str,
        actual: &'static str,
    },
    /// No inferior frame is available (the inferior is not stopped, or the
    /// stack is exhausted).
    NoFrame,
    /// The host debugger refused an operation.
    Host {
        message: String,
    },
}

// empty implementation required for 'anyhow'
impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::MemoryFault { expression } => {
                write!(f, "Memory fault while evaluating '{expression}'")
            },

            Error::MissingVariable { name } => {
                write!(f, "Variable '{name}' not found")
            },

            Error::MissingSymbol { name } => {
                write!(f, "No Lisp symbol named '{name}'")
            },

            Error::UnknownTag { rendered } => {
                write!(f, "Value '{rendered}' has a tag we don't recognise")
            },

            Error::UnexpectedVariant { expected, actual } => {
                write!(f, "Expected a {expected}; got a {actual}")
            },

            Error::NoFrame => {
                write!(f, "No inferior frame available")
            },

            Error::Host { message } => {
                write!(f, "{message}")
            },
        }
    }
}

// NOTE: Debug is the same as Display. This matches anyhow error formatters
// so logged errors read as messages rather than struct dumps.
impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
