//
// lib.rs
//
// Copyright (C) 2026 Posit Software, PBC. All rights reserved.
//
//

pub mod error;
pub mod host;
pub mod value;
pub mod variable;

#[cfg(any(test, feature = "testing"))]
pub mod fixtures;

pub use crate::error::Error;
pub use crate::host::BreakpointId;
pub use crate::host::BreakpointOptions;
pub use crate::host::FrameId;
pub use crate::host::Host;
pub use crate::host::Location;
pub use crate::host::RawValue;
pub use crate::host::StopEvent;
pub use crate::host::StopSubscription;
pub use crate::value::LispValue;

pub type Result<T> = std::result::Result<T, error::Error>;
