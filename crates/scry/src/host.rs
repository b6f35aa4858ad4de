//
// host.rs
//
// Copyright (C) 2026 Posit Software, PBC. All rights reserved.
//
// The scripting surface we consume from the host debugger. A real embedding
// implements `Host` over the debugger's extension API; the test suite
// implements it over an in-memory inferior (see `fixtures`).
//

use std::fmt;

use crate::error::Result;

/// An opaque token for a value living in the inferior. Renders as a
/// value-history token the host can resolve inside parsed expressions.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawValue(pub u64);

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "$s{}", self.0)
    }
}

impl fmt::Debug for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawValue({})", self.0)
    }
}

/// A handle on a host breakpoint. The engine owns deletion of every
/// breakpoint it creates; handles may outlive the underlying breakpoint,
/// hence `is_valid` checks before late deletions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BreakpointId(pub u64);

/// A handle on one activation record of the inferior. Stable for as long as
/// the activation is live; comparing handles compares activations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameId(pub u64);

/// Token returned by `connect_stop`, required to disconnect again.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StopSubscription(pub u64);

/// Where a location breakpoint goes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Location {
    /// A function entry, by symbol name.
    Symbol(String),
    /// A labelled statement inside a function.
    Label { function: String, label: String },
    /// A raw code address.
    Address(u64),
}

impl Location {
    pub fn symbol(name: &str) -> Location {
        Location::Symbol(String::from(name))
    }

    pub fn label(function: &str, label: &str) -> Location {
        Location::Label {
            function: String::from(function),
            label: String::from(label),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Symbol(name) => write!(f, "{name}"),
            Location::Label { function, label } => write!(f, "{function}:{label}"),
            Location::Address(address) => write!(f, "*{address:#x}"),
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct BreakpointOptions {
    /// Internal breakpoints are hidden from the user's breakpoint listing.
    pub internal: bool,
    /// Temporary breakpoints are deleted by the host after their first hit.
    pub temporary: bool,
}

impl BreakpointOptions {
    pub const INTERNAL: BreakpointOptions = BreakpointOptions {
        internal: true,
        temporary: false,
    };

    pub const INTERNAL_TEMPORARY: BreakpointOptions = BreakpointOptions {
        internal: true,
        temporary: true,
    };
}

/// One stop of the inferior, carrying every breakpoint the host saw fire at
/// that address.
#[derive(Clone, Debug)]
pub struct StopEvent {
    pub breakpoints: Vec<BreakpointId>,
}

/// The host debugger surface. All calls run while the inferior is stopped;
/// the only suspension point is `resume`.
pub trait Host {
    // --- breakpoints
    fn create_breakpoint(
        &self,
        location: &Location,
        options: BreakpointOptions,
    ) -> Result<BreakpointId>;

    /// Installs a breakpoint that fires when `frame` returns to its caller.
    /// Deleted by the host after firing.
    fn create_finish_breakpoint(&self, frame: FrameId) -> Result<BreakpointId>;

    fn set_breakpoint_enabled(&self, breakpoint: BreakpointId, enabled: bool);

    fn delete_breakpoint(&self, breakpoint: BreakpointId);

    fn breakpoint_is_valid(&self, breakpoint: BreakpointId) -> bool;

    /// The return value recorded by a fired finish breakpoint.
    fn return_value(&self, breakpoint: BreakpointId) -> Option<RawValue>;

    // --- frames
    fn newest_frame(&self) -> Result<FrameId>;

    /// The frame the user currently has selected. Selection is global host
    /// state the user can move at any time, so callers re-read it rather
    /// than caching.
    fn selected_frame(&self) -> Result<FrameId>;

    fn frame_older(&self, frame: FrameId) -> Result<Option<FrameId>>;

    fn frame_newer(&self, frame: FrameId) -> Result<Option<FrameId>>;

    fn frame_function(&self, frame: FrameId) -> Result<Option<String>>;

    fn read_var(&self, frame: FrameId, name: &str) -> Result<RawValue>;

    // --- expressions and values
    fn parse_and_eval(&self, expression: &str) -> Result<RawValue>;

    fn value_int(&self, value: RawValue) -> Result<i64>;

    fn value_string(&self, value: RawValue) -> Result<String>;

    // --- execution control and console
    fn resume(&self);

    fn echo(&self, text: &str);

    /// Synchronous yes/no prompt. Blocks the event loop by design; the
    /// inferior stays stopped while the user decides.
    fn prompt_yes_no(&self, prompt: &str) -> bool;

    // --- stop events
    fn connect_stop(&self) -> StopSubscription;

    fn disconnect_stop(&self, subscription: StopSubscription);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_rendering() {
        assert_eq!(Location::symbol("eval_sub").to_string(), "eval_sub");
        assert_eq!(
            Location::label("eval_sub", "func_subr_arg_n").to_string(),
            "eval_sub:func_subr_arg_n"
        );
        assert_eq!(Location::Address(0xdeadbeef).to_string(), "*0xdeadbeef");
    }

    #[test]
    fn test_raw_value_token() {
        assert_eq!(RawValue(7).to_string(), "$s7");
    }
}
