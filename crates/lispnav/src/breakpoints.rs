//
// breakpoints.rs
//
// Copyright (C) 2026 Posit Software, PBC. All rights reserved.
//
// User breakpoints on Lisp functions. A host breakpoint on an evaluator
// entry point fires for every call that passes through it, so each carries a
// name predicate: stop only when the Lisp callee now in scope is the one the
// user asked for.
//

use std::fmt;

use scry::host::BreakpointId;
use scry::host::BreakpointOptions;
use scry::host::Host;

use crate::entry::EntryPoint;
use crate::errors::Result;
use crate::funcview::EvalView;
use crate::funcview::LambdaView;
use crate::funcview::SubrView;

pub struct LispBreakpoint {
    id: BreakpointId,
    tag: String,
    entry: EntryPoint,
}

impl LispBreakpoint {
    /// Installs the breakpoint pair watching for `name`: one on the eval
    /// entry point and one on the subr-funcall entry point. The second is
    /// needed because some built-in primitives are entered directly through
    /// funcall without an eval step in between.
    pub fn create_pair(host: &dyn Host, name: &str) -> Result<(LispBreakpoint, LispBreakpoint)> {
        let eval = LispBreakpoint::install(host, name, EntryPoint::EvalSub)?;
        let subr = LispBreakpoint::install(host, name, EntryPoint::FuncallSubr)?;
        Ok((eval, subr))
    }

    fn install(host: &dyn Host, name: &str, entry: EntryPoint) -> Result<LispBreakpoint> {
        let id = host.create_breakpoint(&entry.location(), BreakpointOptions::default())?;
        let breakpoint = LispBreakpoint {
            id,
            tag: String::from(name),
            entry,
        };
        host.echo(&format!("set breakpoint: {breakpoint}"));
        Ok(breakpoint)
    }

    pub fn id(&self) -> BreakpointId {
        self.id
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn entry(&self) -> EntryPoint {
        self.entry
    }

    /// The stop predicate: stop only if the Lisp callee in scope has our
    /// name. Extraction faults mean no stop.
    pub fn should_stop(&self, host: &dyn Host) -> bool {
        match self.matches(host) {
            Ok(matches) => matches,
            Err(error) => {
                log::trace!("breakpoint predicate on {self} did not apply: {error:?}");
                false
            },
        }
    }

    fn matches(&self, host: &dyn Host) -> Result<bool> {
        let frame = host.newest_frame()?;

        match self.entry {
            // Only a call form counts: a cons whose head is a symbol with
            // the tagged name.
            EntryPoint::EvalSub => {
                let view = EvalView::new(host, frame)?;
                Ok(view.callee_symbol(host)?.as_deref() == Some(self.tag.as_str()))
            },

            EntryPoint::FuncallSubr => {
                let view = SubrView::new(host, frame)?;
                Ok(view.name(host)? == self.tag)
            },

            EntryPoint::FuncallLambda => {
                let view = LambdaView::new(host, frame)?;
                Ok(view.name(host)? == self.tag)
            },
        }
    }
}

impl fmt::Display for LispBreakpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [in {}]", self.tag, self.entry)
    }
}

#[cfg(test)]
mod tests {
    use scry::fixtures::MockHost;

    use super::*;

    #[test]
    fn test_create_pair_targets_eval_and_funcall() {
        let host = MockHost::new();
        let (eval, subr) = LispBreakpoint::create_pair(&host, "foo").unwrap();

        assert_eq!(eval.entry(), EntryPoint::EvalSub);
        assert_eq!(subr.entry(), EntryPoint::FuncallSubr);
        assert_eq!(eval.tag(), "foo");
        assert!(host.has_breakpoint_at(&EntryPoint::EvalSub.location()));
        assert!(host.has_breakpoint_at(&EntryPoint::FuncallSubr.location()));
    }

    #[test]
    fn test_eval_predicate_matches_only_the_tagged_call_form() {
        let host = MockHost::new();
        let (eval, _subr) = LispBreakpoint::create_pair(&host, "foo").unwrap();

        // (foo 1): stop.
        let form = host.form("foo", &[host.fixnum(1)]);
        host.push_frame_with("eval_sub", &[("form", form)]);
        assert!(eval.should_stop(&host));
        host.pop_frame();

        // (bar 1): someone else's call.
        let form = host.form("bar", &[host.fixnum(1)]);
        host.push_frame_with("eval_sub", &[("form", form)]);
        assert!(!eval.should_stop(&host));
        host.pop_frame();

        // A bare symbol is not a call.
        host.push_frame_with("eval_sub", &[("form", host.symbol("foo"))]);
        assert!(!eval.should_stop(&host));
    }

    #[test]
    fn test_subr_predicate_reads_the_descriptor_name() {
        let host = MockHost::new();
        let (_eval, subr) = LispBreakpoint::create_pair(&host, "cons").unwrap();

        let descriptor = host.subr("cons", 0x4000, 2, 2);
        host.push_frame_with("funcall_subr", &[
            ("subr", descriptor),
            ("args", host.values(&[])),
            ("numargs", host.fixnum(0)),
        ]);
        assert!(subr.should_stop(&host));
    }

    #[test]
    fn test_predicate_faults_mean_no_stop() {
        let host = MockHost::new();
        let (eval, _subr) = LispBreakpoint::create_pair(&host, "foo").unwrap();

        // No frame at all.
        assert!(!eval.should_stop(&host));

        // A frame without the expected variable.
        host.push_frame("eval_sub");
        assert!(!eval.should_stop(&host));
    }
}
