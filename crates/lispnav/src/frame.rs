//
// frame.rs
//
// Copyright (C) 2026 Posit Software, PBC. All rights reserved.
//
// One node of the virtual Lisp stack. Each frame owns a private set of
// internal breakpoints at the evaluator's argument/body sites and walks a
// small state machine as they fire. Frames never call back into the
// manager: `hit` reports what should happen next and the manager applies it.
//

use std::collections::HashSet;
use std::fmt;

use scry::host::BreakpointId;
use scry::host::BreakpointOptions;
use scry::host::FrameId;
use scry::host::Host;
use scry::host::Location;
use scry::value::LispSubr;
use scry::value::LispValue;
use strum::IntoEnumIterator;

use crate::entry::EntryPoint;
use crate::entry::ExprClass;
use crate::entry::Site;
use crate::errors::Error;
use crate::errors::Result;
use crate::funcview::EvalView;
use crate::funcview::LambdaView;
use crate::funcview::SubrView;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameKind {
    Eval,
    Lambda,
    Subr,
    Primitive,
}

/// Why the frame came to exist.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOrigin {
    Arg,
    Body,
    Breakpoint,
    Unknown,
}

impl fmt::Display for FrameOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FrameOrigin::Arg => "ARG",
            FrameOrigin::Body => "BODY",
            FrameOrigin::Breakpoint => "BREAKPOINT",
            FrameOrigin::Unknown => "UNKNOWN",
        };
        write!(f, "{name}")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameState {
    Entry,
    Arg,
    Body,
    End,
    Unknown,
}

impl fmt::Display for FrameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FrameState::Entry => "ENTRY",
            FrameState::Arg => "ARG",
            FrameState::Body => "BODY",
            FrameState::End => "END",
            FrameState::Unknown => "UNKNOWN",
        };
        write!(f, "{name}")
    }
}

/// Navigation commands, ordered by inclusivity: an earlier command stops
/// for everything a later one does, and more.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum NavCommand {
    Step,
    Next,
    Up,
}

/// Where an internal breakpoint sits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InnerSite {
    /// A labelled argument/body site inside the evaluator.
    Label(Site),
    /// An evaluator entry point (primitives watch all of them; lambdas
    /// watch the eval entry for their body).
    Entry(EntryPoint),
    /// A raw code address (a subr's C implementation).
    Address(u64),
}

impl InnerSite {
    fn location(&self) -> Location {
        match self {
            InnerSite::Label(site) => site.location(),
            InnerSite::Entry(entry) => entry.location(),
            InnerSite::Address(address) => Location::Address(*address),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct InnerBreakpoint {
    pub id: BreakpointId,
    pub site: InnerSite,
}

/// What the manager should do after a frame handled a stop.
pub enum HitOutcome {
    /// Return control to the user.
    Stop,
    /// The stop was not interesting; let the inferior run on.
    Resume,
    /// A child frame was created; push it, then return control to the user.
    Push(Frame),
    /// The underlying inferior frame returned; clean this frame up and pop.
    Finished,
}

enum FrameVariant {
    Eval {
        fun: Option<String>,
        expr_class: Option<ExprClass>,
    },
    Lambda {
        fun: Option<String>,
    },
    Subr {
        subr: Option<LispSubr>,
        name: Option<String>,
    },
    Primitive {
        subr: LispSubr,
        name: String,
        guts: bool,
    },
}

pub struct Frame {
    origin: FrameOrigin,
    state: FrameState,
    command: NavCommand,
    inferior: FrameId,
    start: Option<BreakpointId>,
    finish: Option<BreakpointId>,
    args: Vec<InnerBreakpoint>,
    bodies: Vec<InnerBreakpoint>,
    disabled: HashSet<BreakpointId>,
    user_breakpoint: Option<BreakpointId>,
    variant: FrameVariant,
}

impl Frame {
    /// Constructs the frame variant an entry point maps to.
    pub fn for_entry(
        host: &dyn Host,
        entry: EntryPoint,
        origin: FrameOrigin,
        start: Option<BreakpointId>,
        user_breakpoint: Option<BreakpointId>,
    ) -> Result<Frame> {
        match entry {
            EntryPoint::EvalSub => Frame::new_eval(host, origin, start, user_breakpoint),
            EntryPoint::FuncallLambda => Frame::new_lambda(host, origin, start, user_breakpoint),
            EntryPoint::FuncallSubr => Frame::new_subr(host, origin, start, user_breakpoint),
        }
    }

    pub fn new_eval(
        host: &dyn Host,
        origin: FrameOrigin,
        start: Option<BreakpointId>,
        user_breakpoint: Option<BreakpointId>,
    ) -> Result<Frame> {
        let mut frame = Frame::base(host, origin, start, user_breakpoint, FrameVariant::Eval {
            fun: None,
            expr_class: None,
        })?;

        for site in Site::arg_sites() {
            frame.args.push(install_inner(host, InnerSite::Label(site))?);
        }
        for site in Site::body_sites() {
            frame.bodies.push(install_inner(host, InnerSite::Label(site))?);
        }

        frame.after_install(host)?;
        Ok(frame)
    }

    pub fn new_lambda(
        host: &dyn Host,
        origin: FrameOrigin,
        start: Option<BreakpointId>,
        user_breakpoint: Option<BreakpointId>,
    ) -> Result<Frame> {
        let mut frame =
            Frame::base(host, origin, start, user_breakpoint, FrameVariant::Lambda {
                fun: None,
            })?;

        // The lambda's body runs back through the eval entry point.
        frame
            .bodies
            .push(install_inner(host, InnerSite::Entry(EntryPoint::EvalSub))?);

        frame.after_install(host)?;
        Ok(frame)
    }

    pub fn new_subr(
        host: &dyn Host,
        origin: FrameOrigin,
        start: Option<BreakpointId>,
        user_breakpoint: Option<BreakpointId>,
    ) -> Result<Frame> {
        let mut frame = Frame::base(host, origin, start, user_breakpoint, FrameVariant::Subr {
            subr: None,
            name: None,
        })?;

        // The body breakpoint lands on the subr's C function, which is only
        // known once we are inside and can read the descriptor; `setup`
        // plants it.
        frame.after_install(host)?;
        Ok(frame)
    }

    pub fn new_primitive(
        host: &dyn Host,
        subr: LispSubr,
        start: Option<BreakpointId>,
    ) -> Result<Frame> {
        let name = subr.name(host)?;
        host.echo(&format!("PRIMITIVE: {name}"));

        let mut frame = Frame::base(
            host,
            FrameOrigin::Body,
            start,
            None,
            FrameVariant::Primitive {
                subr,
                name,
                guts: false,
            },
        )?;

        // Raw C code: the only Lisp-level events left are calls back into
        // the evaluator, so watch every entry point.
        for entry in EntryPoint::iter() {
            frame
                .bodies
                .push(install_inner(host, InnerSite::Entry(entry))?);
        }

        frame.after_install(host)?;
        Ok(frame)
    }

    fn base(
        host: &dyn Host,
        origin: FrameOrigin,
        start: Option<BreakpointId>,
        user_breakpoint: Option<BreakpointId>,
        variant: FrameVariant,
    ) -> Result<Frame> {
        let inferior = host.newest_frame()?;

        // A start breakpoint means we are outside the activation we care
        // about; the finish can only be planted once we are in.
        let finish = match start {
            Some(_) => None,
            None => Some(host.create_finish_breakpoint(inferior)?),
        };

        let state = match origin {
            FrameOrigin::Unknown => FrameState::Unknown,
            _ => FrameState::Entry,
        };

        Ok(Frame {
            origin,
            state,
            command: NavCommand::Step,
            inferior,
            start,
            finish,
            args: Vec::new(),
            bodies: Vec::new(),
            disabled: HashSet::new(),
            user_breakpoint,
            variant,
        })
    }

    fn after_install(&mut self, host: &dyn Host) -> Result<()> {
        if self.start.is_some() {
            self.disable_internal(host);
        } else {
            self.setup(host)?;
        }
        Ok(())
    }

    /// Variant-specific work once we are inside the activation: decode the
    /// function in scope, plant late breakpoints, ask about guts mode.
    fn setup(&mut self, host: &dyn Host) -> Result<()> {
        let mut late_body: Option<InnerBreakpoint> = None;
        let mut suppress = false;

        match &mut self.variant {
            FrameVariant::Eval { fun, .. } => {
                let view = EvalView::new(host, self.inferior)?;
                host.echo(&format!("FUNCTION: {}", view.form().render(host)?));
                *fun = Some(view.name(host)?);
            },

            FrameVariant::Lambda { fun } => {
                let view = LambdaView::new(host, self.inferior)?;
                *fun = Some(view.name(host)?);
            },

            FrameVariant::Subr { subr, name } => {
                let view = SubrView::new(host, self.inferior)?;
                let descriptor = view.descriptor();
                let address = descriptor.function_address(host)?;
                late_body = Some(install_inner(host, InnerSite::Address(address))?);
                *subr = Some(descriptor);
                *name = Some(view.name(host)?);
            },

            FrameVariant::Primitive { guts, .. } => {
                if host.prompt_yes_no("debug primitive as C? [y/N] > ") {
                    *guts = true;
                    suppress = true;
                }
            },
        }

        if let Some(breakpoint) = late_body {
            self.bodies.push(breakpoint);
        }
        if suppress {
            self.disable_internal(host);
        }

        Ok(())
    }

    // --- event handling

    pub fn hit(&mut self, host: &dyn Host, breakpoint: BreakpointId) -> Result<HitOutcome> {
        if self.start == Some(breakpoint) {
            return self.do_start(host, breakpoint);
        }

        let interesting = self.looking_for().contains(&breakpoint);

        if self.args.iter().any(|inner| inner.id == breakpoint) {
            self.do_arg(host, breakpoint, interesting)
        } else if self.bodies.iter().any(|inner| inner.id == breakpoint) {
            self.do_body(host, breakpoint, interesting)
        } else if self.finish == Some(breakpoint) {
            self.do_finish(host, breakpoint)
        } else {
            Err(Error::UnexpectedStop)
        }
    }

    pub fn cares_about(&self, breakpoint: BreakpointId) -> bool {
        self.enabled().any(|id| id == breakpoint)
            || self.finish == Some(breakpoint)
            || self.start == Some(breakpoint)
    }

    /// The breakpoints the current command stops for.
    pub fn looking_for(&self) -> HashSet<BreakpointId> {
        let mut interesting = HashSet::new();

        // UP and everything below it waits for the finish.
        if let Some(finish) = self.finish {
            interesting.insert(finish);
        }

        if self.command <= NavCommand::Next {
            interesting.extend(self.bodies.iter().map(|inner| inner.id));
        }

        if self.command <= NavCommand::Step {
            interesting.extend(self.args.iter().map(|inner| inner.id));
        }

        interesting
    }

    fn do_start(&mut self, host: &dyn Host, breakpoint: BreakpointId) -> Result<HitOutcome> {
        host.echo("=== start ===");

        self.start = None;
        if host.breakpoint_is_valid(breakpoint) {
            host.delete_breakpoint(breakpoint);
        }

        // The activation we were waiting to enter is the newest frame now.
        self.inferior = host.newest_frame()?;
        self.finish = Some(host.create_finish_breakpoint(self.inferior)?);

        self.enable_internal(host);
        self.setup(host)?;

        Ok(HitOutcome::Stop)
    }

    fn do_arg(
        &mut self,
        host: &dyn Host,
        breakpoint: BreakpointId,
        interesting: bool,
    ) -> Result<HitOutcome> {
        let site = self
            .args
            .iter()
            .find(|inner| inner.id == breakpoint)
            .map(|inner| inner.site)
            .ok_or(Error::UnexpectedStop)?;
        let InnerSite::Label(site) = site else {
            return Err(Error::UnexpectedStop);
        };

        self.note_expr_class(site);

        // The first argument stop reveals the form's shape: the other site
        // labels can no longer fire for this invocation, so drop them.
        if matches!(self.state, FrameState::Entry | FrameState::Unknown) {
            self.narrow_to(host, breakpoint, site);
        }

        self.state = FrameState::Arg;

        if !interesting {
            host.echo("stepping through arg");
            return Ok(HitOutcome::Resume);
        }

        host.echo("=== arg ===");
        if !host.prompt_yes_no("step in? [yN] ") {
            return Ok(HitOutcome::Stop);
        }

        // The argument's own shape is not known yet; a nested eval is the
        // safe default.
        host.echo("start point...");
        let start = host.create_breakpoint(
            &EntryPoint::EvalSub.location(),
            BreakpointOptions::INTERNAL_TEMPORARY,
        )?;
        let child = Frame::new_eval(host, FrameOrigin::Arg, Some(start), None)?;

        Ok(HitOutcome::Push(child))
    }

    fn do_body(
        &mut self,
        host: &dyn Host,
        breakpoint: BreakpointId,
        interesting: bool,
    ) -> Result<HitOutcome> {
        let site = self
            .bodies
            .iter()
            .find(|inner| inner.id == breakpoint)
            .map(|inner| inner.site)
            .ok_or(Error::UnexpectedStop)?;

        if let InnerSite::Label(label) = site {
            self.note_expr_class(label);
        }

        // Once a body starts, no further argument sites will occur.
        for inner in std::mem::take(&mut self.args) {
            self.remove_inner(host, inner);
        }

        self.state = FrameState::Body;

        if !interesting {
            host.echo("stepping over");
            return Ok(HitOutcome::Resume);
        }

        host.echo("=== body ===");
        if !host.prompt_yes_no("step in? [yN] ") {
            return Ok(HitOutcome::Stop);
        }

        let child = self.step_in_child(host, site)?;
        Ok(HitOutcome::Push(child))
    }

    /// Builds the child frame a body-site descent lands in.
    fn step_in_child(&mut self, host: &dyn Host, site: InnerSite) -> Result<Frame> {
        match &self.variant {
            FrameVariant::Eval { expr_class, .. } => match expr_class {
                Some(ExprClass::Subr) => {
                    // The callee is a built-in: descend into its C function.
                    let fun = LispValue::from_var(host, host.newest_frame()?, "fun")?;
                    let subr = fun.as_subr()?;
                    let address = subr.function_address(host)?;

                    host.echo("start point...");
                    let start = host.create_breakpoint(
                        &Location::Address(address),
                        BreakpointOptions::INTERNAL_TEMPORARY,
                    )?;
                    Frame::new_primitive(host, subr, Some(start))
                },
                Some(ExprClass::Cons) | None => {
                    host.echo("start point...");
                    let start = host.create_breakpoint(
                        &EntryPoint::EvalSub.location(),
                        BreakpointOptions::INTERNAL_TEMPORARY,
                    )?;
                    Frame::new_eval(host, FrameOrigin::Body, Some(start), None)
                },
            },

            // A lambda body is a form: we are already at the eval entry.
            FrameVariant::Lambda { .. } => Frame::new_eval(host, FrameOrigin::Body, None, None),

            // A subr body is its C function: we are already at its entry.
            FrameVariant::Subr { subr, .. } => {
                let subr = (*subr).ok_or(Error::OutOfSync)?;
                Frame::new_primitive(host, subr, None)
            },

            // Raw C called back into the evaluator: we are at whichever
            // entry point fired.
            FrameVariant::Primitive { .. } => {
                let InnerSite::Entry(entry) = site else {
                    return Err(Error::UnexpectedStop);
                };
                Frame::for_entry(host, entry, FrameOrigin::Body, None, None)
            },
        }
    }

    fn do_finish(&mut self, host: &dyn Host, breakpoint: BreakpointId) -> Result<HitOutcome> {
        host.echo("=== finish ===");

        let rendered = host
            .return_value(breakpoint)
            .map(|raw| {
                LispValue::decode(host, raw)
                    .and_then(|value| value.render(host))
                    .unwrap_or_else(|error| {
                        log::warn!("can't render return value: {error:?}");
                        String::from("?")
                    })
            })
            .unwrap_or_else(|| String::from("?"));
        host.echo(&format!("evaluation: {rendered}"));

        self.state = FrameState::End;
        Ok(HitOutcome::Finished)
    }

    fn note_expr_class(&mut self, site: Site) {
        if let FrameVariant::Eval { expr_class, .. } = &mut self.variant {
            match expr_class {
                Some(class) => log::trace!("expression class already known: {class:?}"),
                None => {
                    log::trace!("setting expression class to {:?}", site.class());
                    *expr_class = Some(site.class());
                },
            }
        }
    }

    /// Keeps only the fired argument site and its paired body site.
    fn narrow_to(&mut self, host: &dyn Host, breakpoint: BreakpointId, site: Site) {
        let paired = site.paired_body();

        for inner in std::mem::take(&mut self.args) {
            if inner.id == breakpoint {
                self.args.push(inner);
            } else {
                self.remove_inner(host, inner);
            }
        }

        for inner in std::mem::take(&mut self.bodies) {
            let keep = matches!(inner.site, InnerSite::Label(body) if Some(body) == paired);
            if keep {
                self.bodies.push(inner);
            } else {
                self.remove_inner(host, inner);
            }
        }
    }

    fn remove_inner(&mut self, host: &dyn Host, inner: InnerBreakpoint) {
        self.disabled.remove(&inner.id);
        if host.breakpoint_is_valid(inner.id) {
            host.delete_breakpoint(inner.id);
        }
    }

    // --- navigation

    pub fn navigate(&mut self, host: &dyn Host, command: NavCommand) {
        self.command = command;
        host.resume();
    }

    /// `continue` on a guts-mode primitive leaves guts mode and resumes
    /// stepping; otherwise it runs to the finish like `up`.
    pub fn cont(&mut self, host: &dyn Host) {
        if self.in_guts() {
            if let FrameVariant::Primitive { guts, .. } = &mut self.variant {
                *guts = false;
            }
            self.enable_internal(host);
            self.command = NavCommand::Step;
            host.resume();
            return;
        }

        self.navigate(host, NavCommand::Up);
    }

    pub fn in_guts(&self) -> bool {
        matches!(self.variant, FrameVariant::Primitive { guts: true, .. })
    }

    // --- breakpoint bookkeeping

    /// The internal breakpoints currently live: args and bodies, minus the
    /// disabled subset.
    pub fn enabled(&self) -> impl Iterator<Item = BreakpointId> + '_ {
        self.args
            .iter()
            .chain(self.bodies.iter())
            .map(|inner| inner.id)
            .filter(|id| !self.disabled.contains(id))
    }

    pub fn enable_internal(&mut self, host: &dyn Host) {
        for id in self.disabled.drain() {
            if host.breakpoint_is_valid(id) {
                host.set_breakpoint_enabled(id, true);
            }
        }
    }

    pub fn disable_internal(&mut self, host: &dyn Host) {
        let enabled: Vec<BreakpointId> = self.enabled().collect();
        for id in enabled {
            host.set_breakpoint_enabled(id, false);
            self.disabled.insert(id);
        }
    }

    /// Deletes every breakpoint the frame still owns, including a stale
    /// start that never fired.
    pub fn cleanup(&mut self, host: &dyn Host) {
        for inner in std::mem::take(&mut self.args) {
            if host.breakpoint_is_valid(inner.id) {
                host.delete_breakpoint(inner.id);
            }
        }
        for inner in std::mem::take(&mut self.bodies) {
            if host.breakpoint_is_valid(inner.id) {
                host.delete_breakpoint(inner.id);
            }
        }
        if let Some(finish) = self.finish.take() {
            if host.breakpoint_is_valid(finish) {
                host.delete_breakpoint(finish);
            }
        }
        if let Some(start) = self.start.take() {
            if host.breakpoint_is_valid(start) {
                host.delete_breakpoint(start);
            }
        }
        self.disabled.clear();
    }

    // --- accessors

    pub fn kind(&self) -> FrameKind {
        match self.variant {
            FrameVariant::Eval { .. } => FrameKind::Eval,
            FrameVariant::Lambda { .. } => FrameKind::Lambda,
            FrameVariant::Subr { .. } => FrameKind::Subr,
            FrameVariant::Primitive { .. } => FrameKind::Primitive,
        }
    }

    pub fn origin(&self) -> FrameOrigin {
        self.origin
    }

    pub fn state(&self) -> FrameState {
        self.state
    }

    pub fn command(&self) -> NavCommand {
        self.command
    }

    pub fn inferior(&self) -> FrameId {
        self.inferior
    }

    pub fn start(&self) -> Option<BreakpointId> {
        self.start
    }

    pub fn finish(&self) -> Option<BreakpointId> {
        self.finish
    }

    pub fn user_breakpoint(&self) -> Option<BreakpointId> {
        self.user_breakpoint
    }

    pub fn args_breakpoints(&self) -> &[InnerBreakpoint] {
        &self.args
    }

    pub fn bodies_breakpoints(&self) -> &[InnerBreakpoint] {
        &self.bodies
    }

    pub fn disabled_breakpoints(&self) -> &HashSet<BreakpointId> {
        &self.disabled
    }

    pub fn describe(&self) -> String {
        let label = match &self.variant {
            FrameVariant::Eval { fun, .. } => fun.clone(),
            FrameVariant::Lambda { fun } => fun.clone(),
            FrameVariant::Subr { name, .. } => name.clone(),
            FrameVariant::Primitive { name, .. } => Some(name.clone()),
        };
        let label = label.unwrap_or_else(|| String::from("-"));
        format!("[{label}] : {} @{}", self.origin, self.state)
    }
}

fn install_inner(host: &dyn Host, site: InnerSite) -> Result<InnerBreakpoint> {
    let id = host.create_breakpoint(&site.location(), BreakpointOptions::INTERNAL)?;
    Ok(InnerBreakpoint { id, site })
}

#[cfg(test)]
mod tests {
    use scry::fixtures::MockHost;
    use stdext::assert_match;

    use super::*;

    fn eval_frame(host: &MockHost) -> Frame {
        let form = host.form("foo", &[host.fixnum(1), host.fixnum(2)]);
        host.push_frame_with("eval_sub", &[("form", form)]);
        Frame::new_eval(host, FrameOrigin::Breakpoint, None, None).unwrap()
    }

    fn arg_breakpoint(frame: &Frame, site: Site) -> BreakpointId {
        frame
            .args_breakpoints()
            .iter()
            .find(|inner| inner.site == InnerSite::Label(site))
            .unwrap()
            .id
    }

    #[test]
    fn test_enabled_and_disabled_partition_the_internal_set() {
        let host = MockHost::new();
        let mut frame = eval_frame(&host);

        let total = frame.args_breakpoints().len() + frame.bodies_breakpoints().len();
        assert_eq!(total, 7);
        assert_eq!(frame.enabled().count(), 7);
        assert!(frame.disabled_breakpoints().is_empty());

        frame.disable_internal(&host);
        assert_eq!(frame.enabled().count(), 0);
        assert_eq!(frame.disabled_breakpoints().len(), 7);

        frame.enable_internal(&host);
        assert_eq!(frame.enabled().count(), 7);
        assert!(frame.disabled_breakpoints().is_empty());
    }

    #[test]
    fn test_exactly_one_of_start_and_finish_is_set() {
        let host = MockHost::new();

        let inside = eval_frame(&host);
        assert!(inside.start().is_none());
        assert!(inside.finish().is_some());

        let start = host
            .create_breakpoint(
                &EntryPoint::EvalSub.location(),
                BreakpointOptions::INTERNAL_TEMPORARY,
            )
            .unwrap();
        let outside = Frame::new_eval(&host, FrameOrigin::Arg, Some(start), None).unwrap();
        assert!(outside.start().is_some());
        assert!(outside.finish().is_none());
    }

    #[test]
    fn test_looking_for_shrinks_monotonically() {
        let host = MockHost::new();
        let mut frame = eval_frame(&host);

        frame.navigate(&host, NavCommand::Step);
        let step = frame.looking_for();

        frame.navigate(&host, NavCommand::Next);
        let next = frame.looking_for();

        frame.navigate(&host, NavCommand::Up);
        let up = frame.looking_for();

        assert!(next.is_subset(&step));
        assert!(up.is_subset(&next));
        assert_eq!(up.len(), 1);
        assert!(up.contains(&frame.finish().unwrap()));
    }

    #[test]
    fn test_first_arg_hit_narrows_the_breakpoint_set() {
        let host = MockHost::new();
        let mut frame = eval_frame(&host);
        let before = host.live_breakpoint_count();

        host.queue_answer(false);
        let fired = arg_breakpoint(&frame, Site::SubrArgMany);
        let outcome = frame.hit(&host, fired).unwrap();

        assert_match!(outcome, HitOutcome::Stop);
        assert_eq!(frame.state(), FrameState::Arg);
        assert_eq!(frame.args_breakpoints().len(), 1);
        assert_eq!(frame.bodies_breakpoints().len(), 1);
        assert_eq!(
            frame.bodies_breakpoints()[0].site,
            InnerSite::Label(Site::SubrBodyMany)
        );
        // Five site breakpoints were dropped from the host's table.
        assert_eq!(host.live_breakpoint_count(), before - 5);
    }

    #[test]
    fn test_body_hit_destroys_remaining_arg_breakpoints() {
        let host = MockHost::new();
        let mut frame = eval_frame(&host);

        host.queue_answer(false);
        let body = frame
            .bodies_breakpoints()
            .iter()
            .find(|inner| inner.site == InnerSite::Label(Site::SubrBodyUnevalled))
            .unwrap()
            .id;
        let outcome = frame.hit(&host, body).unwrap();

        assert_match!(outcome, HitOutcome::Stop);
        assert_eq!(frame.state(), FrameState::Body);
        assert!(frame.args_breakpoints().is_empty());
    }

    #[test]
    fn test_uninteresting_arg_resumes_without_prompting() {
        let host = MockHost::new();
        let mut frame = eval_frame(&host);
        frame.navigate(&host, NavCommand::Next);

        let fired = arg_breakpoint(&frame, Site::SubrArgN);
        let outcome = frame.hit(&host, fired).unwrap();

        assert_match!(outcome, HitOutcome::Resume);
        assert!(host.prompts().is_empty());
        // Narrowing still happened: the shape is known now.
        assert_eq!(frame.args_breakpoints().len(), 1);
    }

    #[test]
    fn test_accepted_step_in_at_an_arg_pushes_an_eval_child() {
        let host = MockHost::new();
        let mut frame = eval_frame(&host);

        host.queue_answer(true);
        let fired = arg_breakpoint(&frame, Site::SubrArgMany);
        let outcome = frame.hit(&host, fired).unwrap();

        assert_match!(outcome, HitOutcome::Push(child) => {
            assert_eq!(child.kind(), FrameKind::Eval);
            assert_eq!(child.origin(), FrameOrigin::Arg);
            assert!(child.start().is_some());
            assert_eq!(child.enabled().count(), 0);
        });
    }

    #[test]
    fn test_subr_body_descends_into_the_primitive() {
        let host = MockHost::new();
        let mut frame = eval_frame(&host);

        // Reach BODY with the subr shape recorded.
        host.queue_answer(false);
        let arg = arg_breakpoint(&frame, Site::SubrArgMany);
        frame.hit(&host, arg).unwrap();

        // The evaluator has resolved the callee by body time.
        let subr = host.subr("foo", 0xf00, 0, -2);
        let newest = host.newest_frame().unwrap();
        host.set_var(newest, "fun", subr);

        host.queue_answer(true); // step in?
        let body = frame.bodies_breakpoints()[0].id;
        let outcome = frame.hit(&host, body).unwrap();

        assert_match!(outcome, HitOutcome::Push(child) => {
            assert_eq!(child.kind(), FrameKind::Primitive);
            assert!(child.start().is_some());
        });
        assert!(host.has_breakpoint_at(&Location::Address(0xf00)));
    }

    #[test]
    fn test_start_hit_enters_the_frame() {
        let host = MockHost::new();
        host.push_frame_with("eval_sub", &[("form", host.fixnum(0))]);

        let start = host
            .create_breakpoint(
                &EntryPoint::EvalSub.location(),
                BreakpointOptions::INTERNAL_TEMPORARY,
            )
            .unwrap();
        let mut frame = Frame::new_eval(&host, FrameOrigin::Arg, Some(start), None).unwrap();

        // The inferior reaches the entry point of the awaited call.
        let form = host.form("bar", &[]);
        host.push_frame_with("eval_sub", &[("form", form)]);

        let outcome = frame.hit(&host, start).unwrap();
        assert_match!(outcome, HitOutcome::Stop);
        assert!(frame.start().is_none());
        assert!(frame.finish().is_some());
        assert_eq!(frame.enabled().count(), 7);
        assert_eq!(frame.describe(), "[bar] : ARG @ENTRY");
    }

    #[test]
    fn test_finish_reports_the_return_value() {
        let host = MockHost::new();
        let mut frame = eval_frame(&host);
        let finish = frame.finish().unwrap();

        let event = host.return_from_top(Some(host.fixnum(42)));
        assert_eq!(event.breakpoints, vec![finish]);

        let outcome = frame.hit(&host, finish).unwrap();
        assert_match!(outcome, HitOutcome::Finished);
        assert_eq!(frame.state(), FrameState::End);
        assert!(host.echoes().contains(&String::from("evaluation: 42")));
    }

    #[test]
    fn test_cleanup_deletes_every_owned_breakpoint() {
        let host = MockHost::new();
        let mut frame = eval_frame(&host);
        assert_eq!(host.live_breakpoint_count(), 8); // 7 sites + finish

        frame.cleanup(&host);
        assert_eq!(host.live_breakpoint_count(), 0);
    }

    #[test]
    fn test_guts_mode_suppresses_internal_breakpoints() {
        let host = MockHost::new();
        host.push_frame("Fcons");
        let subr = host.subr("cons", 0x4000, 2, 2);
        let descriptor = LispValue::decode(&host, subr).unwrap().as_subr().unwrap();

        host.queue_answer(true); // debug primitive as C?
        let mut frame = Frame::new_primitive(&host, descriptor, None).unwrap();

        assert!(frame.in_guts());
        assert_eq!(frame.enabled().count(), 0);

        // `continue` leaves guts mode and resumes stepping.
        frame.cont(&host);
        assert!(!frame.in_guts());
        assert_eq!(frame.enabled().count(), 3);
        assert_eq!(frame.command(), NavCommand::Step);
        assert_eq!(host.resumes(), 1);
    }

    #[test]
    fn test_up_twice_is_continue_past_the_finish() {
        let host = MockHost::new();
        let mut frame = eval_frame(&host);

        frame.navigate(&host, NavCommand::Up);
        let first = frame.looking_for();
        frame.navigate(&host, NavCommand::Up);
        let second = frame.looking_for();

        assert_eq!(first, second);
        assert_eq!(host.resumes(), 2);
    }
}
