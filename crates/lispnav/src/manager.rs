//
// manager.rs
//
// Copyright (C) 2026 Posit Software, PBC. All rights reserved.
//
// The long-lived owner of the virtual Lisp stack. Every stop of the
// inferior is routed here; the manager decides whether it belongs to a user
// breakpoint, the recovery breakpoint, or one of the active frames, and
// applies the outcome. Navigation verbs arrive here from the command layer.
//

use std::cell::Cell;
use std::collections::HashSet;
use std::rc::Rc;

use anyhow::anyhow;
use itertools::Itertools;
use stdext::unwrap;

use scry::host::BreakpointId;
use scry::host::FrameId;
use scry::host::Host;
use scry::host::StopEvent;
use scry::host::StopSubscription;

use crate::breakpoints::LispBreakpoint;
use crate::entry::EntryPoint;
use crate::errors::Error;
use crate::frame::Frame;
use crate::frame::FrameOrigin;
use crate::frame::HitOutcome;
use crate::frame::NavCommand;

thread_local! {
    // The host's event dispatch is single-threaded, so one live manager per
    // thread is the same as one per session.
    static INSTALLED: Cell<bool> = const { Cell::new(false) };
}

pub struct Manager {
    host: Rc<dyn Host>,
    breakpoints: Vec<LispBreakpoint>,
    disabled: HashSet<BreakpointId>,
    recovery: Option<BreakpointId>,
    frames: Vec<Frame>,
    subscription: Option<StopSubscription>,
}

impl std::fmt::Debug for Manager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Manager")
            .field("disabled", &self.disabled)
            .field("recovery", &self.recovery)
            .finish_non_exhaustive()
    }
}

impl Manager {
    /// Connects to the host's stop events and hands back the session
    /// manager. Refuses to double-install: tear the previous instance down
    /// first.
    pub fn install(host: Rc<dyn Host>) -> anyhow::Result<Manager> {
        if INSTALLED.with(|installed| installed.replace(true)) {
            return Err(anyhow!(
                "navigation already installed; tear the existing instance down first"
            ));
        }

        let subscription = host.connect_stop();

        Ok(Manager {
            host,
            breakpoints: Vec::new(),
            disabled: HashSet::new(),
            recovery: None,
            frames: Vec::new(),
            subscription: Some(subscription),
        })
    }

    /// Disconnects from the host and deletes every breakpoint we created.
    /// The user confirms first; declining aborts with `UserAbort`.
    pub fn teardown(&mut self) -> anyhow::Result<()> {
        if !self
            .host
            .prompt_yes_no("removing all breakpoints, do you want to proceed? [y/N] > ")
        {
            return Err(Error::UserAbort.into());
        }

        for mut frame in std::mem::take(&mut self.frames) {
            frame.cleanup(self.host.as_ref());
        }

        for breakpoint in self.breakpoints.drain(..) {
            if self.host.breakpoint_is_valid(breakpoint.id()) {
                self.host.delete_breakpoint(breakpoint.id());
            }
        }
        self.disabled.clear();

        if let Some(recovery) = self.recovery.take() {
            if self.host.breakpoint_is_valid(recovery) {
                self.host.delete_breakpoint(recovery);
            }
        }

        if let Some(subscription) = self.subscription.take() {
            self.host.disconnect_stop(subscription);
        }

        INSTALLED.with(|installed| installed.set(false));
        self.host.echo("cleaned up the last stuff");
        Ok(())
    }

    pub fn host(&self) -> &Rc<dyn Host> {
        &self.host
    }

    // --- user breakpoints

    /// Installs (or finds) the user breakpoint pair for a Lisp function.
    pub fn add_breakpoint(&mut self, name: &str) -> anyhow::Result<()> {
        let existing = self
            .breakpoints
            .iter()
            .filter(|breakpoint| breakpoint.tag() == name)
            .count();
        if existing > 0 {
            debug_assert_eq!(existing, 2);
            return Ok(());
        }

        let (eval, subr) = LispBreakpoint::create_pair(self.host.as_ref(), name)?;
        self.breakpoints.push(eval);
        self.breakpoints.push(subr);
        Ok(())
    }

    pub fn user_breakpoints(&self) -> &[LispBreakpoint] {
        &self.breakpoints
    }

    fn disable_user(&mut self, breakpoint: BreakpointId) {
        self.host.set_breakpoint_enabled(breakpoint, false);
        self.disabled.insert(breakpoint);
    }

    fn enable_user(&mut self, breakpoint: BreakpointId) {
        if self.disabled.remove(&breakpoint) && self.host.breakpoint_is_valid(breakpoint) {
            self.host.set_breakpoint_enabled(breakpoint, true);
        }
    }

    // --- stop event dispatch

    /// Classifies and dispatches one stop of the inferior. Priorities:
    /// recovery beats user breakpoints beats frame-internal breakpoints;
    /// within the frames, the top-most claimant wins.
    pub fn on_stop(&mut self, event: &StopEvent) {
        log::trace!("stop event: {:?}", event.breakpoints);

        if let Some(recovery) = self.recovery {
            if event.breakpoints.contains(&recovery) {
                self.on_recovery(recovery);
                return;
            }
        }

        let mut user_fired = false;
        let mut matched: Option<(BreakpointId, EntryPoint)> = None;
        for &breakpoint in &event.breakpoints {
            let Some(candidate) = self
                .breakpoints
                .iter()
                .find(|candidate| candidate.id() == breakpoint)
            else {
                continue;
            };
            user_fired = true;
            if candidate.should_stop(self.host.as_ref()) {
                matched = Some((breakpoint, candidate.entry()));
                break;
            }
        }
        if let Some((breakpoint, entry)) = matched {
            self.on_user(breakpoint, entry);
            return;
        }

        let mut claimed: Option<(usize, BreakpointId)> = None;
        'frames: for index in (0..self.frames.len()).rev() {
            for &breakpoint in &event.breakpoints {
                if self.frames[index].cares_about(breakpoint) {
                    claimed = Some((index, breakpoint));
                    break 'frames;
                }
            }
        }
        if let Some((index, breakpoint)) = claimed {
            self.on_inner(index, breakpoint);
            return;
        }

        if user_fired {
            // Every fired breakpoint was a user breakpoint whose name
            // predicate said no: not a real stop.
            self.host.resume();
            return;
        }

        if !event.breakpoints.is_empty() {
            log::warn!("{:?}", Error::UnexpectedStop);
        }
    }

    fn on_recovery(&mut self, breakpoint: BreakpointId) {
        self.host.echo("wow we made it :)");
        self.recovery = None;

        let host = Rc::clone(&self.host);

        // The eager rebuild already pushed the frame waiting on this
        // breakpoint; drive its start transition and keep running so its
        // internal breakpoints can place us.
        if let Some(top) = self.frames.last_mut() {
            if top.start() == Some(breakpoint) {
                match top.hit(host.as_ref(), breakpoint) {
                    Ok(_) => host.resume(),
                    Err(error) => log::error!("recovery entry failed: {error:?}"),
                }
                return;
            }
        }

        // No frame claims it: fall back to planting a fresh unknown frame
        // at the stop.
        if host.breakpoint_is_valid(breakpoint) {
            host.delete_breakpoint(breakpoint);
        }
        match Frame::new_eval(host.as_ref(), FrameOrigin::Unknown, None, None) {
            Ok(frame) => {
                self.push(frame);
                host.resume();
            },
            Err(error) => log::error!("can't recover at this stop: {error:?}"),
        }
    }

    fn on_user(&mut self, breakpoint: BreakpointId, entry: EntryPoint) {
        self.host.echo("ding ding ding");

        // Keep nested calls of the same function from re-triggering while
        // this frame is live; re-enabled when the frame pops.
        self.disable_user(breakpoint);

        // We are already inside the callee, so no start breakpoint.
        let host = Rc::clone(&self.host);
        match Frame::for_entry(
            host.as_ref(),
            entry,
            FrameOrigin::Breakpoint,
            None,
            Some(breakpoint),
        ) {
            Ok(frame) => {
                self.push(frame);
                self.announce();
            },
            Err(error) => {
                log::error!("can't build a frame at the user breakpoint: {error:?}");
                self.enable_user(breakpoint);
            },
        }
    }

    fn on_inner(&mut self, index: usize, breakpoint: BreakpointId) {
        let host = Rc::clone(&self.host);

        match self.frames[index].hit(host.as_ref(), breakpoint) {
            Ok(HitOutcome::Stop) => self.announce(),
            Ok(HitOutcome::Resume) => host.resume(),
            Ok(HitOutcome::Push(frame)) => {
                self.push(frame);
                self.announce();
            },
            Ok(HitOutcome::Finished) => self.finish_frame(index),
            Err(error) => log::error!("frame can't handle this stop: {error:?}"),
        }
    }

    // --- the virtual stack

    pub fn push(&mut self, frame: Frame) {
        let host = Rc::clone(&self.host);
        if let Some(top) = self.frames.last_mut() {
            top.disable_internal(host.as_ref());
        }
        self.frames.push(frame);
    }

    fn finish_frame(&mut self, index: usize) {
        let host = Rc::clone(&self.host);

        // Anything stacked above the finished frame is stale.
        while self.frames.len() > index + 1 {
            log::warn!("{:?}", Error::OutOfSync);
            if let Some(mut stale) = self.frames.pop() {
                stale.cleanup(host.as_ref());
            }
        }

        let Some(mut frame) = self.frames.pop() else {
            return;
        };
        frame.cleanup(host.as_ref());

        if let Some(user_breakpoint) = frame.user_breakpoint() {
            self.enable_user(user_breakpoint);
        }

        if matches!(frame.origin(), FrameOrigin::Breakpoint | FrameOrigin::Unknown)
            || self.frames.is_empty()
        {
            self.rebuild();
        } else if let Some(top) = self.frames.last_mut() {
            top.enable_internal(host.as_ref());
        }

        self.announce();
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn head(&self) -> Option<&Frame> {
        self.frames.last()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn recovery(&self) -> Option<BreakpointId> {
        self.recovery
    }

    /// Re-synchronises the virtual stack with the inferior: walk outward to
    /// the nearest recognised frame, then arrange to re-enter our view when
    /// execution returns to it.
    pub fn rebuild(&mut self) {
        let host = Rc::clone(&self.host);

        let found = unwrap!(self.find_enclosing_entry(), Err(error) => {
            log::error!("can't walk the inferior stack: {error:?}");
            return;
        });

        let Some((frame, entry)) = found else {
            host.echo("no more frames to use");
            return;
        };

        if self.frames.last().map(|top| top.inferior()) == Some(frame) {
            host.echo("everything already cool");
            return;
        }

        let one_nearer = match host.frame_newer(frame) {
            Ok(Some(one_nearer)) => one_nearer,
            Ok(None) => {
                host.echo("weird case (already at the top of the stack)... make sure you've popped before calling this");
                return;
            },
            Err(error) => {
                log::error!("can't look back up the stack: {error:?}");
                return;
            },
        };

        // Re-entry happens when the frame one nearer than the recognised
        // one returns; an unknown frame of the matching variant starts on
        // that return.
        let start = unwrap!(host.create_finish_breakpoint(one_nearer), Err(error) => {
            log::error!("can't plant the recovery breakpoint: {error:?}");
            return;
        });

        match Frame::for_entry(host.as_ref(), entry, FrameOrigin::Unknown, Some(start), None) {
            Ok(frame) => {
                self.recovery = Some(start);
                self.push(frame);
                host.resume();
            },
            Err(error) => {
                log::error!("can't rebuild the virtual stack: {error:?}");
                host.delete_breakpoint(start);
            },
        }
    }

    fn find_enclosing_entry(&self) -> scry::Result<Option<(FrameId, EntryPoint)>> {
        log::trace!("walking outward for a recognised frame");

        let mut cursor = self.host.newest_frame()?;
        while let Some(older) = self.host.frame_older(cursor)? {
            cursor = older;
            if let Some(name) = self.host.frame_function(cursor)? {
                if let Some(entry) = EntryPoint::from_name(&name) {
                    return Ok(Some((cursor, entry)));
                }
            }
        }

        Ok(None)
    }

    // --- navigation verbs

    pub fn step(&mut self) {
        if self.frames.is_empty() {
            self.host.echo("get into lisp first!");
        } else if self.in_guts() {
            self.host
                .echo("in C mode; use regular navigation commands (or lisp-continue)");
        } else {
            let host = Rc::clone(&self.host);
            if let Some(top) = self.frames.last_mut() {
                top.navigate(host.as_ref(), NavCommand::Step);
            }
        }
    }

    pub fn next(&mut self) {
        if self.frames.is_empty() {
            self.host.echo("get into lisp first!");
        } else if self.in_guts() {
            self.host.echo("in C mode; use regular navigation commands");
            self.host.echo("(lisp-up or lisp-continue also work)");
        } else {
            let host = Rc::clone(&self.host);
            if let Some(top) = self.frames.last_mut() {
                top.navigate(host.as_ref(), NavCommand::Next);
            }
        }
    }

    pub fn up(&mut self) {
        if self.frames.is_empty() {
            self.host.echo("get into lisp first!");
        } else {
            let host = Rc::clone(&self.host);
            if let Some(top) = self.frames.last_mut() {
                top.navigate(host.as_ref(), NavCommand::Up);
            }
        }
    }

    pub fn cont(&mut self) {
        let any_enabled_user = self
            .breakpoints
            .iter()
            .any(|breakpoint| !self.disabled.contains(&breakpoint.id()));

        if !any_enabled_user && self.recovery.is_none() {
            self.host.echo("get into lisp first!");
        } else if !self.frames.is_empty() {
            let host = Rc::clone(&self.host);
            if let Some(top) = self.frames.last_mut() {
                top.cont(host.as_ref());
            }
        } else {
            self.host.resume();
        }
    }

    fn in_guts(&self) -> bool {
        self.frames.last().is_some_and(|top| top.in_guts())
    }

    // --- rendering

    fn announce(&self) {
        self.host.echo("*** BACKTRACE ***");
        self.host.echo(&self.frame_list(true));
        self.host.echo("");
    }

    /// The virtual stack, one line per frame. `backtrace` lists most recent
    /// first, the way the backtrace command shows it.
    pub fn frame_list(&self, backtrace: bool) -> String {
        let mut lines: Vec<String> = self
            .frames
            .iter()
            .map(|frame| frame.describe())
            .collect();
        if backtrace {
            lines.reverse();
        }

        lines
            .iter()
            .enumerate()
            .map(|(index, line)| format!("{index:>3}. {line}"))
            .join("\n")
    }

    pub fn breakpoint_list(&self) -> String {
        self.breakpoints
            .iter()
            .map(|breakpoint| format!(" - {breakpoint}"))
            .join("\n")
    }
}

impl Drop for Manager {
    fn drop(&mut self) {
        // Dropping without teardown leaks the breakpoints to the host's
        // table, but must not block a later install.
        INSTALLED.with(|installed| installed.set(false));
    }
}
