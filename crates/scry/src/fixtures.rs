//
// fixtures.rs
//
// Copyright (C) 2026 Posit Software, PBC. All rights reserved.
//
// An in-memory host debugger and inferior for tests: a heap of Lisp data, a
// C frame stack, a breakpoint table, and scripted prompt answers. Tests
// build a world, let the engine plant breakpoints, then fire stop events by
// location the way the real host would.
//

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::collections::VecDeque;

use itertools::Itertools;

use crate::error::Error;
use crate::error::Result;
use crate::host::BreakpointId;
use crate::host::BreakpointOptions;
use crate::host::FrameId;
use crate::host::Host;
use crate::host::Location;
use crate::host::RawValue;
use crate::host::StopEvent;
use crate::host::StopSubscription;

const UNEVALLED: i64 = -1;
const MANY: i64 = -2;

/// One datum on the mock inferior's heap.
#[derive(Clone, Debug, PartialEq)]
pub enum Datum {
    Symbol(String),
    Fixnum(i64),
    Cons { car: RawValue, cdr: RawValue },
    Float(f64),
    Str(String),
    Vector(Vec<RawValue>),
    Subr {
        name: String,
        function: u64,
        min_args: i64,
        max_args: i64,
    },
    Compiled,
    /// A C-side argument array, addressable by indexing.
    Values(Vec<RawValue>),
    /// Reads through this datum fault, like a wild pointer would.
    Poison,
}

#[derive(Clone, Debug)]
struct MockFrame {
    id: u64,
    function: String,
    vars: HashMap<String, RawValue>,
}

#[derive(Clone, Debug, PartialEq)]
enum MockLocation {
    At(Location),
    Finish(u64),
}

#[derive(Clone, Debug)]
struct MockBreakpoint {
    location: MockLocation,
    enabled: bool,
    temporary: bool,
    deleted: bool,
    return_value: Option<RawValue>,
}

#[derive(Default)]
struct Inner {
    heap: Vec<Datum>,
    frames: Vec<MockFrame>,
    next_frame: u64,
    breakpoints: BTreeMap<u64, MockBreakpoint>,
    next_breakpoint: u64,
    subscriptions: Vec<u64>,
    next_subscription: u64,
    globals: HashMap<String, (RawValue, RawValue)>,
    prompts: Vec<String>,
    answers: VecDeque<bool>,
    echoes: Vec<String>,
    resumes: usize,
}

pub struct MockHost {
    inner: RefCell<Inner>,
}

impl MockHost {
    pub fn new() -> MockHost {
        MockHost {
            inner: RefCell::new(Inner::default()),
        }
    }

    // --- heap building

    fn intern(&self, datum: Datum) -> RawValue {
        let mut inner = self.inner.borrow_mut();
        inner.heap.push(datum);
        RawValue(inner.heap.len() as u64 - 1)
    }

    pub fn nil(&self) -> RawValue {
        self.symbol("nil")
    }

    pub fn symbol(&self, name: &str) -> RawValue {
        self.intern(Datum::Symbol(String::from(name)))
    }

    pub fn fixnum(&self, value: i64) -> RawValue {
        self.intern(Datum::Fixnum(value))
    }

    pub fn float(&self, value: f64) -> RawValue {
        self.intern(Datum::Float(value))
    }

    pub fn string(&self, contents: &str) -> RawValue {
        self.intern(Datum::Str(String::from(contents)))
    }

    pub fn cons(&self, car: RawValue, cdr: RawValue) -> RawValue {
        self.intern(Datum::Cons { car, cdr })
    }

    pub fn list(&self, items: &[RawValue]) -> RawValue {
        let mut tail = self.nil();
        for item in items.iter().rev() {
            tail = self.cons(*item, tail);
        }
        tail
    }

    /// A call form: `(head item...)`.
    pub fn form(&self, head: &str, items: &[RawValue]) -> RawValue {
        let head = self.symbol(head);
        let tail = self.list(items);
        self.cons(head, tail)
    }

    pub fn vector(&self, items: &[RawValue]) -> RawValue {
        self.intern(Datum::Vector(items.to_vec()))
    }

    pub fn subr(&self, name: &str, function: u64, min_args: i64, max_args: i64) -> RawValue {
        self.intern(Datum::Subr {
            name: String::from(name),
            function,
            min_args,
            max_args,
        })
    }

    pub fn compiled(&self) -> RawValue {
        self.intern(Datum::Compiled)
    }

    /// An argument array the engine can index into.
    pub fn values(&self, items: &[RawValue]) -> RawValue {
        self.intern(Datum::Values(items.to_vec()))
    }

    pub fn poison(&self) -> RawValue {
        self.intern(Datum::Poison)
    }

    /// Registers a global Lisp variable reachable through the obarray.
    pub fn define_global(&self, name: &str, value: RawValue) {
        let symbol = self.symbol(name);
        let mut inner = self.inner.borrow_mut();
        inner.globals.insert(String::from(name), (symbol, value));
    }

    // --- inferior driving

    pub fn push_frame(&self, function: &str) -> FrameId {
        self.push_frame_with(function, &[])
    }

    pub fn push_frame_with(&self, function: &str, vars: &[(&str, RawValue)]) -> FrameId {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_frame;
        inner.next_frame += 1;

        let vars = vars
            .iter()
            .map(|(name, value)| (String::from(*name), *value))
            .collect();

        inner.frames.push(MockFrame {
            id,
            function: String::from(function),
            vars,
        });

        FrameId(id)
    }

    pub fn set_var(&self, frame: FrameId, name: &str, value: RawValue) {
        let mut inner = self.inner.borrow_mut();
        let frame = inner
            .frames
            .iter_mut()
            .find(|candidate| candidate.id == frame.0)
            .expect("set_var: unknown frame");
        frame.vars.insert(String::from(name), value);
    }

    pub fn pop_frame(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.frames.pop().expect("pop_frame: stack is empty");
    }

    /// Fires every live, enabled breakpoint at `location`, consuming
    /// temporary ones like the real host would.
    pub fn stop_at(&self, location: &Location) -> StopEvent {
        let mut inner = self.inner.borrow_mut();
        let mut fired = Vec::new();

        for (id, breakpoint) in inner.breakpoints.iter_mut() {
            if breakpoint.deleted || !breakpoint.enabled {
                continue;
            }
            if breakpoint.location == MockLocation::At(location.clone()) {
                fired.push(BreakpointId(*id));
                if breakpoint.temporary {
                    breakpoint.deleted = true;
                }
            }
        }

        StopEvent { breakpoints: fired }
    }

    /// Pops the newest inferior frame and fires any finish breakpoints
    /// watching it, recording `value` as their return value.
    pub fn return_from_top(&self, value: Option<RawValue>) -> StopEvent {
        let mut inner = self.inner.borrow_mut();
        let frame = inner.frames.pop().expect("return_from_top: stack is empty");

        let mut fired = Vec::new();
        for (id, breakpoint) in inner.breakpoints.iter_mut() {
            if breakpoint.deleted || !breakpoint.enabled {
                continue;
            }
            if breakpoint.location == MockLocation::Finish(frame.id) {
                breakpoint.return_value = value;
                breakpoint.deleted = true;
                fired.push(BreakpointId(*id));
            }
        }

        StopEvent { breakpoints: fired }
    }

    // --- scripting and inspection

    pub fn queue_answer(&self, yes: bool) {
        self.inner.borrow_mut().answers.push_back(yes);
    }

    pub fn prompts(&self) -> Vec<String> {
        self.inner.borrow().prompts.clone()
    }

    pub fn echoes(&self) -> Vec<String> {
        self.inner.borrow().echoes.clone()
    }

    pub fn take_echoes(&self) -> Vec<String> {
        std::mem::take(&mut self.inner.borrow_mut().echoes)
    }

    pub fn resumes(&self) -> usize {
        self.inner.borrow().resumes
    }

    pub fn live_breakpoint_count(&self) -> usize {
        self.inner
            .borrow()
            .breakpoints
            .values()
            .filter(|breakpoint| !breakpoint.deleted)
            .count()
    }

    pub fn breakpoint_enabled(&self, breakpoint: BreakpointId) -> bool {
        self.inner
            .borrow()
            .breakpoints
            .get(&breakpoint.0)
            .map(|breakpoint| !breakpoint.deleted && breakpoint.enabled)
            .unwrap_or(false)
    }

    pub fn has_breakpoint_at(&self, location: &Location) -> bool {
        self.inner.borrow().breakpoints.values().any(|breakpoint| {
            !breakpoint.deleted && breakpoint.location == MockLocation::At(location.clone())
        })
    }

    pub fn subscription_count(&self) -> usize {
        self.inner.borrow().subscriptions.len()
    }

    fn datum(inner: &Inner, raw: RawValue) -> Result<&Datum> {
        inner.heap.get(raw.0 as usize).ok_or(Error::Host {
            message: format!("no such value: {raw}"),
        })
    }
}

impl Default for MockHost {
    fn default() -> Self {
        MockHost::new()
    }
}

impl Host for MockHost {
    fn create_breakpoint(
        &self,
        location: &Location,
        options: BreakpointOptions,
    ) -> Result<BreakpointId> {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_breakpoint;
        inner.next_breakpoint += 1;
        inner.breakpoints.insert(id, MockBreakpoint {
            location: MockLocation::At(location.clone()),
            enabled: true,
            temporary: options.temporary,
            deleted: false,
            return_value: None,
        });
        Ok(BreakpointId(id))
    }

    fn create_finish_breakpoint(&self, frame: FrameId) -> Result<BreakpointId> {
        let mut inner = self.inner.borrow_mut();
        if !inner.frames.iter().any(|candidate| candidate.id == frame.0) {
            return Err(Error::Host {
                message: format!("no such frame: {frame:?}"),
            });
        }

        let id = inner.next_breakpoint;
        inner.next_breakpoint += 1;
        inner.breakpoints.insert(id, MockBreakpoint {
            location: MockLocation::Finish(frame.0),
            enabled: true,
            temporary: true,
            deleted: false,
            return_value: None,
        });
        Ok(BreakpointId(id))
    }

    fn set_breakpoint_enabled(&self, breakpoint: BreakpointId, enabled: bool) {
        let mut inner = self.inner.borrow_mut();
        if let Some(breakpoint) = inner.breakpoints.get_mut(&breakpoint.0) {
            if !breakpoint.deleted {
                breakpoint.enabled = enabled;
            }
        }
    }

    fn delete_breakpoint(&self, breakpoint: BreakpointId) {
        let mut inner = self.inner.borrow_mut();
        if let Some(breakpoint) = inner.breakpoints.get_mut(&breakpoint.0) {
            breakpoint.deleted = true;
        }
    }

    fn breakpoint_is_valid(&self, breakpoint: BreakpointId) -> bool {
        self.inner
            .borrow()
            .breakpoints
            .get(&breakpoint.0)
            .map(|breakpoint| !breakpoint.deleted)
            .unwrap_or(false)
    }

    fn return_value(&self, breakpoint: BreakpointId) -> Option<RawValue> {
        self.inner
            .borrow()
            .breakpoints
            .get(&breakpoint.0)
            .and_then(|breakpoint| breakpoint.return_value)
    }

    fn newest_frame(&self) -> Result<FrameId> {
        let inner = self.inner.borrow();
        inner
            .frames
            .last()
            .map(|frame| FrameId(frame.id))
            .ok_or(Error::NoFrame)
    }

    fn selected_frame(&self) -> Result<FrameId> {
        // The mock keeps the selection pinned to the newest frame.
        self.newest_frame()
    }

    fn frame_older(&self, frame: FrameId) -> Result<Option<FrameId>> {
        let inner = self.inner.borrow();
        let index = inner
            .frames
            .iter()
            .position(|candidate| candidate.id == frame.0)
            .ok_or(Error::Host {
                message: format!("no such frame: {frame:?}"),
            })?;
        Ok(index
            .checked_sub(1)
            .map(|index| FrameId(inner.frames[index].id)))
    }

    fn frame_newer(&self, frame: FrameId) -> Result<Option<FrameId>> {
        let inner = self.inner.borrow();
        let index = inner
            .frames
            .iter()
            .position(|candidate| candidate.id == frame.0)
            .ok_or(Error::Host {
                message: format!("no such frame: {frame:?}"),
            })?;
        Ok(inner.frames.get(index + 1).map(|frame| FrameId(frame.id)))
    }

    fn frame_function(&self, frame: FrameId) -> Result<Option<String>> {
        let inner = self.inner.borrow();
        let frame = inner
            .frames
            .iter()
            .find(|candidate| candidate.id == frame.0)
            .ok_or(Error::Host {
                message: format!("no such frame: {frame:?}"),
            })?;
        Ok(Some(frame.function.clone()))
    }

    fn read_var(&self, frame: FrameId, name: &str) -> Result<RawValue> {
        let inner = self.inner.borrow();
        let frame = inner
            .frames
            .iter()
            .find(|candidate| candidate.id == frame.0)
            .ok_or(Error::Host {
                message: format!("no such frame: {frame:?}"),
            })?;
        frame
            .vars
            .get(name)
            .copied()
            .ok_or_else(|| Error::MissingVariable {
                name: String::from(name),
            })
    }

    fn parse_and_eval(&self, expression: &str) -> Result<RawValue> {
        eval_expression(self, expression)
    }

    fn value_int(&self, value: RawValue) -> Result<i64> {
        let inner = self.inner.borrow();
        match MockHost::datum(&inner, value)? {
            Datum::Fixnum(int) => Ok(*int),
            Datum::Poison => Err(Error::MemoryFault {
                expression: value.to_string(),
            }),
            other => Err(Error::Host {
                message: format!("{value} is not an integer: {other:?}"),
            }),
        }
    }

    fn value_string(&self, value: RawValue) -> Result<String> {
        let inner = self.inner.borrow();
        match MockHost::datum(&inner, value)? {
            Datum::Str(contents) => Ok(contents.clone()),
            Datum::Poison => Err(Error::MemoryFault {
                expression: value.to_string(),
            }),
            other => Err(Error::Host {
                message: format!("{value} is not a string: {other:?}"),
            }),
        }
    }

    fn resume(&self) {
        self.inner.borrow_mut().resumes += 1;
    }

    fn echo(&self, text: &str) {
        self.inner.borrow_mut().echoes.push(String::from(text));
    }

    fn prompt_yes_no(&self, prompt: &str) -> bool {
        let mut inner = self.inner.borrow_mut();
        inner.prompts.push(String::from(prompt));
        inner.answers.pop_front().unwrap_or(false)
    }

    fn connect_stop(&self) -> StopSubscription {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_subscription;
        inner.next_subscription += 1;
        inner.subscriptions.push(id);
        StopSubscription(id)
    }

    fn disconnect_stop(&self, subscription: StopSubscription) {
        let mut inner = self.inner.borrow_mut();
        inner.subscriptions.retain(|id| *id != subscription.0);
    }
}

// --- the expression evaluator
//
// The engine only ever evaluates a fixed family of accessor expressions
// (predicates, XCAR/XCDR, subr descriptor fields, argument indexing, the
// obarray helpers), so a pattern matcher over those shapes is enough.

fn eval_expression(host: &MockHost, expression: &str) -> Result<RawValue> {
    if expression == "UNEVALLED" {
        return Ok(host.fixnum(UNEVALLED));
    }
    if expression == "MANY" {
        return Ok(host.fixnum(MANY));
    }

    if let Some(inner) = call_operand(expression, "NILP") {
        let datum = operand_datum(host, inner)?;
        fault_check(&datum, expression)?;
        return Ok(host.fixnum(matches!(&datum, Datum::Symbol(name) if name == "nil") as i64));
    }

    for (predicate, test) in PREDICATES {
        if let Some(inner) = call_operand(expression, predicate) {
            let datum = operand_datum(host, inner)?;
            fault_check(&datum, expression)?;
            return Ok(host.fixnum(test(&datum) as i64));
        }
    }

    if let Some(inner) = call_operand(expression, "XCAR") {
        let datum = operand_datum(host, inner)?;
        return match datum {
            Datum::Cons { car, .. } => Ok(car),
            _ => Err(Error::MemoryFault {
                expression: String::from(expression),
            }),
        };
    }

    if let Some(inner) = call_operand(expression, "XCDR") {
        let datum = operand_datum(host, inner)?;
        return match datum {
            Datum::Cons { cdr, .. } => Ok(cdr),
            _ => Err(Error::MemoryFault {
                expression: String::from(expression),
            }),
        };
    }

    if let Some(inner) = call_operand(expression, "SYMBOL_NAME") {
        let datum = operand_datum(host, inner)?;
        return match datum {
            Datum::Symbol(name) => Ok(host.string(&name)),
            _ => Err(Error::MemoryFault {
                expression: String::from(expression),
            }),
        };
    }

    if let Some(inner) = call_operand(expression, "XFIXNUM") {
        // Untagging a fixnum is the identity in the mock.
        return token(inner).ok_or_else(|| bad_expression(expression));
    }

    if let Some(rest) = expression.strip_prefix("XSUBR(") {
        let (operand, field) = rest.split_once(")->").ok_or_else(|| bad_expression(expression))?;
        let datum = operand_datum(host, operand)?;
        let Datum::Subr {
            name,
            function,
            min_args,
            max_args,
        } = datum
        else {
            return Err(Error::MemoryFault {
                expression: String::from(expression),
            });
        };
        return match field {
            "symbol_name" => Ok(host.string(&name)),
            "function" => Ok(host.fixnum(function as i64)),
            "min_args" => Ok(host.fixnum(min_args)),
            "max_args" => Ok(host.fixnum(max_args)),
            _ => Err(bad_expression(expression)),
        };
    }

    if let Some(rest) = expression.strip_prefix("debug_format(\"%s\", ") {
        let operand = rest.strip_suffix(')').ok_or_else(|| bad_expression(expression))?;
        let raw = token(operand).ok_or_else(|| bad_expression(expression))?;
        let rendered = {
            let inner = host.inner.borrow();
            render(&inner, raw, 0)?
        };
        return Ok(host.string(&rendered));
    }

    // Argument array indexing: `($sN)[i]`
    if let Some(rest) = expression.strip_prefix('(') {
        if let Some((operand, index)) = rest.split_once(")[") {
            let index: usize = index
                .strip_suffix(']')
                .and_then(|index| index.parse().ok())
                .ok_or_else(|| bad_expression(expression))?;
            let datum = operand_datum(host, operand)?;
            return match datum {
                Datum::Values(items) | Datum::Vector(items) => {
                    items.get(index).copied().ok_or(Error::MemoryFault {
                        expression: String::from(expression),
                    })
                },
                _ => Err(Error::MemoryFault {
                    expression: String::from(expression),
                }),
            };
        }
    }

    if let Some(rest) = expression.strip_prefix("make_multibyte_string(\"") {
        let (contents, _) = rest.split_once('"').ok_or_else(|| bad_expression(expression))?;
        return Ok(host.string(contents));
    }

    if expression.starts_with("oblookup(") {
        let operand = expression
            .split("$s")
            .nth(1)
            .and_then(|rest| rest.split(&[')', ','][..]).next())
            .ok_or_else(|| bad_expression(expression))?;
        let raw = RawValue(operand.parse().map_err(|_| bad_expression(expression))?);
        let name = host.value_string(raw)?;

        let inner = host.inner.borrow();
        return match inner.globals.get(&name) {
            Some((symbol, _)) => Ok(*symbol),
            None => Err(Error::MissingSymbol { name }),
        };
    }

    if let Some(inner_expr) = call_operand(expression, "find_symbol_value") {
        let datum = operand_datum(host, inner_expr)?;
        let Datum::Symbol(name) = datum else {
            return Err(bad_expression(expression));
        };
        let inner = host.inner.borrow();
        return match inner.globals.get(&name) {
            Some((_, value)) => Ok(*value),
            None => Err(Error::MissingSymbol { name }),
        };
    }

    Err(bad_expression(expression))
}

type Predicate = fn(&Datum) -> bool;

const PREDICATES: [(&str, Predicate); 9] = [
    ("SYMBOLP", |datum| matches!(datum, Datum::Symbol(_))),
    ("FIXNUMP", |datum| matches!(datum, Datum::Fixnum(_))),
    ("CONSP", |datum| matches!(datum, Datum::Cons { .. })),
    ("FLOATP", |datum| matches!(datum, Datum::Float(_))),
    ("STRINGP", |datum| matches!(datum, Datum::Str(_))),
    ("VECTORP", |datum| matches!(datum, Datum::Vector(_))),
    ("SUBRP", |datum| matches!(datum, Datum::Subr { .. })),
    ("VECTORLIKEP", |datum| {
        matches!(
            datum,
            Datum::Vector(_) | Datum::Subr { .. } | Datum::Compiled
        )
    }),
    ("COMPILEDP", |datum| matches!(datum, Datum::Compiled)),
];

fn call_operand<'a>(expression: &'a str, name: &str) -> Option<&'a str> {
    expression
        .strip_prefix(name)?
        .strip_prefix('(')?
        .strip_suffix(')')
}

fn token(operand: &str) -> Option<RawValue> {
    let id = operand.strip_prefix("$s")?.parse().ok()?;
    Some(RawValue(id))
}

fn operand_datum(host: &MockHost, operand: &str) -> Result<Datum> {
    let raw = token(operand).ok_or_else(|| bad_expression(operand))?;
    let inner = host.inner.borrow();
    MockHost::datum(&inner, raw).cloned()
}

fn fault_check(datum: &Datum, expression: &str) -> Result<()> {
    if matches!(datum, Datum::Poison) {
        return Err(Error::MemoryFault {
            expression: String::from(expression),
        });
    }
    Ok(())
}

fn bad_expression(expression: &str) -> Error {
    Error::Host {
        message: format!("can't evaluate '{expression}'"),
    }
}

fn render(inner: &Inner, raw: RawValue, depth: usize) -> Result<String> {
    if depth > 64 {
        return Ok(String::from("..."));
    }

    let datum = inner.heap.get(raw.0 as usize).ok_or(Error::Host {
        message: format!("no such value: {raw}"),
    })?;

    match datum {
        Datum::Symbol(name) => Ok(name.clone()),
        Datum::Fixnum(int) => Ok(int.to_string()),
        Datum::Float(float) => Ok(float.to_string()),
        Datum::Str(contents) => Ok(format!("\"{contents}\"")),
        Datum::Subr { name, .. } => Ok(format!("#<subr {name}>")),
        Datum::Compiled => Ok(String::from("#<compiled-function>")),
        Datum::Values(_) => Ok(String::from("#<args>")),
        Datum::Vector(items) => {
            let rendered: Result<Vec<String>> = items
                .iter()
                .map(|item| render(inner, *item, depth + 1))
                .collect();
            Ok(format!("[{}]", rendered?.iter().join(" ")))
        },
        Datum::Cons { car, cdr } => {
            let mut car = *car;
            let mut cdr = *cdr;
            let mut parts = vec![render(inner, car, depth + 1)?];
            loop {
                let tail = inner.heap.get(cdr.0 as usize).ok_or(Error::Host {
                    message: format!("no such value: {cdr}"),
                })?;
                match tail {
                    Datum::Symbol(name) if name == "nil" => break,
                    Datum::Cons {
                        car: next_car,
                        cdr: next_cdr,
                    } => {
                        car = *next_car;
                        cdr = *next_cdr;
                        parts.push(render(inner, car, depth + 1)?);
                        if parts.len() > 64 {
                            parts.push(String::from("..."));
                            break;
                        }
                    },
                    _ => {
                        parts.push(String::from("."));
                        parts.push(render(inner, cdr, depth + 1)?);
                        break;
                    },
                }
            }
            Ok(format!("({})", parts.join(" ")))
        },
        Datum::Poison => Err(Error::MemoryFault {
            expression: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_at_consumes_temporary_breakpoints() {
        let host = MockHost::new();
        let location = Location::symbol("eval_sub");

        let persistent = host
            .create_breakpoint(&location, BreakpointOptions::INTERNAL)
            .unwrap();
        let temporary = host
            .create_breakpoint(&location, BreakpointOptions::INTERNAL_TEMPORARY)
            .unwrap();

        let event = host.stop_at(&location);
        assert_eq!(event.breakpoints, vec![persistent, temporary]);
        assert!(host.breakpoint_is_valid(persistent));
        assert!(!host.breakpoint_is_valid(temporary));
    }

    #[test]
    fn test_finish_breakpoints_fire_on_return() {
        let host = MockHost::new();
        host.push_frame("main");
        let frame = host.push_frame("eval_sub");

        let finish = host.create_finish_breakpoint(frame).unwrap();
        let value = host.fixnum(3);

        let event = host.return_from_top(Some(value));
        assert_eq!(event.breakpoints, vec![finish]);
        assert_eq!(host.return_value(finish), Some(value));
        assert_eq!(host.newest_frame().unwrap(), FrameId(0));
    }

    #[test]
    fn test_disabled_breakpoints_do_not_fire() {
        let host = MockHost::new();
        let location = Location::label("eval_sub", "func_subr_arg_n");
        let breakpoint = host
            .create_breakpoint(&location, BreakpointOptions::INTERNAL)
            .unwrap();

        host.set_breakpoint_enabled(breakpoint, false);
        assert!(host.stop_at(&location).breakpoints.is_empty());

        host.set_breakpoint_enabled(breakpoint, true);
        assert_eq!(host.stop_at(&location).breakpoints, vec![breakpoint]);
    }

    #[test]
    fn test_frame_walking() {
        let host = MockHost::new();
        let outer = host.push_frame("main");
        let inner = host.push_frame("eval_sub");

        assert_eq!(host.newest_frame().unwrap(), inner);
        assert_eq!(host.frame_older(inner).unwrap(), Some(outer));
        assert_eq!(host.frame_newer(outer).unwrap(), Some(inner));
        assert_eq!(host.frame_older(outer).unwrap(), None);
        assert_eq!(host.frame_newer(inner).unwrap(), None);
    }

    #[test]
    fn test_poisoned_reads_fault() {
        let host = MockHost::new();
        let poison = host.poison();
        let frame = host.push_frame_with("funcall_subr", &[("args", poison)]);

        let raw = host.read_var(frame, "args").unwrap();
        let result = host.parse_and_eval(&format!("({raw})[0]"));
        assert!(matches!(result, Err(Error::MemoryFault { .. })));
    }
}
