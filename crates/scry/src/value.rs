//
// value.rs
//
// Copyright (C) 2026 Posit Software, PBC. All rights reserved.
//
// Tagged-union reader for Lisp data in the inferior. Classification and the
// accessors all go through the evaluator's own macros, evaluated in inferior
// context by the host, so the layout knowledge stays in the inferior's
// source and not here.
//

use std::fmt;

use crate::error::Error;
use crate::error::Result;
use crate::host::FrameId;
use crate::host::Host;
use crate::host::RawValue;

/// A classified Lisp value. Every variant carries the raw tagged word it was
/// classified from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LispValue {
    Symbol(LispSymbol),
    Int(LispInt),
    Cons(LispCons),
    Float(LispFloat),
    Str(LispStr),
    Vector(LispVector),
    Subr(LispSubr),
    /// The vector-like catch-all: records, bytecode objects, char tables and
    /// friends. We can render these but not take them apart.
    Vectorlike(LispVectorlike),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LispSymbol(RawValue);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LispInt(RawValue);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LispCons(RawValue);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LispFloat(RawValue);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LispStr(RawValue);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LispVector(RawValue);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LispSubr(RawValue);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LispVectorlike(RawValue);

/// How many arguments a subroutine takes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubrArity {
    /// Variadic: arguments arrive as a count plus a vector.
    Many,
    /// Special form: the unevaluated form is passed through whole.
    Unevalled,
    /// A fixed range of evaluated arguments.
    Range { min: i64, max: i64 },
}

impl LispValue {
    /// Classifies `raw` by asking the inferior's type predicates, in the
    /// same order the evaluator's own dispatch checks them.
    pub fn decode(host: &dyn Host, raw: RawValue) -> Result<LispValue> {
        if eval_bool(host, &format!("SYMBOLP({raw})"))? {
            return Ok(LispValue::Symbol(LispSymbol(raw)));
        }
        if eval_bool(host, &format!("FIXNUMP({raw})"))? {
            return Ok(LispValue::Int(LispInt(raw)));
        }
        if eval_bool(host, &format!("CONSP({raw})"))? {
            return Ok(LispValue::Cons(LispCons(raw)));
        }
        if eval_bool(host, &format!("FLOATP({raw})"))? {
            return Ok(LispValue::Float(LispFloat(raw)));
        }
        if eval_bool(host, &format!("STRINGP({raw})"))? {
            return Ok(LispValue::Str(LispStr(raw)));
        }
        if eval_bool(host, &format!("VECTORP({raw})"))? {
            return Ok(LispValue::Vector(LispVector(raw)));
        }
        if eval_bool(host, &format!("SUBRP({raw})"))? {
            return Ok(LispValue::Subr(LispSubr(raw)));
        }
        if eval_bool(host, &format!("VECTORLIKEP({raw})"))? {
            return Ok(LispValue::Vectorlike(LispVectorlike(raw)));
        }

        Err(Error::UnknownTag {
            rendered: raw.to_string(),
        })
    }

    /// Reads and classifies a named variable of `frame`.
    pub fn from_var(host: &dyn Host, frame: FrameId, name: &str) -> Result<LispValue> {
        let raw = host.read_var(frame, name)?;
        LispValue::decode(host, raw)
    }

    pub fn raw(&self) -> RawValue {
        match self {
            LispValue::Symbol(LispSymbol(raw)) => *raw,
            LispValue::Int(LispInt(raw)) => *raw,
            LispValue::Cons(LispCons(raw)) => *raw,
            LispValue::Float(LispFloat(raw)) => *raw,
            LispValue::Str(LispStr(raw)) => *raw,
            LispValue::Vector(LispVector(raw)) => *raw,
            LispValue::Subr(LispSubr(raw)) => *raw,
            LispValue::Vectorlike(LispVectorlike(raw)) => *raw,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            LispValue::Symbol(_) => "symbol",
            LispValue::Int(_) => "fixnum",
            LispValue::Cons(_) => "cons",
            LispValue::Float(_) => "float",
            LispValue::Str(_) => "string",
            LispValue::Vector(_) => "vector",
            LispValue::Subr(_) => "subr",
            LispValue::Vectorlike(_) => "vectorlike",
        }
    }

    pub fn is_nil(&self, host: &dyn Host) -> Result<bool> {
        eval_bool(host, &format!("NILP({})", self.raw()))
    }

    /// The printed representation, produced by the inferior's own printer.
    pub fn render(&self, host: &dyn Host) -> Result<String> {
        let formatted = host.parse_and_eval(&format!("debug_format(\"%s\", {})", self.raw()))?;
        host.value_string(formatted)
    }

    pub fn as_cons(&self) -> Result<LispCons> {
        match self {
            LispValue::Cons(cons) => Ok(*cons),
            other => Err(Error::UnexpectedVariant {
                expected: "cons",
                actual: other.kind(),
            }),
        }
    }

    pub fn as_subr(&self) -> Result<LispSubr> {
        match self {
            LispValue::Subr(subr) => Ok(*subr),
            other => Err(Error::UnexpectedVariant {
                expected: "subr",
                actual: other.kind(),
            }),
        }
    }
}

impl LispSymbol {
    pub fn name(&self, host: &dyn Host) -> Result<String> {
        let name = host.parse_and_eval(&format!("SYMBOL_NAME({})", self.0))?;
        host.value_string(name)
    }
}

impl LispInt {
    pub fn value(&self, host: &dyn Host) -> Result<i64> {
        let untagged = host.parse_and_eval(&format!("XFIXNUM({})", self.0))?;
        host.value_int(untagged)
    }
}

impl LispCons {
    pub fn car(&self, host: &dyn Host) -> Result<LispValue> {
        let car = host.parse_and_eval(&format!("XCAR({})", self.0))?;
        LispValue::decode(host, car)
    }

    pub fn cdr(&self, host: &dyn Host) -> Result<LispValue> {
        let cdr = host.parse_and_eval(&format!("XCDR({})", self.0))?;
        LispValue::decode(host, cdr)
    }

    /// Lazily walks the list headed by this cell, yielding each element.
    /// A non-nil, non-cons tail (a dotted list) yields one final error.
    pub fn cells<'a>(&self, host: &'a dyn Host) -> ConsCells<'a> {
        ConsCells {
            host,
            head: Some(LispValue::Cons(*self)),
        }
    }
}

impl LispSubr {
    /// The subroutine's name, from its descriptor.
    pub fn name(&self, host: &dyn Host) -> Result<String> {
        let name = host.parse_and_eval(&format!("XSUBR({})->symbol_name", self.0))?;
        host.value_string(name)
    }

    /// The address of the C function implementing the subroutine.
    pub fn function_address(&self, host: &dyn Host) -> Result<u64> {
        let function = host.parse_and_eval(&format!("XSUBR({})->function", self.0))?;
        let address = host.value_int(function)?;
        Ok(address as u64)
    }

    pub fn arity(&self, host: &dyn Host) -> Result<SubrArity> {
        let unevalled = eval_int(host, "UNEVALLED")?;
        let many = eval_int(host, "MANY")?;

        let max = eval_int(host, &format!("XSUBR({})->max_args", self.0))?;
        if max == unevalled {
            return Ok(SubrArity::Unevalled);
        }
        if max == many {
            return Ok(SubrArity::Many);
        }

        let min = eval_int(host, &format!("XSUBR({})->min_args", self.0))?;
        Ok(SubrArity::Range { min, max })
    }
}

impl fmt::Display for SubrArity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubrArity::Many => write!(f, "many"),
            SubrArity::Unevalled => write!(f, "unevalled"),
            SubrArity::Range { min, max } => write!(f, "{min}..{max}"),
        }
    }
}

/// Iterator over the elements of a (proper) Lisp list.
pub struct ConsCells<'a> {
    host: &'a dyn Host,
    head: Option<LispValue>,
}

impl Iterator for ConsCells<'_> {
    type Item = Result<LispValue>;

    fn next(&mut self) -> Option<Self::Item> {
        let head = self.head.take()?;

        match head.is_nil(self.host) {
            Ok(true) => return None,
            Ok(false) => (),
            Err(error) => return Some(Err(error)),
        }

        match head {
            LispValue::Cons(cons) => {
                match cons.cdr(self.host) {
                    Ok(cdr) => self.head = Some(cdr),
                    Err(error) => return Some(Err(error)),
                }
                Some(cons.car(self.host))
            },
            other => {
                // Dotted tail. Surface it as an error and stop.
                Some(Err(Error::UnexpectedVariant {
                    expected: "cons",
                    actual: other.kind(),
                }))
            },
        }
    }
}

fn eval_bool(host: &dyn Host, expression: &str) -> Result<bool> {
    let value = host.parse_and_eval(expression)?;
    Ok(host.value_int(value)? != 0)
}

fn eval_int(host: &dyn Host, expression: &str) -> Result<i64> {
    let value = host.parse_and_eval(expression)?;
    host.value_int(value)
}
