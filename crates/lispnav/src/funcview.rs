//
// funcview.rs
//
// Copyright (C) 2026 Posit Software, PBC. All rights reserved.
//
// Views over a stopped inferior frame known to sit at a recognised entry
// point: who is being called, with what arguments. Argument extraction can
// fault on bad inferior memory; the fault carries a placeholder list so
// renderers never have to abort.
//

use itertools::Itertools;
use scry::host::FrameId;
use scry::host::Host;
use scry::host::RawValue;
use scry::value::LispSubr;
use scry::value::LispValue;

use crate::entry::EntryPoint;
use crate::errors::Error;
use crate::errors::Result;

/// One argument of the call under inspection.
#[derive(Clone, Debug)]
pub struct Arg {
    pub name: String,
    pub value: ArgValue,
}

/// The argument's value, or a placeholder where memory could not be read.
#[derive(Clone, Copy, Debug)]
pub enum ArgValue {
    Value(LispValue),
    Unreadable,
}

impl ArgValue {
    pub fn render(&self, host: &dyn Host) -> String {
        match self {
            ArgValue::Value(value) => value
                .render(host)
                .unwrap_or_else(|_| String::from("???")),
            ArgValue::Unreadable => String::from("???"),
        }
    }
}

/// The Lisp call in scope at a recognised entry point.
#[derive(Debug)]
pub enum FunctionView {
    Eval(EvalView),
    Lambda(LambdaView),
    Subr(SubrView),
}

impl FunctionView {
    /// Builds the view for `frame`, which must sit at a recognised entry
    /// point.
    pub fn of(host: &dyn Host, frame: FrameId) -> Result<FunctionView> {
        let Some(function) = host.frame_function(frame)? else {
            return Err(Error::InvalidEntry { function: None });
        };
        let Some(entry) = EntryPoint::from_name(&function) else {
            return Err(Error::InvalidEntry {
                function: Some(function),
            });
        };
        FunctionView::at_entry(host, frame, entry)
    }

    pub fn at_entry(host: &dyn Host, frame: FrameId, entry: EntryPoint) -> Result<FunctionView> {
        match entry {
            EntryPoint::EvalSub => Ok(FunctionView::Eval(EvalView::new(host, frame)?)),
            EntryPoint::FuncallLambda => Ok(FunctionView::Lambda(LambdaView::new(host, frame)?)),
            EntryPoint::FuncallSubr => Ok(FunctionView::Subr(SubrView::new(host, frame)?)),
        }
    }

    /// The callee's display name.
    pub fn name(&self, host: &dyn Host) -> Result<String> {
        match self {
            FunctionView::Eval(view) => view.name(host),
            FunctionView::Lambda(view) => view.name(host),
            FunctionView::Subr(view) => view.name(host),
        }
    }

    /// The argument list. Fails with `InvalidArgs` (placeholders included)
    /// on a memory fault.
    pub fn args(&self, host: &dyn Host) -> Result<Vec<Arg>> {
        match self {
            FunctionView::Eval(view) => view.args(host),
            FunctionView::Lambda(view) => view.args(host),
            FunctionView::Subr(view) => view.args(host),
        }
    }
}

/// The view at the eval entry point: a form under evaluation.
#[derive(Debug)]
pub struct EvalView {
    form: LispValue,
}

impl EvalView {
    pub fn new(host: &dyn Host, frame: FrameId) -> Result<EvalView> {
        let form = LispValue::from_var(host, frame, "form")?;
        Ok(EvalView { form })
    }

    pub fn form(&self) -> LispValue {
        self.form
    }

    /// The called symbol's name, when the form is a call: a cons whose head
    /// is a symbol. Anything else has no callee.
    pub fn callee_symbol(&self, host: &dyn Host) -> Result<Option<String>> {
        let LispValue::Cons(cons) = self.form else {
            return Ok(None);
        };
        let LispValue::Symbol(symbol) = cons.car(host)? else {
            return Ok(None);
        };
        Ok(Some(symbol.name(host)?))
    }

    pub fn name(&self, host: &dyn Host) -> Result<String> {
        match self.callee_symbol(host)? {
            Some(name) => Ok(name),
            None => Ok(self.form.render(host)?),
        }
    }

    /// The argument forms, in order. A plain (non-cons) form has none.
    pub fn args(&self, host: &dyn Host) -> Result<Vec<Arg>> {
        let LispValue::Cons(cons) = self.form else {
            return Ok(Vec::new());
        };

        let rest = cons.cdr(host)?;
        let LispValue::Cons(rest) = rest else {
            return Ok(Vec::new());
        };

        let mut out = Vec::new();
        for (index, item) in rest.cells(host).enumerate() {
            match item {
                Ok(value) => out.push(Arg {
                    name: index.to_string(),
                    value: ArgValue::Value(value),
                }),
                Err(error) => {
                    log::warn!("can't walk argument forms: {error:?}");
                    out.push(Arg {
                        name: index.to_string(),
                        value: ArgValue::Unreadable,
                    });
                    return Err(Error::InvalidArgs { placeholders: out });
                },
            }
        }

        Ok(out)
    }
}

/// The view at the lambda entry point: a closure applied to an argument
/// vector.
#[derive(Debug)]
pub struct LambdaView {
    fun: LispValue,
    args: RawValue,
    nargs: i64,
}

/// What the callee datum turned out to be. A list-shaped lambda of three or
/// four elements exposes its pieces; everything else is opaque.
#[derive(Debug)]
pub enum LambdaShape {
    Compiled,
    Opaque,
    List {
        lexenv: Option<LispValue>,
        params: LispValue,
        body: LispValue,
    },
}

impl LambdaView {
    pub fn new(host: &dyn Host, frame: FrameId) -> Result<LambdaView> {
        let fun = LispValue::from_var(host, frame, "fun")?;
        let args = host.read_var(frame, "arg_vector")?;
        let nargs = host.value_int(host.read_var(frame, "nargs")?)?;
        Ok(LambdaView { fun, args, nargs })
    }

    pub fn shape(&self, host: &dyn Host) -> Result<LambdaShape> {
        if let LispValue::Cons(cons) = self.fun {
            let elements: Vec<LispValue> =
                cons.cells(host).take(5).collect::<scry::Result<_>>()?;
            return Ok(match elements.as_slice() {
                // (lambda params body)
                [_marker, params, body] => LambdaShape::List {
                    lexenv: None,
                    params: *params,
                    body: *body,
                },
                // (closure lexenv params body)
                [_marker, lexenv, params, body] => LambdaShape::List {
                    lexenv: Some(*lexenv),
                    params: *params,
                    body: *body,
                },
                _ => LambdaShape::Opaque,
            });
        }

        let compiled = host.parse_and_eval(&format!("COMPILEDP({})", self.fun.raw()))?;
        if host.value_int(compiled)? != 0 {
            return Ok(LambdaShape::Compiled);
        }

        Ok(LambdaShape::Opaque)
    }

    pub fn name(&self, host: &dyn Host) -> Result<String> {
        match self.shape(host)? {
            LambdaShape::Compiled => Ok(String::from("**compiled**")),
            LambdaShape::List { .. } | LambdaShape::Opaque => Ok(String::from("**lambda**")),
        }
    }

    pub fn args(&self, host: &dyn Host) -> Result<Vec<Arg>> {
        indexed_args(host, self.args, self.nargs)
    }
}

/// The view at the subr entry point: a built-in applied to a C argument
/// array.
#[derive(Debug)]
pub struct SubrView {
    subr: LispSubr,
    args: RawValue,
    numargs: i64,
}

impl SubrView {
    pub fn new(host: &dyn Host, frame: FrameId) -> Result<SubrView> {
        let subr = LispValue::from_var(host, frame, "subr")?.as_subr()?;
        let args = host.read_var(frame, "args")?;
        let numargs = host.value_int(host.read_var(frame, "numargs")?)?;
        Ok(SubrView {
            subr,
            args,
            numargs,
        })
    }

    pub fn descriptor(&self) -> LispSubr {
        self.subr
    }

    pub fn name(&self, host: &dyn Host) -> Result<String> {
        Ok(self.subr.name(host)?)
    }

    pub fn args(&self, host: &dyn Host) -> Result<Vec<Arg>> {
        indexed_args(host, self.args, self.numargs)
    }
}

/// Reads `count` values out of the C argument array at `args`. On a memory
/// fault the whole list degrades to placeholders.
fn indexed_args(host: &dyn Host, args: RawValue, count: i64) -> Result<Vec<Arg>> {
    let mut out = Vec::new();

    for index in 0..count {
        let value = host
            .parse_and_eval(&format!("({args})[{index}]"))
            .and_then(|raw| LispValue::decode(host, raw));

        match value {
            Ok(value) => out.push(Arg {
                name: index.to_string(),
                value: ArgValue::Value(value),
            }),
            Err(scry::Error::MemoryFault { .. }) => {
                let placeholders = (0..count)
                    .map(|index| Arg {
                        name: index.to_string(),
                        value: ArgValue::Unreadable,
                    })
                    .collect();
                return Err(Error::InvalidArgs { placeholders });
            },
            Err(error) => return Err(error.into()),
        }
    }

    Ok(out)
}

/// Renders an argument list the way the backtrace shows it.
pub fn render_args(host: &dyn Host, args: &[Arg]) -> String {
    args.iter()
        .map(|arg| format!("{}={}", arg.name, arg.value.render(host)))
        .join(", ")
}

#[cfg(test)]
mod tests {
    use scry::fixtures::MockHost;
    use stdext::assert_match;

    use super::*;

    #[test]
    fn test_eval_view_reads_the_call_form() {
        let host = MockHost::new();
        let form = host.form("foo", &[host.fixnum(1), host.fixnum(2)]);
        let frame = host.push_frame_with("eval_sub", &[("form", form)]);

        let view = EvalView::new(&host, frame).unwrap();
        assert_eq!(view.callee_symbol(&host).unwrap().as_deref(), Some("foo"));
        assert_eq!(view.name(&host).unwrap(), "foo");

        let args = view.args(&host).unwrap();
        assert_eq!(args.len(), 2);
        assert_eq!(args[0].value.render(&host), "1");
        assert_eq!(args[1].value.render(&host), "2");
    }

    #[test]
    fn test_eval_view_of_a_plain_value_has_no_callee() {
        let host = MockHost::new();
        let frame = host.push_frame_with("eval_sub", &[("form", host.fixnum(7))]);

        let view = EvalView::new(&host, frame).unwrap();
        assert_eq!(view.callee_symbol(&host).unwrap(), None);
        assert_eq!(view.name(&host).unwrap(), "7");
        assert!(view.args(&host).unwrap().is_empty());
    }

    #[test]
    fn test_subr_view_reads_the_descriptor_and_args() {
        let host = MockHost::new();
        let subr = host.subr("cons", 0x4000, 2, 2);
        let args = host.values(&[host.fixnum(1), host.nil()]);
        let frame = host.push_frame_with("funcall_subr", &[
            ("subr", subr),
            ("args", args),
            ("numargs", host.fixnum(2)),
        ]);

        let view = SubrView::new(&host, frame).unwrap();
        assert_eq!(view.name(&host).unwrap(), "cons");

        let args = view.args(&host).unwrap();
        assert_eq!(args.len(), 2);
        assert_eq!(render_args(&host, &args), "0=1, 1=nil");
    }

    #[test]
    fn test_faulting_args_degrade_to_placeholders() {
        let host = MockHost::new();
        let subr = host.subr("list", 0x4100, 0, -2);
        let frame = host.push_frame_with("funcall_subr", &[
            ("subr", subr),
            ("args", host.poison()),
            ("numargs", host.fixnum(3)),
        ]);

        let view = SubrView::new(&host, frame).unwrap();
        let error = view.args(&host).unwrap_err();

        assert_match!(error, Error::InvalidArgs { placeholders } => {
            assert_eq!(placeholders.len(), 3);
            assert!(placeholders
                .iter()
                .all(|arg| matches!(arg.value, ArgValue::Unreadable)));
        });
    }

    #[test]
    fn test_lambda_view_exposes_list_shapes() {
        let host = MockHost::new();

        // (closure ENV (x) body): four elements expose the lexical env.
        let closure = host.list(&[
            host.symbol("closure"),
            host.list(&[host.symbol("t")]),
            host.list(&[host.symbol("x")]),
            host.form("car", &[host.symbol("x")]),
        ]);
        let frame = host.push_frame_with("funcall_lambda", &[
            ("fun", closure),
            ("arg_vector", host.values(&[host.fixnum(1)])),
            ("nargs", host.fixnum(1)),
        ]);

        let view = LambdaView::new(&host, frame).unwrap();
        assert_eq!(view.name(&host).unwrap(), "**lambda**");
        assert_match!(view.shape(&host).unwrap(), LambdaShape::List { lexenv, params, .. } => {
            assert!(lexenv.is_some());
            assert_eq!(params.render(&host).unwrap(), "(x)");
        });

        host.pop_frame();

        // (lambda (x) body): three elements, no lexical env.
        let lambda = host.list(&[
            host.symbol("lambda"),
            host.list(&[host.symbol("x")]),
            host.symbol("x"),
        ]);
        let frame = host.push_frame_with("funcall_lambda", &[
            ("fun", lambda),
            ("arg_vector", host.values(&[])),
            ("nargs", host.fixnum(0)),
        ]);

        let view = LambdaView::new(&host, frame).unwrap();
        assert_match!(view.shape(&host).unwrap(), LambdaShape::List { lexenv, .. } => {
            assert!(lexenv.is_none());
        });
    }

    #[test]
    fn test_lambda_view_reports_compiled_closures() {
        let host = MockHost::new();
        let frame = host.push_frame_with("funcall_lambda", &[
            ("fun", host.compiled()),
            ("arg_vector", host.values(&[])),
            ("nargs", host.fixnum(0)),
        ]);

        let view = LambdaView::new(&host, frame).unwrap();
        assert_eq!(view.name(&host).unwrap(), "**compiled**");
        assert_match!(view.shape(&host).unwrap(), LambdaShape::Compiled);
    }

    #[test]
    fn test_function_view_rejects_unrecognised_frames() {
        let host = MockHost::new();
        let frame = host.push_frame("main");

        let error = FunctionView::of(&host, frame).unwrap_err();
        assert_match!(error, Error::InvalidEntry { function: Some(function) } => {
            assert_eq!(function, "main");
        });
    }
}
