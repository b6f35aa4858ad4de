//
// backtrace.rs
//
// Copyright (C) 2026 Posit Software, PBC. All rights reserved.
//
// Lisp-level decoration of the native stack: frames sitting at recognised
// entry points are shown as the Lisp call in scope there instead of the C
// plumbing. A frame whose arguments can't be read still yields a decorator
// with placeholders; one bad frame never aborts the walk.
//

use scry::host::FrameId;
use scry::host::Host;
use stdext::ResultExt;

use crate::entry::EntryPoint;
use crate::errors::Error;
use crate::funcview::Arg;
use crate::funcview::FunctionView;
use crate::funcview::render_args;

/// A native frame re-dressed in Lisp terms.
pub struct LispFrameDecorator {
    pub frame: FrameId,
    pub function: String,
    pub args: Vec<Arg>,
}

/// Decorates one native frame, if it sits at a recognised entry point.
pub fn decorate(host: &dyn Host, frame: FrameId) -> Option<LispFrameDecorator> {
    let name = host.frame_function(frame).ok().flatten()?;
    let entry = EntryPoint::from_name(&name)?;

    let view = FunctionView::at_entry(host, frame, entry).warn_on_err()?;
    let function = view.name(host).warn_on_err()?;

    let args = match view.args(host) {
        Ok(args) => args,
        Err(Error::InvalidArgs { placeholders }) => {
            log::warn!("frame {frame:?}: argument memory is unreadable");
            placeholders
        },
        Err(error) => {
            log::warn!("frame {frame:?}: {error:?}");
            Vec::new()
        },
    };

    Some(LispFrameDecorator {
        frame,
        function,
        args,
    })
}

/// Walks the whole inferior stack newest-first, yielding a decorator for
/// every recognised frame.
pub fn lisp_frames(host: &dyn Host) -> scry::Result<Vec<LispFrameDecorator>> {
    let mut out = Vec::new();

    let mut cursor = Some(host.newest_frame()?);
    while let Some(frame) = cursor {
        if let Some(decorator) = decorate(host, frame) {
            out.push(decorator);
        }
        cursor = host.frame_older(frame)?;
    }

    Ok(out)
}

/// The full native backtrace with Lisp decoration applied where it fits.
pub fn render_native(host: &dyn Host) -> scry::Result<String> {
    let mut lines = Vec::new();

    let mut cursor = Some(host.newest_frame()?);
    let mut index = 0;
    while let Some(frame) = cursor {
        let line = match decorate(host, frame) {
            Some(decorator) => format!(
                "#{index}  {} ({})",
                decorator.function,
                render_args(host, &decorator.args)
            ),
            None => {
                let name = host
                    .frame_function(frame)?
                    .unwrap_or_else(|| String::from("??"));
                format!("#{index}  {name} (...)")
            },
        };
        lines.push(line);

        cursor = host.frame_older(frame)?;
        index += 1;
    }

    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use scry::fixtures::MockHost;

    use super::*;
    use crate::funcview::ArgValue;

    #[test]
    fn test_lisp_frames_keep_only_recognised_entries() {
        let host = MockHost::new();
        host.push_frame("main");

        let form = host.form("foo", &[host.fixnum(1)]);
        host.push_frame_with("eval_sub", &[("form", form)]);

        host.push_frame("Fcons");

        let subr = host.subr("cons", 0x4000, 2, 2);
        host.push_frame_with("funcall_subr", &[
            ("subr", subr),
            ("args", host.values(&[host.fixnum(1), host.nil()])),
            ("numargs", host.fixnum(2)),
        ]);

        let decorators = lisp_frames(&host).unwrap();
        assert_eq!(decorators.len(), 2);
        assert_eq!(decorators[0].function, "cons");
        assert_eq!(decorators[1].function, "foo");
    }

    #[test]
    fn test_faulting_frame_yields_placeholders_not_an_abort() {
        let host = MockHost::new();

        let subr = host.subr("list", 0x4100, 0, -2);
        host.push_frame_with("funcall_subr", &[
            ("subr", subr),
            ("args", host.poison()),
            ("numargs", host.fixnum(2)),
        ]);

        let form = host.form("outer", &[]);
        host.push_frame_with("eval_sub", &[("form", form)]);

        let decorators = lisp_frames(&host).unwrap();
        assert_eq!(decorators.len(), 2);

        let faulted = &decorators[1];
        assert_eq!(faulted.function, "list");
        assert_eq!(faulted.args.len(), 2);
        assert!(faulted
            .args
            .iter()
            .all(|arg| matches!(arg.value, ArgValue::Unreadable)));
    }

    #[test]
    fn test_render_native_mixes_decorated_and_raw_frames() {
        let host = MockHost::new();
        host.push_frame("main");

        let form = host.form("foo", &[host.fixnum(7)]);
        host.push_frame_with("eval_sub", &[("form", form)]);

        let rendered = render_native(&host).unwrap();
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "#0  foo (0=7)");
        assert_eq!(lines[1], "#1  main (...)");
    }
}
