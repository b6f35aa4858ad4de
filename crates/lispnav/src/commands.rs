//
// commands.rs
//
// Copyright (C) 2026 Posit Software, PBC. All rights reserved.
//
// The textual command surface. Each verb is a thin adapter: parse, forward
// to the manager, echo. Anything user-facing that goes wrong is a console
// message, not an error.
//

use anyhow::anyhow;
use scry::host::Host;
use scry::value::LispValue;
use scry::variable;

use crate::backtrace;
use crate::manager::Manager;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Print(String),
    Break(String),
    Backtrace { full: bool },
    Step,
    Next,
    Up,
    Continue,
}

impl Command {
    pub fn parse(line: &str) -> anyhow::Result<Command> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Err(anyhow!("empty command"));
        };
        let argument = words.next();

        match verb {
            "print" => match argument {
                Some(name) => Ok(Command::Print(String::from(name))),
                None => Err(anyhow!("must pass in an argument")),
            },

            "break" => match argument {
                Some(name) => Ok(Command::Break(String::from(name))),
                None => Err(anyhow!("must give the name of a function!")),
            },

            "backtrace" => match argument {
                None => Ok(Command::Backtrace { full: false }),
                Some("full") => Ok(Command::Backtrace { full: true }),
                Some(_) => Err(anyhow!("invalid argument: [full]")),
            },

            "step" => Ok(Command::Step),
            "next" => Ok(Command::Next),
            "up" => Ok(Command::Up),
            "continue" => Ok(Command::Continue),

            other => Err(anyhow!("unknown command: '{other}'")),
        }
    }
}

pub fn execute(manager: &mut Manager, command: Command) {
    match command {
        Command::Print(name) => print_variable(manager, &name),
        Command::Break(name) => {
            if let Err(error) = manager.add_breakpoint(&name) {
                log::error!("can't set a breakpoint on '{name}': {error:?}");
            }
        },
        Command::Backtrace { full } => print_backtrace(manager, full),
        Command::Step => manager.step(),
        Command::Next => manager.next(),
        Command::Up => manager.up(),
        Command::Continue => manager.cont(),
    }
}

/// Decodes a named variable of the selected frame, falling back to a global
/// Lisp variable lookup through the obarray.
fn print_variable(manager: &Manager, name: &str) {
    let host = manager.host().as_ref();

    let value = read_frame_var(host, name).or_else(|_| variable::global_value(host, name));

    match value.and_then(|value| value.render(host)) {
        Ok(text) => host.echo(&text),
        Err(error) => host.echo(&format!("{error}")),
    }
}

fn read_frame_var(host: &dyn Host, name: &str) -> scry::Result<LispValue> {
    let frame = host.selected_frame()?;
    LispValue::from_var(host, frame, name)
}

fn print_backtrace(manager: &Manager, full: bool) {
    let host = manager.host().as_ref();

    if full {
        match backtrace::render_native(host) {
            Ok(text) => host.echo(&text),
            Err(error) => host.echo(&format!("{error}")),
        }
    } else {
        host.echo(&manager.frame_list(true));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_verbs() {
        assert_eq!(
            Command::parse("print form").unwrap(),
            Command::Print(String::from("form"))
        );
        assert_eq!(
            Command::parse("break foo").unwrap(),
            Command::Break(String::from("foo"))
        );
        assert_eq!(
            Command::parse("backtrace").unwrap(),
            Command::Backtrace { full: false }
        );
        assert_eq!(
            Command::parse("backtrace full").unwrap(),
            Command::Backtrace { full: true }
        );
        assert_eq!(Command::parse("step").unwrap(), Command::Step);
        assert_eq!(Command::parse("next").unwrap(), Command::Next);
        assert_eq!(Command::parse("up").unwrap(), Command::Up);
        assert_eq!(Command::parse("continue").unwrap(), Command::Continue);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(Command::parse("").is_err());
        assert!(Command::parse("print").is_err());
        assert!(Command::parse("break").is_err());
        assert!(Command::parse("backtrace fulll").is_err());
        assert!(Command::parse("frobnicate").is_err());
    }
}
