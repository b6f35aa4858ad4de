//
// variable.rs
//
// Copyright (C) 2026 Posit Software, PBC. All rights reserved.
//
// Lookup of global Lisp variables by name, for when a name is not a C-level
// variable of the selected frame. Goes through the evaluator's own interning
// machinery: build the name string in the inferior, find the symbol in the
// default obarray, then read its value slot.
//

use crate::error::Result;
use crate::host::Host;
use crate::host::RawValue;
use crate::value::LispValue;

const DEFAULT_OBARRAY: &str = "globals.f_Vobarray";

/// Resolves the Lisp variable `name` and decodes its current value.
pub fn global_value(host: &dyn Host, name: &str) -> Result<LispValue> {
    log::trace!("resolving Lisp variable '{name}'");

    let symbol = lookup(host, name, DEFAULT_OBARRAY)?;
    let value = host.parse_and_eval(&format!("find_symbol_value({symbol})"))?;
    LispValue::decode(host, value)
}

/// Finds the symbol named `name` in `obarray`.
fn lookup(host: &dyn Host, name: &str, obarray: &str) -> Result<RawValue> {
    let name = stringify(host, name)?;
    host.parse_and_eval(&format!(
        "oblookup({obarray}, SSDATA({name}), SCHARS({name}), SBYTES({name}))"
    ))
}

/// Builds `contents` as a Lisp string in the inferior.
fn stringify(host: &dyn Host, contents: &str) -> Result<RawValue> {
    host.parse_and_eval(&format!(
        "make_multibyte_string(\"{contents}\", {len}, (sizeof \"{contents}\") - 1)",
        len = contents.chars().count()
    ))
}
