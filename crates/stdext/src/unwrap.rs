//
// unwrap.rs
//
// Copyright (C) 2026 Posit Software, PBC. All rights reserved.
//
//

/// Unwraps a `Result` or `Option`, running the fallback arm on failure.
///
/// The fallback arm can produce a substitute value, or diverge (`return`,
/// `continue`, `break`) to leave the surrounding scope.
///
/// # Examples
///
/// ```
/// #[macro_use] extern crate stdext;
/// # fn main() {
/// let value: Result<i32, String> = Err(String::from("boom"));
/// let value = unwrap!(value, Err(_err) => { -1 });
/// assert_eq!(value, -1);
/// # }
/// ```
#[macro_export]
macro_rules! unwrap {
    ($value:expr, Err($error:ident) => $fallback:block) => {
        match $value {
            Ok(value) => value,
            Err($error) => $fallback,
        }
    };

    ($value:expr, None => $fallback:block) => {
        match $value {
            Some(value) => value,
            None => $fallback,
        }
    };
}

#[cfg(test)]
mod tests {

    #[test]
    fn test_unwrap_result() {
        let value: Result<i32, String> = Ok(1);
        let value = unwrap!(value, Err(_error) => { 0 });
        assert_eq!(value, 1);
    }

    #[test]
    fn test_unwrap_option_fallback() {
        let value: Option<i32> = None;
        let value = unwrap!(value, None => { 7 });
        assert_eq!(value, 7);
    }
}
