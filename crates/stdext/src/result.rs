//
// result.rs
//
// Copyright (C) 2026 Posit Software, PBC. All rights reserved.
//
//

/// Extension methods for results whose errors are logged and discarded at
/// the call site rather than propagated.
pub trait ResultExt<T> {
    /// Logs the error at `error` level and converts to an `Option`.
    fn log_err(self) -> Option<T>;

    /// Logs the error at `warn` level and converts to an `Option`.
    fn warn_on_err(self) -> Option<T>;

    fn log_with_level(self, level: log::Level) -> Option<T>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: std::fmt::Debug,
{
    #[track_caller]
    fn log_err(self) -> Option<T> {
        self.log_with_level(log::Level::Error)
    }

    #[track_caller]
    fn warn_on_err(self) -> Option<T> {
        self.log_with_level(log::Level::Warn)
    }

    #[track_caller]
    fn log_with_level(self, level: log::Level) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                // Mention the caller location in the message itself: error
                // objects can carry long payloads and the file/line shown by
                // the logger is easy to lose at the bottom of them.
                let location = std::panic::Location::caller();
                log::log!(
                    level,
                    "at {}:{}: {error:?}",
                    location.file(),
                    location.line()
                );
                None
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_err_preserves_ok() {
        let value: Result<i32, String> = Ok(42);
        assert_eq!(value.log_err(), Some(42));
    }

    #[test]
    fn test_log_err_discards_err() {
        let value: Result<i32, String> = Err(String::from("boom"));
        assert_eq!(value.log_err(), None);
    }

    #[test]
    fn test_warn_on_err_discards_err() {
        let value: Result<(), &str> = Err("boom");
        assert_eq!(value.warn_on_err(), None);
    }
}
