//! Converts hook panics into reported errors at the walk boundary.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use kanon_core::{rule_names, Direction, Location, ValidationError, ValidationErrors};
use tracing::error;

/// Runs `walk`, turning a panic into a single `panic` error for `location`.
pub(crate) fn catch_panics<T>(
    direction: Direction,
    location: Location,
    walk: impl FnOnce() -> Result<T, ValidationErrors>,
) -> Result<T, ValidationErrors> {
    match panic::catch_unwind(AssertUnwindSafe(walk)) {
        Ok(result) => result,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!(%direction, %location, panic = %message, "walk hook panicked");
            Err(ValidationError::new(
                direction,
                location,
                "",
                rule_names::PANIC,
                format!("hook panicked: {message}"),
            )
            .into())
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_becomes_error() {
        let result: Result<(), _> = catch_panics(Direction::Request, Location::Body, || {
            panic!("decode hook exploded")
        });
        let errors = result.unwrap_err();
        assert!(errors.has_rule(rule_names::PANIC));
        assert!(errors.to_string().contains("decode hook exploded"));
    }

    #[test]
    fn test_results_pass_through() {
        let result = catch_panics(Direction::Response, Location::Header, || Ok(7));
        assert_eq!(result.unwrap(), 7);
    }
}
