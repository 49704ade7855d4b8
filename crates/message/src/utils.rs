//! Utility macros and functions shared by the codec and protocol modules.

/// Returns early with the given error if the predicate does not hold.
///
/// This is similar to `assert!`, but returns an error instead of panicking.
///
/// # Example
///
/// ```ignore
/// ensure!(status_allows_body(code), SendError::body_forbidden(code));
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;
