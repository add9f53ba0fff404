//! Error handling utilities

use tracing::error;

/// Handle fatal errors and exit with appropriate status code
///
/// - For `DispatchError`: shows the user message, and the full source chain
///   in verbose mode
/// - For other errors: shows the error message and exits with 1
pub fn handle_fatal_error(error: anyhow::Error, verbose: u8) -> ! {
    std::process::exit(report_fatal_error(&error, verbose))
}

/// Print `error` and return the exit code it maps to.
pub fn report_fatal_error(error: &anyhow::Error, verbose: u8) -> i32 {
    use crate::error::DispatchError;

    error!("Fatal error: {}", error);

    if let Some(dispatch_err) = error.downcast_ref::<DispatchError>() {
        eprintln!("{}", dispatch_err.user_message());

        if verbose >= 1 {
            eprintln!("\nContext Chain:\n{}", dispatch_err.developer_message());
        }

        dispatch_err.exit_code()
    } else {
        eprintln!("Error: {error}");

        if verbose >= 1 {
            eprintln!("\nError chain:");
            for (i, cause) in error.chain().enumerate() {
                eprintln!("  {}: {}", i, cause);
            }
        }

        1
    }
}
