/// Error code registry for medaka-dispatch
///
/// Error codes are organized by category:
/// - 1000-1999: Configuration errors (no resolvable work, bad config values)
/// - 3000-3999: Storage errors
/// - 4000-4999: Execution errors (local launches and worker exits)
/// - 6000-6999: Scheduler errors
/// - 9000-9999: Other errors
pub struct ErrorCode;

impl ErrorCode {
    // Configuration errors (1000-1999)
    pub const CONFIG_GENERIC: u16 = 1000;
    pub const CONFIG_NOT_FOUND: u16 = 1001;
    pub const CONFIG_INVALID_TOML: u16 = 1002;
    pub const CONFIG_INVALID_VALUE: u16 = 1005;
    pub const CONFIG_NO_DIRECTORIES: u16 = 1010;
    pub const CONFIG_NO_COMBINATIONS: u16 = 1011;
    pub const CONFIG_NO_WELLS: u16 = 1012;
    pub const CONFIG_INVALID_WELL_RANGE: u16 = 1013;
    pub const CONFIG_INDEX_OUT_OF_RANGE: u16 = 1014;

    // Storage errors (3000-3999)
    pub const STORAGE_GENERIC: u16 = 3000;
    pub const STORAGE_IO_ERROR: u16 = 3001;
    pub const STORAGE_PERMISSION_DENIED: u16 = 3002;
    pub const STORAGE_NOT_FOUND: u16 = 3004;

    // Execution errors (4000-4999)
    pub const EXEC_GENERIC: u16 = 4000;
    pub const EXEC_COMMAND_NOT_FOUND: u16 = 4001;
    pub const EXEC_SUBPROCESS_FAILED: u16 = 4003;
    pub const EXEC_SIGNAL_RECEIVED: u16 = 4005;
    pub const EXEC_SPAWN_FAILED: u16 = 4007;
    pub const EXEC_OUTPUT_ERROR: u16 = 4008;

    // Scheduler errors (6000-6999)
    pub const SCHED_SUBMIT_FAILED: u16 = 6001;
    pub const SCHED_NO_JOB_ID: u16 = 6002;

    // Other errors (9000-9999)
    pub const OTHER_GENERIC: u16 = 9000;
}

/// Get a human-readable description for an error code
pub fn describe_error_code(code: u16) -> &'static str {
    match code {
        ErrorCode::CONFIG_GENERIC => "General configuration error",
        ErrorCode::CONFIG_NOT_FOUND => "Configuration file not found",
        ErrorCode::CONFIG_INVALID_TOML => "Invalid TOML in configuration file",
        ErrorCode::CONFIG_INVALID_VALUE => "Invalid configuration value",
        ErrorCode::CONFIG_NO_DIRECTORIES => "No experiment directories resolved",
        ErrorCode::CONFIG_NO_COMBINATIONS => "No loops or channels were found",
        ErrorCode::CONFIG_NO_WELLS => "None of the requested wells exist",
        ErrorCode::CONFIG_INVALID_WELL_RANGE => "Malformed well range expression",
        ErrorCode::CONFIG_INDEX_OUT_OF_RANGE => "Array index outside the resolved work list",

        ErrorCode::STORAGE_GENERIC => "General storage error",
        ErrorCode::STORAGE_IO_ERROR => "I/O operation failed",
        ErrorCode::STORAGE_PERMISSION_DENIED => "Permission denied",
        ErrorCode::STORAGE_NOT_FOUND => "File or directory not found",

        ErrorCode::EXEC_GENERIC => "General execution error",
        ErrorCode::EXEC_COMMAND_NOT_FOUND => "Command not found",
        ErrorCode::EXEC_SUBPROCESS_FAILED => "Subprocess exited with a failure status",
        ErrorCode::EXEC_SIGNAL_RECEIVED => "Subprocess terminated by a signal",
        ErrorCode::EXEC_SPAWN_FAILED => "Failed to spawn subprocess",
        ErrorCode::EXEC_OUTPUT_ERROR => "Failed to capture subprocess output",

        ErrorCode::SCHED_SUBMIT_FAILED => "Scheduler rejected the submission",
        ErrorCode::SCHED_NO_JOB_ID => "No job id found in scheduler output",

        _ => "Unknown error",
    }
}
