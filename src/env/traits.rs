//! Environment trait definitions

/// Read-only view over environment variables
///
/// # Examples
///
/// ```
/// use medaka_dispatch::env::EnvironmentView;
///
/// fn scheduler_name<E: EnvironmentView + ?Sized>(env: &E) -> &'static str {
///     if env.var("LSB_JOBID").is_some() {
///         "lsf"
///     } else if env.var("SLURM_JOB_ID").is_some() {
///         "slurm"
///     } else {
///         "local"
///     }
/// }
/// ```
pub trait EnvironmentView: Send + Sync {
    /// Value of `key`, or `None` when unset or not valid unicode
    fn var(&self, key: &str) -> Option<String>;

    /// Whether `key` is set at all
    fn contains(&self, key: &str) -> bool {
        self.var(key).is_some()
    }
}
