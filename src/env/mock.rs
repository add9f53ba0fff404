//! In-memory environment for tests

use super::traits::EnvironmentView;
use std::collections::HashMap;

/// Mock environment holding a fixed set of variables
///
/// # Examples
///
/// ```
/// use medaka_dispatch::env::{EnvironmentView, MockEnv};
///
/// let env = MockEnv::new().with_var("LSB_JOBINDEX", "4");
/// assert_eq!(env.var("LSB_JOBINDEX").as_deref(), Some("4"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockEnv {
    vars: HashMap<String, String>,
}

impl MockEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) {
        self.vars.remove(key);
    }
}

impl EnvironmentView for MockEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_remove() {
        let mut env = MockEnv::new();
        env.set("SLURM_ARRAY_TASK_MIN", "1");
        assert!(env.contains("SLURM_ARRAY_TASK_MIN"));
        env.remove("SLURM_ARRAY_TASK_MIN");
        assert!(!env.contains("SLURM_ARRAY_TASK_MIN"));
    }
}
