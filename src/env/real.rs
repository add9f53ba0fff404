//! Real environment backed by the current process

use super::traits::EnvironmentView;

/// Delegates to `std::env::var`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl ProcessEnvironment {
    pub fn new() -> Self {
        Self
    }
}

impl EnvironmentView for ProcessEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_path() {
        let env = ProcessEnvironment::new();
        assert_eq!(env.var("PATH"), std::env::var("PATH").ok());
        assert!(!env.contains("MEDAKA_DISPATCH_SURELY_UNSET_VARIABLE"));
    }
}
