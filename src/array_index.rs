//! Array-element self-identification
//!
//! A worker started as one element of an LSF or SLURM job array finds out
//! which slice of work it owns from scheduler environment variables. The
//! index is zero-based and must be applied to the same deterministic
//! ordering that was used when the array was submitted.

use crate::env::EnvironmentView;
use tracing::warn;

pub const LSF_INDEX_VAR: &str = "LSB_JOBINDEX";
pub const SLURM_TASK_ID_VAR: &str = "SLURM_ARRAY_TASK_ID";
pub const SLURM_TASK_MIN_VAR: &str = "SLURM_ARRAY_TASK_MIN";

/// Zero-based array slot of this process, or `None` when not an array element.
///
/// - LSF: `LSB_JOBINDEX` of `0` means "not an array"; otherwise the value minus one.
/// - SLURM: `SLURM_ARRAY_TASK_ID - SLURM_ARRAY_TASK_MIN`.
///
/// Unparseable or inconsistent values are logged and treated as no index.
pub fn detect_array_index<E: EnvironmentView + ?Sized>(env: &E) -> Option<u32> {
    if let Some(raw) = env.var(LSF_INDEX_VAR) {
        let value = parse_var(LSF_INDEX_VAR, &raw)?;
        return value.checked_sub(1);
    }

    let task_id = env.var(SLURM_TASK_ID_VAR)?;
    let task_min = env.var(SLURM_TASK_MIN_VAR)?;
    let task_id = parse_var(SLURM_TASK_ID_VAR, &task_id)?;
    let task_min = parse_var(SLURM_TASK_MIN_VAR, &task_min)?;

    let index = task_id.checked_sub(task_min);
    if index.is_none() {
        warn!(
            "{}={} is below {}={}, ignoring array index",
            SLURM_TASK_ID_VAR, task_id, SLURM_TASK_MIN_VAR, task_min
        );
    }
    index
}

/// Raw scheduler element id (`LSB_JOBINDEX` or `SLURM_ARRAY_TASK_ID`).
///
/// Unit arrays are submitted in well numbers, so for a well worker this is
/// the well it owns.
pub fn detect_array_task_id<E: EnvironmentView + ?Sized>(env: &E) -> Option<u32> {
    if let Some(raw) = env.var(LSF_INDEX_VAR) {
        return parse_var(LSF_INDEX_VAR, &raw).filter(|id| *id != 0);
    }
    env.var(SLURM_TASK_ID_VAR)
        .and_then(|raw| parse_var(SLURM_TASK_ID_VAR, &raw))
}

/// Pick the item owned by `index` from an already-ordered work list.
pub fn select<T>(items: &[T], index: u32) -> Option<&T> {
    items.get(index as usize)
}

fn parse_var(name: &str, raw: &str) -> Option<u32> {
    match raw.trim().parse::<u32>() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Ignoring {}={:?}: {}", name, raw, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MockEnv;

    #[test]
    fn test_no_scheduler_variables() {
        assert_eq!(detect_array_index(&MockEnv::new()), None);
        assert_eq!(detect_array_task_id(&MockEnv::new()), None);
    }

    #[test]
    fn test_lsf_zero_is_not_an_array() {
        let env = MockEnv::new().with_var(LSF_INDEX_VAR, "0");
        assert_eq!(detect_array_index(&env), None);
        assert_eq!(detect_array_task_id(&env), None);
    }

    #[test]
    fn test_lsf_index_is_one_based() {
        let env = MockEnv::new().with_var(LSF_INDEX_VAR, "1");
        assert_eq!(detect_array_index(&env), Some(0));

        let env = MockEnv::new().with_var(LSF_INDEX_VAR, "12");
        assert_eq!(detect_array_index(&env), Some(11));
        assert_eq!(detect_array_task_id(&env), Some(12));
    }

    #[test]
    fn test_slurm_offset_from_minimum() {
        let env = MockEnv::new()
            .with_var(SLURM_TASK_ID_VAR, "5")
            .with_var(SLURM_TASK_MIN_VAR, "2");
        assert_eq!(detect_array_index(&env), Some(3));
        assert_eq!(detect_array_task_id(&env), Some(5));
    }

    #[test]
    fn test_slurm_requires_minimum() {
        let env = MockEnv::new().with_var(SLURM_TASK_ID_VAR, "5");
        assert_eq!(detect_array_index(&env), None);
    }

    #[test]
    fn test_slurm_task_below_minimum() {
        let env = MockEnv::new()
            .with_var(SLURM_TASK_ID_VAR, "1")
            .with_var(SLURM_TASK_MIN_VAR, "2");
        assert_eq!(detect_array_index(&env), None);
    }

    #[test]
    fn test_lsf_takes_precedence() {
        let env = MockEnv::new()
            .with_var(LSF_INDEX_VAR, "3")
            .with_var(SLURM_TASK_ID_VAR, "9")
            .with_var(SLURM_TASK_MIN_VAR, "1");
        assert_eq!(detect_array_index(&env), Some(2));
    }

    #[test]
    fn test_garbage_values_are_ignored() {
        let env = MockEnv::new().with_var(LSF_INDEX_VAR, "abc");
        assert_eq!(detect_array_index(&env), None);
    }

    #[test]
    fn test_select() {
        let dirs = ["a", "b", "c"];
        assert_eq!(select(&dirs, 1), Some(&"b"));
        assert_eq!(select(&dirs, 3), None);
    }
}
