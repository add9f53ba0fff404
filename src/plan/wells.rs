//! Well range parsing and array-expression resolution.

use crate::error::{DispatchError, ErrorCode, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

static RANGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[?\s*(\d+)\s*(?:-\s*(\d+)\s*)?\]?$").expect("Valid regex pattern")
});

/// Inclusive well range requested by the user, written `[a-b]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WellRange {
    pub start: u32,
    pub end: u32,
}

impl WellRange {
    pub fn new(start: u32, end: u32) -> Result<Self> {
        if start > end {
            return Err(invalid_range(format!("[{}-{}]", start, end)));
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, well: u32) -> bool {
        (self.start..=self.end).contains(&well)
    }
}

impl FromStr for WellRange {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self> {
        let caps = RANGE_RE
            .captures(s.trim())
            .ok_or_else(|| invalid_range(s))?;
        let start: u32 = caps[1].parse().map_err(|_| invalid_range(s))?;
        let end: u32 = match caps.get(2) {
            Some(m) => m.as_str().parse().map_err(|_| invalid_range(s))?,
            None => start,
        };
        Self::new(start, end)
    }
}

impl fmt::Display for WellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}-{}]", self.start, self.end)
    }
}

/// Wells submitted as one scheduler array, always a subset of the wells on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WellArray {
    /// Contiguous inclusive span, rendered `a-b`.
    Range { start: u32, end: u32 },
    /// Non-contiguous wells, rendered `a,b,c`.
    List(Vec<u32>),
}

impl WellArray {
    /// Smallest expression covering exactly `wells`; `None` when empty.
    pub fn from_wells(wells: &BTreeSet<u32>) -> Option<Self> {
        let start = *wells.first()?;
        let end = *wells.last()?;
        if (end - start) as usize + 1 == wells.len() {
            Some(Self::Range { start, end })
        } else {
            Some(Self::List(wells.iter().copied().collect()))
        }
    }

    /// LSF wants the expression bracketed after the job name.
    pub fn lsf_expr(&self) -> String {
        format!("[{}]", self)
    }

    /// `[min-max]`, the only form the worker scripts parse. A list keeps
    /// its holes in the scheduler array but not here.
    pub fn worker_expr(&self) -> String {
        match self {
            Self::Range { start, end } => format!("[{}-{}]", start, end),
            Self::List(wells) => {
                let start = wells.first().copied().unwrap_or_default();
                let end = wells.last().copied().unwrap_or(start);
                format!("[{}-{}]", start, end)
            }
        }
    }

    pub fn slurm_expr(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for WellArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Range { start, end } => write!(f, "{}-{}", start, end),
            Self::List(wells) => {
                let parts: Vec<String> = wells.iter().map(u32::to_string).collect();
                write!(f, "{}", parts.join(","))
            }
        }
    }
}

impl Serialize for WellArray {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// Resolve the array expression for `requested` against the wells on disk.
///
/// Without a request the discovered min..max span is used. Otherwise the
/// result covers the intersection of the request with the wells on disk.
pub fn resolve_well_array(
    requested: Option<&WellRange>,
    discovered: &BTreeSet<u32>,
) -> Result<WellArray> {
    let (Some(&min), Some(&max)) = (discovered.first(), discovered.last()) else {
        return Err(DispatchError::configuration_with_code(
            ErrorCode::CONFIG_NO_WELLS,
            "No wells were found",
        ));
    };

    let requested = requested.copied().unwrap_or(WellRange { start: min, end: max });

    // Walk only the discovered wells; the requested span may be huge.
    let intersection: BTreeSet<u32> = discovered
        .range(requested.start..=requested.end)
        .copied()
        .collect();
    WellArray::from_wells(&intersection).ok_or_else(|| {
        DispatchError::configuration_with_code(
            ErrorCode::CONFIG_NO_WELLS,
            format!("None of the requested wells {} were found", requested),
        )
    })
}

fn invalid_range(raw: impl fmt::Display) -> DispatchError {
    DispatchError::configuration_with_code(
        ErrorCode::CONFIG_INVALID_WELL_RANGE,
        format!("Well range must look like [a-b], got '{}'", raw),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn set(wells: impl IntoIterator<Item = u32>) -> BTreeSet<u32> {
        wells.into_iter().collect()
    }

    fn members(array: &WellArray) -> BTreeSet<u32> {
        match array {
            WellArray::Range { start, end } => (*start..=*end).collect(),
            WellArray::List(wells) => wells.iter().copied().collect(),
        }
    }

    #[test]
    fn test_parse_range() {
        assert_eq!("[1-96]".parse::<WellRange>().unwrap(), WellRange { start: 1, end: 96 });
        assert_eq!("3-12".parse::<WellRange>().unwrap(), WellRange { start: 3, end: 12 });
        assert_eq!("[ 5 ]".parse::<WellRange>().unwrap(), WellRange { start: 5, end: 5 });
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for raw in ["", "[a-b]", "[12-3]", "1-2-3", "[1,2]"] {
            let err = raw.parse::<WellRange>().unwrap_err();
            assert_eq!(err.code(), ErrorCode::CONFIG_INVALID_WELL_RANGE, "{raw}");
        }
    }

    #[test]
    fn test_absent_request_uses_discovered_span() {
        let array = resolve_well_array(None, &set(1..=20)).unwrap();
        assert_eq!(array.to_string(), "1-20");
    }

    #[test]
    fn test_request_is_clamped_to_disk() {
        let range = WellRange::new(1, 96).unwrap();
        let array = resolve_well_array(Some(&range), &set(5..=40)).unwrap();
        assert_eq!(array, WellArray::Range { start: 5, end: 40 });
    }

    #[test]
    fn test_holes_become_explicit_list() {
        let range = WellRange::new(1, 10).unwrap();
        let array = resolve_well_array(Some(&range), &set([2, 3, 7])).unwrap();
        assert_eq!(array.to_string(), "2,3,7");
        assert_eq!(array.lsf_expr(), "[2,3,7]");
        assert_eq!(members(&array), set([2, 3, 7]));
    }

    #[test]
    fn test_huge_request_is_not_materialized() {
        let range: WellRange = "[1-4000000000]".parse().unwrap();
        let array = resolve_well_array(Some(&range), &set([1, 2, 3])).unwrap();
        assert_eq!(array, WellArray::Range { start: 1, end: 3 });
        assert!(range.contains(3_999_999_999));
        assert!(!range.contains(0));
    }

    #[test]
    fn test_worker_expr_is_bracketed_span() {
        assert_eq!(WellArray::Range { start: 5, end: 30 }.worker_expr(), "[5-30]");
        assert_eq!(WellArray::List(vec![2, 3, 7]).worker_expr(), "[2-7]");
    }

    #[test]
    fn test_disjoint_request_is_an_error() {
        let range = WellRange::new(50, 60).unwrap();
        let err = resolve_well_array(Some(&range), &set(1..=20)).unwrap_err();
        assert_eq!(err.code(), ErrorCode::CONFIG_NO_WELLS);
    }

    #[test]
    fn test_no_wells_on_disk() {
        assert!(resolve_well_array(None, &BTreeSet::new()).is_err());
    }

    #[test]
    fn test_expressions() {
        let array = WellArray::Range { start: 3, end: 12 };
        assert_eq!(array.lsf_expr(), "[3-12]");
        assert_eq!(array.slurm_expr(), "3-12");
        assert_eq!(members(&array).len(), 10);
    }

    proptest! {
        #[test]
        fn prop_resolution_is_idempotent_when_covered(start in 1u32..60, len in 0u32..40) {
            let end = start + len;
            let discovered = set(start..=end);
            let range: WellRange = format!("[{}-{}]", start, end).parse().unwrap();
            let array = resolve_well_array(Some(&range), &discovered).unwrap();
            prop_assert_eq!(array.to_string(), format!("{}-{}", start, end));

            let again = resolve_well_array(None, &members(&array)).unwrap();
            prop_assert_eq!(again, array);
        }

        #[test]
        fn prop_resolved_wells_exist_on_disk(
            discovered in prop::collection::btree_set(1u32..97, 1..40),
            start in 1u32..97,
            len in 0u32..96,
        ) {
            let range = WellRange::new(start, start + len).unwrap();
            if let Ok(array) = resolve_well_array(Some(&range), &discovered) {
                for well in members(&array) {
                    prop_assert!(discovered.contains(&well));
                    prop_assert!(range.contains(well));
                }
            }
        }
    }
}
