use super::wells::WellRange;
use crate::error::Result;
use serde::Serialize;
use std::collections::BTreeSet;

/// User restrictions on what to analyse. Empty sets mean "everything found".
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Filters {
    pub channels: BTreeSet<String>,
    pub loops: BTreeSet<String>,
    #[serde(skip)]
    pub wells: Option<WellRange>,
}

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts `CO6` or bare `6`.
    pub fn with_channels<I, S>(mut self, channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.channels = channels
            .into_iter()
            .filter_map(|c| normalize_token(c.as_ref(), "CO", 0))
            .collect();
        self
    }

    /// Accepts `LO001` or bare `1`.
    pub fn with_loops<I, S>(mut self, loops: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.loops = loops
            .into_iter()
            .filter_map(|l| normalize_token(l.as_ref(), "LO", 3))
            .collect();
        self
    }

    pub fn with_well_expr(mut self, expr: Option<&str>) -> Result<Self> {
        self.wells = expr.map(str::parse).transpose()?;
        Ok(self)
    }
}

/// Intersect `filter` with `discovered`; an empty filter keeps everything.
/// The result is sorted ascending.
pub fn apply_filter(filter: &BTreeSet<String>, discovered: &BTreeSet<String>) -> Vec<String> {
    if filter.is_empty() {
        discovered.iter().cloned().collect()
    } else {
        filter.intersection(discovered).cloned().collect()
    }
}

fn normalize_token(raw: &str, prefix: &str, width: usize) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if raw.chars().all(|c| c.is_ascii_digit()) {
        Some(format!("{}{:0>width$}", prefix, raw, width = width))
    } else {
        Some(raw.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_normalizes_bare_numbers() {
        let filters = Filters::new()
            .with_channels(["6", "CO4", " "])
            .with_loops(["1", "LO002"]);
        assert_eq!(filters.channels, set(&["CO4", "CO6"]));
        assert_eq!(filters.loops, set(&["LO001", "LO002"]));
    }

    #[test]
    fn test_well_expression() {
        let filters = Filters::new().with_well_expr(Some("[3-12]")).unwrap();
        assert_eq!(filters.wells, Some(WellRange { start: 3, end: 12 }));
        assert!(Filters::new().with_well_expr(Some("[x]")).is_err());
        assert!(Filters::new().with_well_expr(None).unwrap().wells.is_none());
    }

    #[test]
    fn test_apply_filter() {
        let discovered = set(&["CO4", "CO6"]);
        assert_eq!(apply_filter(&BTreeSet::new(), &discovered), vec!["CO4", "CO6"]);
        assert_eq!(apply_filter(&set(&["CO6", "CO9"]), &discovered), vec!["CO6"]);
        assert!(apply_filter(&set(&["CO9"]), &discovered).is_empty());
    }
}
