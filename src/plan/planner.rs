//! Expands the (channel, loop) sweep for one experiment directory.

use super::filters::{apply_filter, Filters};
use super::wells::{resolve_well_array, WellArray};
use crate::error::{common, Result};
use crate::experiment::ExperimentDescriptor;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

/// One (channel, loop) combination submitted over a well array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisUnit {
    pub channel: String,
    #[serde(rename = "loop")]
    pub loop_id: String,
    pub well_array: WellArray,
}

impl AnalysisUnit {
    /// `<loop>_<channel>`, used in job names and log file names.
    pub fn label(&self) -> String {
        format!("{}_{}", self.loop_id, self.channel)
    }
}

/// Planned sweep for one directory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plan {
    pub channels: Vec<String>,
    pub loops: Vec<String>,
    pub well_array: WellArray,
    pub units: Vec<AnalysisUnit>,
}

#[derive(Debug, Default)]
pub struct CombinationPlanner;

impl CombinationPlanner {
    pub fn new() -> Self {
        Self
    }

    /// Cross product of filtered channels x filtered loops, channel-major.
    ///
    /// An empty channel or loop set after filtering is a configuration error
    /// rather than an empty sweep.
    pub fn plan(
        &self,
        directory: &Path,
        descriptor: &ExperimentDescriptor,
        filters: &Filters,
    ) -> Result<Plan> {
        let channels = apply_filter(&filters.channels, &descriptor.channels);
        let loops = apply_filter(&filters.loops, &descriptor.loops);

        info!(
            "Channels: {} | Loops: {}",
            channels.join(", "),
            loops.join(", ")
        );

        if channels.is_empty() || loops.is_empty() {
            return Err(common::no_combinations(directory));
        }

        let well_array = resolve_well_array(filters.wells.as_ref(), &descriptor.well_numbers())?;

        let units: Vec<AnalysisUnit> = channels
            .iter()
            .flat_map(|channel| {
                loops.iter().map(|loop_id| AnalysisUnit {
                    channel: channel.clone(),
                    loop_id: loop_id.clone(),
                    well_array: well_array.clone(),
                })
            })
            .collect();

        info!(
            "Planned {} analysis unit(s) over wells {}",
            units.len(),
            well_array
        );
        for unit in &units {
            debug!("  {}", unit.label());
        }

        Ok(Plan {
            channels,
            loops,
            well_array,
            units,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::experiment::{well_id, FrameKey};
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn descriptor(channels: &[&str], loops: &[&str], wells: impl IntoIterator<Item = u32>) -> ExperimentDescriptor {
        let wells: Vec<u32> = wells.into_iter().collect();
        let mut keys = Vec::new();
        for c in channels {
            for l in loops {
                for w in &wells {
                    keys.push(FrameKey {
                        well: well_id(*w),
                        loop_id: l.to_string(),
                        channel: c.to_string(),
                    });
                }
            }
        }
        ExperimentDescriptor::from_keys(keys)
    }

    #[test]
    fn test_single_channel_filter() {
        let desc = descriptor(&["A", "B"], &["1", "2"], 1..=20);
        let filters = Filters {
            channels: ["A".to_string()].into_iter().collect(),
            ..Default::default()
        };

        let plan = CombinationPlanner::new()
            .plan(Path::new("/plate"), &desc, &filters)
            .unwrap();

        let pairs: Vec<_> = plan
            .units
            .iter()
            .map(|u| (u.channel.as_str(), u.loop_id.as_str()))
            .collect();
        assert_eq!(pairs, vec![("A", "1"), ("A", "2")]);
        assert_eq!(plan.well_array.to_string(), "1-20");
        assert!(plan.units.iter().all(|u| u.well_array == plan.well_array));
    }

    #[test]
    fn test_units_are_sorted() {
        let desc = descriptor(&["CO6", "CO4"], &["LO002", "LO001"], 1..=2);
        let plan = CombinationPlanner::new()
            .plan(Path::new("/plate"), &desc, &Filters::default())
            .unwrap();
        let labels: Vec<_> = plan.units.iter().map(AnalysisUnit::label).collect();
        assert_eq!(
            labels,
            vec!["LO001_CO4", "LO002_CO4", "LO001_CO6", "LO002_CO6"]
        );
    }

    #[test]
    fn test_no_matching_channel_is_error() {
        let desc = descriptor(&["CO6"], &["LO001"], 1..=4);
        let filters = Filters::new().with_channels(["CO9"]);
        let err = CombinationPlanner::new()
            .plan(Path::new("/plate"), &desc, &filters)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::CONFIG_NO_COMBINATIONS);
    }

    #[test]
    fn test_well_filter_is_clamped() {
        let desc = descriptor(&["CO6"], &["LO001"], 5..=30);
        let filters = Filters::new().with_well_expr(Some("[1-96]")).unwrap();
        let plan = CombinationPlanner::new()
            .plan(Path::new("/plate"), &desc, &filters)
            .unwrap();
        assert_eq!(plan.well_array.to_string(), "5-30");
    }

    proptest! {
        #[test]
        fn prop_unit_count_is_product_of_intersections(
            channel_filter in prop::collection::btree_set("CO[1-6]", 0..4),
            loop_filter in prop::collection::btree_set("LO00[1-5]", 0..4),
        ) {
            let desc = descriptor(&["CO1", "CO2", "CO3"], &["LO001", "LO002", "LO003"], 1..=3);
            let filters = Filters {
                channels: channel_filter.clone(),
                loops: loop_filter.clone(),
                wells: None,
            };

            let expected_channels = if channel_filter.is_empty() {
                desc.channels.len()
            } else {
                channel_filter.intersection(&desc.channels).count()
            };
            let expected_loops = if loop_filter.is_empty() {
                desc.loops.len()
            } else {
                loop_filter.intersection(&desc.loops).count()
            };

            let result = CombinationPlanner::new().plan(Path::new("/plate"), &desc, &filters);
            if expected_channels == 0 || expected_loops == 0 {
                prop_assert!(result.unwrap_err().is_configuration());
            } else {
                let plan = result.unwrap();
                prop_assert_eq!(plan.units.len(), expected_channels * expected_loops);
                let distinct: BTreeSet<_> = plan.units.iter().map(AnalysisUnit::label).collect();
                prop_assert_eq!(distinct.len(), plan.units.len());
            }
        }
    }
}
