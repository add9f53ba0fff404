//! `plan`: show what a run would dispatch

use super::filters_from_args;
use crate::cli::args::SweepArgs;
use crate::error::{DispatchError, Result};
use crate::experiment::{DirectoryResolver, ExperimentDescriptor};
use crate::plan::{CombinationPlanner, Filters};
use serde_json::{json, Value};
use tracing::warn;

pub fn execute(sweep: SweepArgs) -> anyhow::Result<()> {
    let filters = filters_from_args(&sweep)?;
    let plans = plan_directories(&sweep.indir, &sweep.outdir, &filters)?;
    let rendered = serde_json::to_string_pretty(&plans).map_err(DispatchError::from)?;
    println!("{}", rendered);
    Ok(())
}

/// One JSON entry per resolved directory, in dispatch order.
///
/// A directory whose frames cannot be read is reported with an `error`
/// field; filters that leave nothing to analyse fail the whole plan.
pub fn plan_directories(indir: &str, outdir: &std::path::Path, filters: &Filters) -> Result<Value> {
    let dirs = DirectoryResolver::new().resolve(indir)?;
    let planner = CombinationPlanner::new();
    let mut entries = Vec::with_capacity(dirs.len());

    for (index, dir) in dirs.iter().enumerate() {
        let output_root = dir.output_root(outdir);
        let entry = match ExperimentDescriptor::scan(&dir.path) {
            Ok(descriptor) => {
                let plan = planner.plan(&dir.path, &descriptor, filters)?;
                json!({
                    "array_index": index,
                    "directory": dir,
                    "output_root": output_root,
                    "descriptor": descriptor,
                    "plan": plan,
                })
            }
            Err(e) => {
                warn!("Cannot describe {}: {}", dir.path.display(), e);
                json!({
                    "array_index": index,
                    "directory": dir,
                    "output_root": output_root,
                    "error": e.user_message(),
                })
            }
        };
        entries.push(entry);
    }

    Ok(Value::Array(entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiment::descriptor::fixtures::write_frames;
    use std::path::Path;
    use tempfile::TempDir;

    #[test]
    fn test_plan_json_shape() {
        let tmp = TempDir::new().unwrap();
        write_frames(&tmp.path().join("plate"), &[1, 2, 3, 4], &[1, 2], &[4, 6]);

        let filters = Filters::new().with_channels(["CO6"]);
        let value = plan_directories(tmp.path().to_str().unwrap(), Path::new("/out"), &filters).unwrap();

        let entry = &value[0];
        assert_eq!(entry["array_index"], 0);
        assert_eq!(entry["directory"]["experiment_id"], "plate");
        assert_eq!(entry["output_root"], "/out/plate");
        assert_eq!(entry["plan"]["well_array"], "1-4");
        let units = entry["plan"]["units"].as_array().unwrap();
        assert_eq!(units.len(), 2);
        assert_eq!(units[0]["channel"], "CO6");
        assert_eq!(units[0]["loop"], "LO001");
        assert_eq!(entry["descriptor"]["video_count"], 16);
    }
}
