//! `resolve-index`: work owned by one array element

use crate::array_index::{detect_array_index, detect_array_task_id, select};
use crate::cli::args::ResolveIndexArgs;
use crate::env::{EnvironmentView, ProcessEnvironment};
use crate::error::{DispatchError, ErrorCode, Result};
use crate::experiment::{well_id, DirectoryResolver};
use crate::plan::WellRange;
use std::path::PathBuf;
use tracing::debug;

/// Prints nothing when this process is not an array element.
pub fn execute(args: ResolveIndexArgs) -> anyhow::Result<()> {
    let env = ProcessEnvironment::new();

    let owned = match (&args.indir, &args.wells) {
        (Some(indir), _) => resolve_directory(indir, &env)?.map(|p| p.display().to_string()),
        (None, Some(wells)) => resolve_well(wells, &env)?,
        (None, None) => None,
    };

    match owned {
        Some(item) => println!("{}", item),
        None => debug!("Not running as an array element"),
    }
    Ok(())
}

/// Directory at this element's zero-based index in the resolved order.
pub fn resolve_directory<E: EnvironmentView + ?Sized>(
    indir: &str,
    env: &E,
) -> Result<Option<PathBuf>> {
    let Some(index) = detect_array_index(env) else {
        return Ok(None);
    };
    let dirs = DirectoryResolver::new().resolve(indir)?;
    let dir = select(&dirs, index).ok_or_else(|| {
        DispatchError::configuration_with_code(
            ErrorCode::CONFIG_INDEX_OUT_OF_RANGE,
            format!("Array index {} is past the {} resolved director(ies)", index, dirs.len()),
        )
    })?;
    Ok(Some(dir.path.clone()))
}

/// Well id for this element. Unit arrays are submitted in well numbers, so
/// the raw element id is the well.
pub fn resolve_well<E: EnvironmentView + ?Sized>(expr: &str, env: &E) -> Result<Option<String>> {
    let range: WellRange = expr.parse()?;
    let Some(task_id) = detect_array_task_id(env) else {
        return Ok(None);
    };
    if !range.contains(task_id) {
        return Err(DispatchError::configuration_with_code(
            ErrorCode::CONFIG_INDEX_OUT_OF_RANGE,
            format!("Array element {} is outside the well range {}", task_id, range),
        ));
    }
    Ok(Some(well_id(task_id)))
}
