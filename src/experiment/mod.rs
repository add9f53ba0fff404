//! Experiment discovery
//!
//! - `resolver` - turns a path, glob or list file into experiment directories
//! - `descriptor` - inventories the channels, loops and wells of one directory

pub mod descriptor;
pub mod resolver;

pub use descriptor::{well_id, well_number, ExperimentDescriptor, FrameKey};
pub use resolver::{DirectoryResolver, ExperimentDirectory, CROPPED_DIR_NAME};
