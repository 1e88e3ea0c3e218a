//! Snapshot construction: change detection, materialization, publication

mod compare;
mod materialize;
mod previous;
mod publish;

pub use compare::hardlink_eligible;
pub use materialize::{MaterializeStats, Materializer};
pub use previous::resolve_previous;
pub use publish::{timestamp_name, PendingSnapshot, IN_PROGRESS_SUFFIX, LATEST_NAME};
