//! Change detection between two snapshots.

mod delta;
mod diff_kind;
mod field_diff;

pub use delta::{Delta, DeltaSummary, EditedEvent};
pub use diff_kind::DiffKind;
pub use field_diff::{DayGranularity, FieldDiff};
