//! Data models for Releves

mod collection;
mod entry;
mod series;
pub mod validation;

pub(crate) use entry::{flag, text_or_empty, Scalar};
pub use collection::{EntryCollection, Upsert};
pub use entry::{Entry, EntryDraft, EntryState};
pub use series::{sensor_series, SensorSeries, SeriesPoint};
pub use validation::{validate, validate_at, Field, FieldError};
