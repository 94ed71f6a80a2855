pub mod add;
pub mod common;
pub mod edit;
pub mod list;
pub mod reconcile;
pub mod refresh;
pub mod series;
pub mod show;
pub mod status;
pub mod sync;
