//! Report summary — field snapshots and document rendering.

pub mod renderer;
pub mod summary;

pub use renderer::{FileReportRenderer, ReportArtifact, ReportRenderer};
pub use summary::{context_block, field_map, NOT_PROVIDED};
