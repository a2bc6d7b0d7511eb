//! Prompt generation for portrait batches.
//!
//! Templates from `portraitgen-core` go through constrained selection,
//! prompt assembly and the alternate-register mapping, and come out as
//! typed rows written to a [`RowSink`] (usually a BOM-prefixed CSV file).

pub mod assembler;
pub mod engine;
pub mod errors;
pub mod model;
pub mod output;
pub mod selection;
pub mod selector;
pub mod traversal;
pub mod variant;

pub use assembler::{assemble, character_selection, unit_selection};
pub use engine::{CORRUPTED_SUFFIX, EngineOptions, PromptEngine};
pub use errors::{GenerationError, SelectionError};
pub use model::{
    BatchIssue, BatchReport, OutputRow, PortraitRow, RoleBatch, RolePromptRow, UnitFilter,
    UnitRecord, UnitRow,
};
pub use output::{CsvSink, RowSink, read_records, read_rows, write_rows};
pub use selection::{Field, ResolvedSelection};
pub use traversal::{Combination, Dimension, PortraitTraversal};
pub use variant::corrupt;
