pub mod csv;

use crate::errors::GenerationError;

/// Destination for generated rows.
pub trait RowSink<R> {
    fn write_row(&mut self, row: &R) -> Result<(), GenerationError>;
}

impl<R: Clone> RowSink<R> for Vec<R> {
    fn write_row(&mut self, row: &R) -> Result<(), GenerationError> {
        self.push(row.clone());
        Ok(())
    }
}

pub use self::csv::{CsvSink, read_records, read_rows, write_rows};
