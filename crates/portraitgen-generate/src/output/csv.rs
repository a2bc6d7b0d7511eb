use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::marker::PhantomData;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::errors::GenerationError;
use crate::model::OutputRow;
use crate::output::RowSink;

const BOM: &str = "\u{feff}";

/// CSV file sink with a UTF-8 BOM and a fixed header.
///
/// Every row is flushed to disk before `write_row` returns, so an interrupted
/// batch leaves a file whose last line is a complete record.
pub struct CsvSink<R: OutputRow> {
    writer: csv::Writer<CountingWriter<BufWriter<File>>>,
    rows: u64,
    _row: PhantomData<R>,
}

impl<R: OutputRow> CsvSink<R> {
    pub fn create(path: &Path) -> Result<Self, GenerationError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut counting = CountingWriter::new(BufWriter::new(File::create(path)?));
        counting.write_all(BOM.as_bytes())?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(counting);
        writer.write_record(R::HEADER)?;
        writer.flush()?;

        Ok(Self {
            writer,
            rows: 0,
            _row: PhantomData,
        })
    }

    pub fn rows_written(&self) -> u64 {
        self.rows
    }

    pub fn bytes_written(&self) -> u64 {
        self.writer.get_ref().bytes_written()
    }
}

impl<R: OutputRow> RowSink<R> for CsvSink<R> {
    fn write_row(&mut self, row: &R) -> Result<(), GenerationError> {
        self.writer.serialize(row)?;
        self.writer.flush()?;
        self.rows += 1;
        Ok(())
    }
}

/// Write `rows` to a fresh file at `path`. Returns the bytes written.
pub fn write_rows<R: OutputRow>(path: &Path, rows: &[R]) -> Result<u64, GenerationError> {
    let mut sink = CsvSink::<R>::create(path)?;
    for row in rows {
        sink.write_row(row)?;
    }
    Ok(sink.bytes_written())
}

/// Read a headed CSV file into records, tolerating a leading BOM.
pub fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, GenerationError> {
    let contents = fs::read_to_string(path)?;
    let contents = contents.strip_prefix(BOM).unwrap_or(&contents);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(contents.as_bytes());

    let mut records = Vec::new();
    for record in reader.deserialize() {
        records.push(record?);
    }
    Ok(records)
}

pub fn read_rows<R: OutputRow>(path: &Path) -> Result<Vec<R>, GenerationError> {
    read_records(path)
}

struct CountingWriter<W: Write> {
    inner: W,
    bytes: u64,
}

impl<W: Write> CountingWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner, bytes: 0 }
    }

    fn bytes_written(&self) -> u64 {
        self.bytes
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let size = self.inner.write(buf)?;
        self.bytes = self.bytes.saturating_add(size as u64);
        Ok(size)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::model::{PortraitRow, UnitRecord};

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("portraitgen_csv_{}", uuid::Uuid::new_v4()))
            .join(name)
    }

    #[test]
    fn file_starts_with_bom_and_header() {
        let path = temp_path("portraits.csv");
        let rows = vec![PortraitRow {
            race: "人类".to_string(),
            style: "骑士_人类_双马尾_银色_中胸".to_string(),
            prompt: "1girl, solo, human girl, silver hair".to_string(),
            seed: 12_345,
        }];
        write_rows(&path, &rows).expect("write csv");

        let raw = fs::read(&path).expect("read csv");
        assert!(raw.starts_with(BOM.as_bytes()));
        let text = String::from_utf8(raw).expect("utf8");
        let mut lines = text.trim_start_matches(BOM).lines();
        assert_eq!(lines.next(), Some("race,style,prompt,seed"));
        assert_eq!(
            lines.next(),
            Some("人类,骑士_人类_双马尾_银色_中胸,\"1girl, solo, human girl, silver hair\",12345")
        );
    }

    #[test]
    fn unit_table_missing_columns_take_defaults() {
        let path = temp_path("units.csv");
        fs::create_dir_all(path.parent().expect("parent")).expect("create dir");
        fs::write(&path, "\u{feff}name,race,country\n人类骑士,人类,人类国家\n").expect("write");

        let records: Vec<UnitRecord> = read_records(&path).expect("read units");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].unit_type, "physical");
        assert_eq!(records[0].level, "1");
        assert_eq!(records[0].avatar, "");
    }
}
