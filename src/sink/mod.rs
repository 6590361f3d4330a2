//! Persist tables as CSV and Parquet
//!
//! Every table is written with a header row (CSV) or a fixed Arrow schema
//! (Parquet). Writing the same rows twice yields identical bytes.

mod tables;

use crate::error::Result;
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use serde::Serialize;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// A row type that can be persisted
pub trait Table: Serialize + Sized {
    /// Column layout; names match the CSV header
    fn schema() -> SchemaRef;

    /// Columnar form of `rows`
    fn record_batch(rows: &[Self]) -> Result<RecordBatch>;
}

/// Destination for named tables
pub trait TableSink {
    /// Write `rows` as table `name`, returning the files created
    fn write<T: Table>(&self, name: &str, rows: &[T]) -> Result<Vec<PathBuf>>;
}

/// Comma-separated text, one file per table
#[derive(Debug, Clone)]
pub struct CsvSink {
    dir: PathBuf,
}

impl CsvSink {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }
}

impl TableSink for CsvSink {
    fn write<T: Table>(&self, name: &str, rows: &[T]) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(format!("{}.csv", name));
        let mut writer = csv::Writer::from_path(&path)?;

        if rows.is_empty() {
            // serde only emits the header alongside the first row
            let schema = T::schema();
            writer.write_record(schema.fields().iter().map(|f| f.name().as_str()))?;
        }
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;

        log::debug!("Wrote {} rows to {}", rows.len(), path.display());
        Ok(vec![path])
    }
}

/// Snappy-compressed Parquet, one file per table
#[derive(Debug, Clone)]
pub struct ParquetSink {
    dir: PathBuf,
}

impl ParquetSink {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }
}

impl TableSink for ParquetSink {
    fn write<T: Table>(&self, name: &str, rows: &[T]) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(format!("{}.parquet", name));
        let batch = T::record_batch(rows)?;

        let props = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build();
        let file = File::create(&path)?;
        let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
        writer.write(&batch)?;
        writer.close()?;

        log::debug!("Wrote {} rows to {}", rows.len(), path.display());
        Ok(vec![path])
    }
}

/// Writes each table in both formats
#[derive(Debug, Clone)]
pub struct DualSink {
    csv: CsvSink,
    parquet: ParquetSink,
}

impl DualSink {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            csv: CsvSink::new(&dir),
            parquet: ParquetSink::new(&dir),
        }
    }
}

impl TableSink for DualSink {
    fn write<T: Table>(&self, name: &str, rows: &[T]) -> Result<Vec<PathBuf>> {
        let mut paths = self.csv.write(name, rows)?;
        paths.extend(self.parquet.write(name, rows)?);
        log::info!("Persisted table '{}' ({} rows)", name, rows.len());
        Ok(paths)
    }
}
