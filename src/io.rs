use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;

use polars::prelude::*;
use polars_io::parquet::ParquetWriter;
use tracing::debug;

use crate::config::OutputFormat;
use crate::error::{PipelineError, Result};
use crate::records::DiabetesRecord;

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|source| PipelineError::Open {
        path: path.to_path_buf(),
        source,
    })
}

/// Creates (or truncates) `path`, creating missing parent directories.
pub(crate) fn create_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(File::create(path)?)
}

/// Reads a header-first CSV. Known columns get the raw record schema; empty
/// cells and any of `null_values` become missing.
pub fn read_csv<P: AsRef<Path>>(path: P, null_values: &[String]) -> Result<DataFrame> {
    let path = path.as_ref();
    let file = open(path)?;

    let null_values = if null_values.is_empty() {
        None
    } else {
        Some(NullValues::AllColumns(null_values.to_vec()))
    };

    let df = CsvReader::new(file)
        .has_header(true)
        .with_dtypes(Some(Arc::new(DiabetesRecord::raw_schema())))
        .with_null_values(null_values)
        .finish()?;

    debug!(path = %path.display(), rows = df.height(), columns = df.width(), "loaded table");
    Ok(df)
}

pub fn write_csv<P: AsRef<Path>>(path: P, df: &mut DataFrame) -> Result<()> {
    let mut file = create_file(path.as_ref())?;
    CsvWriter::new(&mut file).finish(df)?;
    Ok(())
}

pub fn write_parquet<P: AsRef<Path>>(path: P, df: &mut DataFrame) -> Result<()> {
    let mut file = create_file(path.as_ref())?;
    ParquetWriter::new(&mut file).finish(df)?;
    Ok(())
}

pub fn write_table<P: AsRef<Path>>(
    path: P,
    df: &mut DataFrame,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Csv => write_csv(path, df),
        OutputFormat::Parquet => write_parquet(path, df),
    }
}
