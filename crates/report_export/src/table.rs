use anyhow::{Context, Result};
use csv::WriterBuilder;
use feedback_core::export::ExportRecord;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub fn write_csv<W: Write>(records: &[ExportRecord], writer: W) -> Result<()> {
    let mut wtr = WriterBuilder::new().has_headers(true).from_writer(writer);
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_csv_file(records: &[ExportRecord], path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    write_csv(records, BufWriter::new(file))
}
