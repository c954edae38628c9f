use std::{fs::File, io::BufReader, path::Path};

use crate::{Error, Result, telemetry::DecisionRecord};

/// Write `records` to `path`, header first.
pub fn write_records<P: AsRef<Path>>(path: P, records: &[DecisionRecord]) -> Result<()> {
    let path = path.as_ref();
    let file =
        File::create(path).map_err(|e| Error::io(format!("create {}", path.display()), e))?;
    let mut writer = csv::Writer::from_writer(file);
    for record in records {
        writer.serialize(record)?;
    }
    writer
        .flush()
        .map_err(|e| Error::io(format!("flush {}", path.display()), e))
}

/// Read every decision record in `path`.
///
/// Surrounding whitespace in fields is ignored.
pub fn read_records<P: AsRef<Path>>(path: P) -> Result<Vec<DecisionRecord>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::io(format!("open {}", path.display()), e))?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(BufReader::new(file));
    let mut records = Vec::new();
    for row in reader.deserialize() {
        records.push(row?);
    }
    Ok(records)
}
