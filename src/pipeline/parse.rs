use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

use tracing::{debug, error, warn};

use crate::config::Config;
use crate::error::{CollectorError, ParseError, PublishError};
use crate::oui::metric::write_metrics;
use crate::oui::{OuiMap, RegistryEntry};

// Columns: Registry, Assignment, Organization Name, Organization Address
const ASSIGNMENT_COLUMN: usize = 1;
const ORGANIZATION_COLUMN: usize = 2;

/// Turn a downloaded registry CSV into the published metric file.
///
/// Returns the number of OUIs written.
pub fn parse(source: &Path, config: &Config) -> Result<usize, CollectorError> {
    let map = read_registry(source)?;

    let staging = config.temp_output_path();
    write_staging_file(&map, &config.metric_name, &staging)?;
    publish(&staging, &config.output_file)?;

    Ok(map.len())
}

/// Read the registry CSV into a merged [`OuiMap`], skipping the header row
/// and any row whose assignment is not a 6 character prefix.
pub fn read_registry(source: &Path) -> Result<OuiMap, ParseError> {
    let file = File::open(source).map_err(|e| ParseError::Open {
        path: source.to_path_buf(),
        source: e,
    })?;

    read_entries(csv::Reader::from_reader(BufReader::new(file)))
}

fn read_entries<R: io::Read>(mut reader: csv::Reader<R>) -> Result<OuiMap, ParseError> {
    let mut map = OuiMap::new();
    let mut skipped = 0usize;

    for result in reader.byte_records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();

        let (Some(assignment), Some(organization)) = (
            record.get(ASSIGNMENT_COLUMN),
            record.get(ORGANIZATION_COLUMN),
        ) else {
            return Err(ParseError::MissingColumns {
                line,
                found: record.len(),
            });
        };

        let assignment = String::from_utf8_lossy(assignment);
        let organization = String::from_utf8_lossy(organization);

        match RegistryEntry::from_columns(&assignment, &organization) {
            Some(entry) => map.insert(entry),
            None => {
                error!(oui = %assignment.to_lowercase(), line, "OUI has wrong number of characters");
                skipped += 1;
            }
        }
    }

    debug!(entries = map.len(), skipped, "Parsed OUI database");
    if map.is_empty() {
        warn!(skipped, "OUI database contained no usable entries");
    }
    Ok(map)
}

fn write_staging_file(map: &OuiMap, metric_name: &str, staging: &Path) -> Result<(), ParseError> {
    let write_err = |source: io::Error| ParseError::WriteOutput {
        path: staging.to_path_buf(),
        source,
    };

    let file = File::create(staging).map_err(|source| ParseError::CreateOutput {
        path: staging.to_path_buf(),
        source,
    })?;

    let mut writer = BufWriter::new(file);
    write_metrics(map, metric_name, &mut writer).map_err(write_err)?;
    writer.flush().map_err(write_err)?;
    writer
        .into_inner()
        .map_err(|e| write_err(e.into_error()))?
        .sync_all()
        .map_err(write_err)?;

    Ok(())
}

/// Atomically move the staged metric file over the published one.
pub fn publish(staging: &Path, output: &Path) -> Result<(), PublishError> {
    fs::rename(staging, output).map_err(|source| PublishError {
        from: staging.to_path_buf(),
        to: output.to_path_buf(),
        source,
    })
}
