use crate::model::{Fiber, Link, Span};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Only link rows of this subtype are fiber runs.
pub const FIBRE_SUBTYPE: &str = "Fibre";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: invalid {field} value `{value}`")]
    InvalidField {
        row: usize,
        field: &'static str,
        value: String,
    },
    #[error("duplicate {kind} `{name}`")]
    Duplicate { kind: &'static str, name: String },
}

#[derive(Debug, Deserialize)]
struct FiberRecord {
    cores: String,
    armor: String,
    length: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct LinkRecord {
    #[serde(rename = "Subtype")]
    subtype: String,
    #[serde(rename = "Cores")]
    cores: String,
    #[serde(rename = "Length")]
    length: String,
    #[serde(rename = "From-Location")]
    source: String,
    #[serde(rename = "To-Location")]
    destination: String,
}

fn csv_reader<R: Read>(input: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(input)
}

fn open(path: &Path) -> Result<File, LoadError> {
    File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_int(row: usize, field: &'static str, value: &str) -> Result<i64, LoadError> {
    value.parse::<i64>().map_err(|_| LoadError::InvalidField {
        row,
        field,
        value: value.to_string(),
    })
}

/// Non-negative length rounded up to whole units.
fn parse_length(row: usize, field: &'static str, value: &str, margin: f64) -> Result<u32, LoadError> {
    let invalid = || LoadError::InvalidField {
        row,
        field,
        value: value.to_string(),
    };
    let parsed = value.parse::<f64>().map_err(|_| invalid())?;
    if !parsed.is_finite() || parsed < 0.0 {
        return Err(invalid());
    }
    let rounded = (parsed + margin).ceil();
    if rounded > u32::MAX as f64 {
        return Err(invalid());
    }
    Ok(rounded as u32)
}

fn parse_armor(row: usize, value: &str) -> Result<bool, LoadError> {
    match value.to_ascii_lowercase().as_str() {
        "" | "false" | "no" | "n" | "0" => Ok(false),
        "true" | "yes" | "y" | "1" | "armored" | "armoured" => Ok(true),
        _ => Err(LoadError::InvalidField {
            row,
            field: "armor",
            value: value.to_string(),
        }),
    }
}

/// Parse fiber records with headers `cores,armor,length,name`.
///
/// A record with zero or negative cores describes a dead fiber and loads with an empty span.
pub fn load_fibers<R: Read>(input: R) -> Result<Vec<Fiber>, LoadError> {
    let mut fibers = Vec::new();
    let mut names = HashSet::new();

    for (index, record) in csv_reader(input).deserialize::<FiberRecord>().enumerate() {
        let record = record?;
        let row = index + 2;

        let cores = parse_int(row, "cores", &record.cores)?;
        let length = parse_length(row, "length", &record.length, 0.0)?;
        let span = if cores <= 0 {
            Span::dead()
        } else {
            let cores = u32::try_from(cores).map_err(|_| LoadError::InvalidField {
                row,
                field: "cores",
                value: record.cores.clone(),
            })?;
            Span::new(cores, length)
        };

        if !names.insert(record.name.clone()) {
            return Err(LoadError::Duplicate {
                kind: "fiber",
                name: record.name,
            });
        }

        fibers.push(Fiber {
            name: record.name,
            armored: parse_armor(row, &record.armor)?,
            span,
        });
    }

    log::debug!("Loaded {} fibers", fibers.len());
    Ok(fibers)
}

/// Parse link records, keeping only `Fibre` rows.
///
/// Every link length becomes `ceil(Length + link_length_margin)`.
pub fn load_links<R: Read>(input: R, link_length_margin: f64) -> Result<Vec<Link>, LoadError> {
    let mut links = Vec::new();
    let mut ids = HashSet::new();
    let mut skipped = 0;

    for (index, record) in csv_reader(input).deserialize::<LinkRecord>().enumerate() {
        let record = record?;
        let row = index + 2;

        if record.subtype != FIBRE_SUBTYPE {
            skipped += 1;
            continue;
        }

        let cores = parse_int(row, "Cores", &record.cores)?;
        let cores = u32::try_from(cores).map_err(|_| LoadError::InvalidField {
            row,
            field: "Cores",
            value: record.cores.clone(),
        })?;
        let length = parse_length(row, "Length", &record.length, link_length_margin)?;

        let link = Link::new(record.source, record.destination, cores, length);
        if !ids.insert(link.id.clone()) {
            return Err(LoadError::Duplicate {
                kind: "link",
                name: link.id.to_string(),
            });
        }
        links.push(link);
    }

    log::debug!("Loaded {} links ({} non-fibre rows skipped)", links.len(), skipped);
    Ok(links)
}

pub fn load_fibers_from_path(path: &Path) -> Result<Vec<Fiber>, LoadError> {
    load_fibers(open(path)?)
}

pub fn load_links_from_path(path: &Path, link_length_margin: f64) -> Result<Vec<Link>, LoadError> {
    load_links(open(path)?, link_length_margin)
}
