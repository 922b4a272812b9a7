//! Tabular data sources loaded once at startup.
//!
//! `BoxCatalog` holds every box type that may be recommended and
//! `MaterialFactors` maps a packaging material to its CO2 footprint. Both are
//! read from CSV files whose columns are referenced by header name, validated
//! row by row, and never mutated afterwards.

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::{Position, ReaderBuilder, Trim};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::model::{BoxSpec, ValidationError};
use crate::types::validation;

/// Failure to build a table from its source.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed row {row}: {source}")]
    Csv {
        row: usize,
        #[source]
        source: csv::Error,
    },

    #[error("invalid row {row} ({id}): {source}")]
    InvalidRow {
        row: usize,
        id: String,
        #[source]
        source: ValidationError,
    },

    #[error("duplicate box_id '{id}' in row {row}")]
    DuplicateBoxId { row: usize, id: String },

    #[error("{0} contains no rows")]
    Empty(&'static str),
}

/// Material whose CO2 factor is required but missing from the table.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("material '{material}' not found in material factor table")]
pub struct MaterialNotFoundError {
    pub material: String,
}

fn open(path: &Path) -> Result<File, LoadError> {
    File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(reader)
}

fn line_of(position: Option<&Position>) -> Option<usize> {
    position.map(|pos| pos.line() as usize)
}

/// Reads every record together with the file line it starts on.
///
/// Lines are counted the way a person reading the file would (header is line
/// 1), so a quoted field spanning several lines does not shift later rows.
fn read_rows<T, R>(reader: R) -> Result<Vec<(usize, T)>, LoadError>
where
    T: DeserializeOwned,
    R: Read,
{
    let mut reader = csv_reader(reader);
    let headers = reader
        .headers()
        .map_err(|source| LoadError::Csv { row: 1, source })?
        .clone();

    let mut rows = Vec::new();
    let mut last_line = 1;
    for record in reader.records() {
        let record = record.map_err(|source| LoadError::Csv {
            row: line_of(source.position()).unwrap_or(last_line + 1),
            source,
        })?;
        let row = line_of(record.position()).unwrap_or(last_line + 1);
        last_line = row;

        let value = record
            .deserialize(Some(&headers))
            .map_err(|source| LoadError::Csv { row, source })?;
        rows.push((row, value));
    }
    Ok(rows)
}

/// Numbers in-memory rows by their 1-based position in the list.
fn numbered<T>(rows: Vec<T>) -> Vec<(usize, T)> {
    rows.into_iter()
        .enumerate()
        .map(|(index, row)| (index + 1, row))
        .collect()
}

/// Immutable, ordered set of box types.
#[derive(Clone, Debug)]
pub struct BoxCatalog {
    boxes: Vec<BoxSpec>,
}

impl BoxCatalog {
    /// Loads the catalog from a CSV file.
    ///
    /// Expected columns: `box_id,length_cm,width_cm,height_cm,max_weight_kg,cost_per_box`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let catalog = Self::from_reader(open(path)?)?;
        tracing::info!(
            path = %path.display(),
            boxes = catalog.len(),
            "box catalog loaded"
        );
        Ok(catalog)
    }

    /// Parses the catalog from any CSV source.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, LoadError> {
        Self::from_rows(read_rows(reader)?)
    }

    /// Builds a catalog from rows that are already in memory.
    ///
    /// Rows go through the same checks as rows read from a file; errors
    /// report the 1-based position in `boxes`.
    pub fn from_specs(boxes: Vec<BoxSpec>) -> Result<Self, LoadError> {
        Self::from_rows(numbered(boxes))
    }

    fn from_rows(rows: Vec<(usize, BoxSpec)>) -> Result<Self, LoadError> {
        if rows.is_empty() {
            return Err(LoadError::Empty("box catalog"));
        }

        let mut seen = HashSet::with_capacity(rows.len());
        for (row, spec) in &rows {
            spec.validate().map_err(|source| LoadError::InvalidRow {
                row: *row,
                id: spec.box_id.clone(),
                source,
            })?;
            if !seen.insert(spec.box_id.as_str()) {
                return Err(LoadError::DuplicateBoxId {
                    row: *row,
                    id: spec.box_id.clone(),
                });
            }
        }

        Ok(Self {
            boxes: rows.into_iter().map(|(_, spec)| spec).collect(),
        })
    }

    /// Iterates the box types in load order.
    pub fn iter(&self) -> std::slice::Iter<'_, BoxSpec> {
        self.boxes.iter()
    }

    /// All box types in load order.
    pub fn boxes(&self) -> &[BoxSpec] {
        &self.boxes
    }

    /// Looks up a box type by identifier.
    pub fn get(&self, box_id: &str) -> Option<&BoxSpec> {
        self.boxes.iter().find(|spec| spec.box_id == box_id)
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}

impl<'a> IntoIterator for &'a BoxCatalog {
    type Item = &'a BoxSpec;
    type IntoIter = std::slice::Iter<'a, BoxSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// One row of the material factor table.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct MaterialFactor {
    pub material_type: String,
    pub co2_per_kg_kg: f64,
}

/// CO2 emitted per kilogram of packaging material.
#[derive(Clone, Debug)]
pub struct MaterialFactors {
    factors: Vec<MaterialFactor>,
}

impl MaterialFactors {
    /// Loads the table from a CSV file with `material_type,co2_per_kg_kg` columns.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let factors = Self::from_reader(open(path)?)?;
        tracing::info!(
            path = %path.display(),
            materials = factors.len(),
            "material factors loaded"
        );
        Ok(factors)
    }

    /// Parses the table from any CSV source.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, LoadError> {
        Self::from_rows(read_rows(reader)?)
    }

    /// Builds the table from rows that are already in memory.
    ///
    /// An empty table is accepted; lookups against it fail with
    /// `MaterialNotFoundError`.
    pub fn from_factors(factors: Vec<MaterialFactor>) -> Result<Self, LoadError> {
        Self::from_rows(numbered(factors))
    }

    fn from_rows(rows: Vec<(usize, MaterialFactor)>) -> Result<Self, LoadError> {
        for (row, factor) in &rows {
            validation::validate_non_negative(factor.co2_per_kg_kg, "CO2 per kg")
                .map_err(|msg| LoadError::InvalidRow {
                    row: *row,
                    id: factor.material_type.clone(),
                    source: ValidationError::InvalidFactor(msg),
                })?;
        }
        Ok(Self {
            factors: rows.into_iter().map(|(_, factor)| factor).collect(),
        })
    }

    /// Returns the CO2 factor of a material. The first matching row wins.
    pub fn co2_per_kg(&self, material: &str) -> Result<f64, MaterialNotFoundError> {
        self.factors
            .iter()
            .find(|factor| factor.material_type == material)
            .map(|factor| factor.co2_per_kg_kg)
            .ok_or_else(|| MaterialNotFoundError {
                material: material.to_string(),
            })
    }

    pub fn contains(&self, material: &str) -> bool {
        self.factors.iter().any(|f| f.material_type == material)
    }

    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }
}
