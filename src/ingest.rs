use csv::StringRecord;
use std::{fmt::Display, io, path::Path, path::PathBuf, str::FromStr};
use thiserror::Error;
use tracing::debug;

pub const COLUMN_SIZE: &str = "Size";
pub const COLUMN_TIME: &str = "Time(ms)";
pub const COLUMN_SPACE: &str = "Space(bytes)";
pub const COLUMN_STATIC_SPACE: &str = "Static_Space(bytes)";
pub const COLUMN_PEAK_MEMORY: &str = "Peak_Memory(bytes)";

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Result file not found at {0:?}")]
    ResultFileMissing(PathBuf),
    #[error("Result file is missing the '{column}' column")]
    ColumnMissing { column: &'static str },
    #[error("Row {row} holds '{value}' which is not a valid '{column}' value")]
    MalformedValue {
        column: &'static str,
        row: usize,
        value: String,
    },
    #[error("Failed to read result file")]
    Csv(#[from] csv::Error),
}

/// grouping key for the two benchmark result tables
/// purely a label, the harness never inspects the graphs themselves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Density {
    Sparse,
    Dense,
}

impl Density {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Sparse => "Sparse Graph",
            Self::Dense => "Dense Graph",
        }
    }
}

/// which column set a result file is required to carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schema {
    /// `Size`, `Time(ms)`, `Space(bytes)`
    Timing,
    /// `Size`, `Time(ms)`, `Static_Space(bytes)`, `Peak_Memory(bytes)`
    Memory,
}

#[derive(Debug, Clone)]
pub enum SpaceColumns {
    /// one flat space metric per row
    Flat(Vec<f64>),
    /// adjacency-representation size and observed peak, per row
    Split {
        static_bytes: Vec<f64>,
        peak_bytes: Vec<f64>,
    },
}

/// one fully loaded result table for a single density class
///
/// columns keep the file's row order untouched, sizes are taken at face
/// value for axis ticks (no sorting, no deduplication)
#[derive(Debug, Clone)]
pub struct ResultTable {
    pub density: Density,
    pub sizes: Vec<u64>,
    pub time_ms: Vec<f64>,
    pub space: SpaceColumns,
}

impl ResultTable {
    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }
}

/// load one result table from disk, failing fast on anything unexpected
pub fn read_table(
    path: &Path,
    density: Density,
    schema: Schema,
) -> Result<ResultTable, IngestError> {
    if !path.is_file() {
        return Err(IngestError::ResultFileMissing(path.to_path_buf()));
    }

    let table = read_table_from(std::fs::File::open(path).map_err(csv::Error::from)?, density, schema)?;

    debug!(
        "Loaded {} rows for the {} table from {}",
        table.len(),
        density.label(),
        path.to_string_lossy()
    );

    Ok(table)
}

/// reader-based variant of `read_table`, mainly a seam for testing
pub fn read_table_from<R: io::Read>(
    reader: R,
    density: Density,
    schema: Schema,
) -> Result<ResultTable, IngestError> {
    let mut reader = csv::Reader::from_reader(reader);
    let headers = reader.headers()?.clone();

    let size_idx = column_index(&headers, COLUMN_SIZE)?;
    let time_idx = column_index(&headers, COLUMN_TIME)?;
    let space_idx = match schema {
        Schema::Timing => SpaceIndices::Flat(column_index(&headers, COLUMN_SPACE)?),
        Schema::Memory => SpaceIndices::Split {
            static_bytes: column_index(&headers, COLUMN_STATIC_SPACE)?,
            peak_bytes: column_index(&headers, COLUMN_PEAK_MEMORY)?,
        },
    };

    let mut sizes = Vec::new();
    let mut time_ms = Vec::new();
    let mut space = match space_idx {
        SpaceIndices::Flat(_) => SpaceColumns::Flat(Vec::new()),
        SpaceIndices::Split { .. } => SpaceColumns::Split {
            static_bytes: Vec::new(),
            peak_bytes: Vec::new(),
        },
    };

    for (row, record) in reader.records().enumerate() {
        let record = record?;

        sizes.push(parse_field(&record, size_idx, COLUMN_SIZE, row)?);
        time_ms.push(parse_field(&record, time_idx, COLUMN_TIME, row)?);

        match (&space_idx, &mut space) {
            (SpaceIndices::Flat(idx), SpaceColumns::Flat(values)) => {
                values.push(parse_field(&record, *idx, COLUMN_SPACE, row)?);
            }
            (
                SpaceIndices::Split {
                    static_bytes: static_idx,
                    peak_bytes: peak_idx,
                },
                SpaceColumns::Split {
                    static_bytes,
                    peak_bytes,
                },
            ) => {
                static_bytes.push(parse_field(&record, *static_idx, COLUMN_STATIC_SPACE, row)?);
                peak_bytes.push(parse_field(&record, *peak_idx, COLUMN_PEAK_MEMORY, row)?);
            }
            // both values are built from the same schema above
            _ => unreachable!(),
        }
    }

    Ok(ResultTable {
        density,
        sizes,
        time_ms,
        space,
    })
}

enum SpaceIndices {
    Flat(usize),
    Split {
        static_bytes: usize,
        peak_bytes: usize,
    },
}

// exact header match, no case or whitespace tolerance
fn column_index(headers: &StringRecord, column: &'static str) -> Result<usize, IngestError> {
    headers
        .iter()
        .position(|header| header == column)
        .ok_or(IngestError::ColumnMissing { column })
}

fn parse_field<T>(
    record: &StringRecord,
    idx: usize,
    column: &'static str,
    row: usize,
) -> Result<T, IngestError>
where
    T: FromStr,
    T::Err: Display,
{
    let value = record.get(idx).unwrap_or("");

    value.parse().map_err(|_| IngestError::MalformedValue {
        column,
        row,
        value: value.to_owned(),
    })
}
