//! Typed station readings and the per-year dataset.

pub mod dataset;
pub mod row;

pub use dataset::YearDataset;
pub use row::{MergedRow, SpatialField};

/// Columns of a station CSV member, in order.
pub const OBSERVATION_COLUMNS: [&str; 28] = [
    "STATION",
    "DATE",
    "LATITUDE",
    "LONGITUDE",
    "ELEVATION",
    "NAME",
    "TEMP",
    "TEMP_ATTRIBUTES",
    "DEWP",
    "DEWP_ATTRIBUTES",
    "SLP",
    "SLP_ATTRIBUTES",
    "STP",
    "STP_ATTRIBUTES",
    "VISIB",
    "VISIB_ATTRIBUTES",
    "WDSP",
    "WDSP_ATTRIBUTES",
    "MXSPD",
    "GUST",
    "MAX",
    "MAX_ATTRIBUTES",
    "MIN",
    "MIN_ATTRIBUTES",
    "PRCP",
    "PRCP_ATTRIBUTES",
    "SNDP",
    "FRSHTT",
];

/// Provenance column appended to every merged row.
pub const SOURCE_FILE_COLUMN: &str = "SOURCE_FILE";

/// Sentinel written for absent spatial values.
pub const MISSING: &str = "missing";

/// Full merged header: observation columns then provenance.
pub fn merged_header() -> Vec<&'static str> {
    OBSERVATION_COLUMNS
        .iter()
        .copied()
        .chain(std::iter::once(SOURCE_FILE_COLUMN))
        .collect()
}
