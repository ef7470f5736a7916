//! Spatial checks on a merged year.
//!
//! Rows missing latitude or longitude, and rows missing only elevation, are
//! copied into side sets. Every station's fully populated rows must agree on a
//! single (latitude, longitude, elevation) triple.

use std::collections::BTreeSet;

use tracing::{info, warn};

use crate::error::SpatialInconsistencyError;
use crate::reading::{MergedRow, YearDataset};

#[derive(Debug, Clone, Default, PartialEq)]
/// Row subsets derived from a dataset. Persisted as side files, never merged back.
pub struct SpatialFlagSet {
    pub missing_lat_long: Vec<MergedRow>,
    pub missing_only_elevation: Vec<MergedRow>,
    pub inconsistent_station: Vec<MergedRow>,
}

impl SpatialFlagSet {
    pub fn is_empty(&self) -> bool {
        self.missing_lat_long.is_empty()
            && self.missing_only_elevation.is_empty()
            && self.inconsistent_station.is_empty()
    }
}

/// Verifies `dataset` and returns it with every row kept.
///
/// Null spatial values are replaced with the `missing` sentinel. Fails when
/// any station has more than one distinct spatial triple.
pub fn verify(
    mut dataset: YearDataset,
) -> Result<(YearDataset, SpatialFlagSet), SpatialInconsistencyError> {
    for row in dataset.rows_mut() {
        row.latitude.fill_missing();
        row.longitude.fill_missing();
        row.elevation.fill_missing();
    }

    let rows = dataset.rows();
    let mut flags = SpatialFlagSet::default();

    flags.missing_lat_long = rows
        .iter()
        .filter(|r| r.missing_lat_long())
        .cloned()
        .collect();
    flags.missing_only_elevation = rows
        .iter()
        .filter(|r| r.missing_only_elevation())
        .cloned()
        .collect();

    let mut station_ids = Vec::new();
    for (station, indices) in dataset.station_index() {
        let populated: Vec<&MergedRow> = indices
            .iter()
            .map(|&i| &rows[i])
            .filter(|r| !r.missing_lat_long() && !r.elevation.is_missing())
            .collect();

        let triples: BTreeSet<(&str, &str, &str)> =
            populated.iter().map(|r| r.spatial_triple()).collect();

        if triples.len() > 1 {
            warn!(
                year = %dataset.year,
                station,
                variants = triples.len(),
                "Station has inconsistent spatial data"
            );
            station_ids.push(station.to_string());
            flags
                .inconsistent_station
                .extend(populated.into_iter().cloned());
        }
    }

    info!(
        year = %dataset.year,
        rows = rows.len(),
        missing_lat_long = flags.missing_lat_long.len(),
        missing_only_elevation = flags.missing_only_elevation.len(),
        inconsistent_stations = station_ids.len(),
        "Spatial verification complete"
    );

    if !station_ids.is_empty() {
        return Err(SpatialInconsistencyError {
            year: dataset.year.clone(),
            station_ids,
            flags,
        });
    }

    Ok((dataset, flags))
}

// -- Tests -------------------------------------------------------------------
