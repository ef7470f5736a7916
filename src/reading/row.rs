//! One merged station observation.

use std::fmt;

use csv::StringRecord;

use super::{MISSING, OBSERVATION_COLUMNS};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// A latitude, longitude or elevation value.
///
/// `Null` is what a member CSV gives for an empty cell. The spatial verifier
/// turns every `Null` into `Missing`, which is written as the `missing` sentinel.
pub enum SpatialField {
    Value(String),
    Null,
    Missing,
}

impl SpatialField {
    pub fn parse(cell: &str) -> Self {
        let cell = cell.trim();
        if cell.is_empty() {
            SpatialField::Null
        } else if cell == MISSING {
            SpatialField::Missing
        } else {
            SpatialField::Value(cell.to_string())
        }
    }

    pub fn is_missing(&self) -> bool {
        !matches!(self, SpatialField::Value(_))
    }

    /// Replaces a null with the sentinel.
    pub fn fill_missing(&mut self) {
        if *self == SpatialField::Null {
            *self = SpatialField::Missing;
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SpatialField::Value(v) => v,
            SpatialField::Null => "",
            SpatialField::Missing => MISSING,
        }
    }
}

impl fmt::Display for SpatialField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A daily summary row from one station file, tagged with that file's name.
pub struct MergedRow {
    pub station: String,
    pub date: String,
    pub latitude: SpatialField,
    pub longitude: SpatialField,
    pub elevation: SpatialField,
    pub name: String,
    pub temp: String,
    pub temp_attributes: String,
    pub dewp: String,
    pub dewp_attributes: String,
    pub slp: String,
    pub slp_attributes: String,
    pub stp: String,
    pub stp_attributes: String,
    pub visib: String,
    pub visib_attributes: String,
    pub wdsp: String,
    pub wdsp_attributes: String,
    pub mxspd: String,
    pub gust: String,
    pub max: String,
    pub max_attributes: String,
    pub min: String,
    pub min_attributes: String,
    pub prcp: String,
    pub prcp_attributes: String,
    pub sndp: String,
    pub frshtt: String,
    pub source_file: String,
}

impl MergedRow {
    /// Builds a row from one CSV record. On a field count mismatch, returns
    /// the number of fields found.
    pub fn from_record(record: &StringRecord, source_file: &str) -> Result<Self, usize> {
        if record.len() != OBSERVATION_COLUMNS.len() {
            return Err(record.len());
        }

        let f = |i: usize| record.get(i).unwrap_or_default().to_string();

        Ok(MergedRow {
            station: f(0),
            date: f(1),
            latitude: SpatialField::parse(&record[2]),
            longitude: SpatialField::parse(&record[3]),
            elevation: SpatialField::parse(&record[4]),
            name: f(5),
            temp: f(6),
            temp_attributes: f(7),
            dewp: f(8),
            dewp_attributes: f(9),
            slp: f(10),
            slp_attributes: f(11),
            stp: f(12),
            stp_attributes: f(13),
            visib: f(14),
            visib_attributes: f(15),
            wdsp: f(16),
            wdsp_attributes: f(17),
            mxspd: f(18),
            gust: f(19),
            max: f(20),
            max_attributes: f(21),
            min: f(22),
            min_attributes: f(23),
            prcp: f(24),
            prcp_attributes: f(25),
            sndp: f(26),
            frshtt: f(27),
            source_file: source_file.to_string(),
        })
    }

    /// Field values in merged-header order, provenance last.
    pub fn fields(&self) -> [&str; 29] {
        [
            &self.station,
            &self.date,
            self.latitude.as_str(),
            self.longitude.as_str(),
            self.elevation.as_str(),
            &self.name,
            &self.temp,
            &self.temp_attributes,
            &self.dewp,
            &self.dewp_attributes,
            &self.slp,
            &self.slp_attributes,
            &self.stp,
            &self.stp_attributes,
            &self.visib,
            &self.visib_attributes,
            &self.wdsp,
            &self.wdsp_attributes,
            &self.mxspd,
            &self.gust,
            &self.max,
            &self.max_attributes,
            &self.min,
            &self.min_attributes,
            &self.prcp,
            &self.prcp_attributes,
            &self.sndp,
            &self.frshtt,
            &self.source_file,
        ]
    }

    pub fn missing_lat_long(&self) -> bool {
        self.latitude.is_missing() || self.longitude.is_missing()
    }

    pub fn missing_only_elevation(&self) -> bool {
        !self.missing_lat_long() && self.elevation.is_missing()
    }

    pub fn spatial_triple(&self) -> (&str, &str, &str) {
        (
            self.latitude.as_str(),
            self.longitude.as_str(),
            self.elevation.as_str(),
        )
    }
}

// -- Tests -------------------------------------------------------------------
