//! Nearest-neighbor spatio-temporal join: resolve one (date, lat, lon)
//! tuple to a (time, lat, lon) index triple into the weather grid, then
//! read all five fields at that triple.

use crate::clean::CleanIncident;
use crate::config::{Config, CoverageCutoff, RowErrorPolicy};
use crate::data_io::{WeatherGrid, WeatherSample};
use crate::time_utils::{days_between, is_valid_date};
use chrono::{Datelike, NaiveDate};
use ndarray::Array1;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum JoinError {
    #[error("Row {row}: cannot resolve date {year:04}-{month:02}-{day:02}")]
    UnresolvableDate {
        row: usize,
        year: i32,
        month: i32,
        day: i32,
    },

    #[error("Row {row}: missing coordinates")]
    MissingCoordinates { row: usize },
}

/// Joiner over one weather grid. Holds the coverage policy and the
/// longitude conversion mode; the grid itself is read-only and shared.
pub struct Joiner<'a> {
    grid: &'a WeatherGrid,
    reference_date: NaiveDate,
    coverage_cutoff: Option<CoverageCutoff>,
    exact_longitude_wrap: bool,
    row_error_policy: RowErrorPolicy,
}

impl<'a> Joiner<'a> {
    pub fn new(grid: &'a WeatherGrid, config: &Config) -> Self {
        Self {
            grid,
            reference_date: config.reference_date,
            coverage_cutoff: config.coverage_cutoff,
            exact_longitude_wrap: config.exact_longitude_wrap,
            row_error_policy: config.row_error_policy,
        }
    }

    /// Annotate one cleaned row: either a full five-field sample or None.
    ///
    /// None means the row is outside the grid's temporal coverage. A row
    /// that cannot be resolved at all (invalid calendar date, missing
    /// coordinates) is an error under the abort policy and None otherwise.
    pub fn annotate(
        &self,
        row_index: usize,
        row: &CleanIncident,
    ) -> Result<Option<WeatherSample>, JoinError> {
        let time = match self.resolve_time(row_index, row)? {
            Some(t) => t,
            None => return Ok(None),
        };
        let (latitude, longitude) = match (row.latitude, row.longitude) {
            (Some(lat), Some(lon)) => (lat, lon),
            _ => return self.row_failure(JoinError::MissingCoordinates { row: row_index }),
        };

        let lat_index = nearest_index(&self.grid.latitudes, latitude);
        let lon_index = nearest_index(
            &self.grid.longitudes,
            self.to_grid_longitude(longitude),
        );

        Ok(Some(self.grid.sample(time, lat_index, lon_index)))
    }

    /// Resolve the incident date to a time-step index, or None when the
    /// date falls outside the coverage window.
    fn resolve_time(
        &self,
        row_index: usize,
        row: &CleanIncident,
    ) -> Result<Option<usize>, JoinError> {
        if !is_valid_date(row.iyear as i64, row.imonth as i64, row.iday as i64) {
            let error = JoinError::UnresolvableDate {
                row: row_index,
                year: row.iyear,
                month: row.imonth,
                day: row.iday,
            };
            return match self.row_error_policy {
                RowErrorPolicy::Skip => Ok(None),
                RowErrorPolicy::Abort => Err(error),
            };
        }

        if let Some(cutoff) = &self.coverage_cutoff {
            if cutoff.excludes(row.iyear, row.imonth as u32) {
                return Ok(None);
            }
        }

        let offset = days_between(
            self.reference_date.year() as i64,
            self.reference_date.month() as i64,
            self.reference_date.day() as i64,
            row.iyear as i64,
            row.imonth as i64,
            row.iday as i64,
        );
        // Dates strictly before the reference date are out of coverage;
        // the reference date itself is time step 0. Offsets past the end
        // of the time axis are equally out of coverage.
        if offset < 0 || offset as usize >= self.grid.num_steps() {
            return Ok(None);
        }
        Ok(Some(offset as usize))
    }

    /// Convert an incident longitude (-180..180) to the grid's 0..360
    /// convention. The legacy flat +180 shift is preserved by default
    /// because downstream consumers depend on its behavior; the exact
    /// modulo wrap is available behind a flag.
    fn to_grid_longitude(&self, longitude: f64) -> f64 {
        if self.exact_longitude_wrap {
            (longitude + 360.0) % 360.0
        } else {
            longitude + 180.0
        }
    }

    fn row_failure(&self, error: JoinError) -> Result<Option<WeatherSample>, JoinError> {
        match self.row_error_policy {
            RowErrorPolicy::Skip => Ok(None),
            RowErrorPolicy::Abort => Err(error),
        }
    }
}

/// Index of the axis value nearest to the target by absolute difference.
/// Ties resolve to the lowest index. The axis is non-empty by the grid
/// loader's contract, so an index always exists.
pub fn nearest_index(axis: &Array1<f64>, target: f64) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (i, &value) in axis.iter().enumerate() {
        let dist = (value - target).abs();
        if dist < best_dist {
            best = i;
            best_dist = dist;
        }
    }
    best
}
