pub mod grid;
pub mod incidents;
pub mod writer;

pub use grid::*;
pub use incidents::*;
pub use writer::*;

use ndarray::{Array1, Array3};

/// Gridded reanalysis weather dataset, fully materialized in memory.
/// Immutable after load; all five fields share the coordinate axes.
#[derive(Debug, Clone)]
pub struct WeatherGrid {
    /// Latitude coordinates (degrees, arbitrary order and spacing)
    pub latitudes: Array1<f64>,
    /// Longitude coordinates (degrees, 0-360 convention)
    pub longitudes: Array1<f64>,
    /// Time coordinates (days since the reference date, daily step)
    pub times: Array1<f64>,

    /// 2 metre temperature [time, lat, lon]
    pub t2m: Array3<f32>,
    /// Total cloud cover
    pub tcc: Array3<f32>,
    /// Vertical integral of divergence of geopotential flux
    pub vidgf: Array3<f32>,
    /// Surface pressure
    pub sp: Array3<f32>,
    /// 10 metre V wind component
    pub v10: Array3<f32>,
}

impl WeatherGrid {
    /// Number of time steps along the time axis
    pub fn num_steps(&self) -> usize {
        self.times.len()
    }

    /// Read all five fields at one resolved index triple.
    pub fn sample(&self, time: usize, lat: usize, lon: usize) -> WeatherSample {
        WeatherSample {
            t2m: self.t2m[[time, lat, lon]],
            tcc: self.tcc[[time, lat, lon]],
            vidgf: self.vidgf[[time, lat, lon]],
            sp: self.sp[[time, lat, lon]],
            v10: self.v10[[time, lat, lon]],
        }
    }
}

/// One weather observation, produced and written as a unit: a row is
/// either fully annotated or carries null for all five fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeatherSample {
    pub t2m: f32,
    pub tcc: f32,
    pub vidgf: f32,
    pub sp: f32,
    pub v10: f32,
}

/// Output column names for the five weather fields, in write order.
pub const WEATHER_COLUMNS: [&str; 5] = ["t2m", "tcc", "vidgf", "sp", "v10"];
