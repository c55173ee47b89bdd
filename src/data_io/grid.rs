use super::WeatherGrid;
use ndarray::{Array1, Array3};
use std::path::Path;
use thiserror::Error;

/// NetCDF variable names in the weather extract.
const LAT_VAR: &str = "latitude";
const LON_VAR: &str = "longitude";
const TIME_VAR: &str = "time";
const FIELD_VARS: [&str; 5] = ["t2m", "tcc", "p85.162", "sp", "v10"];

#[derive(Error, Debug)]
pub enum GridError {
    #[error("NetCDF error: {0}")]
    Netcdf(#[from] netcdf::Error),

    #[error("Variable not found: {0}")]
    MissingVariable(String),

    #[error("Coordinate axis {0} is empty")]
    EmptyAxis(String),

    #[error("Variable {name} has shape {actual:?}, expected {expected:?}")]
    ShapeMismatch {
        name: String,
        actual: Vec<usize>,
        expected: Vec<usize>,
    },

    #[error("File not found: {0}")]
    FileNotFound(String),
}

/// NetCDF reader for the gridded weather dataset
pub struct GridReader {
    pub file_path: String,
}

impl GridReader {
    pub fn new(file_path: impl AsRef<Path>) -> Self {
        Self {
            file_path: file_path.as_ref().to_string_lossy().to_string(),
        }
    }

    /// Load the coordinate axes and all five fields into memory.
    ///
    /// Fatal on a missing variable, an empty coordinate axis, or a field
    /// whose shape disagrees with the axes. The time axis is assumed to be
    /// daily-resolution starting at the configured reference date; that
    /// precondition is the caller's to guarantee and is not validated here.
    pub fn read(&self) -> Result<WeatherGrid, GridError> {
        let path = Path::new(&self.file_path);
        if !path.exists() {
            return Err(GridError::FileNotFound(self.file_path.clone()));
        }
        let file = netcdf::open(path)?;

        let latitudes = read_axis(&file, LAT_VAR)?;
        let longitudes = read_axis(&file, LON_VAR)?;
        let times = read_axis(&file, TIME_VAR)?;

        let expected = vec![times.len(), latitudes.len(), longitudes.len()];
        let [t2m_var, tcc_var, vidgf_var, sp_var, v10_var] = FIELD_VARS;
        let t2m = read_field(&file, t2m_var, &expected)?;
        let tcc = read_field(&file, tcc_var, &expected)?;
        let vidgf = read_field(&file, vidgf_var, &expected)?;
        let sp = read_field(&file, sp_var, &expected)?;
        let v10 = read_field(&file, v10_var, &expected)?;

        Ok(WeatherGrid {
            latitudes,
            longitudes,
            times,
            t2m,
            tcc,
            vidgf,
            sp,
            v10,
        })
    }
}

/// Read a 1-D coordinate variable; empty axes are fatal because
/// nearest-neighbor resolution is undefined over them.
fn read_axis(file: &netcdf::File, name: &str) -> Result<Array1<f64>, GridError> {
    let var = file
        .variable(name)
        .ok_or_else(|| GridError::MissingVariable(name.to_string()))?;
    let values: Vec<f64> = var.get_values(..)?;
    if values.is_empty() {
        return Err(GridError::EmptyAxis(name.to_string()));
    }
    Ok(Array1::from_vec(values))
}

/// Read one 3-D data variable with layout [time, lat, lon].
fn read_field(
    file: &netcdf::File,
    name: &str,
    expected: &[usize],
) -> Result<Array3<f32>, GridError> {
    let var = file
        .variable(name)
        .ok_or_else(|| GridError::MissingVariable(name.to_string()))?;
    let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
    if shape != expected {
        return Err(GridError::ShapeMismatch {
            name: name.to_string(),
            actual: shape,
            expected: expected.to_vec(),
        });
    }
    let raw: Vec<f32> = var.get_values(..)?;
    Array3::from_shape_vec((expected[0], expected[1], expected[2]), raw).map_err(|_| {
        GridError::ShapeMismatch {
            name: name.to_string(),
            actual: expected.to_vec(),
            expected: expected.to_vec(),
        }
    })
}
