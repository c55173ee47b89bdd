use super::{WeatherSample, WEATHER_COLUMNS};
use crate::clean::CleanIncident;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Column order of the output table; the five weather columns trail.
const OUTPUT_COLUMNS: [&str; 29] = [
    "iyear",
    "imonth",
    "iday",
    "latitude",
    "longitude",
    "extended",
    "vicinity",
    "crit1",
    "crit2",
    "crit3",
    "doubtterr",
    "multiple",
    "success",
    "suicide",
    "claimed",
    "property",
    "ishostkid",
    "country_txt",
    "region_txt",
    "attacktype1_txt",
    "targtype1_txt",
    "weaptype1_txt",
    "target1",
    "gname",
    "summary",
    "nkill",
    "nwound",
    "ncasualties",
    "has_casualties",
];

/// CSV writer for the annotated incident table
pub struct OutputWriter {
    file_path: String,
}

impl OutputWriter {
    pub fn new(file_path: impl AsRef<Path>) -> Self {
        Self {
            file_path: file_path.as_ref().to_string_lossy().to_string(),
        }
    }

    /// Write the cleaned rows with their weather annotations, preserving
    /// row order. No leading index column; null weather values are
    /// written as empty fields.
    pub fn write(
        &self,
        rows: &[CleanIncident],
        samples: &[Option<WeatherSample>],
    ) -> Result<(), WriteError> {
        let mut writer = csv::Writer::from_path(&self.file_path)?;

        let header: Vec<&str> = OUTPUT_COLUMNS
            .iter()
            .chain(WEATHER_COLUMNS.iter())
            .copied()
            .collect();
        writer.write_record(&header)?;

        for (row, sample) in rows.iter().zip(samples.iter()) {
            let mut record = vec![
                row.iyear.to_string(),
                row.imonth.to_string(),
                row.iday.to_string(),
                format_coord(row.latitude),
                format_coord(row.longitude),
                row.extended.to_string(),
                row.vicinity.to_string(),
                row.crit1.to_string(),
                row.crit2.to_string(),
                row.crit3.to_string(),
                row.doubtterr.to_string(),
                row.multiple.to_string(),
                row.success.to_string(),
                row.suicide.to_string(),
                row.claimed.to_string(),
                row.property.to_string(),
                row.ishostkid.to_string(),
                row.country_txt.clone(),
                row.region_txt.clone(),
                row.attacktype1_txt.clone(),
                row.targtype1_txt.clone(),
                row.weaptype1_txt.clone(),
                row.target1.clone(),
                row.gname.clone(),
                row.summary.clone(),
                row.nkill.to_string(),
                row.nwound.to_string(),
                row.ncasualties.to_string(),
                row.has_casualties.to_string(),
            ];
            match sample {
                Some(s) => {
                    record.push(s.t2m.to_string());
                    record.push(s.tcc.to_string());
                    record.push(s.vidgf.to_string());
                    record.push(s.sp.to_string());
                    record.push(s.v10.to_string());
                }
                None => record.extend(std::iter::repeat(String::new()).take(5)),
            }
            writer.write_record(&record)?;
        }

        writer.flush()?;
        Ok(())
    }
}

fn format_coord(value: Option<f64>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => String::new(),
    }
}
