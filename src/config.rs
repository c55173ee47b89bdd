use chrono::{Datelike, NaiveDate};
use clap::{Arg, Command};
use std::path::PathBuf;

/// End of the grid's valid time window. Incidents dated after this
/// (year, month) pair resolve to null weather values even when their
/// computed time index would nominally be in range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CoverageCutoff {
    pub year: i32,
    /// Last covered month of `year` (1-12).
    pub month: u32,
    /// When false the cutoff month itself is already out of coverage.
    pub inclusive: bool,
}

impl CoverageCutoff {
    /// True when the given incident date falls past the cutoff.
    pub fn excludes(&self, year: i32, month: u32) -> bool {
        if year > self.year {
            return true;
        }
        if year < self.year {
            return false;
        }
        if self.inclusive {
            month > self.month
        } else {
            month >= self.month
        }
    }
}

/// What to do when a single row cannot be resolved (e.g. a month-0 date).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowErrorPolicy {
    /// Assign null weather values and continue.
    Skip,
    /// Abort the whole run.
    Abort,
}

/// Main configuration structure with CLI support
#[derive(Clone, Debug)]
pub struct Config {
    /// Incident report CSV (ISO-8859-1 encoded)
    pub incidents_path: PathBuf,
    /// Gridded weather NetCDF file
    pub grid_path: PathBuf,
    /// Output CSV path
    pub output_path: PathBuf,

    /// First record date of the weather grid; time index 0.
    pub reference_date: NaiveDate,
    /// Optional end of valid coverage (None = the whole time axis).
    pub coverage_cutoff: Option<CoverageCutoff>,

    /// Keep only rows where all three terrorism criteria hold and the
    /// motive-doubt flag is unset.
    pub strict_filter: bool,
    /// Use the mathematically correct 0-360 longitude wrap instead of the
    /// legacy flat +180 shift.
    pub exact_longitude_wrap: bool,
    /// Per-row failure handling
    pub row_error_policy: RowErrorPolicy,
    /// Number of worker threads for the join (0 = rayon default)
    pub num_threads: usize,
    /// Verbose output
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            incidents_path: PathBuf::from("globalterrorismdb.csv"),
            grid_path: PathBuf::from("weather.nc"),
            output_path: PathBuf::from("incident_weather.csv"),
            // First record in the weather extract.
            reference_date: NaiveDate::from_ymd_opt(2012, 1, 1).unwrap(),
            coverage_cutoff: Some(CoverageCutoff {
                year: 2017,
                month: 6,
                inclusive: true,
            }),
            strict_filter: false,
            exact_longitude_wrap: false,
            row_error_policy: RowErrorPolicy::Skip,
            num_threads: 0,
            verbose: false,
        }
    }
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn from_args() -> Result<Self, String> {
        let app = Command::new("incident_weather")
            .version("0.1.0")
            .about("Annotate incident reports with reanalysis weather fields")
            .arg(
                Arg::new("incidents")
                    .short('i')
                    .long("incidents")
                    .value_name("CSV")
                    .help("Incident report CSV file (ISO-8859-1 encoded)")
                    .required(true),
            )
            .arg(
                Arg::new("grid")
                    .short('g')
                    .long("grid")
                    .value_name("NC")
                    .help("Gridded weather NetCDF file")
                    .required(true),
            )
            .arg(
                Arg::new("output")
                    .short('o')
                    .long("output")
                    .value_name("CSV")
                    .help("Output CSV path")
                    .default_value("incident_weather.csv"),
            )
            .arg(
                Arg::new("reference-date")
                    .long("reference-date")
                    .value_name("DATE")
                    .help("First record date of the weather grid (YYYY-MM-DD)")
                    .default_value("2012-01-01"),
            )
            .arg(
                Arg::new("coverage-end")
                    .long("coverage-end")
                    .value_name("YYYY-MM")
                    .help("Last covered month, inclusive (\"none\" to disable)")
                    .default_value("2017-06"),
            )
            .arg(
                Arg::new("coverage-end-exclusive")
                    .long("coverage-end-exclusive")
                    .help("Treat the coverage-end month itself as out of coverage")
                    .action(clap::ArgAction::SetTrue),
            )
            .arg(
                Arg::new("strict-filter")
                    .long("strict-filter")
                    .help("Drop rows failing the terrorism criteria or flagged as doubted")
                    .action(clap::ArgAction::SetTrue),
            )
            .arg(
                Arg::new("exact-longitude-wrap")
                    .long("exact-longitude-wrap")
                    .help("Use (lon + 360) mod 360 instead of the legacy +180 shift")
                    .action(clap::ArgAction::SetTrue),
            )
            .arg(
                Arg::new("on-row-error")
                    .long("on-row-error")
                    .value_name("POLICY")
                    .help("What to do when a row cannot be resolved")
                    .value_parser(["skip", "abort"])
                    .default_value("skip"),
            )
            .arg(
                Arg::new("num-threads")
                    .short('j')
                    .long("num-threads")
                    .value_name("COUNT")
                    .help("Worker threads for the join (0 = all cores)")
                    .default_value("0"),
            )
            .arg(
                Arg::new("verbose")
                    .short('v')
                    .long("verbose")
                    .help("Enable verbose output")
                    .action(clap::ArgAction::SetTrue),
            );

        let matches = app.try_get_matches().map_err(|e| e.to_string())?;

        let incidents_path = PathBuf::from(matches.get_one::<String>("incidents").unwrap());
        let grid_path = PathBuf::from(matches.get_one::<String>("grid").unwrap());
        let output_path = PathBuf::from(matches.get_one::<String>("output").unwrap());

        let reference_date = Self::parse_date(matches.get_one::<String>("reference-date").unwrap())?;

        let coverage_cutoff = Self::parse_cutoff(
            matches.get_one::<String>("coverage-end").unwrap(),
            !matches.get_flag("coverage-end-exclusive"),
        )?;

        let row_error_policy = match matches.get_one::<String>("on-row-error").unwrap().as_str() {
            "skip" => RowErrorPolicy::Skip,
            "abort" => RowErrorPolicy::Abort,
            _ => return Err("Invalid row error policy".to_string()),
        };

        let num_threads: usize = matches
            .get_one::<String>("num-threads")
            .unwrap()
            .parse()
            .map_err(|_| "Invalid number of threads")?;

        let config = Self {
            incidents_path,
            grid_path,
            output_path,
            reference_date,
            coverage_cutoff,
            strict_filter: matches.get_flag("strict-filter"),
            exact_longitude_wrap: matches.get_flag("exact-longitude-wrap"),
            row_error_policy,
            num_threads,
            verbose: matches.get_flag("verbose"),
        };

        config.validate()?;

        Ok(config)
    }

    /// Parse a date in YYYY-MM-DD format
    fn parse_date(date_str: &str) -> Result<NaiveDate, String> {
        NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
            .map_err(|_| format!("Invalid date: {}. Expected: YYYY-MM-DD", date_str))
    }

    /// Parse a coverage cutoff in YYYY-MM format, or "none"
    fn parse_cutoff(cutoff_str: &str, inclusive: bool) -> Result<Option<CoverageCutoff>, String> {
        if cutoff_str.eq_ignore_ascii_case("none") {
            return Ok(None);
        }
        let parts: Vec<&str> = cutoff_str.split('-').collect();
        if parts.len() != 2 {
            return Err(format!(
                "Invalid coverage end: {}. Expected: YYYY-MM or none",
                cutoff_str
            ));
        }
        let year: i32 = parts[0].parse().map_err(|_| "Invalid coverage end year")?;
        let month: u32 = parts[1].parse().map_err(|_| "Invalid coverage end month")?;
        if !(1..=12).contains(&month) {
            return Err(format!("Coverage end month out of range: {}", month));
        }
        Ok(Some(CoverageCutoff {
            year,
            month,
            inclusive,
        }))
    }

    /// Create a Config for testing purposes (bypasses CLI parsing)
    #[cfg(test)]
    pub fn for_testing() -> Self {
        Self::default()
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), String> {
        if !self.incidents_path.exists() {
            return Err(format!(
                "Incident file does not exist: {}",
                self.incidents_path.display()
            ));
        }
        if !self.grid_path.exists() {
            return Err(format!(
                "Grid file does not exist: {}",
                self.grid_path.display()
            ));
        }
        if let Some(cutoff) = &self.coverage_cutoff {
            if (cutoff.year, cutoff.month)
                < (self.reference_date.year(), self.reference_date.month())
            {
                return Err("Coverage end predates the grid reference date".to_string());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cutoff_inclusive_june() {
        let config = Config::for_testing();
        let cutoff = config.coverage_cutoff.unwrap();
        assert!(!cutoff.excludes(2017, 6));
        assert!(cutoff.excludes(2017, 7));
        assert!(cutoff.excludes(2018, 1));
        assert!(!cutoff.excludes(2016, 12));
    }

    #[test]
    fn test_exclusive_cutoff() {
        let cutoff = CoverageCutoff {
            year: 2017,
            month: 6,
            inclusive: false,
        };
        assert!(cutoff.excludes(2017, 6));
        assert!(!cutoff.excludes(2017, 5));
    }

    #[test]
    fn test_parse_cutoff() {
        assert_eq!(Config::parse_cutoff("none", true).unwrap(), None);
        let cutoff = Config::parse_cutoff("2017-06", true).unwrap().unwrap();
        assert_eq!((cutoff.year, cutoff.month), (2017, 6));
        assert!(cutoff.inclusive);
        assert!(Config::parse_cutoff("2017-13", true).is_err());
        assert!(Config::parse_cutoff("2017", true).is_err());
    }

    #[test]
    fn test_validate_cutoff_before_reference() {
        let config = Config {
            incidents_path: PathBuf::from("Cargo.toml"),
            grid_path: PathBuf::from("Cargo.toml"),
            coverage_cutoff: Some(CoverageCutoff {
                year: 2011,
                month: 12,
                inclusive: true,
            }),
            ..Config::for_testing()
        };
        assert!(config.validate().is_err());
    }
}
