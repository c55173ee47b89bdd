use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Columns the loader requires in the incident CSV. Anything else in the
/// source file is ignored; the cleaning stage works on this whitelist.
pub const REQUIRED_COLUMNS: [&str; 27] = [
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
];

#[derive(Error, Debug)]
pub enum TableError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("File not found: {0}")]
    FileNotFound(String),
}

/// One incident report row as loaded, values still in their raw encoding
/// (-9 "unknown" sentinels, absent counts, free-form text).
#[derive(Debug, Clone, Deserialize)]
pub struct RawIncident {
    pub iyear: i32,
    /// May be 0 when the month is unknown
    pub imonth: i32,
    /// May be 0 when the day is unknown
    pub iday: i32,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    pub extended: Option<i32>,
    pub vicinity: Option<i32>,
    pub crit1: Option<i32>,
    pub crit2: Option<i32>,
    pub crit3: Option<i32>,
    pub doubtterr: Option<i32>,
    pub multiple: Option<i32>,
    pub success: Option<i32>,
    pub suicide: Option<i32>,
    pub claimed: Option<i32>,
    pub property: Option<i32>,
    pub ishostkid: Option<i32>,

    pub country_txt: Option<String>,
    pub region_txt: Option<String>,
    pub attacktype1_txt: Option<String>,
    pub targtype1_txt: Option<String>,
    pub weaptype1_txt: Option<String>,

    pub target1: Option<String>,
    pub gname: Option<String>,
    pub summary: Option<String>,

    pub nkill: Option<f64>,
    pub nwound: Option<f64>,
}

/// CSV reader for the incident report table
pub struct IncidentReader {
    pub file_path: String,
}

impl IncidentReader {
    pub fn new(file_path: impl AsRef<Path>) -> Self {
        Self {
            file_path: file_path.as_ref().to_string_lossy().to_string(),
        }
    }

    /// Load the full table into memory.
    ///
    /// The source file uses the legacy ISO-8859-1 single-byte encoding, so
    /// the bytes are decoded to UTF-8 before CSV parsing. A missing
    /// required column is fatal and reported by name.
    pub fn read(&self) -> Result<Vec<RawIncident>, TableError> {
        let path = Path::new(&self.file_path);
        if !path.exists() {
            return Err(TableError::FileNotFound(self.file_path.clone()));
        }
        let bytes = fs::read(path)?;
        let text = decode_latin1(&bytes);

        let mut reader = csv::ReaderBuilder::new()
            .flexible(false)
            .from_reader(text.as_bytes());

        let headers = reader.headers()?.clone();
        for required in REQUIRED_COLUMNS {
            if !headers.iter().any(|h| h == required) {
                return Err(TableError::MissingColumn(required.to_string()));
            }
        }

        let mut rows = Vec::new();
        for record in reader.deserialize() {
            let row: RawIncident = record?;
            rows.push(row);
        }
        Ok(rows)
    }
}

/// Decode ISO-8859-1 bytes to a UTF-8 string. Every byte maps to the
/// Unicode code point of the same value, so the conversion is total.
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn header_line() -> String {
        REQUIRED_COLUMNS.join(",")
    }

    #[test]
    fn test_decode_latin1() {
        // 0xE9 is 'é' in ISO-8859-1; invalid as a lone UTF-8 byte.
        let bytes = [b'M', b'e', b'd', 0xE9, b'a'];
        assert_eq!(decode_latin1(&bytes), "Med\u{e9}a");
    }

    #[test]
    fn test_read_missing_column() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "iyear,imonth,iday").unwrap();
        writeln!(file, "2014,6,1").unwrap();

        let reader = IncidentReader::new(file.path());
        let result = reader.read();
        assert!(matches!(result, Err(TableError::MissingColumn(_))));
    }

    #[test]
    fn test_read_row_with_sentinels_and_gaps() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", header_line()).unwrap();
        writeln!(
            file,
            "2014,6,1,33.5,44.0,0,0,1,1,1,-9,0,1,0,-9,2,0,\
             Iraq,Middle East & North Africa,Bombing/Explosion,Police,Explosives,\
             checkpoint,Unknown,,3.0,"
        )
        .unwrap();

        let reader = IncidentReader::new(file.path());
        let rows = reader.read().unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.iyear, 2014);
        assert_eq!(row.doubtterr, Some(-9));
        assert_eq!(row.property, Some(2));
        assert_eq!(row.nkill, Some(3.0));
        assert_eq!(row.nwound, None);
        assert_eq!(row.summary, None);
    }

    #[test]
    fn test_read_nonexistent_file() {
        let reader = IncidentReader::new("nonexistent/incidents.csv");
        assert!(matches!(reader.read(), Err(TableError::FileNotFound(_))));
    }
}
