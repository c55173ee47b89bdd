//! Cleaning and normalization of the raw incident table: row filtering,
//! sentinel resolution, text normalization, median imputation, and the
//! derived casualty columns. Output rows are ready for the joiner.

use crate::data_io::RawIncident;
use thiserror::Error;

/// Flag columns where the -9 "unknown" sentinel is resolved to 0. For
/// these particular flags an unknown is statistically far more often a
/// "no" than a "yes".
const SENTINEL_TO_NO: [&str; 5] = ["vicinity", "doubtterr", "claimed", "property", "ishostkid"];

/// The verbose vehicle weapon label in the source vocabulary; shortened to
/// "Vehicle" by exact match.
const VEHICLE_LABEL_LONG: &str =
    "Vehicle (not to include vehicle-borne explosives, i.e., car or truck bombs)";
const VEHICLE_LABEL_SHORT: &str = "Vehicle";

#[derive(Error, Debug)]
pub enum CleanError {
    #[error("Cannot impute column {0}: no non-missing values to compute a median from")]
    ImputationUndefined(String),
}

/// One cleaned incident row, restricted to the column whitelist.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanIncident {
    pub iyear: i32,
    pub imonth: i32,
    pub iday: i32,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    pub extended: i32,
    pub vicinity: i32,
    pub crit1: i32,
    pub crit2: i32,
    pub crit3: i32,
    pub doubtterr: i32,
    pub multiple: i32,
    pub success: i32,
    pub suicide: i32,
    pub claimed: i32,
    pub property: i32,
    pub ishostkid: i32,

    pub country_txt: String,
    pub region_txt: String,
    pub attacktype1_txt: String,
    pub targtype1_txt: String,
    pub weaptype1_txt: String,

    pub target1: String,
    pub gname: String,
    pub summary: String,

    pub nkill: i64,
    pub nwound: i64,
    pub ncasualties: i64,
    pub has_casualties: i32,
}

/// Run the full cleaning stage.
///
/// Rows dated before `min_year` are dropped; with `strict` set, rows are
/// additionally dropped unless all three terrorism criteria are raw 1 and
/// the motive-doubt flag is raw 0 (an unknown doubt also drops the row).
/// Casualty medians are computed after filtering and before imputation;
/// an all-missing casualty column aborts the run.
pub fn clean(
    rows: &[RawIncident],
    min_year: i32,
    strict: bool,
) -> Result<Vec<CleanIncident>, CleanError> {
    let retained: Vec<&RawIncident> = rows
        .iter()
        .filter(|row| row.iyear >= min_year)
        .filter(|row| !strict || passes_strict_filter(row))
        .collect();

    let nkill_median = median(retained.iter().filter_map(|r| r.nkill))
        .ok_or_else(|| CleanError::ImputationUndefined("nkill".to_string()))?;
    let nwound_median = median(retained.iter().filter_map(|r| r.nwound))
        .ok_or_else(|| CleanError::ImputationUndefined("nwound".to_string()))?;

    Ok(retained
        .into_iter()
        .map(|row| clean_row(row, nkill_median, nwound_median))
        .collect())
}

/// Three independent is-this-terrorism criteria all affirmed, and the
/// motive-doubt flag affirmatively unset.
fn passes_strict_filter(row: &RawIncident) -> bool {
    row.crit1 == Some(1)
        && row.crit2 == Some(1)
        && row.crit3 == Some(1)
        && row.doubtterr == Some(0)
}

fn clean_row(row: &RawIncident, nkill_median: f64, nwound_median: f64) -> CleanIncident {
    let nkill = impute_count(row.nkill, nkill_median);
    let nwound = impute_count(row.nwound, nwound_median);
    let ncasualties = nkill + nwound;

    CleanIncident {
        iyear: row.iyear,
        imonth: row.imonth,
        iday: row.iday,
        latitude: row.latitude,
        longitude: row.longitude,

        extended: resolve_flag("extended", row.extended),
        vicinity: resolve_flag("vicinity", row.vicinity),
        crit1: resolve_flag("crit1", row.crit1),
        crit2: resolve_flag("crit2", row.crit2),
        crit3: resolve_flag("crit3", row.crit3),
        doubtterr: resolve_flag("doubtterr", row.doubtterr),
        multiple: resolve_flag("multiple", row.multiple),
        success: resolve_flag("success", row.success),
        suicide: resolve_flag("suicide", row.suicide),
        claimed: resolve_flag("claimed", row.claimed),
        property: resolve_flag("property", row.property),
        ishostkid: resolve_flag("ishostkid", row.ishostkid),

        country_txt: categorical(&row.country_txt),
        region_txt: categorical(&row.region_txt),
        attacktype1_txt: categorical(&row.attacktype1_txt),
        targtype1_txt: categorical(&row.targtype1_txt),
        weaptype1_txt: shorten_weapon_label(categorical(&row.weaptype1_txt)),

        target1: descriptive(&row.target1),
        gname: descriptive(&row.gname),
        summary: descriptive(&row.summary),

        nkill,
        nwound,
        ncasualties,
        has_casualties: if ncasualties == 0 { 0 } else { 1 },
    }
}

/// Resolve a raw flag value to {0, 1}.
///
/// -9 means "unknown" and resolves to 0 for the designated columns. The
/// value 2 is meaningless for a binary field and is remapped to 1 as a
/// data-entry correction, not an unknown.
fn resolve_flag(name: &str, value: Option<i32>) -> i32 {
    match value {
        Some(-9) if SENTINEL_TO_NO.contains(&name) => 0,
        Some(2) => 1,
        Some(v) if v == 0 || v == 1 => v,
        Some(_) | None => 0,
    }
}

/// Categorical labels keep their case; only missing values are coalesced.
fn categorical(value: &Option<String>) -> String {
    match value {
        Some(s) if !s.is_empty() => s.clone(),
        _ => "unknown".to_string(),
    }
}

/// Descriptive free text is lowercased, with missing text and the
/// abbreviated "unk" token both coalesced to the canonical "unknown".
fn descriptive(value: &Option<String>) -> String {
    match value {
        Some(s) if !s.is_empty() => {
            let lowered = s.to_lowercase();
            if lowered == "unk" {
                "unknown".to_string()
            } else {
                lowered
            }
        }
        _ => "unknown".to_string(),
    }
}

fn shorten_weapon_label(label: String) -> String {
    if label == VEHICLE_LABEL_LONG {
        VEHICLE_LABEL_SHORT.to_string()
    } else {
        label
    }
}

/// Impute a missing count with the column median, then round to integer.
fn impute_count(value: Option<f64>, column_median: f64) -> i64 {
    value.unwrap_or(column_median).round() as i64
}

/// Median of the non-missing values; None when the iterator is empty.
fn median(values: impl Iterator<Item = f64>) -> Option<f64> {
    let mut sorted: Vec<f64> = values.filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}
