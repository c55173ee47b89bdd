use incident_weather::clean::clean;
use incident_weather::config::Config;
use incident_weather::data_io::{
    IncidentReader, OutputWriter, WeatherGrid, REQUIRED_COLUMNS,
};
use incident_weather::parallel::{join_table, join_table_parallel};
use ndarray::{Array1, Array3};
use std::io::Write;
use tempfile::TempDir;

fn synthetic_grid() -> WeatherGrid {
    // Ten daily steps from 2012-01-01, 3 latitudes, 4 longitudes (0-360).
    let nt = 10;
    let nlat = 3;
    let nlon = 4;
    let fill = |offset: f32| {
        Array3::from_shape_fn((nt, nlat, nlon), move |(t, la, lo)| {
            offset + (t * 100 + la * 10 + lo) as f32
        })
    };
    WeatherGrid {
        latitudes: Array1::from_vec(vec![60.0, 30.0, 0.0]),
        longitudes: Array1::from_vec(vec![0.0, 90.0, 224.0, 300.0]),
        times: Array1::from_iter((0..nt).map(|t| t as f64)),
        t2m: fill(0.0),
        tcc: fill(1000.0),
        vidgf: fill(2000.0),
        sp: fill(3000.0),
        v10: fill(4000.0),
    }
}

fn write_incident_csv(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("incidents.csv");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "eventid,{},scite1", REQUIRED_COLUMNS.join(",")).unwrap();
    // Baghdad-ish row inside coverage.
    writeln!(
        file,
        "1,2012,1,3,33.5,44.0,0,0,1,1,1,0,0,1,0,-9,0,0,\
         Iraq,Middle East & North Africa,Bombing/Explosion,Police,Explosives,\
         checkpoint,UNK,A summary,2.0,5.0,cite"
    )
    .unwrap();
    // Pre-reference row.
    writeln!(
        file,
        "2,2011,12,31,33.5,44.0,0,0,1,1,1,0,0,1,0,0,0,0,\
         Iraq,Middle East & North Africa,Armed Assault,Military,Firearms,\
         patrol,Some Group,,1.0,0.0,cite"
    )
    .unwrap();
    // Too old, dropped by the year filter.
    writeln!(
        file,
        "3,2001,9,11,40.7,-74.0,0,0,1,1,1,0,1,1,1,1,0,0,\
         United States,North America,Hijacking,Airports & Aircraft,Melee,\
         airport,Some Group,,10.0,20.0,cite"
    )
    .unwrap();
    // Missing casualty counts, imputed from the column medians.
    writeln!(
        file,
        "4,2012,1,1,60.0,-180.0,0,0,1,1,1,0,0,1,0,0,0,0,\
         Iraq,Middle East & North Africa,Bombing/Explosion,Police,Explosives,\
         checkpoint,UNK,,,,cite"
    )
    .unwrap();
    path
}

fn config_for(dir: &TempDir, incidents: &std::path::Path) -> Config {
    Config {
        incidents_path: incidents.to_path_buf(),
        grid_path: incidents.to_path_buf(), // unused; grid built in memory
        output_path: dir.path().join("out.csv"),
        coverage_cutoff: None,
        ..Config::default()
    }
}

#[test]
fn test_full_pipeline_on_synthetic_data() {
    let dir = TempDir::new().unwrap();
    let incidents_path = write_incident_csv(&dir);
    let config = config_for(&dir, &incidents_path);

    let raw = IncidentReader::new(&incidents_path).read().unwrap();
    assert_eq!(raw.len(), 4);

    let cleaned = clean(&raw, 2011, false).unwrap();
    // 2001 row dropped, the rest retained in order.
    assert_eq!(cleaned.len(), 3);
    assert_eq!(cleaned[0].iyear, 2012);
    assert_eq!(cleaned[0].gname, "unknown");
    assert_eq!(cleaned[0].claimed, 0); // -9 resolved
    // Row 4 imputed with medians of [2, 1] and [5, 0].
    assert_eq!(cleaned[2].nkill, 2);
    assert_eq!(cleaned[2].nwound, 3);
    assert_eq!(cleaned[2].ncasualties, 5);
    assert_eq!(cleaned[2].has_casualties, 1);

    let grid = synthetic_grid();
    let samples = join_table(&config, &cleaned, &grid).unwrap();
    assert_eq!(samples.len(), 3);

    // Row 1: 2012-01-03 is step 2; lat 33.5 -> index 1; lon 44+180=224 -> index 2.
    let first = samples[0].unwrap();
    assert_eq!(first.t2m, 212.0);
    assert_eq!(first.sp, 3212.0);

    // Row 2 predates the reference date.
    assert_eq!(samples[1], None);

    // Row 4: reference date itself is step 0; lat 60 -> 0; lon -180+180=0 -> 0.
    let last = samples[2].unwrap();
    assert_eq!(last.t2m, 0.0);

    let parallel = join_table_parallel(&config, &cleaned, &grid).unwrap();
    assert_eq!(samples, parallel);

    OutputWriter::new(&config.output_path)
        .write(&cleaned, &samples)
        .unwrap();

    let written = std::fs::read_to_string(&config.output_path).unwrap();
    let mut lines = written.lines();
    let header = lines.next().unwrap();
    assert!(header.starts_with("iyear,"));
    assert!(header.ends_with("t2m,tcc,vidgf,sp,v10"));

    let rows: Vec<&str> = lines.collect();
    assert_eq!(rows.len(), 3);
    assert!(rows[0].ends_with("212,1212,2212,3212,4212"));
    // Null weather values are written as trailing empty fields.
    assert!(rows[1].ends_with(",,,,"));
}

#[test]
fn test_cutoff_applies_in_pipeline() {
    let dir = TempDir::new().unwrap();
    let incidents_path = write_incident_csv(&dir);
    let mut config = config_for(&dir, &incidents_path);
    config.coverage_cutoff = Some(incident_weather::config::CoverageCutoff {
        year: 2012,
        month: 1,
        inclusive: false,
    });

    let raw = IncidentReader::new(&incidents_path).read().unwrap();
    let cleaned = clean(&raw, 2011, false).unwrap();
    let samples = join_table(&config, &cleaned, &synthetic_grid()).unwrap();
    // Every 2012 row falls in the excluded cutoff month.
    assert!(samples.iter().all(|s| s.is_none()));
}

#[test]
fn test_strict_filter_in_pipeline() {
    let dir = TempDir::new().unwrap();
    let incidents_path = write_incident_csv(&dir);

    let raw = IncidentReader::new(&incidents_path).read().unwrap();
    let lenient = clean(&raw, 2011, false).unwrap();
    let strict = clean(&raw, 2011, true).unwrap();
    // All retained synthetic rows satisfy the criteria, so strict mode
    // changes nothing here.
    assert_eq!(lenient.len(), strict.len());
}
