use chrono::Datelike;
use incident_weather::{
    clean::clean,
    config::Config,
    data_io::{GridReader, IncidentReader, OutputWriter},
    parallel::join_table_parallel,
};

fn main() {
    let config = match Config::from_args() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&config) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(config: &Config) -> Result<(), String> {
    let incidents = IncidentReader::new(&config.incidents_path)
        .read()
        .map_err(|e| e.to_string())?;
    println!("Incident table loaded ({} rows)", incidents.len());

    let grid = GridReader::new(&config.grid_path)
        .read()
        .map_err(|e| e.to_string())?;
    println!(
        "Weather grid loaded ({} time steps, {} x {} cells)",
        grid.times.len(),
        grid.latitudes.len(),
        grid.longitudes.len()
    );

    let cleaned = clean(
        &incidents,
        config.reference_date.year(),
        config.strict_filter,
    )
    .map_err(|e| e.to_string())?;
    println!("Cleaning complete ({} rows retained)", cleaned.len());

    let samples = join_table_parallel(config, &cleaned, &grid).map_err(|e| e.to_string())?;
    let annotated = samples.iter().filter(|s| s.is_some()).count();
    println!(
        "Weather fields merged ({} of {} rows in coverage)",
        annotated,
        samples.len()
    );

    OutputWriter::new(&config.output_path)
        .write(&cleaned, &samples)
        .map_err(|e| e.to_string())?;
    println!("File write complete: {}", config.output_path.display());

    Ok(())
}
