use crate::clean::CleanIncident;
use crate::config::Config;
use crate::data_io::{WeatherGrid, WeatherSample};
use crate::join::{JoinError, Joiner};
use rayon::prelude::*;

/// Annotate every row serially. One index resolution and five reads per
/// row; output order matches input order.
pub fn join_table(
    config: &Config,
    rows: &[CleanIncident],
    grid: &WeatherGrid,
) -> Result<Vec<Option<WeatherSample>>, JoinError> {
    let joiner = Joiner::new(grid, config);
    rows.iter()
        .enumerate()
        .map(|(i, row)| joiner.annotate(i, row))
        .collect()
}

/// Annotate every row in parallel using Rayon.
///
/// Rows are independent and the grid is read-only, so no locking is
/// needed; output is identical to the serial pass.
pub fn join_table_parallel(
    config: &Config,
    rows: &[CleanIncident],
    grid: &WeatherGrid,
) -> Result<Vec<Option<WeatherSample>>, JoinError> {
    let joiner = Joiner::new(grid, config);
    let run = || {
        rows.par_iter()
            .enumerate()
            .map(|(i, row)| joiner.annotate(i, row))
            .collect::<Result<Vec<_>, _>>()
    };

    if config.num_threads > 0 {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(config.num_threads)
            .build()
        {
            Ok(pool) => pool.install(run),
            Err(e) => {
                eprintln!("Warning: could not build thread pool: {}", e);
                run()
            }
        }
    } else {
        run()
    }
}
