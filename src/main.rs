use argh::FromArgs;
use comfort_map::{ComfortMap, ComfortMapConfig, ComfortMapError};
use std::path::PathBuf;

#[derive(FromArgs)]
/// Build a monthly climate-normals dataset for a list of cities and an interactive comfort map
struct Args {
    /// city table with City and Country columns (default: cities_200.csv)
    #[argh(option, short = 'i')]
    input: Option<PathBuf>,

    /// directory for the CSV, JSON and HTML outputs (default: current directory)
    #[argh(option, short = 'o')]
    output_dir: Option<PathBuf>,

    /// directory for cached station metadata and normals (default: system cache dir)
    #[argh(option)]
    cache_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = env_logger::Env::default().default_filter_or("info");
    env_logger::Builder::from_env(env)
        .target(env_logger::Target::Stdout)
        .init();

    let args: Args = argh::from_env();
    let mut config = ComfortMapConfig::default();
    if let Some(input) = args.input {
        config.input = input;
    }
    if let Some(output_dir) = args.output_dir {
        config.output_dir = output_dir;
    }
    config.cache_dir = args.cache_dir;

    let pipeline = ComfortMap::new(config).await?;
    let summary = match pipeline.run().await {
        Ok(summary) => summary,
        Err(e @ ComfortMapError::NoDataCollected { .. }) => {
            log::error!("{}", e);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    println!(
        "Done.\n- CSV: {}\n- JSON: {}\n- Map: {}",
        summary.paths.csv.display(),
        summary.paths.json.display(),
        summary.paths.html.display()
    );
    println!(
        "Tip: open {} in your browser.",
        summary.paths.html.display()
    );
    Ok(())
}
