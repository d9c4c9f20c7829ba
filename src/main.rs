use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};

use wikiwatch::{plan_opens, History, PipelineConfig, SystemClock};

const CONFIG_PATH_VARIABLE: &str = "WIKIWATCH_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "./wikiwatch.json";

/// Reads one change-list fragment from stdin and prints the planned opens
/// as `title<TAB>url` lines. Opening the URLs is left to the caller.
fn main() -> Result<()> {
    env_logger::init();

    let config_path = std::env::var_os(CONFIG_PATH_VARIABLE)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = PipelineConfig::load(&config_path)?;

    let mut fragment = String::new();
    std::io::stdin()
        .read_to_string(&mut fragment)
        .context("failed to read change-list fragment from stdin")?;

    let history = History::open(&config.database_path, config.open_conflicts);
    let outcome = plan_opens(&fragment, &config, &history, &SystemClock)?;

    for open in &outcome.opens {
        println!("{}\t{}", open.entry.page_title, open.url);
    }

    Ok(())
}
