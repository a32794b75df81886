use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use ftail::Ftail;
use log::{info, LevelFilter};

const LOGS_DIR: &str = ".logs";
const PKG_NAME: &str = env!("CARGO_PKG_NAME");

fn logs_dir() -> Result<PathBuf> {
    let home_folder = env::home_dir().ok_or_else(|| anyhow!("Could not determine $HOME"))?;
    Ok(home_folder.join(LOGS_DIR).join(PKG_NAME))
}

/// Warnings and errors go to the console, everything from `info` up goes to
/// `~/.logs/matchmind/matchmind.log`.
pub fn init_logger() -> Result<()> {
    let logs_path = logs_dir()?;
    let logs_file = logs_path.join(format!("{}.log", PKG_NAME));

    // idempotent
    fs::create_dir_all(&logs_path)
        .map_err(|e| anyhow!("Could not create logs dir at {:#?}: {}", &logs_path, e))?;

    Ftail::new()
        .console(LevelFilter::Warn)
        .single_file(&logs_file, true, LevelFilter::Info)
        .init()
        .map_err(|e| anyhow!("Could not initialize logger: {}", e))?;

    info!("Logger initialized at {}", logs_file.display());
    Ok(())
}
