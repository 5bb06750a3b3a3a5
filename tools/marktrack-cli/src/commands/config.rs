//! Show the effective configuration.

use std::path::Path;

use marktrack_common::config::AppConfig;

pub fn run(app: &AppConfig, path: &Path, init: bool) -> anyhow::Result<()> {
    if init {
        if path.exists() {
            println!("Config already exists: {}", path.display());
        } else {
            AppConfig::default().save_to(path)?;
            println!("Wrote default config: {}", path.display());
        }
    }

    println!("# {}", path.display());
    println!("{}", serde_json::to_string_pretty(app)?);
    Ok(())
}
