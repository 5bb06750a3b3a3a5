//! List supported marker dictionaries.

use std::str::FromStr;

use marktrack_common::config::AppConfig;
use marktrack_model::dictionary::MarkerDictionary;

pub fn run(app: &AppConfig) -> anyhow::Result<()> {
    let configured = MarkerDictionary::from_str(&app.analysis.dictionary).ok();

    println!("Marker dictionaries");
    println!("{}", "=".repeat(50));
    for (grid, dictionaries) in MarkerDictionary::grouped() {
        let names: Vec<String> = dictionaries
            .iter()
            .map(|d| {
                if Some(*d) == configured {
                    format!("{d}*")
                } else {
                    d.to_string()
                }
            })
            .collect();
        println!("{:>4}  {}", grid.to_string(), names.join("  "));
    }
    println!();
    println!("* configured default");

    if marktrack_engine::backend::video_backend_available() {
        println!("[OK] Video backend: OpenCV");
    } else {
        println!("[WARN] Video backend: not built (use `replay` with a detection stream)");
    }
    Ok(())
}
