//! `wayfarer onboard` — First-time setup.

use wayfarer_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    println!("🧭 Wayfarer — First-Time Setup");
    println!("==============================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("✅ Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    if !config_path.exists() {
        std::fs::write(&config_path, AppConfig::default_toml())?;
        println!("✅ Created default config: {}", config_path.display());
    } else {
        println!("  Config file exists: {}", config_path.display());
    }

    println!();
    println!("Next steps:");
    println!("  1. Export an API key: OPENROUTER_API_KEY, OPENAI_API_KEY, or WAYFARER_API_KEY");
    println!("  2. (Optional) Point [data] at your legal corpus and alias table");
    println!("  3. Run: wayfarer ask -q \"5 days in Tokyo: sights, visa rules and the weather\"");
    println!();

    Ok(())
}
