//! `wayfarer ask` — Interactive or single-question mode.

use std::io::Write;

use wayfarer_config::AppConfig;
use wayfarer_core::Error;
use wayfarer_core::query::Query;
use wayfarer_core::session::SessionId;

use super::bootstrap::build_orchestrator;

pub async fn run(
    question: Option<String>,
    session: Option<String>,
    location: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()
        .map_err(|e| Error::Config { message: format!("Failed to load config: {e}") })?;

    // Check for API key early — give a clear error
    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    OPENROUTER_API_KEY   (recommended)");
        eprintln!("    OPENAI_API_KEY       (for OpenAI direct)");
        eprintln!("    WAYFARER_API_KEY     (generic)");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let orchestrator = build_orchestrator(&config)?;
    let session = match session {
        Some(name) => SessionId::from(&name),
        None => SessionId::new(),
    };

    let make_query = |text: &str| {
        let query = Query::new(text);
        match &location {
            Some(hint) => query.with_location_hint(hint.as_str()),
            None => query,
        }
    };

    if let Some(text) = question {
        let response = orchestrator.handle(make_query(&text), &session).await;
        println!("{}", response.text);
        return Ok(());
    }

    // Interactive mode
    println!("🧭 Wayfarer — sights, visas, weather, routes. Type 'exit' to quit.\n");
    let stdin = std::io::stdin();
    loop {
        print!("you> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if text == "exit" || text == "quit" {
            break;
        }

        let response = orchestrator.handle(make_query(text), &session).await;
        println!("\n{}\n", response.text);
    }

    println!("Safe travels!");
    Ok(())
}
