//! `wayfarer status` — Configuration and data summary.

use wayfarer_config::AppConfig;

use super::bootstrap::{load_corpus, load_knowledge};

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    println!("🧭 Wayfarer Status");
    println!("==================\n");

    println!("Config dir:       {}", AppConfig::config_dir().display());
    println!("API key:          {}", if config.has_api_key() { "set" } else { "NOT SET" });
    println!("Model:            {}", config.generator.model);
    println!("Embedding model:  {}", config.generator.embedding_model);
    println!();

    let knowledge = load_knowledge(&config.data.alias_table_path);
    println!("Alias table:      {} ({} countries)", config.data.alias_table_path, knowledge.country_count());

    let index = load_corpus(&config.data.corpus_path);
    println!("Legal corpus:     {} ({} chunks)", config.data.corpus_path, index.len());
    println!();

    println!(
        "Retrieval:        top_k={} fetch_k={} lambda={} min_score={}",
        config.retrieval.top_k,
        config.retrieval.fetch_k,
        config.retrieval.diversity_lambda,
        config.retrieval.min_score
    );
    println!(
        "Timeouts (ms):    tourism={} legal={} weather={} route={}",
        config.timeouts.tourism_ms,
        config.timeouts.legal_ms,
        config.timeouts.weather_ms,
        config.timeouts.route_ms
    );
    println!(
        "Sessions:         max_turns={} ttl={}min cap={}",
        config.session.max_turns, config.session.ttl_minutes, config.session.max_sessions
    );

    Ok(())
}
