//! `wayfarer doctor` — Diagnose configuration and data-file health.

use std::path::Path;

use wayfarer_config::AppConfig;
use wayfarer_knowledge::KnowledgeBase;
use wayfarer_retrieval::CorpusIndex;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🧭 Wayfarer Doctor");
    println!("==================\n");

    let mut problems = 0usize;

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("✅ Config loads and validates");
            config
        }
        Err(e) => {
            println!("❌ Config problem: {e}");
            return Err("Fix the config file before continuing.".into());
        }
    };

    if config.has_api_key() {
        println!("✅ Generator API key present");
    } else {
        println!("❌ No generator API key (OPENROUTER_API_KEY / OPENAI_API_KEY / WAYFARER_API_KEY)");
        problems += 1;
    }

    let alias_path = Path::new(&config.data.alias_table_path);
    if !alias_path.exists() {
        println!("⚠️  No alias table at {} (built-in table will be used)", alias_path.display());
    } else {
        match KnowledgeBase::load(alias_path) {
            Ok(kb) => println!("✅ Alias table parses ({} countries)", kb.country_count()),
            Err(e) => {
                println!("❌ Alias table broken: {e}");
                problems += 1;
            }
        }
    }

    let corpus_path = Path::new(&config.data.corpus_path);
    if !corpus_path.exists() {
        println!(
            "⚠️  No legal corpus at {} (legal questions will report insufficient data)",
            corpus_path.display()
        );
    } else {
        match CorpusIndex::load(corpus_path) {
            Ok(index) => {
                if index.is_empty() {
                    println!("⚠️  Legal corpus parses but holds zero chunks");
                } else {
                    println!("✅ Legal corpus parses ({} chunks)", index.len());
                }
            }
            Err(e) => {
                println!("❌ Legal corpus broken: {e}");
                problems += 1;
            }
        }
    }

    println!();
    if problems == 0 {
        println!("All checks passed.");
        Ok(())
    } else {
        Err(format!("{problems} problem(s) found. See above.").into())
    }
}
