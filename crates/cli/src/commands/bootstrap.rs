//! Wires configuration, data files, collaborator clients, and agents into a
//! ready orchestrator.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};
use wayfarer_agents::{
    GenerativeClassifier, LegalAgent, RouteAgent, Summarizer, TouristAgent, WeatherAgent,
};
use wayfarer_config::AppConfig;
use wayfarer_core::Result;
use wayfarer_core::generator::Generator;
use wayfarer_knowledge::{KnowledgeBase, builtin_table};
use wayfarer_orchestrator::{Orchestrator, SessionStore};
use wayfarer_providers::OpenAiCompatGenerator;
use wayfarer_retrieval::{CorpusIndex, RetrievalParams};
use wayfarer_services::{NominatimClient, OpenMeteoClient, OsrmClient};

pub fn build_orchestrator(config: &AppConfig) -> Result<Orchestrator> {
    let generator: Arc<dyn Generator> =
        Arc::new(OpenAiCompatGenerator::from_config(&config.generator)?);

    let knowledge = Arc::new(load_knowledge(&config.data.alias_table_path));
    let index = Arc::new(load_corpus(&config.data.corpus_path));

    let params = RetrievalParams {
        top_k: config.retrieval.top_k,
        fetch_k: config.retrieval.fetch_k,
        diversity_lambda: config.retrieval.diversity_lambda,
        min_score: config.retrieval.min_score,
    };

    let weather_api = Arc::new(OpenMeteoClient::new(
        config.services.open_meteo_url.as_str(),
        config.services.open_meteo_geocoding_url.as_str(),
    ));
    let geocoder = Arc::new(NominatimClient::new(
        config.services.nominatim_url.as_str(),
        &config.services.user_agent,
    ));
    let routing = Arc::new(OsrmClient::new(config.services.osrm_url.as_str()));

    let sessions = Arc::new(SessionStore::new(
        config.session.clone(),
        Summarizer::new(Arc::clone(&generator)),
    ));

    Ok(Orchestrator::new(
        Arc::new(GenerativeClassifier::new(Arc::clone(&generator))),
        Arc::new(TouristAgent::new(
            Arc::clone(&generator),
            config.generator.temperature,
            config.generator.max_tokens,
        )),
        Arc::new(LegalAgent::new(Arc::clone(&generator), index, knowledge, params)),
        Arc::new(WeatherAgent::new(weather_api)),
        Arc::new(RouteAgent::new(geocoder, routing)),
        sessions,
        config.timeouts.clone(),
    ))
}

/// Alias table from disk, or the built-in table when the file is absent.
pub fn load_knowledge(path: &str) -> KnowledgeBase {
    let path = Path::new(path);
    if !path.exists() {
        info!("No alias table at {}, using the built-in one", path.display());
        return builtin_table();
    }
    match KnowledgeBase::load(path) {
        Ok(kb) => kb,
        Err(e) => {
            warn!(error = %e, "Alias table unreadable, using the built-in one");
            builtin_table()
        }
    }
}

/// Corpus index from disk. A missing or unreadable corpus degrades to an
/// empty index: legal questions then answer "insufficient data" instead of
/// crashing the assistant.
pub fn load_corpus(path: &str) -> CorpusIndex {
    match CorpusIndex::load(Path::new(path)) {
        Ok(index) => {
            info!(chunks = index.len(), "Loaded legal corpus");
            index
        }
        Err(e) => {
            warn!(error = %e, "Legal corpus unavailable, starting with an empty index");
            CorpusIndex::from_entries(Vec::new())
        }
    }
}
