//! Domain agents.
//!
//! Each agent turns a classified query into one structured payload for its
//! domain. Agents never talk to each other; the orchestrator owns the data
//! flow between them (the waypoint-route contract included). Failures are
//! absorbed into `DomainFailure` markers so one broken collaborator never
//! takes down a sibling domain.

pub mod classifier;
pub mod json;
pub mod legal;
pub mod route;
pub mod summarizer;
pub mod testing;
pub mod tourist;
pub mod weather;

pub use classifier::{GenerativeClassifier, IntentClassifier, RuleClassifier};
pub use legal::LegalAgent;
pub use route::RouteAgent;
pub use summarizer::Summarizer;
pub use tourist::TouristAgent;
pub use weather::WeatherAgent;
