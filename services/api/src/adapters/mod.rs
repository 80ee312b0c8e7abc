pub mod db;
pub mod feed;
pub mod heuristic;
pub mod llm;
pub mod tokens;

pub use db::DbAdapter;
pub use feed::SimulatedFeed;
pub use heuristic::HeuristicClassifier;
pub use llm::LlmClassifier;
pub use tokens::StaticTokenIdentity;
