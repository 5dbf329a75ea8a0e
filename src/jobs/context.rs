//! Job context for dependency injection

use crate::db::Database;
use crate::metrics::Metrics;
use crate::services::llm::LlmClient;
use std::sync::Arc;

/// Context passed to job handlers via Apalis Data<T> pattern
///
/// Contains:
/// - Database (watchlists in, signals out)
/// - LLM client (scoring calls)
/// - Metrics (analysis statistics)
pub struct JobContext {
    pub database: Option<Arc<Database>>,
    pub llm: Arc<LlmClient>,
    pub metrics: Option<Arc<Metrics>>,
}

impl JobContext {
    pub fn new(
        database: Option<Arc<Database>>,
        llm: Arc<LlmClient>,
        metrics: Option<Arc<Metrics>>,
    ) -> Self {
        Self {
            database,
            llm,
            metrics,
        }
    }
}
