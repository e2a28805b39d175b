//! Context summary + context-step cache persistence port (`spec.md` §4.7).

use async_trait::async_trait;

use crate::domain::context::{ContextCacheEntry, ContextCacheKey, ContextSummaryRecord};
use crate::domain::identifiers::SessionId;
use crate::domain::AppError;

#[async_trait]
pub trait ContextStore: Send + Sync {
    async fn persist_summary(&self, record: ContextSummaryRecord) -> Result<(), AppError>;
    async fn cache_get(&self, key: &ContextCacheKey) -> Result<Option<ContextCacheEntry>, AppError>;
    async fn cache_put(&self, key: ContextCacheKey, entry: ContextCacheEntry) -> Result<(), AppError>;

    /// Last `limit` persisted summaries for one session/section, oldest first
    /// (`spec.md` §4.7 step 3a, "prior M summaries").
    async fn recent_summaries(&self, session_id: &SessionId, section_name: &str, limit: u32) -> Result<Vec<ContextSummaryRecord>, AppError>;
}
