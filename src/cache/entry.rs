use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One cached classification result, keyed by content hash and model.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub id: String,
    pub filename: String,
    pub file_hash: String,
    pub result: Value,
    pub timestamp: i64,
    pub model_used: String,
    pub expires_at: i64,
}

impl CacheEntry {
    #[inline]
    #[must_use]
    pub const fn is_expired_at(&self, now_millis: i64) -> bool {
        self.expires_at <= now_millis
    }
}
