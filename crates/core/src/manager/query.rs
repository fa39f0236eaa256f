//! Cached query requests

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cache::CacheConfig;
use crate::error::PerfResult;
use crate::ports::{Rows, Statement};

/// One statement, or several executed together
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryRequest {
    Single(Statement),
    Many(Vec<Statement>),
}

impl QueryRequest {
    pub fn statements(&self) -> &[Statement] {
        match self {
            Self::Single(statement) => std::slice::from_ref(statement),
            Self::Many(statements) => statements,
        }
    }

    pub fn into_statements(self) -> Vec<Statement> {
        match self {
            Self::Single(statement) => vec![statement],
            Self::Many(statements) => statements,
        }
    }

    /// Fold executor output back into the request's shape: a single row set
    /// for `Single`, an array of row sets for `Many`
    pub(crate) fn shape(&self, mut rows: Vec<Rows>) -> Rows {
        match self {
            Self::Single(_) => rows.pop().unwrap_or(Value::Null),
            Self::Many(_) => Value::Array(rows),
        }
    }

    /// Cache key for `query_key` and this request's encoded statements
    pub(crate) fn cache_key(&self, query_key: &str) -> PerfResult<String> {
        let encoded = serde_json::to_vec(self)?;
        let digest = blake3::hash(&encoded).to_hex();
        Ok(format!("query:{query_key}:{}", &digest.as_str()[..16]))
    }
}

impl From<Statement> for QueryRequest {
    fn from(statement: Statement) -> Self {
        Self::Single(statement)
    }
}

impl From<Vec<Statement>> for QueryRequest {
    fn from(statements: Vec<Statement>) -> Self {
        Self::Many(statements)
    }
}

/// Cache policy plus execution hints for [`CacheManager::query`]
///
/// `use_index` and `prefetch` are accepted for callers that pass them but do
/// not change execution.
///
/// [`CacheManager::query`]: super::CacheManager::query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryOptions {
    pub cache: CacheConfig,
    /// Route through the batching path, flushing once this many callers joined
    #[serde(default)]
    pub batch_size: Option<usize>,
    /// Fan multi-statement requests out concurrently
    #[serde(default)]
    pub parallel: bool,
    #[serde(default)]
    pub use_index: bool,
    #[serde(default)]
    pub prefetch: bool,
}

impl QueryOptions {
    pub fn new(cache: CacheConfig) -> Self {
        Self { cache, batch_size: None, parallel: false, use_index: false, prefetch: false }
    }

    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = Some(size);
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}
