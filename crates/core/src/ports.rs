//! Port interfaces consumed by the performance layer
//!
//! The core never interprets SQL. Statements are opaque text plus positional
//! parameters, executed through whatever [`QueryExecutor`] the host injects.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PerfResult;

/// Rows returned by the database driver, kept opaque
pub type Rows = Value;

/// A single statement: SQL text and its positional parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub sql: String,
    #[serde(default)]
    pub params: Vec<Value>,
}

impl Statement {
    /// Statement without parameters
    pub fn new<S: Into<String>>(sql: S) -> Self {
        Self { sql: sql.into(), params: Vec::new() }
    }

    /// Statement with positional parameters
    pub fn with_params<S: Into<String>>(sql: S, params: Vec<Value>) -> Self {
        Self { sql: sql.into(), params }
    }
}

/// Database capability injected by the host application
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Execute one statement and return its rows
    async fn query(&self, sql: &str, params: &[Value]) -> PerfResult<Rows>;
}
