//! Execution history
//!
//! Keeps a record of each executed request alongside its result so a client
//! can list recent runs. The in-memory store is bounded and evicts the oldest
//! records first.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tokio::sync::RwLock;

use crate::executors::{ExecutionRequest, ExecutionResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRecord {
    pub id: u64,
    pub project_id: Option<i64>,
    pub code: String,
    pub language: String,
    pub output: Option<String>,
    pub error: Option<String>,
    pub execution_time: u64,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait ExecutionHistory: Send + Sync {
    async fn record(&self, request: &ExecutionRequest, result: &ExecutionResult) -> ExecutionRecord;

    /// Most recent records first, at most `limit` of them.
    async fn recent(&self, limit: usize) -> Vec<ExecutionRecord>;
}

pub struct InMemoryHistory {
    capacity: usize,
    inner: RwLock<HistoryState>,
}

#[derive(Default)]
struct HistoryState {
    next_id: u64,
    records: VecDeque<ExecutionRecord>,
}

impl InMemoryHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: RwLock::new(HistoryState {
                next_id: 1,
                records: VecDeque::new(),
            }),
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl ExecutionHistory for InMemoryHistory {
    async fn record(&self, request: &ExecutionRequest, result: &ExecutionResult) -> ExecutionRecord {
        let mut state = self.inner.write().await;
        let record = ExecutionRecord {
            id: state.next_id,
            project_id: request.project_id,
            code: request.code.clone(),
            language: request.language.clone(),
            output: result.output.clone(),
            error: result.error.clone(),
            execution_time: result.execution_time,
            created_at: Utc::now(),
        };
        state.next_id += 1;
        state.records.push_back(record.clone());
        while state.records.len() > self.capacity {
            state.records.pop_front();
        }
        record
    }

    async fn recent(&self, limit: usize) -> Vec<ExecutionRecord> {
        let state = self.inner.read().await;
        state.records.iter().rev().take(limit).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(output: &str) -> ExecutionResult {
        ExecutionResult {
            output: Some(output.to_string()),
            error: None,
            error_kind: None,
            execution_time: 5,
        }
    }

    #[tokio::test]
    async fn test_recent_returns_newest_first() {
        let history = InMemoryHistory::new(10);
        for i in 0..3 {
            let request = ExecutionRequest::new(format!("print({})", i), "python");
            history.record(&request, &result(&i.to_string())).await;
        }

        let recent = history.recent(2).await;
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].code, "print(2)");
        assert_eq!(recent[1].code, "print(1)");
        assert!(recent[0].id > recent[1].id);
    }

    #[tokio::test]
    async fn test_capacity_evicts_oldest() {
        let history = InMemoryHistory::new(2);
        for i in 0..5 {
            let request = ExecutionRequest::new(i.to_string(), "js").with_project_id(9);
            history.record(&request, &result("")).await;
        }

        assert_eq!(history.len().await, 2);
        let recent = history.recent(50).await;
        assert_eq!(recent[0].id, 5);
        assert_eq!(recent[1].id, 4);
        assert_eq!(recent[0].project_id, Some(9));
    }

    #[tokio::test]
    async fn test_record_serializes_camel_case() {
        let history = InMemoryHistory::new(1);
        assert!(history.is_empty().await);
        let record = history
            .record(&ExecutionRequest::new("1", "js"), &result("1\n"))
            .await;
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["executionTime"], 5);
        assert!(value.get("createdAt").is_some());
        assert!(value.get("projectId").is_some());
    }
}
