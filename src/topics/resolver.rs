// Cluster id -> (label, top keywords).

use std::sync::Arc;

use serde::Serialize;

use super::table::TopicTable;
use crate::cluster::ClusterId;
use crate::error::{PipelineError, Result};

/// Number of keywords shown per prediction unless configured otherwise.
pub const DEFAULT_TOP_KEYWORDS: usize = 5;

/// The parts of a topic shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedTopic {
    pub label: String,
    /// At most `top_n` keywords, most representative first
    pub keywords: Vec<String>,
}

pub struct TopicResolver {
    table: Arc<TopicTable>,
    top_n: usize,
}

impl TopicResolver {
    pub fn new(table: Arc<TopicTable>, top_n: usize) -> Self {
        Self { table, top_n }
    }

    pub fn top_n(&self) -> usize {
        self.top_n
    }

    /// Look up a cluster. An id outside the fitted set is an error, never a
    /// default topic.
    pub fn resolve(&self, id: ClusterId) -> Result<ResolvedTopic> {
        let record = self
            .table
            .get(id)
            .ok_or(PipelineError::UnknownCluster(id))?;
        Ok(ResolvedTopic {
            label: record.label.clone(),
            keywords: record
                .keywords
                .iter()
                .take(self.top_n)
                .map(|(k, _)| k.clone())
                .collect(),
        })
    }
}
