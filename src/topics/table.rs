// TopicTable — the per-cluster descriptions produced by the offline
// TF-IDF pass and the hand-written label file.
//
// Each cluster gets one TopicRecord: a human-readable label and its keywords
// ranked by descending score. Records are built once at load and never
// mutated afterwards.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cluster::ClusterId;

/// Keyword table as stored on disk: cluster id (as a string key) to a list
/// of `[keyword, score]` pairs.
pub type RawKeywordTable = BTreeMap<String, Vec<(String, f32)>>;

/// Label table as stored on disk: cluster id (as a string key) to label.
pub type RawLabelTable = BTreeMap<String, String>;

/// Description of one cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicRecord {
    /// Human-readable topic name, e.g. "Technology"
    pub label: String,
    /// Keywords with their scores, highest score first
    pub keywords: Vec<(String, f32)>,
}

/// All topic records, keyed by cluster id.
#[derive(Debug, Clone, Default)]
pub struct TopicTable {
    records: BTreeMap<ClusterId, TopicRecord>,
}

impl TopicTable {
    /// Join the keyword and label tables. Every cluster must appear in both;
    /// a cluster with keywords but no label (or the reverse) means the two
    /// files came from different fits.
    pub fn from_raw(keywords: RawKeywordTable, labels: RawLabelTable) -> Result<Self, String> {
        let labels = labels
            .into_iter()
            .map(|(k, v)| parse_id(&k).map(|id| (id, v)))
            .collect::<Result<BTreeMap<ClusterId, String>, String>>()?;

        let mut records = BTreeMap::new();
        for (key, mut ranked) in keywords {
            let id = parse_id(&key)?;
            let label = labels
                .get(&id)
                .cloned()
                .ok_or_else(|| format!("cluster {id} has keywords but no label"))?;
            // Stable, so equal scores keep the order the file lists them in.
            ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
            records.insert(
                id,
                TopicRecord {
                    label,
                    keywords: ranked,
                },
            );
        }

        if let Some(id) = labels.keys().find(|id| !records.contains_key(*id)) {
            return Err(format!("cluster {id} has a label but no keywords"));
        }

        Ok(Self { records })
    }

    pub fn get(&self, id: ClusterId) -> Option<&TopicRecord> {
        self.records.get(&id)
    }

    pub fn contains(&self, id: ClusterId) -> bool {
        self.records.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ClusterId, &TopicRecord)> {
        self.records.iter().map(|(id, r)| (*id, r))
    }
}

fn parse_id(key: &str) -> Result<ClusterId, String> {
    key.parse()
        .map_err(|_| format!("'{key}' is not a valid cluster id"))
}
