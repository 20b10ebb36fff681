use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::Incident;

/// Tập nguồn tin giữ thứ tự xuất hiện đầu tiên.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct SourceSet {
    ordered: Vec<String>,
    seen: HashSet<String>,
}

impl SourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_incidents<'a, I>(incidents: I) -> Self
    where
        I: IntoIterator<Item = &'a Incident>,
    {
        let mut set = Self::new();
        for incident in incidents {
            if let Some(source) = incident.source.as_deref() {
                set.insert(source);
            }
        }
        set
    }

    /// Trả về `true` nếu nguồn mới được thêm.
    pub fn insert(&mut self, source: &str) -> bool {
        if source.is_empty() || self.seen.contains(source) {
            return false;
        }
        self.seen.insert(source.to_string());
        self.ordered.push(source.to_string());
        true
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ordered.iter().map(String::as_str)
    }

    pub fn joined(&self) -> String {
        self.ordered.join(",")
    }

    /// Dòng ghi nguồn hiển thị dưới lưới, `None` khi chưa có nguồn nào.
    pub fn attribution(&self) -> Option<String> {
        (!self.is_empty()).then(|| format!("Source: {}", self.joined()))
    }
}

impl From<Vec<String>> for SourceSet {
    fn from(sources: Vec<String>) -> Self {
        let mut set = Self::new();
        for source in &sources {
            set.insert(source);
        }
        set
    }
}

impl From<SourceSet> for Vec<String> {
    fn from(set: SourceSet) -> Self {
        set.ordered
    }
}
