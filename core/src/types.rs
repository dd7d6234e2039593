//! Request payloads and query options for the resource endpoints.
//!
//! # Design
//! Write payloads serialize straight to the JSON WakaTime expects; optional
//! fields are skipped rather than sent as `null`. Query option structs are
//! plain `Default`-able bags; unset fields never reach the URL.

use serde::{Deserialize, Serialize};

/// A single coding activity event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewHeartbeat {
    pub entity: String,
    /// `file`, `domain`, `url`, or `app`.
    #[serde(rename = "type")]
    pub kind: String,
    /// UNIX epoch seconds, fractional.
    pub time: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Comma-separated dependency names.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lines: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_additions: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_deletions: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lineno: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursorpos: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_write: Option<bool>,
}

impl NewHeartbeat {
    pub fn new(entity: impl Into<String>, kind: impl Into<String>, time: f64) -> Self {
        Self {
            entity: entity.into(),
            kind: kind.into(),
            time,
            category: None,
            project: None,
            branch: None,
            language: None,
            dependencies: None,
            lines: None,
            line_additions: None,
            line_deletions: None,
            lineno: None,
            cursorpos: None,
            is_write: None,
        }
    }
}

/// Activity with explicit start and end, reported by an external source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewExternalDuration {
    pub external_id: String,
    pub entity: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub start_time: f64,
    pub end_time: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataDumpType {
    Daily,
    Heartbeats,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDataDump {
    #[serde(rename = "type")]
    pub kind: DataDumpType,
    /// Server default is `true`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_when_finished: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitsQuery {
    pub author: Option<String>,
    pub branch: Option<String>,
    pub page: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DurationsQuery {
    pub project: Option<String>,
    /// Comma-separated branch names.
    pub branches: Option<String>,
    /// Keystroke timeout in minutes.
    pub timeout: Option<u32>,
    pub writes_only: Option<bool>,
    pub timezone: Option<String>,
    /// `entity`, `language`, `dependencies`, `os`, `editor`, `category`, or `machine`.
    pub slice_by: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExternalDurationsQuery {
    pub project: Option<String>,
    pub branches: Option<String>,
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InsightsQuery {
    pub timeout: Option<u32>,
    pub writes_only: Option<bool>,
    pub weekday: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeadersQuery {
    pub language: Option<String>,
    pub is_hireable: Option<bool>,
    pub country_code: Option<String>,
    pub page: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsQuery {
    /// Sent as a path segment, e.g. `last_7_days`.
    pub range: Option<String>,
    pub timeout: Option<u32>,
    pub writes_only: Option<bool>,
}

/// Either `start` and `end` (YYYY-MM-DD) or a named `range`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummariesQuery {
    pub start: Option<String>,
    pub end: Option<String>,
    pub project: Option<String>,
    pub branches: Option<String>,
    pub timeout: Option<u32>,
    pub writes_only: Option<bool>,
    pub timezone: Option<String>,
    pub range: Option<String>,
}

/// Ordered query pairs; `None` values are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Query(pub(crate) Vec<(&'static str, String)>);

impl Query {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set(mut self, key: &'static str, value: impl ToString) -> Self {
        self.0.push((key, value.to_string()));
        self
    }

    pub(crate) fn opt<V: ToString>(self, key: &'static str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.set(key, value),
            None => self,
        }
    }
}

impl From<&CommitsQuery> for Query {
    fn from(q: &CommitsQuery) -> Self {
        Query::new()
            .opt("author", q.author.as_deref())
            .opt("branch", q.branch.as_deref())
            .opt("page", q.page)
    }
}

impl From<&DurationsQuery> for Query {
    fn from(q: &DurationsQuery) -> Self {
        Query::new()
            .opt("project", q.project.as_deref())
            .opt("branches", q.branches.as_deref())
            .opt("timeout", q.timeout)
            .opt("writes_only", q.writes_only)
            .opt("timezone", q.timezone.as_deref())
            .opt("slice_by", q.slice_by.as_deref())
    }
}

impl From<&ExternalDurationsQuery> for Query {
    fn from(q: &ExternalDurationsQuery) -> Self {
        Query::new()
            .opt("project", q.project.as_deref())
            .opt("branches", q.branches.as_deref())
            .opt("timezone", q.timezone.as_deref())
    }
}

impl From<&InsightsQuery> for Query {
    fn from(q: &InsightsQuery) -> Self {
        Query::new()
            .opt("timeout", q.timeout)
            .opt("writes_only", q.writes_only)
            .opt("weekday", q.weekday.as_deref())
    }
}

impl From<&LeadersQuery> for Query {
    fn from(q: &LeadersQuery) -> Self {
        Query::new()
            .opt("language", q.language.as_deref())
            .opt("is_hireable", q.is_hireable)
            .opt("country_code", q.country_code.as_deref())
            .opt("page", q.page)
    }
}

impl From<&SummariesQuery> for Query {
    fn from(q: &SummariesQuery) -> Self {
        Query::new()
            .opt("start", q.start.as_deref())
            .opt("end", q.end.as_deref())
            .opt("project", q.project.as_deref())
            .opt("branches", q.branches.as_deref())
            .opt("timeout", q.timeout)
            .opt("writes_only", q.writes_only)
            .opt("timezone", q.timezone.as_deref())
            .opt("range", q.range.as_deref())
    }
}
