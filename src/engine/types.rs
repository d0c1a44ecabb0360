//! Job, result and table metadata types.
//!
//! Wire types mirror the Treasure Data v3 JSON responses; result types are
//! the tabular shape handed to the host.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind used to describe every table this engine exposes.
pub const BASE_TABLE: &str = "BASE TABLE";

/// Opaque, engine-assigned job identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(v: &str) -> Self {
        Self::new(v)
    }
}

/// Query engine a job runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    Hive,
    /// Anything that is not `hive` falls back to Presto.
    #[default]
    #[serde(other)]
    Presto,
}

impl EngineKind {
    /// Returns the engine name as used in API paths.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hive => "hive",
            Self::Presto => "presto",
        }
    }

    /// Parses an engine name. Unknown names select Presto.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "hive" => Self::Hive,
            _ => Self::Presto,
        }
    }

    /// Field of the job status response that carries the result schema.
    ///
    /// Both engines currently report it under the Hive field name.
    pub fn schema_field(&self) -> &'static str {
        match self {
            Self::Hive => "hive_result_schema",
            Self::Presto => "hive_result_schema",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remote job state as reported by the status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Queued,
    Booting,
    Running,
    Success,
    Error,
    Killed,
    #[serde(other)]
    Unknown,
}

impl JobState {
    /// Terminal states never change on later polls.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Error | Self::Killed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Booting => "booting",
            Self::Running => "running",
            Self::Success => "success",
            Self::Error => "error",
            Self::Killed => "killed",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A freshly submitted job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedJob {
    pub job_id: JobId,
    pub engine: EngineKind,
}

/// Diagnostic output attached to a job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobDebug {
    #[serde(default)]
    pub cmdout: Option<String>,
    #[serde(default)]
    pub stderr: Option<String>,
}

/// Response of the job status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobInfo {
    pub job_id: JobId,
    pub status: JobState,
    #[serde(default)]
    pub debug: Option<JobDebug>,
    /// Remaining response fields, including the engine-specific schema field.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl JobInfo {
    pub fn new(job_id: JobId, status: JobState) -> Self {
        Self {
            job_id,
            status,
            debug: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Attaches the JSON-encoded result schema under the engine's field name.
    pub fn with_result_schema(mut self, engine: EngineKind, schema: impl Into<String>) -> Self {
        self.extra.insert(
            engine.schema_field().to_string(),
            serde_json::Value::String(schema.into()),
        );
        self
    }

    pub fn with_debug(mut self, debug: JobDebug) -> Self {
        self.debug = Some(debug);
        self
    }

    /// Returns the JSON-encoded result schema, if the engine has reported one.
    pub fn result_schema(&self, engine: EngineKind) -> Option<&str> {
        self.extra
            .get(engine.schema_field())
            .and_then(|v| v.as_str())
    }

    /// Best available explanation of why the job failed.
    pub fn error_detail(&self) -> String {
        let detail = self.debug.as_ref().and_then(|d| {
            d.stderr
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .or_else(|| d.cmdout.as_deref().filter(|s| !s.trim().is_empty()))
        });
        match detail {
            Some(d) => d.trim().to_string(),
            None => format!("job {} finished with status {}", self.job_id, self.status),
        }
    }
}

/// Acknowledgement of a kill request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KillAck {
    #[serde(default)]
    pub job_id: Option<JobId>,
    #[serde(default)]
    pub former_status: Option<String>,
}

/// One table entry of the table listing endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableEntry {
    pub name: String,
    /// JSON-encoded array of `[name, type]` pairs.
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(default)]
    pub count: u64,
}

/// A column as an ordered `(name, type)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct ColumnDef {
    pub name: String,
    pub data_type: String,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

impl From<(String, String)> for ColumnDef {
    fn from((name, data_type): (String, String)) -> Self {
        Self { name, data_type }
    }
}

impl From<ColumnDef> for (String, String) {
    fn from(c: ColumnDef) -> Self {
        (c.name, c.data_type)
    }
}

/// Table metadata derived from the listing at fetch time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDescriptor {
    pub name: String,
    pub columns: Vec<ColumnDef>,
    pub count: u64,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Column definitions of one table in tabular form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSummary {
    pub name: String,
    pub defs: QueryResult,
}

/// Tabular result of a query. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Column names in result order.
    pub fields: Vec<String>,

    /// Rows of data.
    pub rows: Vec<Row>,
}

impl QueryResult {
    /// Creates a new empty query result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a query result with the given fields and rows.
    pub fn with_data(fields: Vec<String>, rows: Vec<Row>) -> Self {
        Self { fields, rows }
    }

    /// Returns true if the result set is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// A row of data from a query result.
pub type Row = Vec<Value>;

/// A single value from a result line.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// Arrays and maps are kept as raw JSON.
    Json(serde_json::Value),
}

impl Value {
    /// Returns true if this value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Attempts to convert the value to a string representation.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::String(s) => s.clone(),
            Value::Json(v) => v.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}
