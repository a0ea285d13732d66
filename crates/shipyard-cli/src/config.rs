//! Deployment targets, data paths and environment knobs.

use crate::error::DriverError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use shipyard_sampling::SampleLimit;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment used when `ENVIRONMENT` is unset or unknown.
pub const DEFAULT_ENVIRONMENT: &str = "local";

// ============================================================================
// Targets
// ============================================================================

/// Backend URLs for one deployment environment.
///
/// Search and normalization backends run as several clusters, so they map a
/// cluster alias to its URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Targets {
    pub search: BTreeMap<String, String>,
    pub neo4j: String,
    pub nodenorm: BTreeMap<String, String>,
    pub trapi: String,
    pub dgraph: String,
    pub janusgraph: String,
}

impl Targets {
    pub fn search_cluster(&self, alias: &str) -> Result<&str, DriverError> {
        lookup(&self.search, "search", alias)
    }

    pub fn nodenorm_cluster(&self, alias: &str) -> Result<&str, DriverError> {
        lookup(&self.nodenorm, "nodenorm", alias)
    }
}

fn lookup<'a>(
    clusters: &'a BTreeMap<String, String>,
    kind: &str,
    alias: &str,
) -> Result<&'a str, DriverError> {
    clusters
        .get(alias)
        .map(String::as_str)
        .ok_or_else(|| DriverError::Config(format!("no {kind} cluster named `{alias}`")))
}

/// Targets keyed by environment name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnvironmentConfig {
    environments: BTreeMap<String, Targets>,
}

fn clusters(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(alias, url)| (alias.to_string(), url.to_string()))
        .collect()
}

fn builtin_targets(graph_host: &str, neo4j_host: &str) -> Targets {
    Targets {
        search: clusters(&[
            ("su12", "http://su12:9200/_msearch"),
            ("transltr", "http://transltr.biothings.io:9200/_msearch"),
        ]),
        neo4j: format!("http://{neo4j_host}:7474/db/neo4j/tx/commit"),
        nodenorm: clusters(&[
            ("ci", "https://biothings.ci.transltr.io/nodenorm/node"),
            ("su12", "http://su10:9200/_msearch"),
            ("transltr", "http://transltr.biothings.io:9200/_msearch"),
            ("renci", "https://nodenorm.ci.transltr.io/1.5/get_normalized_nodes"),
            ("pending", "https://biothings.ci.transltr.io/nodenorm/get_normalized_nodes"),
        ]),
        trapi: "https://kg2cploverdb.ci.transltr.io/query".to_string(),
        dgraph: format!("http://{graph_host}:18080/query"),
        janusgraph: format!("http://{graph_host}:8182"),
    }
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self::builtin()
    }
}

impl EnvironmentConfig {
    /// The `local` and `prod` environments.
    pub fn builtin() -> Self {
        let mut environments = BTreeMap::new();
        environments.insert("local".to_string(), builtin_targets("su08", "su08"));
        environments.insert("prod".to_string(), builtin_targets("localhost", "localhost"));
        Self { environments }
    }

    /// Load a JSON file shaped like `{"<env>": {"search": {...}, ...}}`.
    pub fn from_path(path: &Path) -> Result<Self, DriverError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| DriverError::Config(format!("reading {}: {e}", path.display())))?;
        Self::from_json(&raw)
            .map_err(|e| DriverError::Config(format!("parsing {}: {e}", path.display())))
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.environments.keys().map(String::as_str)
    }

    /// Targets for `name`, falling back to [`DEFAULT_ENVIRONMENT`].
    pub fn select(&self, name: &str) -> Result<&Targets, DriverError> {
        self.environments
            .get(name)
            .or_else(|| {
                tracing::warn!(
                    environment = name,
                    fallback = DEFAULT_ENVIRONMENT,
                    "unknown environment"
                );
                self.environments.get(DEFAULT_ENVIRONMENT)
            })
            .ok_or_else(|| DriverError::Config(format!("environment `{name}` is not configured")))
    }
}

/// Name of the active environment from `ENVIRONMENT`.
pub fn environment_name() -> String {
    std::env::var("ENVIRONMENT")
        .ok()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string())
}

// ============================================================================
// Data paths
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataPaths {
    pub graph: PathBuf,
    pub curies: PathBuf,
    pub traffic: PathBuf,
    /// Directory holding `<k>hop.db` files.
    pub multihop_dir: PathBuf,
}

impl DataPaths {
    pub fn under(root: &Path) -> Self {
        Self {
            graph: root.join("graph_sample.db"),
            curies: root.join("nodenorm_curie.db"),
            traffic: root.join("traffic.db"),
            multihop_dir: root.to_path_buf(),
        }
    }

    pub fn multihop(&self, hops: usize) -> PathBuf {
        self.multihop_dir.join(format!("{hops}hop.db"))
    }
}

impl Default for DataPaths {
    fn default() -> Self {
        Self::under(Path::new("data"))
    }
}

// ============================================================================
// Knobs
// ============================================================================

/// Username/password for HTTP Basic authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// `NEO4J_USERNAME` / `NEO4J_PASSWORD`, when both are set.
    pub fn from_env() -> Option<Self> {
        let username = std::env::var("NEO4J_USERNAME").ok()?;
        let password = std::env::var("NEO4J_PASSWORD").ok()?;
        Some(Self { username, password })
    }

    /// Value for the `Authorization` header.
    pub fn basic_auth(&self) -> String {
        let token = STANDARD.encode(format!("{}:{}", self.username, self.password));
        format!("Basic {token}")
    }
}

/// Per-run knobs read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Knobs {
    pub num_sample: SampleLimit,
    pub http_timeout: Duration,
    pub credentials: Option<Credentials>,
    /// Database directory of the embedded engine (`KUZUDB_PATH`).
    pub embedded_path: Option<PathBuf>,
}

impl Default for Knobs {
    fn default() -> Self {
        Self {
            num_sample: SampleLimit::Count(1000),
            http_timeout: Duration::from_secs(300),
            credentials: None,
            embedded_path: None,
        }
    }
}

impl Knobs {
    pub fn from_env() -> Result<Self, DriverError> {
        let mut knobs = Self::default();
        if let Ok(raw) = std::env::var("NUM_SAMPLE") {
            let n: i64 = raw
                .trim()
                .parse()
                .map_err(|_| DriverError::Config(format!("NUM_SAMPLE must be an integer, got `{raw}`")))?;
            knobs.num_sample = SampleLimit::from_signed(n);
        }
        if let Ok(raw) = std::env::var("HTTP_TIMEOUT") {
            knobs.http_timeout = parse_timeout(&raw)?;
        }
        knobs.credentials = Credentials::from_env();
        knobs.embedded_path = std::env::var_os("KUZUDB_PATH").map(PathBuf::from);
        Ok(knobs)
    }
}

/// Parse `300s`, `15m`, `2h`, `500ms` or a bare number of seconds.
pub fn parse_timeout(raw: &str) -> Result<Duration, DriverError> {
    let raw = raw.trim();
    let split = raw
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len());
    let (digits, unit) = raw.split_at(split);
    let value: u64 = digits
        .parse()
        .map_err(|_| DriverError::Config(format!("invalid timeout `{raw}`")))?;
    let seconds = |scale: u64| {
        value
            .checked_mul(scale)
            .map(Duration::from_secs)
            .ok_or_else(|| DriverError::Config(format!("timeout `{raw}` is too large")))
    };
    match unit {
        "" | "s" => Ok(Duration::from_secs(value)),
        "ms" => Ok(Duration::from_millis(value)),
        "m" => seconds(60),
        "h" => seconds(3600),
        other => Err(DriverError::Config(format!("unknown timeout unit `{other}` in `{raw}`"))),
    }
}
