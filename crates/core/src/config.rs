use std::env;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_i32(profile: &str, key: &str, default: i32) -> i32 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

/// Everything a pipeline run needs, resolved once at process start.
///
/// The value is immutable for the run and handed to the pipelines
/// explicitly; nothing reads credentials from ambient process state after
/// this struct is built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LakeConfig {
    /// Active profile name (empty = default).
    pub profile: String,
    pub paths: PathsConfig,
    pub aws: AwsConfig,
    pub parquet: ParquetConfig,
}

impl LakeConfig {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `SPARKIFY_PROFILE`. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("SPARKIFY_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            paths: PathsConfig::from_env_profiled(p),
            aws: AwsConfig::from_env_profiled(p),
            parquet: ParquetConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  input:   {}", self.paths.input_root);
        tracing::info!("  output:  {}", self.paths.output_root);
        tracing::info!(
            "  aws:     region={}, credentials={}",
            self.aws.region,
            if self.aws.has_credentials() { "static" } else { "(none)" }
        );
        tracing::info!("  parquet: zstd_level={}", self.parquet.zstd_level);
    }
}

// ── Paths ─────────────────────────────────────────────────────

/// Source and destination roots. Either a local directory or an
/// `s3://bucket/prefix` URL (`s3a://` is accepted as well).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    pub input_root: String,
    pub output_root: String,
}

impl PathsConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            input_root: profiled_env_or(p, "INPUT_ROOT", "data/input"),
            output_root: profiled_env_or(p, "OUTPUT_ROOT", "data/output"),
        }
    }
}

// ── AWS / S3 ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwsConfig {
    pub region: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub session_token: Option<String>,
    pub endpoint_url: Option<String>,
}

impl AwsConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            region: profiled_env_or(p, "AWS_REGION", "us-west-2"),
            access_key_id: profiled_env_opt(p, "AWS_ACCESS_KEY_ID"),
            secret_access_key: profiled_env_opt(p, "AWS_SECRET_ACCESS_KEY"),
            session_token: profiled_env_opt(p, "AWS_SESSION_TOKEN"),
            endpoint_url: profiled_env_opt(p, "AWS_ENDPOINT_URL"),
        }
    }

    pub fn has_credentials(&self) -> bool {
        self.access_key_id.is_some() && self.secret_access_key.is_some()
    }
}

// ── Parquet output ────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParquetConfig {
    /// Zstd level for every written file (1..=22).
    pub zstd_level: i32,
}

impl ParquetConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            zstd_level: profiled_env_i32(p, "PARQUET_ZSTD_LEVEL", 3).clamp(1, 22),
        }
    }
}

impl Default for ParquetConfig {
    fn default() -> Self {
        Self { zstd_level: 3 }
    }
}
