//! Parsing of the configured input/output roots.

use std::fmt;
use std::path::PathBuf;

use url::Url;

use crate::error::LakeError;

/// Where a root lives: a local directory or a bucket prefix in S3.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootLocation {
    Local(PathBuf),
    S3 { bucket: String, prefix: String },
}

impl RootLocation {
    /// Parse a root string. `s3://` and `s3a://` URLs select S3; anything
    /// else (including `file://` URLs) is a local path.
    pub fn parse(root: &str) -> Result<Self, LakeError> {
        let trimmed = root.trim();
        if trimmed.is_empty() {
            return Err(LakeError::Config("empty storage root".into()));
        }

        let has_scheme = trimmed.contains("://");
        if !has_scheme {
            return Ok(RootLocation::Local(PathBuf::from(trimmed)));
        }

        let url = Url::parse(trimmed)
            .map_err(|e| LakeError::Config(format!("invalid storage root '{trimmed}': {e}")))?;

        match url.scheme() {
            "s3" | "s3a" => {
                let bucket = url
                    .host_str()
                    .filter(|h| !h.is_empty())
                    .ok_or_else(|| LakeError::Config(format!("missing bucket in '{trimmed}'")))?;
                let prefix = url.path().trim_matches('/').to_string();
                Ok(RootLocation::S3 {
                    bucket: bucket.to_string(),
                    prefix,
                })
            }
            "file" => url
                .to_file_path()
                .map(RootLocation::Local)
                .map_err(|_| LakeError::Config(format!("invalid file URL '{trimmed}'"))),
            other => Err(LakeError::Config(format!(
                "unsupported storage scheme '{other}' in '{trimmed}'"
            ))),
        }
    }
}

impl fmt::Display for RootLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RootLocation::Local(path) => write!(f, "{}", path.display()),
            RootLocation::S3 { bucket, prefix } if prefix.is_empty() => write!(f, "s3://{bucket}"),
            RootLocation::S3 { bucket, prefix } => write!(f, "s3://{bucket}/{prefix}"),
        }
    }
}
