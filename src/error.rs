//! Error types for binprep
//!
//! Every stage of the pipeline reports failures through [`PrepareError`].
//! Only the binary entry point turns an error into an exit status, using the
//! structured [`Diagnostic`] produced by [`PrepareError::diagnostic`].

use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while preparing a release binary
#[derive(Debug, Error)]
pub enum PrepareError {
    /// Host architecture or OS has no entry in the platform tables
    #[error("Unsupported platform: no {kind} mapping for host value '{value}'")]
    UnsupportedPlatform { kind: &'static str, value: String },

    /// Remote rejected the request with 401/403
    #[error("{}", auth_message(.token_supplied, .body))]
    Auth {
        status: u16,
        body: String,
        token_supplied: bool,
    },

    /// No usable release (empty list, everything prerelease, or tag missing)
    #[error("Release not found: {0}")]
    NotFound(String),

    /// No asset in the release satisfied the match order
    #[error("No asset for '{binary}' in release {tag} matches this platform. Candidates: {candidates}")]
    AssetNotFound {
        binary: String,
        tag: String,
        candidates: String,
    },

    /// Remote API answered with a non-success status
    #[error("Remote error (HTTP {status}): {body}")]
    Remote { status: u16, body: String },

    /// Downloading the chosen asset failed
    #[error("Download failed for {url}: {detail}")]
    Download {
        url: String,
        status: Option<u16>,
        detail: String,
    },

    /// Archive extraction failed
    #[error("Extraction failed for {archive}: {detail}")]
    Extract { archive: String, detail: String },

    /// chmod, rename or manifest rewrite failed after install
    #[error("Permission error on {path}: {detail}")]
    Permission { path: String, detail: String },

    /// Invalid options, unreadable manifest
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport-level failure talking to the remote API
    #[error("HTTP error during {stage}: {source}")]
    Http {
        stage: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

fn auth_message(token_supplied: &bool, body: &str) -> String {
    if *token_supplied {
        format!("Authorization failed with the supplied remote token: {body}")
    } else {
        format!(
            "Authorization failed and no remote token was supplied. \
             Pass --remote-token or set REMOTE_TOKEN / GITHUB_TOKEN. Remote said: {body}"
        )
    }
}

/// Structured failure report emitted on stderr by the binary
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Diagnostic {
    pub status: &'static str,
    pub http_status: Option<u16>,
    pub body: String,
}

impl PrepareError {
    /// Short kind name used as the diagnostic `status`
    pub fn kind(&self) -> &'static str {
        match self {
            PrepareError::UnsupportedPlatform { .. } => "UnsupportedPlatform",
            PrepareError::Auth { .. } => "AuthError",
            PrepareError::NotFound(_) => "NotFound",
            PrepareError::AssetNotFound { .. } => "AssetNotFound",
            PrepareError::Remote { .. } => "RemoteError",
            PrepareError::Download { .. } => "DownloadError",
            PrepareError::Extract { .. } => "ExtractError",
            PrepareError::Permission { .. } => "PermissionError",
            PrepareError::Config(_) => "ConfigError",
            PrepareError::Http { .. } => "HttpError",
        }
    }

    /// HTTP status attached to the failure, if the remote supplied one
    pub fn http_status(&self) -> Option<u16> {
        match self {
            PrepareError::Auth { status, .. } | PrepareError::Remote { status, .. } => {
                Some(*status)
            }
            PrepareError::Download { status, .. } => *status,
            PrepareError::Http { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn diagnostic(&self) -> Diagnostic {
        Diagnostic {
            status: self.kind(),
            http_status: self.http_status(),
            body: self.to_string(),
        }
    }

    pub(crate) fn http(stage: &'static str) -> impl FnOnce(reqwest::Error) -> PrepareError {
        move |source| PrepareError::Http { stage, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_message_depends_on_token_presence() {
        let with = PrepareError::Auth {
            status: 401,
            body: "Bad credentials".into(),
            token_supplied: true,
        };
        let without = PrepareError::Auth {
            status: 401,
            body: "Bad credentials".into(),
            token_supplied: false,
        };
        assert!(with.to_string().contains("supplied remote token"));
        assert!(without.to_string().contains("no remote token was supplied"));
        assert_ne!(with.to_string(), without.to_string());
    }

    #[test]
    fn diagnostic_carries_kind_and_status() {
        let err = PrepareError::Download {
            url: "https://example.invalid/a.zip".into(),
            status: Some(404),
            detail: "Not Found".into(),
        };
        let diag = err.diagnostic();
        assert_eq!(diag.status, "DownloadError");
        assert_eq!(diag.http_status, Some(404));
        assert!(diag.body.contains("Not Found"));

        let json = serde_json::to_value(&diag).unwrap();
        assert_eq!(json["status"], "DownloadError");
        assert_eq!(json["http_status"], 404);
    }

    #[test]
    fn local_errors_have_no_http_status() {
        let err = PrepareError::UnsupportedPlatform {
            kind: "architecture",
            value: "mips".into(),
        };
        assert_eq!(err.http_status(), None);
        assert_eq!(err.kind(), "UnsupportedPlatform");
    }
}
