//! Prebuilt release binary installer
//!
//! Finds the release asset built for the current host on a GitHub-style
//! release API, downloads it, extracts the binary into a directory, makes it
//! executable and keeps a `package.json` bin entry in sync with the final
//! file name.
//!
//! ```no_run
//! # async fn run() -> Result<(), binprep::PrepareError> {
//! let mut options = binprep::PrepareOptions::new("dprint", "dprint", "dprint");
//! options.orders = vec![
//!     binprep::MatchToken::Binary,
//!     binprep::MatchToken::Arch,
//!     binprep::MatchToken::Vendor,
//!     binprep::MatchToken::Os,
//! ];
//! let outcome = binprep::prepare(&options).await?;
//! println!("installed {}", outcome.path.display());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod install;

pub use config::{ConfigFile, MapOverrides, MatchToken, PrepareOptions, Remote};
pub use error::{Diagnostic, PrepareError};
pub use install::download::HostFacts;
pub use install::{InstallStatus, Outcome, prepare};
