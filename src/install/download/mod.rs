//! GitHub release download and asset extraction
//!
//! ## Module Organization
//!
//! - `platform` - Host platform tokens and lookup tables
//! - `github` - GitHub API interaction for release discovery
//! - `asset` - Picking the release asset for this platform
//! - `extract` - Archive extraction (tar.gz, zip)
//! - `core` - Download orchestration and idempotent skip

pub mod asset;
pub mod core;
pub mod extract;
pub mod github;
pub mod platform;

pub use self::asset::{MatchTokens, ResolvedAsset, match_asset_name, resolve_asset};
pub use self::core::{FetchOutcome, fetch_and_install};
pub use self::github::{Asset, GitHubRemote, Release, ReleaseQuery, ReleaseSource, build_client};
pub use self::platform::{HostFacts, PlatformMaps, PlatformTriple, TokenMapping};
