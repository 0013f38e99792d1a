//! Release asset selection
//!
//! Asset names are scanned left to right: each configured token must occur
//! in what is left of the name after the previous token, and whatever
//! remains at the end must be a supported archive extension (or nothing, for
//! a bare executable).

use log::debug;

use super::github::Asset;
use super::platform::PlatformTriple;
use crate::config::MatchToken;
use crate::error::PrepareError;

/// Archive extensions the extractor understands, without the leading dot
pub const ARCHIVE_EXTENSIONS: &[&str] = &["tar.gz", "tgz", "zip"];

/// Installer packages are never picked
const INSTALLER_MARKER: &str = "install";

/// Asset picked for this platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    pub asset: Asset,
    /// `.zip`, `.tar.gz`, ... or empty for a bare executable
    pub extension: String,
}

impl ResolvedAsset {
    pub fn is_archive(&self) -> bool {
        !self.extension.is_empty()
    }
}

/// Concrete token values for one run, in match order, empty values dropped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchTokens {
    binary: String,
    tokens: Vec<(MatchToken, String)>,
}

impl MatchTokens {
    /// `version` is the release tag (or manifest version); `tag_prefix` is
    /// stripped from it before matching.
    pub fn new(
        order: &[MatchToken],
        binary: &str,
        version: &str,
        tag_prefix: &str,
        triple: &PlatformTriple,
    ) -> Self {
        let version = version.trim();
        let version = if tag_prefix.is_empty() {
            version
        } else {
            version.strip_prefix(tag_prefix).unwrap_or(version)
        };

        let tokens = order
            .iter()
            .filter_map(|&category| {
                let value = match category {
                    MatchToken::Binary => Some(binary),
                    MatchToken::Version => Some(version),
                    MatchToken::Vendor => triple.vendor(),
                    MatchToken::Os => triple.operating_system(),
                    MatchToken::Arch => triple.architecture(),
                    MatchToken::Lib => triple.lib(),
                }?;
                let value = value.trim();
                (!value.is_empty()).then(|| (category, value.to_string()))
            })
            .collect();

        Self {
            binary: binary.to_string(),
            tokens,
        }
    }

    pub fn as_pairs(&self) -> Vec<(MatchToken, &str)> {
        self.tokens.iter().map(|(c, v)| (*c, v.as_str())).collect()
    }
}

/// Match one asset name against the ordered tokens.
///
/// Returns the extension (possibly empty) when the name matches.
pub fn match_asset_name(name: &str, tokens: &[(MatchToken, &str)]) -> Option<String> {
    let mut rest = name.trim();

    for (category, token) in tokens {
        match rest.find(token) {
            Some(at) => rest = &rest[at + token.len()..],
            None => {
                debug!("{name}: missing {category:?} token '{token}'");
                return None;
            }
        }
    }

    if rest.contains(INSTALLER_MARKER) {
        debug!("{name}: looks like an installer, skipping");
        return None;
    }

    let rest = rest.trim();
    if rest.is_empty() {
        return Some(String::new());
    }

    match rest.strip_prefix('.') {
        Some(ext) if ARCHIVE_EXTENSIONS.contains(&ext) => Some(rest.to_string()),
        _ => {
            debug!("{name}: unsupported trailing content '{rest}'");
            None
        }
    }
}

/// Pick the first asset, in release order, that matches the tokens
pub fn resolve_asset(
    assets: &[Asset],
    tokens: &MatchTokens,
    tag: &str,
) -> Result<ResolvedAsset, PrepareError> {
    let pairs = tokens.as_pairs();
    debug!("matching {} assets against {:?}", assets.len(), pairs);

    assets
        .iter()
        .find_map(|asset| {
            match_asset_name(&asset.name, &pairs).map(|extension| ResolvedAsset {
                asset: asset.clone(),
                extension,
            })
        })
        .ok_or_else(|| PrepareError::AssetNotFound {
            binary: tokens.binary.clone(),
            tag: tag.to_string(),
            candidates: assets
                .iter()
                .map(|a| a.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        })
}
