//! Platform detection for asset matching
//!
//! Turns host-reported architecture / OS names into the tokens release
//! assets use (`x86_64`, `apple`, `windows-msvc`, ...).

use std::collections::BTreeMap;

use once_cell::sync::Lazy;

use crate::config::MapOverrides;
use crate::error::PrepareError;

/// Host facts as reported by the running process (or supplied by the caller)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostFacts {
    pub arch: String,
    pub os: String,
}

impl HostFacts {
    pub fn new(arch: impl Into<String>, os: impl Into<String>) -> Self {
        Self {
            arch: arch.into(),
            os: os.into(),
        }
    }

    /// Facts for the current process
    pub fn detect() -> Self {
        Self::new(std::env::consts::ARCH, std::env::consts::OS)
    }

    pub fn is_windows(&self) -> bool {
        matches!(self.os.as_str(), "windows" | "win32")
    }
}

/// Value of a lookup-table entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenMapping {
    Token(String),
    /// Category is conventionally left out of asset names on this host
    Omit,
}

impl TokenMapping {
    fn from_override(value: &str) -> Self {
        if value.trim().is_empty() {
            TokenMapping::Omit
        } else {
            TokenMapping::Token(value.trim().to_string())
        }
    }

    fn token(&self) -> Option<&str> {
        match self {
            TokenMapping::Token(t) => Some(t),
            TokenMapping::Omit => None,
        }
    }
}

type Table = BTreeMap<String, TokenMapping>;

/// The three lookup tables plus the optional libc flavour
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformMaps {
    pub arch: Table,
    pub vendor: Table,
    pub os: Table,
    pub lib: Option<String>,
}

fn table(entries: &[(&str, &str)]) -> Table {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), TokenMapping::Token(v.to_string())))
        .collect()
}

static DEFAULT_MAPS: Lazy<PlatformMaps> = Lazy::new(|| PlatformMaps {
    arch: table(&[
        ("x64", "x86_64"),
        ("x86_64", "x86_64"),
        ("arm64", "aarch64"),
        ("aarch64", "aarch64"),
    ]),
    vendor: table(&[
        ("darwin", "apple"),
        ("macos", "apple"),
        ("win32", "pc"),
        ("windows", "pc"),
        ("linux", "unknown"),
    ]),
    os: table(&[
        ("darwin", "darwin"),
        ("macos", "darwin"),
        ("win32", "windows-msvc"),
        ("windows", "windows-msvc"),
        ("linux", "linux"),
    ]),
    lib: None,
});

impl Default for PlatformMaps {
    fn default() -> Self {
        DEFAULT_MAPS.clone()
    }
}

fn merge(base: &mut Table, clear: bool, overrides: &BTreeMap<String, String>) {
    if clear {
        base.clear();
    }
    for (key, value) in overrides {
        base.insert(key.clone(), TokenMapping::from_override(value));
    }
}

impl PlatformMaps {
    /// Built-in tables with the caller's entries merged over them key by key
    pub fn with_overrides(overrides: &MapOverrides) -> Self {
        let mut maps = Self::default();
        merge(&mut maps.arch, overrides.clear_arch, &overrides.arch);
        merge(&mut maps.vendor, overrides.clear_vendor, &overrides.vendor);
        merge(&mut maps.os, overrides.clear_os, &overrides.os);
        if let Some(lib) = overrides.lib.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
            maps.lib = Some(lib.to_string());
        }
        maps
    }
}

/// Canonical (architecture, vendor, os) tokens for one host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformTriple {
    architecture: Option<String>,
    vendor: Option<String>,
    operating_system: Option<String>,
    lib: Option<String>,
    windows_family: bool,
}

impl PlatformTriple {
    pub fn resolve(host: &HostFacts, maps: &PlatformMaps) -> Result<Self, PrepareError> {
        let architecture = maps
            .arch
            .get(&host.arch)
            .ok_or_else(|| PrepareError::UnsupportedPlatform {
                kind: "architecture",
                value: host.arch.clone(),
            })?
            .token()
            .map(str::to_string);
        let operating_system = maps
            .os
            .get(&host.os)
            .ok_or_else(|| PrepareError::UnsupportedPlatform {
                kind: "operating system",
                value: host.os.clone(),
            })?
            .token()
            .map(str::to_string);
        // vendor is optional: no entry means it is not part of matching
        let vendor = maps
            .vendor
            .get(&host.os)
            .and_then(TokenMapping::token)
            .map(str::to_string);
        let windows_family = host.is_windows() || vendor.as_deref() == Some("pc");

        log::debug!(
            "platform {}/{} -> arch={:?} vendor={:?} os={:?} lib={:?}",
            host.arch,
            host.os,
            architecture,
            vendor,
            operating_system,
            maps.lib
        );

        Ok(Self {
            architecture,
            vendor,
            operating_system,
            lib: maps.lib.clone(),
            windows_family,
        })
    }

    pub fn architecture(&self) -> Option<&str> {
        self.architecture.as_deref()
    }

    pub fn vendor(&self) -> Option<&str> {
        self.vendor.as_deref()
    }

    pub fn operating_system(&self) -> Option<&str> {
        self.operating_system.as_deref()
    }

    pub fn lib(&self) -> Option<&str> {
        self.lib.as_deref()
    }

    pub fn is_windows_family(&self) -> bool {
        self.windows_family
    }

    /// Conventional executable suffix for this platform
    pub fn executable_suffix(&self) -> &'static str {
        if self.windows_family { ".exe" } else { "" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tables_cover_supported_hosts() {
        let maps = PlatformMaps::default();
        let cases = [
            ("x64", "linux", "x86_64", "unknown", "linux"),
            ("arm64", "linux", "aarch64", "unknown", "linux"),
            ("x64", "darwin", "x86_64", "apple", "darwin"),
            ("arm64", "darwin", "aarch64", "apple", "darwin"),
            ("x64", "win32", "x86_64", "pc", "windows-msvc"),
            ("arm64", "win32", "aarch64", "pc", "windows-msvc"),
            ("x86_64", "linux", "x86_64", "unknown", "linux"),
            ("aarch64", "macos", "aarch64", "apple", "darwin"),
            ("x86_64", "windows", "x86_64", "pc", "windows-msvc"),
        ];
        for (arch, os, want_arch, want_vendor, want_os) in cases {
            let triple = PlatformTriple::resolve(&HostFacts::new(arch, os), &maps).unwrap();
            assert_eq!(triple.architecture(), Some(want_arch), "{arch}/{os}");
            assert_eq!(triple.vendor(), Some(want_vendor), "{arch}/{os}");
            assert_eq!(triple.operating_system(), Some(want_os), "{arch}/{os}");
        }
    }

    #[test]
    fn unknown_arch_or_os_is_unsupported() {
        let maps = PlatformMaps::default();
        let err = PlatformTriple::resolve(&HostFacts::new("mips", "linux"), &maps).unwrap_err();
        assert!(matches!(
            err,
            PrepareError::UnsupportedPlatform { kind: "architecture", .. }
        ));

        let err = PlatformTriple::resolve(&HostFacts::new("x64", "aix"), &maps).unwrap_err();
        assert!(matches!(
            err,
            PrepareError::UnsupportedPlatform { kind: "operating system", .. }
        ));
    }

    #[test]
    fn overrides_merge_instead_of_replacing() {
        let mut overrides = MapOverrides::default();
        overrides.arch.insert("x86".into(), String::new());
        overrides.arch.insert("x64".into(), "x64".into());
        overrides.os.insert("win32".into(), "win32".into());
        overrides.clear_vendor = true;
        let maps = PlatformMaps::with_overrides(&overrides);

        // untouched built-in entry survives
        assert_eq!(
            maps.arch.get("arm64"),
            Some(&TokenMapping::Token("aarch64".into()))
        );
        assert_eq!(maps.arch.get("x86"), Some(&TokenMapping::Omit));
        assert!(maps.vendor.is_empty());

        let triple = PlatformTriple::resolve(&HostFacts::new("x64", "win32"), &maps).unwrap();
        assert_eq!(triple.architecture(), Some("x64"));
        assert_eq!(triple.operating_system(), Some("win32"));
        assert_eq!(triple.vendor(), None);
        assert!(triple.is_windows_family());

        let triple = PlatformTriple::resolve(&HostFacts::new("x86", "linux"), &maps).unwrap();
        assert_eq!(triple.architecture(), None);
    }

    #[test]
    fn lib_flavour_is_carried_when_configured() {
        let overrides = MapOverrides {
            lib: Some("musl".into()),
            ..Default::default()
        };
        let maps = PlatformMaps::with_overrides(&overrides);
        let triple = PlatformTriple::resolve(&HostFacts::new("x64", "linux"), &maps).unwrap();
        assert_eq!(triple.lib(), Some("musl"));
        assert_eq!(triple.executable_suffix(), "");
    }
}
