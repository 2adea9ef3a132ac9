use crate::resolver::error::Error;
use crate::resolver::host::HostInfo;
use crate::weak_error;
use once_cell::sync;
use regex::Regex;

/// Runtime version requested by a launch configuration, in nvs notation:
/// `[remote/][v]major[.minor[.patch]][/arch]`.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct VersionSpec {
    /// True if remote name or architecture is present, nvm can't install such versions.
    pub nvs_format: bool,
    pub remote_name: String,
    pub semantic_version: String,
    pub arch: String,
}

impl VersionSpec {
    /// Parse version string like "16", "v16.2.0", "lts/16/x64".
    ///
    /// # Arguments
    ///
    /// * `s`: version string
    /// * `host`: platform used for default architecture
    pub fn parse(s: &str, host: &HostInfo) -> Result<Self, Error> {
        // a remote name never starts like a version, so "14/32" and "v14/32" are version/arch
        static V_RE: sync::Lazy<Regex> = sync::Lazy::new(|| {
            Regex::new(
                r"(?i)^(?:([a-uw-z_][\w-]*|v(?:[a-z_-][\w-]*)?)/)?v?(\d+(?:\.\d+(?:\.\d+)?)?)(?:/(x86|ia32|32|x64|amd64|64|arm\w*|ppc\w*|s390\w*))?$",
            )
            .expect("must compile")
        });

        let captures = V_RE
            .captures(s)
            .ok_or_else(|| Error::InvalidVersion(s.to_string()))?;

        let remote = captures.get(1).map(|m| m.as_str());
        let arch = captures.get(3).map(|m| m.as_str());

        Ok(VersionSpec {
            nvs_format: remote.is_some() || arch.is_some(),
            remote_name: remote.unwrap_or("node").to_string(),
            semantic_version: captures
                .get(2)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
            arch: standard_arch_name(arch.unwrap_or(&host.arch), host),
        })
    }
}

/// Normalize architecture name to the one used by nvs directory layout.
fn standard_arch_name(arch: &str, host: &HostInfo) -> String {
    match arch.to_ascii_lowercase().as_str() {
        "32" | "x86" | "ia32" => "x86".to_string(),
        "64" | "x64" | "amd64" => "x64".to_string(),
        "arm" => match host.arm_version {
            Some(v) => format!("armv{v}l"),
            None => "arm".to_string(),
        },
        _ => arch.to_string(),
    }
}

/// Version reported by a runtime executable.
#[derive(PartialEq, PartialOrd, Eq, Ord, Clone, Copy, Debug)]
pub struct RuntimeVersion(pub (u32, u32, u32));

impl RuntimeVersion {
    /// First version where `SIGUSR1` opens an inspector instead of a legacy debugger.
    pub const INSPECTOR_BY_DEFAULT: RuntimeVersion = RuntimeVersion((8, 0, 0));

    /// Parse runtime version from `--version` output like "v16.2.0\n".
    pub fn parse(s: &str) -> Option<Self> {
        static V_RE: sync::Lazy<Regex> =
            sync::Lazy::new(|| Regex::new(r"v?(\d+)\.(\d+)\.(\d+)").expect("must compile"));

        if let Some((_, [major, minor, patch])) = V_RE.captures_iter(s).next().map(|c| c.extract())
        {
            let major = weak_error!(major.parse::<u32>())?;
            let minor = weak_error!(minor.parse::<u32>())?;
            let patch = weak_error!(patch.parse::<u32>())?;
            return Some(RuntimeVersion((major, minor, patch)));
        }
        None
    }

    pub fn inspector_by_default(&self) -> bool {
        *self >= Self::INSPECTOR_BY_DEFAULT
    }
}
