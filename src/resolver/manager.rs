//! Lookup of runtimes installed side by side by a version manager (nvs, nvm, nvm-windows).

use crate::resolver::config::LaunchConfiguration;
use crate::resolver::error::Error;
use crate::resolver::host::{Environment, FileSystem, HostInfo, OsFamily};
use crate::resolver::version::VersionSpec;
use log::{debug, info};
use std::path::{Path, PathBuf};

/// Directory where a requested runtime is expected.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Candidate {
    pub bin: PathBuf,
    /// Name of the version manager that owns the directory.
    pub manager: &'static str,
}

fn nvs_home(host: &HostInfo, env: &dyn Environment, fs: &dyn FileSystem) -> Option<PathBuf> {
    if let Some(home) = env.var("NVS_HOME") {
        return Some(PathBuf::from(home));
    }

    let conventional = match host.os {
        OsFamily::Windows => env
            .var("LOCALAPPDATA")
            .map(|dir| PathBuf::from(dir).join("nvs")),
        OsFamily::Unix => env.home_dir().map(|dir| dir.join(".nvs")),
    };
    conventional.filter(|dir| fs.is_dir(dir))
}

fn nvm_home(env: &dyn Environment, fs: &dyn FileSystem) -> Option<PathBuf> {
    if let Some(home) = env.var("NVM_DIR") {
        return Some(PathBuf::from(home));
    }
    env.home_dir()
        .map(|dir| dir.join(".nvm"))
        .filter(|dir| fs.is_dir(dir))
}

/// Find a directory with runtime binaries for a version. Existence of the result isn't checked.
///
/// # Arguments
///
/// * `spec`: requested version
/// * `host`: platform
/// * `env`: environment variables
/// * `fs`: filesystem, used for probing conventional directories
pub fn locate(
    spec: &VersionSpec,
    host: &HostInfo,
    env: &dyn Environment,
    fs: &dyn FileSystem,
) -> Result<Candidate, Error> {
    if let Some(home) = nvs_home(host, env, fs) {
        let mut bin = home
            .join(&spec.remote_name)
            .join(&spec.semantic_version)
            .join(&spec.arch);
        if !host.is_windows() {
            bin.push("bin");
        }
        return Ok(Candidate { bin, manager: "nvs" });
    }

    if spec.nvs_format {
        return Err(Error::VersionManagerNotFound("nvs"));
    }

    let version_dir = format!("v{}", spec.semantic_version);
    match host.os {
        OsFamily::Windows => {
            let home = env
                .var("NVM_HOME")
                .ok_or(Error::VersionManagerNotFound("nvm-windows"))?;
            Ok(Candidate {
                bin: PathBuf::from(home).join(version_dir),
                manager: "nvm-windows",
            })
        }
        OsFamily::Unix => {
            let home = nvm_home(env, fs).ok_or(Error::VersionManagerNotFound("nvm"))?;
            Ok(Candidate {
                bin: home
                    .join("versions")
                    .join("node")
                    .join(version_dir)
                    .join("bin"),
                manager: "nvm",
            })
        }
    }
}

/// Put a directory in front of the executable search path of a launch configuration.
/// A path already set by the configuration is preferred over the host one.
pub fn prepend_path(
    config: &mut LaunchConfiguration,
    bin: &Path,
    host: &HostInfo,
    env: &dyn Environment,
) {
    let (key, separator) = host.path_var();
    let config_env = config.env.get_or_insert_with(Default::default);

    let current = config_env
        .get(key)
        .filter(|path| !path.is_empty())
        .cloned()
        .or_else(|| env.var(key));

    let bin = bin.to_string_lossy();
    let path = match current {
        Some(current) => format!("{bin}{separator}{current}"),
        None => bin.to_string(),
    };
    config_env.insert(key.to_string(), path);
}

/// Make the runtime requested by `runtimeVersion` the first one on the configuration's path.
/// A missing or `default` version leaves the configuration untouched.
pub fn apply_runtime_version(
    config: &mut LaunchConfiguration,
    host: &HostInfo,
    env: &dyn Environment,
    fs: &dyn FileSystem,
) -> Result<(), Error> {
    let Some(version) = config
        .runtime_version
        .clone()
        .filter(|v| v != "default")
    else {
        return Ok(());
    };

    let spec = VersionSpec::parse(&version, host)?;
    debug!(target: "resolver", "runtime version request: {spec:?}");

    let candidate = locate(&spec, host, env, fs)?;
    if !fs.is_dir(&candidate.bin) {
        return Err(Error::VersionNotInstalled {
            version,
            manager: candidate.manager,
        });
    }

    info!(
        target: "resolver",
        "use Node.js {version} from {} ({})",
        candidate.bin.display(),
        candidate.manager
    );
    prepend_path(config, &candidate.bin, host, env);
    Ok(())
}
