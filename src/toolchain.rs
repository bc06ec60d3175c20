//! Toolchain resolution and compile command synthesis
//!
//! The resolver runs once per harness run and only performs a PATH lookup.
//! [`build_command`] is pure: include roots are filtered against the
//! filesystem by the caller, so flag assembly can be tested without a compiler.

use std::collections::HashSet;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use crate::error::HarnessError;

/// Compilers probed on non-Windows hosts, in priority order
pub const UNIX_CANDIDATES: &[&str] = &["clang++", "g++"];

/// The only compiler accepted on Windows hosts
pub const WINDOWS_CANDIDATE: &str = "cl";

/// Host family; decides which compiler is probed and which flag syntax is used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostFamily {
    /// MSVC-style `/flag` syntax
    Windows,
    /// GCC/Clang-style `-flag` syntax
    Unix,
}

impl HostFamily {
    pub fn current() -> Self {
        if cfg!(windows) { HostFamily::Windows } else { HostFamily::Unix }
    }

    /// Suffix of the executables the toolchain produces
    pub fn exe_suffix(self) -> &'static str {
        match self {
            HostFamily::Windows => ".exe",
            HostFamily::Unix => "",
        }
    }
}

/// Resolved compiler invocation prefix, reused for every test of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub host: HostFamily,
    pub prefix: Vec<OsString>,
}

impl Toolchain {
    pub fn new(host: HostFamily, prefix: Vec<OsString>) -> Self {
        Self { host, prefix }
    }

    /// Toolchain for an explicit compiler path
    pub fn from_compiler(host: HostFamily, compiler: impl Into<PathBuf>) -> Self {
        Self::new(host, vec![compiler.into().into_os_string()])
    }

    /// Human-readable form of the invocation prefix
    pub fn describe(&self) -> String {
        self.prefix
            .iter()
            .map(|token| token.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Locate the compiler for `host` on the executable search path.
pub fn resolve(host: HostFamily) -> Result<Toolchain, HarnessError> {
    resolve_with(host, |name| which::which(name).ok())
}

/// Resolve with an injectable lookup function.
pub fn resolve_with<F>(host: HostFamily, lookup: F) -> Result<Toolchain, HarnessError>
where
    F: Fn(&str) -> Option<PathBuf>,
{
    match host {
        HostFamily::Windows => lookup(WINDOWS_CANDIDATE)
            .map(|path| Toolchain::from_compiler(host, path))
            .ok_or_else(|| HarnessError::ToolchainUnavailable {
                candidates: vec![WINDOWS_CANDIDATE.to_string()],
                remediation: "Install the MSVC build tools and run from a Developer Command Prompt so `cl` is on PATH.",
            }),
        HostFamily::Unix => {
            for candidate in UNIX_CANDIDATES {
                if let Some(path) = lookup(candidate) {
                    tracing::debug!(compiler = %path.display(), "resolved toolchain");
                    return Ok(Toolchain::from_compiler(host, path));
                }
            }
            Err(HarnessError::ToolchainUnavailable {
                candidates: UNIX_CANDIDATES.iter().map(|c| c.to_string()).collect(),
                remediation: "Install clang++ or g++ and make sure it is on PATH.",
            })
        }
    }
}

/// Everything needed to compile one test source
#[derive(Debug, Clone)]
pub struct CompileRequest<'a> {
    pub source: &'a Path,
    pub output: &'a Path,
    /// Include roots known to exist, in priority order (may contain duplicates)
    pub include_dirs: &'a [PathBuf],
    /// Used alone when `include_dirs` is empty
    pub default_include: &'a Path,
    /// Language standard, e.g. `c++20`
    pub standard: &'a str,
}

/// Assemble the full compiler argument list for `request`.
pub fn build_command(toolchain: &Toolchain, request: &CompileRequest<'_>) -> Vec<OsString> {
    let includes = unique_includes(request.include_dirs, request.default_include);
    let mut command = toolchain.prefix.clone();

    match toolchain.host {
        HostFamily::Windows => {
            command.push("/nologo".into());
            command.push(format!("/std:{}", request.standard).into());
            for dir in includes {
                command.push(concat_flag("/I", dir.as_os_str()));
            }
            command.push(request.source.as_os_str().to_owned());
            command.push(concat_flag("/Fe:", request.output.as_os_str()));
        }
        HostFamily::Unix => {
            command.push(format!("-std={}", request.standard).into());
            for dir in includes {
                command.push("-I".into());
                command.push(dir.as_os_str().to_owned());
            }
            command.push(request.source.as_os_str().to_owned());
            command.push("-o".into());
            command.push(request.output.as_os_str().to_owned());
        }
    }

    command
}

fn unique_includes<'a>(dirs: &'a [PathBuf], default_include: &'a Path) -> Vec<&'a Path> {
    if dirs.is_empty() {
        return vec![default_include];
    }
    let mut seen = HashSet::new();
    dirs.iter()
        .map(PathBuf::as_path)
        .filter(|dir| seen.insert(*dir))
        .collect()
}

fn concat_flag(flag: &str, value: &OsStr) -> OsString {
    let mut out = OsString::from(flag);
    out.push(value);
    out
}
