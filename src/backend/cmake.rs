//! CMake build backend.
//!
//! Each package is configured and built out-of-source into its build
//! directory. The combined configure/build output is the log stream and
//! is also written to `<log_dir>/build.log` for later inspection.

use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::backend::{BackendOutcome, BuildBackend, BuildRequest};
use crate::util::fs::ensure_dir;
use crate::util::process::{find_cmake, ProcessBuilder};

/// Name of the per-package log file.
pub const BUILD_LOG_NAME: &str = "build.log";

/// The default build backend, driving `cmake`.
pub struct CmakeBackend;

impl CmakeBackend {
    /// Create the backend, verifying that CMake is installed.
    pub fn new() -> Result<Self> {
        if find_cmake().is_none() {
            bail!(
                "cmake not found\n\
                 \n\
                 CMake is required to build workspace packages.\n\
                 Install CMake and ensure it's in your PATH."
            );
        }
        Ok(CmakeBackend)
    }

    /// Arguments for the configure step.
    fn configure_args(req: &BuildRequest<'_>) -> Vec<String> {
        let mut args = vec![
            "-S".to_string(),
            req.package.root().display().to_string(),
            "-B".to_string(),
            req.package.build_dir().display().to_string(),
        ];

        if let Some(build_type) = req.build_type {
            args.push(format!("-DCMAKE_BUILD_TYPE={}", build_type));
        }

        args.push(format!(
            "-DBUILD_TESTING={}",
            if req.build_tests { "ON" } else { "OFF" }
        ));

        args
    }

    /// Arguments for the build step.
    fn build_args(req: &BuildRequest<'_>) -> Vec<String> {
        let mut args = vec![
            "--build".to_string(),
            req.package.build_dir().display().to_string(),
            "--parallel".to_string(),
        ];

        if req.verbose {
            args.push("--verbose".to_string());
        }

        args
    }

    /// Run one cmake step, appending its output to `log`.
    fn run_step(&self, args: &[String], log: &mut String) -> Result<bool> {
        let cmd = ProcessBuilder::new("cmake").args(args);
        tracing::debug!("running {}", cmd.display_command());

        let output = cmd.exec()?;
        log.push_str(&String::from_utf8_lossy(&output.stdout));
        log.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(output.status.success())
    }

    /// Write the accumulated log to the package's log directory.
    ///
    /// Log persistence is best-effort; a failure here must not turn a
    /// finished build into an error.
    fn persist_log(&self, log_dir: &Path, log: &str) {
        let write = || -> Result<()> {
            ensure_dir(log_dir)?;
            std::fs::write(log_dir.join(BUILD_LOG_NAME), log)
                .with_context(|| format!("failed to write log in {}", log_dir.display()))?;
            Ok(())
        };
        if let Err(e) = write() {
            tracing::warn!("could not persist build log: {:#}", e);
        }
    }
}

impl BuildBackend for CmakeBackend {
    fn name(&self) -> &str {
        "cmake"
    }

    fn build(&self, req: &BuildRequest<'_>) -> Result<BackendOutcome> {
        ensure_dir(req.package.build_dir())?;

        // Cache reset happens here, immediately before this package's
        // own invocation, so a skipped package never loses its cache.
        if req.clear_cache {
            let cache = req.package.build_dir().join("CMakeCache.txt");
            if cache.exists() {
                std::fs::remove_file(&cache)
                    .with_context(|| format!("failed to remove {}", cache.display()))?;
                tracing::debug!("cleared CMake cache for {}", req.package.name());
            }
        }

        let mut log = String::new();

        let configured = self.run_step(&Self::configure_args(req), &mut log)?;
        if !configured {
            self.persist_log(req.package.log_dir(), &log);
            return Ok(BackendOutcome {
                success: false,
                log,
            });
        }

        let built = self.run_step(&Self::build_args(req), &mut log)?;
        self.persist_log(req.package.log_dir(), &log);

        Ok(BackendOutcome {
            success: built,
            log,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BuildType;
    use crate::test_support::fixture_workspace;
    use tempfile::TempDir;

    fn request<'a>(ws: &'a crate::core::workspace::Workspace) -> BuildRequest<'a> {
        BuildRequest {
            package: ws.get("pkg").unwrap(),
            build_type: None,
            build_tests: false,
            verbose: false,
            clear_cache: false,
        }
    }

    #[test]
    fn test_configure_args_defaults() {
        let tmp = TempDir::new().unwrap();
        let ws = fixture_workspace(tmp.path(), &[("pkg", &[])]);
        let req = request(&ws);

        let args = CmakeBackend::configure_args(&req);
        assert_eq!(args[0], "-S");
        assert!(args[1].ends_with("src/pkg"));
        assert_eq!(args[2], "-B");
        assert!(args[3].ends_with("build/pkg"));
        assert!(args.contains(&"-DBUILD_TESTING=OFF".to_string()));
        assert!(!args.iter().any(|a| a.starts_with("-DCMAKE_BUILD_TYPE")));
    }

    #[test]
    fn test_configure_args_with_type_and_tests() {
        let tmp = TempDir::new().unwrap();
        let ws = fixture_workspace(tmp.path(), &[("pkg", &[])]);
        let mut req = request(&ws);
        req.build_type = Some(BuildType::RelWithDebInfo);
        req.build_tests = true;

        let args = CmakeBackend::configure_args(&req);
        assert!(args.contains(&"-DCMAKE_BUILD_TYPE=RelWithDebInfo".to_string()));
        assert!(args.contains(&"-DBUILD_TESTING=ON".to_string()));
    }

    #[test]
    fn test_build_args_verbose() {
        let tmp = TempDir::new().unwrap();
        let ws = fixture_workspace(tmp.path(), &[("pkg", &[])]);
        let mut req = request(&ws);

        let args = CmakeBackend::build_args(&req);
        assert_eq!(args[0], "--build");
        assert!(args.contains(&"--parallel".to_string()));
        assert!(!args.contains(&"--verbose".to_string()));

        req.verbose = true;
        let args = CmakeBackend::build_args(&req);
        assert!(args.contains(&"--verbose".to_string()));
    }
}
