use layer_models::{InstallConfig, InstallFailureReason, LayerError};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{info, instrument, warn};

/// Packages likely to ship universal wheels; on a pinned-install failure
/// these get one retry with a minimal flag set.
const SIMPLE_RETRY_ALLOWLIST: &[&str] = &[
    "requests",
    "boto3",
    "urllib3",
    "six",
    "python-dateutil",
    "certifi",
    "charset-normalizer",
];

/// Allow-list for the single-package retry in together mode.
const BATCH_RETRY_ALLOWLIST: &[&str] = &["requests", "boto3", "numpy", "pandas"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallMode {
    /// One subprocess per dependency, to isolate failures.
    Individual,
    /// One subprocess covering all dependencies.
    Together,
}

pub fn mode_for(dependency_count: usize, batch_threshold: usize) -> InstallMode {
    if dependency_count > batch_threshold {
        InstallMode::Individual
    } else {
        InstallMode::Together
    }
}

/// Per-dependency bookkeeping for one installation run.
#[derive(Debug, Clone, Default)]
pub struct InstallOutcome {
    pub installed: Vec<String>,
    pub failed: Vec<String>,
    /// Classification of the first observed failure; advisory.
    pub reason: Option<InstallFailureReason>,
}

impl InstallOutcome {
    pub fn success_ratio(&self) -> f64 {
        let total = self.installed.len() + self.failed.len();
        if total == 0 {
            return 1.0;
        }
        self.installed.len() as f64 / total as f64
    }

    pub fn accepted(&self, min_ratio: f64) -> bool {
        self.success_ratio() >= min_ratio
    }

    fn record_failure(&mut self, package: &str, reason: InstallFailureReason) {
        self.failed.push(package.to_string());
        self.reason.get_or_insert(reason);
    }
}

/// Captured output of a completed-but-failed installer invocation.
#[derive(Debug, Clone)]
pub struct PipOutput {
    pub code: Option<i32>,
    pub signal: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug)]
enum PipStatus {
    Success,
    Failed(PipOutput),
    TimedOut { timeout_secs: u64 },
}

/// Classify a failed invocation. Structured evidence first: a signal-killed
/// installer means the kernel reclaimed memory; only then fall back to
/// substring heuristics over the output text. Advisory either way.
pub fn classify_failure(output: &PipOutput) -> InstallFailureReason {
    if output.signal.is_some() {
        return InstallFailureReason::ResourceExhausted;
    }

    let text = format!("{}\n{}", output.stdout, output.stderr).to_lowercase();
    if text.contains("memory") || text.contains("no space left") || text.contains("disk space") {
        InstallFailureReason::ResourceExhausted
    } else if text.contains("network")
        || text.contains("connection")
        || text.contains("temporary failure in name resolution")
        || text.contains("read timed out")
    {
        InstallFailureReason::Network
    } else if text.contains("resolutionimpossible") || text.contains("conflicting dependencies") {
        InstallFailureReason::VersionConflict
    } else if text.contains("(from versions: none)") {
        InstallFailureReason::UnknownPackage
    } else if text.contains("no matching distribution")
        || text.contains("not a supported wheel")
    {
        InstallFailureReason::PlatformMismatch
    } else {
        InstallFailureReason::Other
    }
}

/// Full pinned flag set: target directory, CPython implementation tag,
/// interpreter version, platform tag, binary-only. Source builds are
/// rejected outright; they are slow and rarely succeed in the sandbox.
pub fn pinned_install_args(
    target_dir: &Path,
    platform: &str,
    python_version: &str,
    upgrade: bool,
    packages: &[String],
) -> Vec<String> {
    let mut args = vec![
        "-m".to_string(),
        "pip".to_string(),
        "install".to_string(),
        "--target".to_string(),
        target_dir.display().to_string(),
        "--implementation".to_string(),
        "cp".to_string(),
        "--python-version".to_string(),
        python_version.to_string(),
        "--only-binary=:all:".to_string(),
        "--no-cache-dir".to_string(),
        "--disable-pip-version-check".to_string(),
        "--platform".to_string(),
        platform.to_string(),
    ];
    if upgrade {
        args.push("--upgrade".to_string());
    }
    args.extend(packages.iter().cloned());
    args
}

/// Minimal flag set used for allow-listed retries: no pinning, so pip can
/// fall back to whatever universal wheel exists.
pub fn minimal_install_args(target_dir: &Path, packages: &[String]) -> Vec<String> {
    let mut args = vec![
        "-m".to_string(),
        "pip".to_string(),
        "install".to_string(),
        "--target".to_string(),
        target_dir.display().to_string(),
    ];
    args.extend(packages.iter().cloned());
    args
}

pub struct PipInstaller {
    config: InstallConfig,
}

impl PipInstaller {
    pub fn new(config: InstallConfig) -> Self {
        Self { config }
    }

    async fn run_pip(
        &self,
        args: &[String],
        timeout: Duration,
        work_dir: &Path,
    ) -> Result<PipStatus, LayerError> {
        let mut command = Command::new(&self.config.python_bin);
        command
            .args(args)
            .current_dir(work_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        match tokio::time::timeout(timeout, command.output()).await {
            Err(_) => Ok(PipStatus::TimedOut {
                timeout_secs: timeout.as_secs(),
            }),
            Ok(Err(e)) => Err(LayerError::Internal {
                reason: format!("failed to run {}: {e}", self.config.python_bin),
            }),
            Ok(Ok(output)) if output.status.success() => Ok(PipStatus::Success),
            Ok(Ok(output)) => {
                #[cfg(unix)]
                let signal = {
                    use std::os::unix::process::ExitStatusExt;
                    output.status.signal()
                };
                #[cfg(not(unix))]
                let signal = None;

                Ok(PipStatus::Failed(PipOutput {
                    code: output.status.code(),
                    signal,
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                }))
            }
        }
    }

    async fn probe_python(&self, work_dir: &Path) {
        let probe = Command::new(&self.config.python_bin)
            .arg("--version")
            .current_dir(work_dir)
            .output();
        match tokio::time::timeout(Duration::from_secs(10), probe).await {
            Ok(Ok(output)) if output.status.success() => {
                info!(
                    "Python version: {}",
                    String::from_utf8_lossy(&output.stdout).trim()
                );
            }
            _ => warn!("Could not check Python version"),
        }
    }

    /// Install `dependencies` into `site_packages`. Strictly sequential; each
    /// subprocess is bounded by a wall-clock timeout and killed on expiry.
    #[instrument(skip(self, dependencies, site_packages, work_dir), fields(count = dependencies.len()))]
    pub async fn install(
        &self,
        dependencies: &[String],
        site_packages: &Path,
        work_dir: &Path,
        platform: &str,
        python_version: &str,
        upgrade: bool,
    ) -> Result<InstallOutcome, LayerError> {
        if dependencies.is_empty() {
            return Ok(InstallOutcome::default());
        }

        self.probe_python(work_dir).await;

        match mode_for(dependencies.len(), self.config.batch_threshold) {
            InstallMode::Individual => {
                info!(
                    "Installing {} packages individually for better reliability",
                    dependencies.len()
                );
                self.install_individually(
                    dependencies,
                    site_packages,
                    work_dir,
                    platform,
                    python_version,
                    upgrade,
                )
                .await
            }
            InstallMode::Together => {
                info!("Installing {} packages together", dependencies.len());
                self.install_together(
                    dependencies,
                    site_packages,
                    work_dir,
                    platform,
                    python_version,
                    upgrade,
                )
                .await
            }
        }
    }

    async fn install_individually(
        &self,
        dependencies: &[String],
        site_packages: &Path,
        work_dir: &Path,
        platform: &str,
        python_version: &str,
        upgrade: bool,
    ) -> Result<InstallOutcome, LayerError> {
        let mut outcome = InstallOutcome::default();
        let per_package = Duration::from_secs(self.config.package_timeout_secs);
        let retry = Duration::from_secs(self.config.simple_retry_timeout_secs);

        for (i, package) in dependencies.iter().enumerate() {
            info!(
                "Installing package {}/{}: {}",
                i + 1,
                dependencies.len(),
                package
            );
            let args = pinned_install_args(
                site_packages,
                platform,
                python_version,
                upgrade,
                std::slice::from_ref(package),
            );

            match self.run_pip(&args, per_package, work_dir).await? {
                PipStatus::Success => {
                    info!("Successfully installed: {}", package);
                    outcome.installed.push(package.clone());
                }
                PipStatus::TimedOut { timeout_secs } => {
                    warn!("Timeout ({timeout_secs}s) installing: {package}");
                    outcome.record_failure(package, InstallFailureReason::Timeout);
                }
                PipStatus::Failed(output) => {
                    warn!("Failed to install {}: {}", package, output.stderr.trim());
                    if SIMPLE_RETRY_ALLOWLIST.contains(&package.as_str()) {
                        info!("Trying simplified install for {}", package);
                        let args =
                            minimal_install_args(site_packages, std::slice::from_ref(package));
                        if matches!(
                            self.run_pip(&args, retry, work_dir).await?,
                            PipStatus::Success
                        ) {
                            info!("Simplified install succeeded for: {}", package);
                            outcome.installed.push(package.clone());
                        } else {
                            outcome.record_failure(package, classify_failure(&output));
                        }
                    } else {
                        outcome.record_failure(package, classify_failure(&output));
                    }
                }
            }
        }

        info!(
            "Installation summary: {} installed, {} failed, success rate {:.0}%",
            outcome.installed.len(),
            outcome.failed.len(),
            outcome.success_ratio() * 100.0
        );
        Ok(outcome)
    }

    async fn install_together(
        &self,
        dependencies: &[String],
        site_packages: &Path,
        work_dir: &Path,
        platform: &str,
        python_version: &str,
        upgrade: bool,
    ) -> Result<InstallOutcome, LayerError> {
        // Best-effort pip self-upgrade; failure never blocks the install.
        let upgrade_args: Vec<String> = ["-m", "pip", "install", "--upgrade", "pip"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let upgrade_timeout = Duration::from_secs(self.config.pip_upgrade_timeout_secs);
        match self.run_pip(&upgrade_args, upgrade_timeout, work_dir).await {
            Ok(PipStatus::Success) => info!("Successfully upgraded pip"),
            Ok(_) => warn!("Pip upgrade failed (continuing anyway)"),
            Err(e) => warn!("Could not upgrade pip (continuing anyway): {e}"),
        }

        let mut outcome = InstallOutcome::default();
        let args = pinned_install_args(
            site_packages,
            platform,
            python_version,
            upgrade,
            dependencies,
        );
        let batch_timeout = Duration::from_secs(self.config.batch_timeout_secs);

        match self.run_pip(&args, batch_timeout, work_dir).await? {
            PipStatus::Success => {
                outcome.installed.extend(dependencies.iter().cloned());
            }
            PipStatus::TimedOut { timeout_secs } => {
                warn!("Pip install timed out after {timeout_secs} seconds");
                for package in dependencies {
                    outcome.record_failure(package, InstallFailureReason::Timeout);
                }
            }
            PipStatus::Failed(output) => {
                warn!("Pip install failed: {}", output.stderr.trim());
                let retried = if let [only] = dependencies {
                    BATCH_RETRY_ALLOWLIST.contains(&only.as_str())
                } else {
                    false
                };

                let mut recovered = false;
                if retried {
                    info!("Trying simplified install for {}", dependencies[0]);
                    let args = minimal_install_args(site_packages, dependencies);
                    let retry_timeout = Duration::from_secs(self.config.batch_retry_timeout_secs);
                    recovered = matches!(
                        self.run_pip(&args, retry_timeout, work_dir).await?,
                        PipStatus::Success
                    );
                }

                if recovered {
                    info!("Simplified install succeeded");
                    outcome.installed.extend(dependencies.iter().cloned());
                } else {
                    let reason = classify_failure(&output);
                    for package in dependencies {
                        outcome.record_failure(package, reason);
                    }
                }
            }
        }

        Ok(outcome)
    }
}
