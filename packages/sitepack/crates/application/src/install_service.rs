use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, info, warn};

use domain::markers::{Marker, MarkerEnvironment};
use domain::ports::{ArtifactFetcher, WheelInstaller};
use domain::security::{is_sha256_hex, verify_file, IntegrityError};
use domain::selection::select_best;
use domain::system::{is_plain_file_name, PlatformContext, StoreManager};
use sitepack_lock::{Artifact, ArtifactLocation, Lockfile, Package};

use crate::error::ResolveError;

pub const DEFAULT_MAX_CONCURRENT_INSTALLS: usize = 4;

/// Turns a lockfile into installed package directories in the shared cache.
///
/// Wheels are fetched, verified against their sha256 and installed by a
/// bounded pool of workers. Anything already present in the cache is reused
/// as is.
pub struct InstallService {
    worker: Arc<Worker>,
    max_concurrent: usize,
}

/// One selected wheel and everything a worker needs to materialise it.
struct Job {
    index: usize,
    package: String,
    artifact: Artifact,
    sha256: String,
    location: ArtifactLocation,
    install_path: PathBuf,
}

struct Worker {
    store: StoreManager,
    fetcher: Arc<dyn ArtifactFetcher>,
    installer: Arc<dyn WheelInstaller>,
}

impl InstallService {
    pub fn new(
        store: StoreManager,
        fetcher: Arc<dyn ArtifactFetcher>,
        installer: Arc<dyn WheelInstaller>,
    ) -> Self {
        Self {
            worker: Arc::new(Worker {
                store,
                fetcher,
                installer,
            }),
            max_concurrent: DEFAULT_MAX_CONCURRENT_INSTALLS,
        }
    }

    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max.max(1);
        self
    }

    pub fn store(&self) -> &StoreManager {
        &self.worker.store
    }

    /// Packages whose marker holds in `env`, in lockfile order.
    pub fn applicable<'l>(
        lockfile: &'l Lockfile,
        env: &MarkerEnvironment,
    ) -> Result<Vec<&'l Package>, ResolveError> {
        let mut packages = Vec::with_capacity(lockfile.packages.len());
        for package in &lockfile.packages {
            let applies = Marker::parse(package.marker())
                .map_err(Into::into)
                .and_then(|marker| marker.evaluate(env))
                .map_err(|source| ResolveError::Marker {
                    package: package.name.clone(),
                    source,
                })?;

            if applies {
                packages.push(package);
            } else {
                debug!(
                    "Skipping {}: marker {:?} does not match",
                    package.name,
                    package.marker()
                );
            }
        }
        Ok(packages)
    }

    /// The wheel chosen for every applicable package, in lockfile order.
    pub fn select<'l>(
        lockfile: &'l Lockfile,
        ctx: &PlatformContext,
    ) -> Result<Vec<(&'l Package, &'l Artifact)>, ResolveError> {
        Self::applicable(lockfile, &ctx.markers)?
            .into_iter()
            .map(|package| -> Result<_, ResolveError> {
                let wheel = select_best(package, &ctx.tags)?;
                debug!("Selected {} for {}", wheel.name, package.name);
                Ok((package, wheel))
            })
            .collect()
    }

    /// Install every applicable package and return the install directories
    /// in lockfile order.
    pub async fn resolve(
        &self,
        lockfile: &Lockfile,
        ctx: &PlatformContext,
    ) -> Result<Vec<PathBuf>, ResolveError> {
        let jobs = Self::select(lockfile, ctx)?
            .into_iter()
            .enumerate()
            .map(|(index, (package, artifact))| self.job(index, lockfile, ctx, package, artifact))
            .collect::<Result<Vec<_>, _>>()?;

        let total: u64 = jobs.iter().filter_map(|job| job.artifact.size).sum();
        info!(
            "Resolving {} wheels ({} bytes) with {} workers",
            jobs.len(),
            total,
            self.max_concurrent
        );

        let count = jobs.len();
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let (tx, mut rx) = mpsc::channel(count.max(1));

        for job in jobs {
            let semaphore = Arc::clone(&semaphore);
            let worker = Arc::clone(&self.worker);
            let tx = tx.clone();

            tokio::spawn(async move {
                let index = job.index;
                let result = match semaphore.acquire_owned().await {
                    Ok(_permit) => worker.materialise(job).await,
                    Err(e) => Err(ResolveError::Worker(e.to_string())),
                };
                // The receiver is gone once another worker has failed.
                let _ = tx.send((index, result)).await;
            });
        }
        drop(tx);

        let mut paths: Vec<Option<PathBuf>> = vec![None; count];
        while let Some((index, result)) = rx.recv().await {
            paths[index] = Some(result?);
        }

        paths
            .into_iter()
            .enumerate()
            .map(|(index, path)| {
                path.ok_or_else(|| {
                    ResolveError::Worker(format!("worker for package #{} exited early", index))
                })
            })
            .collect()
    }

    /// Both the digest and the file name end up as cache path components, so
    /// they are checked here before any path is built from them.
    fn job(
        &self,
        index: usize,
        lockfile: &Lockfile,
        ctx: &PlatformContext,
        package: &Package,
        artifact: &Artifact,
    ) -> Result<Job, ResolveError> {
        if !is_plain_file_name(&artifact.name) {
            return Err(ResolveError::InvalidWheelName {
                package: package.name.clone(),
                wheel: artifact.name.clone(),
            });
        }

        let sha256 = artifact.sha256().ok_or_else(|| ResolveError::MissingSha256 {
            package: package.name.clone(),
            wheel: artifact.name.clone(),
        })?;
        if !is_sha256_hex(sha256) {
            return Err(ResolveError::InvalidSha256 {
                package: package.name.clone(),
                wheel: artifact.name.clone(),
                value: sha256.to_string(),
            });
        }
        let sha256 = sha256.to_ascii_lowercase();

        Ok(Job {
            index,
            package: package.name.clone(),
            location: artifact.location(lockfile.base_dir())?,
            install_path: self
                .worker
                .store
                .install_path(&ctx.interpreter, artifact, &sha256),
            artifact: artifact.clone(),
            sha256,
        })
    }
}

impl Worker {
    async fn materialise(&self, job: Job) -> Result<PathBuf, ResolveError> {
        let install_path = job.install_path.clone();
        if tokio::fs::metadata(&install_path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
        {
            debug!("{} already installed at {:?}", job.package, install_path);
            return Ok(install_path);
        }

        let wheel = self.download(&job).await?;
        self.install(&job, wheel, install_path).await
    }

    /// Return a verified copy of the wheel, reusing a cached download when its
    /// digest still matches.
    async fn download(&self, job: &Job) -> Result<PathBuf, ResolveError> {
        let dest = self.store.download_path(&job.artifact, &job.sha256);
        let integrity = |source| ResolveError::Integrity {
            wheel: job.artifact.name.clone(),
            source,
        };

        if tokio::fs::metadata(&dest).await.is_ok() {
            match verify_blocking(dest.clone(), job.sha256.clone()).await? {
                Ok(()) => {
                    debug!("Reusing downloaded {:?}", dest);
                    return Ok(dest);
                }
                Err(IntegrityError::Mismatch { actual, .. }) => {
                    warn!(
                        "Cached {} has sha256 {}, downloading again",
                        job.artifact.name, actual
                    );
                    remove_file_if_exists(&dest).await?;
                }
                Err(e) => return Err(integrity(e)),
            }
        }

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(ResolveError::io(parent))?;
        }

        let partial = StoreManager::partial_path(&dest);
        info!("Downloading {}", job.artifact.name);
        if let Err(source) = self.fetcher.fetch(&job.location, &partial).await {
            discard(&partial).await;
            return Err(ResolveError::Fetch {
                wheel: job.artifact.name.clone(),
                source,
            });
        }

        if let Err(e) = verify_blocking(partial.clone(), job.sha256.clone()).await? {
            discard(&partial).await;
            return Err(integrity(e));
        }

        tokio::fs::rename(&partial, &dest)
            .await
            .map_err(ResolveError::io(&dest))?;
        Ok(dest)
    }

    async fn install(
        &self,
        job: &Job,
        wheel: PathBuf,
        install_path: PathBuf,
    ) -> Result<PathBuf, ResolveError> {
        let tmp = self.store.tmp_install_dir();
        let installer = Arc::clone(&self.installer);
        let name = job.artifact.name.clone();
        info!("Installing {} into {:?}", name, install_path);

        tokio::task::spawn_blocking(move || -> Result<PathBuf, ResolveError> {
            install_into(installer.as_ref(), &name, &wheel, &tmp, &install_path)?;
            Ok(install_path)
        })
        .await
        .map_err(|e| ResolveError::Worker(e.to_string()))?
    }
}

/// Run the installer into `tmp` and move the result to `install_path`.
fn install_into(
    installer: &dyn WheelInstaller,
    name: &str,
    wheel: &Path,
    tmp: &Path,
    install_path: &Path,
) -> Result<(), ResolveError> {
    fs::create_dir_all(tmp).map_err(ResolveError::io(tmp))?;
    let _guard = TempDir(tmp);

    installer
        .install(wheel, tmp)
        .map_err(|source| ResolveError::Install {
            wheel: name.to_string(),
            source,
        })?;

    if let Some(parent) = install_path.parent() {
        fs::create_dir_all(parent).map_err(ResolveError::io(parent))?;
    }

    match fs::rename(tmp, install_path) {
        Ok(()) => Ok(()),
        // Another process installed the same digest first.
        Err(e) if install_path.is_dir() => {
            debug!("{:?} appeared during install ({}), keeping it", install_path, e);
            Ok(())
        }
        Err(e) => Err(ResolveError::io(install_path)(e)),
    }
}

/// Removes a scratch directory on every exit path.
struct TempDir<'a>(&'a Path);

impl Drop for TempDir<'_> {
    fn drop(&mut self) {
        if self.0.exists() {
            if let Err(e) = fs::remove_dir_all(self.0) {
                warn!("Failed to remove {:?}: {}", self.0, e);
            }
        }
    }
}

async fn verify_blocking(
    path: PathBuf,
    sha256: String,
) -> Result<Result<(), IntegrityError>, ResolveError> {
    tokio::task::spawn_blocking(move || verify_file(&path, &sha256))
        .await
        .map_err(|e| ResolveError::Worker(e.to_string()))
}

/// Best-effort removal of a partial download on a path that is already
/// failing. The original error is the one reported.
async fn discard(path: &Path) {
    if let Err(e) = remove_file_if_exists(path).await {
        warn!("Failed to remove partial download: {}", e);
    }
}

async fn remove_file_if_exists(path: &Path) -> Result<(), ResolveError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ResolveError::io(path)(e)),
    }
}
