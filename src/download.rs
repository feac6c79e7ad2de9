//! Remote dataset download and archive extraction.
//!
//! The geographic archive is fetched at most once: if its extraction
//! directory already exists, nothing is requested. The check does not try to
//! tell a previous download apart from a directory created for another
//! reason.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use thiserror::Error;
use tracing::{error, info, warn};
use url::Url;
use zip::ZipArchive;

use crate::config::TransportConfig;

const USER_AGENT: &str = "seguia/0.1 (data preparation)";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
}

/// Result of a skip-if-present archive fetch
#[derive(Debug)]
pub enum FetchOutcome {
    /// Target directory existed; no request was made
    AlreadyPresent { target: PathBuf },
    /// Archive downloaded to `archive` and extracted into `target`
    Fetched {
        archive: PathBuf,
        target: PathBuf,
        extracted: usize,
    },
    Failed(FetchError),
}

/// Anything that can hand back the body behind a URL
#[allow(async_fn_in_trait)]
pub trait ArchiveSource {
    async fn get(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// HTTP transport with explicitly scoped TLS settings
pub struct Transport {
    client: Client,
}

impl Transport {
    pub fn new(config: &TransportConfig) -> Result<Self, FetchError> {
        if config.accept_invalid_certs {
            warn!("TLS certificate verification is DISABLED for this transport");
        }

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;

        Ok(Self { client })
    }
}

impl ArchiveSource for Transport {
    async fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        info!("Making request on the url: {}", url);
        let mut response = self.client.get(url).send().await?.error_for_status()?;

        let pb = ProgressBar::new(response.content_length().unwrap_or(0));
        if let Ok(style) = ProgressStyle::default_bar().template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec})",
        ) {
            pb.set_style(style.progress_chars("#>-"));
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            pb.inc(chunk.len() as u64);
            body.extend_from_slice(&chunk);
        }
        pb.finish_and_clear();

        info!("Received {} bytes from {}", body.len(), url);
        Ok(body)
    }
}

/// Where an archive and its extraction live on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivePaths {
    pub archive: PathBuf,
    pub target: PathBuf,
}

/// Last path segment of a URL
pub fn archive_name(url: &str) -> Result<String, FetchError> {
    let invalid = |reason: &str| FetchError::InvalidUrl {
        url: url.to_string(),
        reason: reason.to_string(),
    };

    let parsed = Url::parse(url).map_err(|e| invalid(&e.to_string()))?;
    parsed
        .path_segments()
        .and_then(|segments| segments.last())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .ok_or_else(|| invalid("url has no file name"))
}

/// Archive file and extraction directory for a `.zip` URL under `dir`
pub fn archive_paths(url: &str, dir: &Path) -> Result<ArchivePaths, FetchError> {
    let name = archive_name(url)?;
    let stem = name
        .strip_suffix(".zip")
        .filter(|stem| !stem.is_empty())
        .ok_or_else(|| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: "not a .zip archive".to_string(),
        })?;

    Ok(ArchivePaths {
        archive: dir.join(&name),
        target: dir.join(stem),
    })
}

/// Download the core dataset as-is into `<dir>/<key>.<ext>`.
pub async fn fetch_core_data<S: ArchiveSource>(
    source: &S,
    url: &str,
    dir: &Path,
    key: &str,
) -> Result<PathBuf, FetchError> {
    let name = archive_name(url)?;
    let ext = Path::new(&name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("bin");
    let path = dir.join(format!("{}.{}", key, ext));

    info!("Reading url: {}", url);
    let content = source.get(url).await?;

    fs::create_dir_all(dir)?;
    fs::write(&path, &content)?;
    info!("Data saved into file: {}", path.display());

    Ok(path)
}

/// Download and extract a zip archive unless its directory already exists.
pub async fn fetch_geo_data<S: ArchiveSource>(source: &S, url: &str, dir: &Path) -> FetchOutcome {
    let paths = match archive_paths(url, dir) {
        Ok(paths) => paths,
        Err(e) => return FetchOutcome::Failed(e),
    };

    if paths.target.exists() {
        info!(
            "File already exists. No need to search for data: {}",
            paths.target.display()
        );
        return FetchOutcome::AlreadyPresent {
            target: paths.target,
        };
    }

    info!("Making directory on the path: {}", paths.target.display());
    if let Err(e) = fs::create_dir_all(dir).and_then(|_| fs::create_dir(&paths.target)) {
        return FetchOutcome::Failed(e.into());
    }

    match download_and_extract(source, url, &paths).await {
        Ok(extracted) => FetchOutcome::Fetched {
            archive: paths.archive,
            target: paths.target,
            extracted,
        },
        Err(e) => {
            error!("Fetching {} failed: {}", url, e);
            // A half-populated directory would make the next run skip the fetch
            if let Err(cleanup) = fs::remove_dir_all(&paths.target) {
                warn!(
                    "Could not remove {}: {}",
                    paths.target.display(),
                    cleanup
                );
            }
            FetchOutcome::Failed(e)
        }
    }
}

async fn download_and_extract<S: ArchiveSource>(
    source: &S,
    url: &str,
    paths: &ArchivePaths,
) -> Result<usize, FetchError> {
    let content = source.get(url).await?;

    info!("Writing file on the path: {}", paths.archive.display());
    fs::write(&paths.archive, &content)?;

    extract_archive(&paths.archive, &paths.target)
}

/// Extract every entry of a zip file into `target`, returning the entry count.
///
/// Entries whose names would escape `target` are rejected by the zip reader.
pub fn extract_archive(zip_path: &Path, target: &Path) -> Result<usize, FetchError> {
    info!(
        "Extracting {} into {}",
        zip_path.display(),
        target.display()
    );

    let file = File::open(zip_path)?;
    let mut archive = ZipArchive::new(BufReader::new(file))?;
    let count = archive.len();
    archive.extract(target)?;

    info!("Extracted {} entries", count);
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use walkdir::WalkDir;
    use zip::write::SimpleFileOptions;

    const GEO_URL: &str = "https://example.org/geo/mg_2020_integrado.zip";

    struct CountingSource {
        body: Vec<u8>,
        calls: AtomicUsize,
    }

    impl CountingSource {
        fn new(body: Vec<u8>) -> Self {
            Self {
                body,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl ArchiveSource for CountingSource {
        async fn get(&self, _url: &str) -> Result<Vec<u8>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.body.clone())
        }
    }

    struct OfflineSource;

    impl ArchiveSource for OfflineSource {
        async fn get(&self, _url: &str) -> Result<Vec<u8>, FetchError> {
            Err(FetchError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "offline",
            )))
        }
    }

    fn sample_zip() -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        writer.add_directory("conjunto_de_datos/", options).unwrap();
        writer
            .start_file("conjunto_de_datos/00ent.shp", options)
            .unwrap();
        writer.write_all(b"states").unwrap();
        writer.start_file("conjunto_de_datos/00a.shp", options).unwrap();
        writer.write_all(b"localities").unwrap();
        writer.finish().unwrap().into_inner()
    }

    fn snapshot(dir: &Path) -> Vec<(PathBuf, Vec<u8>)> {
        let mut entries: Vec<(PathBuf, Vec<u8>)> = WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .map(|e| {
                let contents = if e.file_type().is_file() {
                    fs::read(e.path()).unwrap()
                } else {
                    Vec::new()
                };
                (e.into_path(), contents)
            })
            .collect();
        entries.sort();
        entries
    }

    #[test]
    fn test_archive_paths() {
        let paths = archive_paths(GEO_URL, Path::new("data/raw")).unwrap();
        assert_eq!(paths.archive, PathBuf::from("data/raw/mg_2020_integrado.zip"));
        assert_eq!(paths.target, PathBuf::from("data/raw/mg_2020_integrado"));

        assert!(archive_paths("https://example.org/geo/data.tar", Path::new(".")).is_err());
        assert!(archive_paths("https://example.org/", Path::new(".")).is_err());
        assert!(archive_name("not a url").is_err());
    }

    #[tokio::test]
    async fn test_second_fetch_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let source = CountingSource::new(sample_zip());

        let first = fetch_geo_data(&source, GEO_URL, dir.path()).await;
        let target = match first {
            FetchOutcome::Fetched {
                target, extracted, ..
            } => {
                assert_eq!(extracted, 3);
                target
            }
            other => panic!("expected Fetched, got {:?}", other),
        };
        assert!(target.join("conjunto_de_datos").join("00ent.shp").is_file());
        let before = snapshot(dir.path());

        let second = fetch_geo_data(&source, GEO_URL, dir.path()).await;
        assert!(matches!(second, FetchOutcome::AlreadyPresent { .. }));
        assert_eq!(source.calls(), 1);
        assert_eq!(snapshot(dir.path()), before);
    }

    #[tokio::test]
    async fn test_existing_directory_skips_request() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("mg_2020_integrado")).unwrap();
        let source = CountingSource::new(sample_zip());

        let outcome = fetch_geo_data(&source, GEO_URL, dir.path()).await;
        assert!(matches!(outcome, FetchOutcome::AlreadyPresent { .. }));
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_no_directory() {
        let dir = tempfile::tempdir().unwrap();

        let outcome = fetch_geo_data(&OfflineSource, GEO_URL, dir.path()).await;
        assert!(matches!(outcome, FetchOutcome::Failed(FetchError::Io(_))));
        assert!(!dir.path().join("mg_2020_integrado").exists());

        let source = CountingSource::new(b"not a zip".to_vec());
        let outcome = fetch_geo_data(&source, GEO_URL, dir.path()).await;
        assert!(matches!(outcome, FetchOutcome::Failed(FetchError::Archive(_))));
        assert!(!dir.path().join("mg_2020_integrado").exists());
    }

    #[tokio::test]
    async fn test_core_data_keeps_extension() {
        let dir = tempfile::tempdir().unwrap();
        let source = CountingSource::new(b"xlsx bytes".to_vec());

        let path = fetch_core_data(
            &source,
            "https://example.org/core/ITER_NALXLSX20.xlsx",
            &dir.path().join("raw"),
            "core",
        )
        .await
        .unwrap();

        assert_eq!(path, dir.path().join("raw").join("core.xlsx"));
        assert_eq!(fs::read(path).unwrap(), b"xlsx bytes");
    }

    #[test]
    fn test_transport_builds_with_scoped_tls_option() {
        let config = TransportConfig {
            accept_invalid_certs: true,
            timeout_secs: 5,
        };
        assert!(Transport::new(&config).is_ok());
        assert!(Transport::new(&TransportConfig::default()).is_ok());
    }
}
