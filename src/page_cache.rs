use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, anyhow};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const RESULTS_BASE_URL: &str = "https://takarakuji.rakuten.co.jp/backnumber";
const MANIFEST_FILE: &str = "manifest.json";
const MANIFEST_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct Manifest {
    version: u32,
    pages: BTreeMap<String, ManifestEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ManifestEntry {
    url: String,
    bytes: usize,
    fetched_at: u64,
}

#[derive(Debug, Clone, Default)]
pub struct FetchSummary {
    pub fetched: Vec<PathBuf>,
    pub skipped: usize,
    pub errors: Vec<String>,
}

/// Issue list file: a JSON array such as `["202401", "1850-1854"]`.
pub fn load_issue_numbers(path: &Path) -> Result<Vec<String>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read issue list {}", path.display()))?;
    let issues: Vec<String> =
        serde_json::from_str(&raw).with_context(|| format!("parse issue list {}", path.display()))?;
    Ok(issues
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

/// Month pages (`202401`) live under the backnumber listing, draw ranges
/// (`1850-1854`) under the detail listing.
pub fn page_url(issue: &str) -> String {
    page_url_at(RESULTS_BASE_URL, issue)
}

fn page_url_at(base: &str, issue: &str) -> String {
    let base = base.trim_end_matches('/');
    if issue.contains('-') {
        format!("{base}/loto6_detail/{issue}/")
    } else {
        format!("{base}/loto6/{issue}/")
    }
}

pub struct PageCache {
    dir: PathBuf,
    delay: Duration,
    base_url: String,
}

impl PageCache {
    pub fn new(dir: impl Into<PathBuf>, delay: Duration) -> Self {
        Self {
            dir: dir.into(),
            delay,
            base_url: RESULTS_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn page_path(&self, issue: &str) -> PathBuf {
        self.dir.join(format!("{issue}.bin"))
    }

    pub fn cached_pages(&self) -> Result<Vec<PathBuf>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(err).with_context(|| format!("list {}", self.dir.display()));
            }
        };
        let mut out = Vec::new();
        for entry in entries {
            let path = entry.context("read cache entry")?.path();
            if path.extension().is_some_and(|ext| ext == "bin") {
                out.push(path);
            }
        }
        out.sort();
        Ok(out)
    }

    pub fn fetch_missing(&self, client: &Client, issues: &[String]) -> Result<FetchSummary> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("create cache dir {}", self.dir.display()))?;
        let mut manifest = self.load_manifest();
        let mut summary = FetchSummary::default();

        for issue in issues {
            let path = self.page_path(issue);
            if path.is_file() {
                info!(issue = %issue, "skipped: already cached");
                summary.skipped += 1;
                continue;
            }
            let url = page_url_at(&self.base_url, issue);
            let fetched = fetch_page(client, &url)
                .and_then(|body| write_atomic(&path, &body).map(|()| body));
            match fetched {
                Ok(body) => {
                    manifest.pages.insert(
                        issue.clone(),
                        ManifestEntry {
                            url,
                            bytes: body.len(),
                            fetched_at: system_time_to_secs(SystemTime::now()).unwrap_or_default(),
                        },
                    );
                    info!(issue = %issue, bytes = body.len(), "fetched page");
                    summary.fetched.push(path);
                }
                Err(err) => {
                    warn!(issue = %issue, error = %err, "page fetch failed");
                    summary.errors.push(format!("{issue}: {err:#}"));
                }
            }
            thread::sleep(self.delay);
        }

        manifest.version = MANIFEST_VERSION;
        self.save_manifest(&manifest)?;
        Ok(summary)
    }

    fn load_manifest(&self) -> Manifest {
        let Ok(raw) = fs::read_to_string(self.dir.join(MANIFEST_FILE)) else {
            return Manifest::default();
        };
        match serde_json::from_str::<Manifest>(&raw) {
            Ok(manifest) if manifest.version == MANIFEST_VERSION => manifest,
            Ok(manifest) => {
                warn!(version = manifest.version, "page manifest version changed, starting fresh");
                Manifest::default()
            }
            Err(err) => {
                warn!(error = %err, "page manifest unreadable, starting fresh");
                Manifest::default()
            }
        }
    }

    fn save_manifest(&self, manifest: &Manifest) -> Result<()> {
        let json = serde_json::to_vec_pretty(manifest).context("serialize page manifest")?;
        write_atomic(&self.dir.join(MANIFEST_FILE), &json)
    }
}

fn fetch_page(client: &Client, url: &str) -> Result<Vec<u8>> {
    let resp = client.get(url).send().context("request failed")?;
    let status = resp.status();
    if !status.is_success() {
        return Err(anyhow!("http {status} for {url}"));
    }
    let body = resp.bytes().context("failed reading body")?;
    Ok(body.to_vec())
}

pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, bytes).with_context(|| format!("write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("swap {}", path.display()))?;
    Ok(())
}

fn system_time_to_secs(time: SystemTime) -> Option<u64> {
    time.duration_since(UNIX_EPOCH).ok().map(|d| d.as_secs())
}
