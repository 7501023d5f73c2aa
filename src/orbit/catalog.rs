use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::orbit::{parse_tle_text, TleEntry};
use crate::types::SatelliteSummary;

/// Upper bound on search hits returned to the dashboard.
pub const MAX_SEARCH_RESULTS: usize = 20;

/// Wait this long before retrying a failed reload or asking CelesTrak again
/// for an id it did not know.
const RETRY_AFTER: Duration = Duration::from_secs(300);

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("TLE directory not found: {0}")]
    DirectoryNotFound(String),
    #[error("TLE file read error: {0}")]
    Io(#[from] std::io::Error),
    #[error("catalog download failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("no valid element sets in {0}")]
    Empty(String),
}

#[derive(Debug, Clone)]
pub enum CatalogSource {
    /// Every `*.tle` / `*.txt` file in a directory.
    Folder(PathBuf),
    /// CelesTrak `gp.php` endpoint and the group to download.
    Celestrak { url: String, group: String },
}

/// Reads element sets from a source. Holds no catalog state, so callers can
/// clone one out of a locked catalog and load without the lock.
#[derive(Debug, Clone)]
pub struct CatalogLoader {
    source: CatalogSource,
    http: reqwest::Client,
}

impl CatalogLoader {
    pub async fn load_all(&self) -> Result<Vec<TleEntry>, CatalogError> {
        let entries = match &self.source {
            CatalogSource::Folder(dir) => load_folder(dir)?,
            CatalogSource::Celestrak { url, group } => {
                let text = self
                    .download(url, &[("GROUP", group.as_str()), ("FORMAT", "tle")])
                    .await?;
                parse_tle_text(&text, &format!("celestrak:{}", group))
            }
        };

        if entries.is_empty() {
            return Err(CatalogError::Empty(self.describe()));
        }
        Ok(entries)
    }

    /// Ask CelesTrak for one catalog number. Folder sources have nothing
    /// beyond what `load_all` read.
    pub async fn load_one(&self, norad_id: u32) -> Result<Vec<TleEntry>, CatalogError> {
        match &self.source {
            CatalogSource::Folder(_) => Ok(Vec::new()),
            CatalogSource::Celestrak { url, .. } => {
                let id = norad_id.to_string();
                let text = self
                    .download(url, &[("CATNR", id.as_str()), ("FORMAT", "tle")])
                    .await?;
                Ok(parse_tle_text(&text, &format!("celestrak:{}", id)))
            }
        }
    }

    async fn download(&self, url: &str, query: &[(&str, &str)]) -> Result<String, CatalogError> {
        log::debug!("Downloading element sets from {} {:?}", url, query);
        let text = self
            .http
            .get(url)
            .query(query)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(text)
    }

    fn describe(&self) -> String {
        match &self.source {
            CatalogSource::Folder(dir) => dir.display().to_string(),
            CatalogSource::Celestrak { url, group } => format!("{} (group {})", url, group),
        }
    }
}

/// Cached set of element sets keyed by NORAD id.
pub struct Catalog {
    loader: CatalogLoader,
    cache_for: Duration,
    satellites: HashMap<u32, TleEntry>,
    next_refresh: Option<Instant>,
    missing: HashMap<u32, Instant>,
}

impl Catalog {
    pub fn new(
        source: CatalogSource,
        cache_for: Duration,
        timeout: Duration,
    ) -> Result<Self, CatalogError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            loader: CatalogLoader { source, http },
            cache_for,
            satellites: HashMap::new(),
            next_refresh: None,
            missing: HashMap::new(),
        })
    }

    pub fn loader(&self) -> CatalogLoader {
        self.loader.clone()
    }

    pub fn len(&self) -> usize {
        self.satellites.len()
    }

    pub fn is_stale(&self) -> bool {
        self.satellites.is_empty() || self.next_refresh.map_or(true, |at| Instant::now() >= at)
    }

    /// Reload when the cache has expired. Only for exclusive owners: the
    /// shared server state loads through `loader()` and `apply_reload`.
    pub async fn ensure_fresh(&mut self) -> Result<(), CatalogError> {
        if !self.is_stale() {
            return Ok(());
        }
        let result = self.loader.load_all().await;
        self.apply_reload(result)
    }

    /// Install the outcome of `CatalogLoader::load_all`. A failed reload keeps
    /// serving the previous set and is only an error when nothing was loaded.
    pub fn apply_reload(
        &mut self,
        result: Result<Vec<TleEntry>, CatalogError>,
    ) -> Result<(), CatalogError> {
        match result {
            Ok(entries) => {
                self.satellites = entries.into_iter().map(|e| (e.norad_id, e)).collect();
                self.next_refresh = Some(Instant::now() + self.cache_for);
                self.missing.clear();
                log::info!(
                    "Loaded {} satellites from {}",
                    self.satellites.len(),
                    self.loader.describe()
                );
                Ok(())
            }
            Err(e) if !self.satellites.is_empty() => {
                log::warn!(
                    "Catalog refresh failed, keeping {} cached satellites: {}",
                    self.satellites.len(),
                    e
                );
                self.next_refresh = Some(Instant::now() + RETRY_AFTER.min(self.cache_for));
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Merge the answer to a single-id lookup. An answer without `norad_id`
    /// is remembered so the id is not asked for again straight away.
    pub fn merge_lookup(&mut self, norad_id: u32, entries: Vec<TleEntry>) {
        for entry in entries {
            log::debug!("Merged {} ({}) into catalog", entry.name, entry.norad_id);
            self.satellites.insert(entry.norad_id, entry);
        }
        if self.satellites.contains_key(&norad_id) {
            self.missing.remove(&norad_id);
        } else {
            self.missing.insert(norad_id, Instant::now() + RETRY_AFTER);
        }
    }

    /// True when a lookup for `norad_id` is neither needed nor worth retrying yet.
    pub fn lookup_settled(&self, norad_id: u32) -> bool {
        self.satellites.contains_key(&norad_id)
            || self
                .missing
                .get(&norad_id)
                .is_some_and(|until| Instant::now() < *until)
    }

    /// Look up one satellite, asking the source directly when it is not in
    /// the cached set.
    pub async fn fetch_one(&mut self, norad_id: u32) -> Result<Option<&TleEntry>, CatalogError> {
        if !self.lookup_settled(norad_id) {
            let found = self.loader.load_one(norad_id).await?;
            self.merge_lookup(norad_id, found);
        }
        Ok(self.satellites.get(&norad_id))
    }

    pub fn get(&self, norad_id: u32) -> Option<&TleEntry> {
        self.satellites.get(&norad_id)
    }

    pub fn entries(&self) -> impl Iterator<Item = &TleEntry> {
        self.satellites.values()
    }

    /// Digits match a NORAD id prefix, anything else a case-insensitive
    /// substring of the name.
    pub fn search(&self, query: &str, limit: usize) -> Vec<SatelliteSummary> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        let by_id = query.chars().all(|c| c.is_ascii_digit());
        let needle = query.to_lowercase();

        let mut hits: Vec<&TleEntry> = self
            .satellites
            .values()
            .filter(|e| {
                if by_id {
                    e.norad_id.to_string().starts_with(query)
                } else {
                    e.name.to_lowercase().contains(&needle)
                }
            })
            .collect();

        hits.sort_by(|a, b| a.name.cmp(&b.name).then(a.norad_id.cmp(&b.norad_id)));
        hits.into_iter()
            .take(limit)
            .map(|e| SatelliteSummary {
                id: e.norad_id.to_string(),
                name: e.name.clone(),
            })
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn insert(&mut self, entry: TleEntry) {
        self.satellites.insert(entry.norad_id, entry);
        self.next_refresh = Some(Instant::now() + self.cache_for);
    }
}

fn load_folder(dir: &Path) -> Result<Vec<TleEntry>, CatalogError> {
    if !dir.exists() {
        return Err(CatalogError::DirectoryNotFound(dir.display().to_string()));
    }

    let mut entries = Vec::new();
    for item in fs::read_dir(dir)? {
        let path = item?.path();
        if !path.is_file() {
            continue;
        }
        let is_tle = path
            .extension()
            .is_some_and(|ext| ext == "tle" || ext == "txt");
        if !is_tle {
            continue;
        }

        let filename = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        match fs::read_to_string(&path) {
            Ok(content) => entries.extend(parse_tle_text(&content, &filename)),
            Err(e) => log::warn!("Failed to read TLE file {}: {}", path.display(), e),
        }
    }

    Ok(entries)
}
