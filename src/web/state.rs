use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::config::Config;
use crate::iss::IssFeed;
use crate::orbit::{Catalog, CatalogError};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub catalog: Arc<RwLock<Catalog>>,
    pub iss: Arc<IssFeed>,
    /// Serialises downloads. Readers of `catalog` never wait on it.
    pub loading: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(config: Config, catalog: Catalog, iss: IssFeed) -> Self {
        Self {
            config: Arc::new(config),
            catalog: Arc::new(RwLock::new(catalog)),
            iss: Arc::new(iss),
            loading: Arc::new(Mutex::new(())),
        }
    }

    /// Reload the catalog if its cache expired. The download runs with no
    /// catalog lock held; the write lock only covers installing the result.
    pub async fn refresh_catalog(&self) -> Result<(), CatalogError> {
        if !self.catalog.read().await.is_stale() {
            return Ok(());
        }

        let _loading = self.loading.lock().await;
        let loader = {
            let catalog = self.catalog.read().await;
            // Another request may have reloaded while this one waited.
            if !catalog.is_stale() {
                return Ok(());
            }
            catalog.loader()
        };

        let result = loader.load_all().await;
        self.catalog.write().await.apply_reload(result)
    }

    /// Ask the source for an id missing from the catalog and merge the
    /// answer, again without holding the catalog lock over the download.
    pub async fn look_up(&self, norad_id: u32) -> Result<(), CatalogError> {
        let _loading = self.loading.lock().await;
        let loader = {
            let catalog = self.catalog.read().await;
            if catalog.lookup_settled(norad_id) {
                return Ok(());
            }
            catalog.loader()
        };

        let found = loader.load_one(norad_id).await?;
        self.catalog.write().await.merge_lookup(norad_id, found);
        Ok(())
    }
}
