use std::sync::Arc;

use tally_core::{config::Config, store::VisitStore};

use crate::geo::GeoResolver;

/// Shared application state injected into every Axum handler via
/// [`axum::extract::State`].
///
/// Built once in `main` and never mutated afterwards.
pub struct AppState {
    /// The persistence collaborator. DuckDB in production; tests substitute
    /// their own implementations.
    pub store: Arc<dyn VisitStore>,

    /// Parsed configuration, loaded once at startup from environment variables.
    pub config: Arc<Config>,

    /// Read-only GeoIP resolver.
    pub geo: Arc<GeoResolver>,
}

impl AppState {
    /// Construct state, loading the GeoIP database from `config.geoip_path`.
    pub fn new(store: Arc<dyn VisitStore>, config: Config) -> Self {
        let geo = GeoResolver::open(&config.geoip_path);
        Self::with_geo(store, config, geo)
    }

    pub fn with_geo(store: Arc<dyn VisitStore>, config: Config, geo: GeoResolver) -> Self {
        Self {
            store,
            config: Arc::new(config),
            geo: Arc::new(geo),
        }
    }
}
