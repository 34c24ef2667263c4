use std::{ops::Deref, sync::Arc, time::Instant};

use tracing::info;
use twilight_http::Client as HttpClient;

use crate::core::{
    adapter::TwilightAdapter,
    cache::Cache,
    config::EnvConfig,
    engine::Engine,
    vanity::VanityMonitor,
};

#[derive(Debug)]
pub struct AppStateInner {
    pub http: Arc<HttpClient>,
    pub adapter: TwilightAdapter,
    pub config: EnvConfig,
    pub engine: Engine<TwilightAdapter>,
    pub vanity: VanityMonitor,
    pub cache: Cache,
    pub started_at: Instant,
}

#[derive(Debug, Clone)]
pub struct AppState(Arc<AppStateInner>);

impl AppState {
    pub fn new(config: EnvConfig) -> AppState {
        info!("Initializing AppState contents...");

        let http = Arc::new(HttpClient::new(config.discord_token.clone()));
        let adapter = TwilightAdapter::new(http.clone());
        let engine = Engine::new(adapter.clone(), config.bridge);
        let vanity = VanityMonitor::new(config.vanity_codes.clone());

        AppState(Arc::new(AppStateInner {
            http,
            adapter,
            config,
            engine,
            vanity,
            cache: Cache::default(),
            started_at: Instant::now(),
        }))
    }
}

impl Deref for AppState {
    type Target = AppStateInner;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
