//! HTTP surface of the integrity monitor

use actix_web::{web, App, HttpServer};
use common::{Config, Result};
use log::info;
use std::sync::Arc;
use crate::engine::IntegrityEngine;
use crate::security::{AuthGate, ChallengeStore};

pub mod handlers;

/// Shared state handed to every handler.
pub struct AppState {
    pub gate: AuthGate,
    pub engine: Arc<IntegrityEngine>,
    pub enable_demo_keys: bool,
}

impl AppState {
    pub fn from_config(config: &Config) -> Result<Self> {
        let store = ChallengeStore::new(config.challenge_length, config.challenge_ttl)
            .with_capacity(config.challenge_capacity);

        Ok(Self {
            gate: AuthGate::new(store, config.client_public_key.clone()),
            engine: Arc::new(IntegrityEngine::from_config(config)?),
            enable_demo_keys: config.enable_demo_keys,
        })
    }
}

/// Registers every route; shared by the server and the HTTP tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/")
            .route(web::get().to(handlers::issue_challenge))
            .route(web::post().to(handlers::hash_files)),
    )
    .service(
        web::resource("/GetFilesStructure")
            .route(web::get().to(handlers::issue_challenge))
            .route(web::post().to(handlers::file_tree)),
    )
    .service(web::resource("/GetECDSA").route(web::get().to(handlers::demo_keys)))
    .service(
        web::scope("/api")
            .service(web::resource("/status").to(handlers::get_status)),
    );
}

pub struct MonitorServer {
    bind_address: String,
    state: web::Data<AppState>,
}

impl MonitorServer {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            bind_address: config.bind_address.clone(),
            state: web::Data::new(AppState::from_config(config)?),
        })
    }

    pub async fn start(&self) -> Result<()> {
        let state = self.state.clone();

        info!("Monitoring {}", state.engine.root().display());
        info!("Code signing checks {}", if state.engine.code_signing_enabled() { "enabled" } else { "disabled" });
        info!("Starting HTTP server on {}", self.bind_address);

        HttpServer::new(move || {
            App::new()
                .app_data(state.clone())
                .configure(configure)
        })
        .bind(&self.bind_address)?
        .run()
        .await?;

        info!("HTTP server stopped");
        Ok(())
    }
}
