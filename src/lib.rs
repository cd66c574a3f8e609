//! SignLens - sign language capture and translation.
//!
//! This is the main library crate. It turns camera recordings or uploaded
//! clips into fixed-length hand landmark sequences, sends them to a remote
//! translator and manages the capture session around that.

pub mod capture;
pub mod detector;
pub mod extract;
pub mod history;
pub mod landmarks;
pub mod recorder;
pub mod translate;
pub mod ui;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;

use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use capture::CameraDevice;
use detector::DetectorFactory;
use extract::FfmpegSourceFactory;
use history::JsonFileStore;
use recorder::{FfmpegRecorderFactory, SessionBackends, SessionConfig, SessionController};
use translate::{HttpTranslationService, OrchestratorDeps, TranslationOrchestrator};
use ui::SpeechSynthesizer;
use utils::AppConfig;

/// Initialize tracing/logging. Safe to call more than once.
pub fn init_logging() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "signlens=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Platform services supplied by the embedding front end
#[derive(Clone)]
pub struct Platform {
    pub camera: Arc<dyn CameraDevice>,
    pub detectors: Arc<dyn DetectorFactory>,
    pub speech: Arc<dyn SpeechSynthesizer>,
}

/// A fully wired application: session controller plus orchestrator
pub struct SignLens {
    config: AppConfig,
    session: Arc<SessionController>,
    orchestrator: Arc<TranslationOrchestrator>,
}

impl SignLens {
    pub fn new(config: AppConfig, platform: Platform) -> anyhow::Result<Self> {
        tracing::info!("Starting SignLens v{}", env!("CARGO_PKG_VERSION"));

        let store = JsonFileStore::open(config.store_path())
            .with_context(|| format!("Failed to open store {:?}", config.store_path()))?;
        let service = HttpTranslationService::from_config(&config)
            .context("Failed to create translation client")?;

        let session = SessionController::new(
            SessionBackends {
                camera: platform.camera,
                recorders: Arc::new(FfmpegRecorderFactory::new(config.pipeline.target_fps)),
                detectors: platform.detectors.clone(),
            },
            SessionConfig {
                pipeline: config.pipeline.clone(),
                detector: config.detector.clone(),
                ..SessionConfig::default()
            },
        );

        let orchestrator = Arc::new(TranslationOrchestrator::new(
            OrchestratorDeps {
                session: session.clone(),
                sources: Arc::new(FfmpegSourceFactory),
                detectors: platform.detectors,
                service: Arc::new(service),
                speech: platform.speech,
                store: Arc::new(store),
            },
            &config,
        ));

        tracing::info!("Translation service at {}", config.service_url);
        Ok(Self {
            config,
            session,
            orchestrator,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<SessionController> {
        &self.session
    }

    pub fn orchestrator(&self) -> &Arc<TranslationOrchestrator> {
        &self.orchestrator
    }

    /// Release the camera and the live detector
    pub async fn shutdown(&self) {
        self.orchestrator.stop_speaking();
        self.session.shutdown().await;
        tracing::info!("SignLens stopped");
    }
}
