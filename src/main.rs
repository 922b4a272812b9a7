// src/main.rs
use std::process::ExitCode;
use std::sync::Arc;

use thiserror::Error;

use packwise::catalog::{BoxCatalog, LoadError, MaterialFactors};
use packwise::config::{self, AppConfig, LoggingConfig};
use packwise::service::PackagingService;
use packwise::{api, logging, savings};

#[derive(Debug, Error)]
enum StartupError {
    #[error("failed to load box catalog: {0}")]
    Catalog(#[source] LoadError),
    #[error("failed to load material factors: {0}")]
    Materials(#[source] LoadError),
    #[error("API server failed: {0}")]
    Server(#[from] std::io::Error),
}

/// Loads both tables and builds the service. Any failure aborts startup.
fn build_service(config: &config::DataConfig) -> Result<PackagingService, StartupError> {
    let catalog = BoxCatalog::load(config.box_catalog()).map_err(StartupError::Catalog)?;
    let factors = MaterialFactors::load(config.material_data()).map_err(StartupError::Materials)?;

    let service = PackagingService::new(Arc::new(catalog), Arc::new(factors));
    if !service.estimator().has_required_material() {
        tracing::warn!(
            material = savings::CARDBOARD,
            "material factor table has no cardboard row; savings requests will fail"
        );
    }
    Ok(service)
}

async fn run(app_config: AppConfig) -> Result<(), StartupError> {
    let service = build_service(&app_config.data)?;
    api::start_api_server(app_config.api, service).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let dotenv_result = dotenvy::dotenv();
    logging::init(&LoggingConfig::from_env());

    if let Err(err) = dotenv_result {
        if !matches!(err, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            tracing::warn!("Could not load .env: {}", err);
        }
    }

    let app_config = AppConfig::from_env();

    tracing::info!("🚀 Packaging service starting...");
    match run(app_config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("❌ {err}");
            ExitCode::FAILURE
        }
    }
}
