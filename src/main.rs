use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use dotenvy::dotenv;
use tokio::signal;
use tracing::{error, info, warn};

use garage_manager::cache::{CacheConfig, RedisClient};
use garage_manager::config::{DatabaseConfig, EnvironmentConfig, StorageBackend};
use garage_manager::database::{create_pool, ensure_schema};
use garage_manager::repositories::{
    HttpRepository, LocalStorageRepository, MemoryRepository, PostgresRepository, VehicleRepository,
};
use garage_manager::routes::create_router;
use garage_manager::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();
    let config = EnvironmentConfig::from_env()?;

    // Configurar logging
    let level = config.log_level.parse::<tracing::Level>().unwrap_or(tracing::Level::DEBUG);
    tracing_subscriber::fmt().with_max_level(level).init();

    info!("🚗 Garage Manager - API de garage");
    info!("================================================");
    info!("🌍 Entorno: {} | almacenamiento: {}", config.environment, config.storage_backend);

    let repository = build_repository(&config).await?;
    let app = create_router(AppState::new(config.clone(), repository));

    let addr: SocketAddr = config.server_url().parse()?;
    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health");
    info!("   GET|POST /api/garages/:owner/vehicles");
    info!("   GET|DELETE /api/garages/:owner/vehicles/:id");
    info!("   POST /api/garages/:owner/vehicles/:id/actions");
    info!("   PUT  /api/garages/:owner/vehicles/:id/visibility");
    info!("   POST /api/garages/:owner/vehicles/:id/maintenance");
    info!("   PUT|DELETE /api/garages/:owner/vehicles/:id/maintenance/:record_id");
    info!("   GET  /api/garages/:owner/stats | appointments | public-vehicles");
    info!("   POST /api/garages/:owner/sync");
    info!("   DELETE /api/garages/:owner/session");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    if let Err(e) = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await {
        error!("❌ Error del servidor: {}", e);
        return Err(e.into());
    }

    info!("👋 Servidor terminado");
    Ok(())
}

/// Elegir el backend de persistencia según la configuración
async fn build_repository(config: &EnvironmentConfig) -> Result<Arc<dyn VehicleRepository>> {
    let repository: Arc<dyn VehicleRepository> = match config.storage_backend {
        StorageBackend::Memory => {
            warn!("⚠️ Usando almacenamiento en memoria: los datos se pierden al reiniciar");
            Arc::new(MemoryRepository::new())
        }
        StorageBackend::Redis => {
            let cache_config = CacheConfig {
                redis_url: config.redis_url.clone(),
                quota_bytes: config.storage_quota_bytes,
                ..CacheConfig::default()
            };
            let client = RedisClient::new(&cache_config).await.map_err(|e| {
                error!("❌ Error conectando a Redis: {}", e);
                e
            })?;
            info!("✅ Redis conectado exitosamente");
            Arc::new(LocalStorageRepository::new(Arc::new(client), cache_config))
        }
        StorageBackend::Postgres => {
            let url = config
                .database_url
                .clone()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?;
            let pool = create_pool(&DatabaseConfig::new(url)).await.map_err(|e| {
                error!("❌ Error conectando a la base de datos: {}", e);
                e
            })?;
            ensure_schema(&pool).await?;
            info!("✅ PostgreSQL conectado exitosamente");
            Arc::new(PostgresRepository::new(pool))
        }
        StorageBackend::Api => {
            let url = config
                .persistence_api_url
                .clone()
                .ok_or_else(|| anyhow::anyhow!("PERSISTENCE_API_URL must be set"))?;
            let repository = HttpRepository::new(url)?;
            info!("✅ API de persistencia en {}", repository.base_url());
            Arc::new(repository)
        }
    };
    Ok(repository)
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo instalar el handler de Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo instalar el handler de SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
