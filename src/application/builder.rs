use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

use crate::api::router::AppState;
use crate::application::{
    composition::{CompositionEngine, TextRenderer},
    gc::GarbageCollector,
    ports::{AssetSource, ImageRepository, ImageStore, UploadAssembler},
    use_cases::{AddLegalUseCase, ComposeImageUseCase, DeleteImageUseCase, SubmitChunkUseCase},
};
use crate::config::Config;
use crate::infrastructure::{
    assets::{FilesystemAssets, FontRenderer},
    persistence::{InMemoryImageRepository, PostgresImageRepository},
    storage::{LocalChunkAssembler, LocalImageStore, PathBuilder},
};

pub type BuildError = Box<dyn std::error::Error + Send + Sync>;

/// Application builder for clean dependency injection and setup
pub struct ApplicationBuilder {
    config: Config,
    pool: Option<sqlx::PgPool>,
    repository: Option<Arc<dyn ImageRepository>>,
    store: Option<Arc<dyn ImageStore>>,
    uploads: Option<Arc<dyn UploadAssembler>>,
    engine: Option<Arc<CompositionEngine>>,
}

impl ApplicationBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            pool: None,
            repository: None,
            store: None,
            uploads: None,
            engine: None,
        }
    }

    /// Initialize database connection pool with retry logic
    pub async fn with_database(mut self) -> Result<Self, BuildError> {
        info!("Connecting to database");

        // Retry connection with exponential backoff
        let mut retries = 3;
        let mut delay = Duration::from_secs(1);
        let pool = loop {
            match PgPoolOptions::new()
                .max_connections(self.config.db_max_connections)
                .min_connections(self.config.db_min_connections)
                .acquire_timeout(Duration::from_secs(self.config.db_acquire_timeout_secs))
                .idle_timeout(Some(Duration::from_secs(self.config.db_idle_timeout_secs)))
                .max_lifetime(Some(Duration::from_secs(self.config.db_max_lifetime_secs)))
                .connect(&self.config.database_url)
                .await
            {
                Ok(pool) => break pool,
                Err(e) if retries > 0 => {
                    retries -= 1;
                    warn!(
                        "Database connection failed, retrying in {:?} ({} retries left): {}",
                        delay, retries, e
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
                Err(e) => {
                    tracing::error!("Failed to connect to database after retries: {}", e);
                    return Err(Box::new(e));
                }
            }
        };

        info!(
            "Database pool configured: max={}, min={}, acquire_timeout={}s",
            self.config.db_max_connections,
            self.config.db_min_connections,
            self.config.db_acquire_timeout_secs,
        );

        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to run migrations: {}", e);
                e
            })?;

        self.repository = Some(Arc::new(PostgresImageRepository::new(pool.clone())));
        self.pool = Some(pool);
        Ok(self)
    }

    /// Keep records in process memory instead of Postgres
    pub fn with_in_memory_repository(mut self) -> Self {
        info!("Using in-memory image repository");
        self.repository = Some(Arc::new(InMemoryImageRepository::new()));
        self
    }

    /// Use a caller-provided repository
    pub fn with_repository(mut self, repository: Arc<dyn ImageRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Initialize storage, the upload assembler and the composition engine
    pub async fn with_infrastructure(mut self) -> Result<Self, BuildError> {
        let paths = PathBuilder::new(
            self.config.storage_root.clone(),
            self.config.upload_root.clone(),
        );

        let store = Arc::new(LocalImageStore::with_durability(
            paths.clone(),
            self.config.durable_writes,
        ));
        store.init().await?;

        let assembler = Arc::new(LocalChunkAssembler::new(
            paths,
            self.config.assembler_settings(),
        ));
        assembler.init().await?;

        let assets: Arc<dyn AssetSource> =
            Arc::new(FilesystemAssets::new(self.config.asset_root.clone()));
        let text: Option<Arc<dyn TextRenderer>> = match &self.config.font {
            Some(font) => {
                let renderer = FontRenderer::from_asset(assets.as_ref(), font)?;
                info!(font = %font, "font loaded");
                Some(Arc::new(renderer))
            }
            None => {
                warn!("No font configured; requests with text will fail");
                None
            }
        };

        self.engine = Some(Arc::new(CompositionEngine::new(
            assets,
            text,
            self.config.engine_settings(),
        )));
        let store: Arc<dyn ImageStore> = store;
        let assembler: Arc<dyn UploadAssembler> = assembler;
        self.store = Some(store);
        self.uploads = Some(assembler);

        info!("Infrastructure layer initialized");
        Ok(self)
    }

    /// Build application state with all use cases
    pub fn build(&self) -> Result<AppState, BuildError> {
        let repository = self
            .repository
            .as_ref()
            .ok_or("Image repository not initialized")?;
        let store = self.store.as_ref().ok_or("Image store not initialized")?;
        let uploads = self
            .uploads
            .as_ref()
            .ok_or("Upload assembler not initialized")?;
        let engine = self.engine.as_ref().ok_or("Engine not initialized")?;

        let compose_use_case = Arc::new(
            ComposeImageUseCase::new(
                Arc::clone(repository),
                Arc::clone(store),
                Arc::clone(uploads),
                Arc::clone(engine),
            )
            .with_max_canvas_edge(self.config.max_canvas_edge),
        );
        let submit_chunk_use_case = Arc::new(SubmitChunkUseCase::new(Arc::clone(uploads)));
        let delete_use_case = Arc::new(DeleteImageUseCase::new(
            Arc::clone(repository),
            Arc::clone(store),
        ));
        let legal_use_case = Arc::new(AddLegalUseCase::new(Arc::clone(repository)));

        info!("Application layer initialized");

        Ok(AppState {
            pool: self.pool.clone().map(Arc::new),
            compose_use_case,
            submit_chunk_use_case,
            delete_use_case,
            legal_use_case,
            chunk_size: self.config.upload_chunk_size,
            allowed_origins: self.config.allowed_origins.clone(),
        })
    }

    /// Get garbage collector instance
    pub fn build_gc(&self) -> Result<Arc<GarbageCollector>, BuildError> {
        let repository = self
            .repository
            .as_ref()
            .ok_or("Image repository not initialized")?;
        let store = self.store.as_ref().ok_or("Image store not initialized")?;
        let uploads = self
            .uploads
            .as_ref()
            .ok_or("Upload assembler not initialized")?;

        Ok(Arc::new(GarbageCollector::new(
            Arc::clone(repository),
            Arc::clone(store),
            Arc::clone(uploads),
            self.config.gc_config(),
        )))
    }

    /// Get configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}
