use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::application::composition::{
    BackgroundSource, CompositionContext, CompositionEngine, CompositionOutput, OutputTargets,
    StageObserver, TracingObserver, DEFAULT_GRADIENT_FROM, DEFAULT_GRADIENT_TO,
};
use crate::application::dedup::{Deduplicator, DigestGuard, DigestLocks, Resolution};
use crate::application::dto::{ComposeResponse, CompositionRequest, RawImageHash, Requester};
use crate::application::errors::ComposeError;
use crate::application::ports::{ImageRepository, ImageStore, TakeUploadError, UploadAssembler};
use crate::application::validation::validate_composition;
use crate::domain::entities::{CompositionMeta, FinalImage, RawImage};
use crate::domain::value_objects::{
    BackgroundKind, ContentHash, ImageId, OriginalRef, StorageNamespace, UploadSessionKey,
};

/// Largest preview edge accepted unless configured lower
pub const DEFAULT_MAX_CANVAS_EDGE: u32 = 8000;

/// Background bytes a composition runs against
enum RawSource {
    /// Gradient or transparent canvas
    Generated(OriginalRef),
    /// A stored raw image with the same digest was reused
    Existing(RawImage),
    /// The upload was promoted into the raw namespace by this request
    Fresh {
        file_name: String,
        digest: ContentHash,
        created: bool,
    },
}

impl RawSource {
    fn digest(&self) -> RawImageHash {
        match self {
            RawSource::Generated(_) => RawImageHash::None,
            RawSource::Existing(raw) => RawImageHash::Digest(raw.digest().clone()),
            RawSource::Fresh { digest, .. } => RawImageHash::Digest(digest.clone()),
        }
    }

    fn file_name(&self) -> Option<&str> {
        match self {
            RawSource::Generated(_) => None,
            RawSource::Existing(raw) => Some(raw.file_name()),
            RawSource::Fresh { file_name, .. } => Some(file_name),
        }
    }
}

/// Use case: compose a promotional image end to end.
///
/// Resolves the background (upload, reused duplicate or generated canvas),
/// runs the composition engine on a blocking thread and records the result.
/// Nothing is written to the record store unless the engine succeeded.
pub struct ComposeImageUseCase {
    repository: Arc<dyn ImageRepository>,
    store: Arc<dyn ImageStore>,
    uploads: Arc<dyn UploadAssembler>,
    dedup: Deduplicator,
    digest_locks: DigestLocks,
    engine: Arc<CompositionEngine>,
    observer: Arc<dyn StageObserver>,
    max_canvas_edge: u32,
}

impl ComposeImageUseCase {
    pub fn new(
        repository: Arc<dyn ImageRepository>,
        store: Arc<dyn ImageStore>,
        uploads: Arc<dyn UploadAssembler>,
        engine: Arc<CompositionEngine>,
    ) -> Self {
        Self {
            dedup: Deduplicator::new(Arc::clone(&repository), Arc::clone(&store)),
            digest_locks: DigestLocks::new(),
            repository,
            store,
            uploads,
            engine,
            observer: Arc::new(TracingObserver),
            max_canvas_edge: DEFAULT_MAX_CANVAS_EDGE,
        }
    }

    /// Lower the largest accepted preview width or height
    pub fn with_max_canvas_edge(mut self, max_canvas_edge: u32) -> Self {
        self.max_canvas_edge = max_canvas_edge;
        self
    }

    /// Replace the default logging observer
    pub fn with_observer(mut self, observer: Arc<dyn StageObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub async fn execute(
        &self,
        requester: Requester,
        request: CompositionRequest,
    ) -> Result<ComposeResponse, ComposeError> {
        validate_composition(&request)?;
        let size = request.preview.size;
        if size.width > self.max_canvas_edge || size.height > self.max_canvas_edge {
            return Err(ComposeError::InvalidRequest(format!(
                "preview size {}x{} exceeds {} pixels",
                size.width, size.height, self.max_canvas_edge
            )));
        }

        // held until the raw record is written or the fresh raw file removed
        let (background, raw, _digest_guard) =
            self.resolve_source(&requester, &request).await?;
        let ctx = self.build_context(&request, background, &raw);

        let engine = Arc::clone(&self.engine);
        let observer = Arc::clone(&self.observer);
        let outcome = tokio::task::spawn_blocking(move || engine.compose(&ctx, observer.as_ref()))
            .await
            .map_err(|e| ComposeError::Worker(e.to_string()));

        let output = match outcome {
            Ok(Ok(output)) => output,
            Ok(Err(stage_error)) => {
                self.discard_fresh_raw(&raw).await;
                return Err(stage_error.into());
            }
            Err(e) => {
                self.discard_fresh_raw(&raw).await;
                return Err(e);
            }
        };

        match self.persist(&requester, &request, &raw, &output).await {
            Ok(image) => {
                info!(
                    image_id = %image.id(),
                    file = image.file_name(),
                    original = %image.original().to_column(),
                    "composition stored"
                );
                Ok(ComposeResponse {
                    success: true,
                    filename: output.file_name.clone(),
                    raw_image_hash: raw.digest(),
                })
            }
            Err(e) => {
                error!(error = %e, "failed to record composition, removing its files");
                if let Err(cleanup) = self
                    .store
                    .delete(StorageNamespace::Final, &output.file_name)
                    .await
                {
                    warn!(error = %cleanup, "failed to remove final image after error");
                }
                self.discard_fresh_raw(&raw).await;
                Err(e)
            }
        }
    }

    async fn resolve_source(
        &self,
        requester: &Requester,
        request: &CompositionRequest,
    ) -> Result<(BackgroundSource, RawSource, Option<DigestGuard<'_>>), ComposeError> {
        match request.image.kind {
            BackgroundKind::Transparent => Ok((
                BackgroundSource::Transparent,
                RawSource::Generated(OriginalRef::Transparent),
                None,
            )),
            BackgroundKind::Gradient => {
                let (from, to) = request
                    .image
                    .gradient
                    .as_ref()
                    .map(|g| (g.from, g.to))
                    .unwrap_or((DEFAULT_GRADIENT_FROM, DEFAULT_GRADIENT_TO));
                Ok((
                    BackgroundSource::Gradient { from, to },
                    RawSource::Generated(OriginalRef::Gradient),
                    None,
                ))
            }
            BackgroundKind::Custom => {
                let name = request.image.name.as_deref().unwrap_or_default();
                let key = UploadSessionKey::new(requester.id, name)?;
                let (raw, guard) = self.take_and_dedup(&key).await?;
                let file_name = raw.file_name().unwrap_or_default();
                let path = self.store.locate(StorageNamespace::Raw, file_name);
                Ok((BackgroundSource::Custom { path }, raw, Some(guard)))
            }
        }
    }

    async fn take_and_dedup(
        &self,
        key: &UploadSessionKey,
    ) -> Result<(RawSource, DigestGuard<'_>), ComposeError> {
        let upload = self.uploads.take_completed(key).await.map_err(|e| match e {
            TakeUploadError::Incomplete(k) => ComposeError::UploadIncomplete(k),
            TakeUploadError::Unknown(k) => {
                ComposeError::InvalidImage(format!("no completed upload for {}", k))
            }
        })?;

        let digest = match self.dedup.digest(&upload).await {
            Ok(digest) => digest,
            Err(e) => {
                if let Err(cleanup) = self.store.discard_upload(upload).await {
                    warn!(error = %cleanup, "failed to remove unhashable upload");
                }
                return Err(e);
            }
        };

        let guard = self.digest_locks.lock(&digest).await;
        let raw = match self.dedup.resolve(upload, &digest).await? {
            Resolution::Duplicate(raw) => RawSource::Existing(raw),
            Resolution::New(upload) => {
                let promotion = self.store.promote_upload(upload, &digest).await?;
                RawSource::Fresh {
                    file_name: promotion.file_name,
                    digest,
                    created: promotion.created,
                }
            }
        };
        Ok((raw, guard))
    }

    fn build_context(
        &self,
        request: &CompositionRequest,
        background: BackgroundSource,
        raw: &RawSource,
    ) -> CompositionContext {
        let raw_thumb: Option<PathBuf> = raw
            .file_name()
            .map(|name| self.store.locate_thumb(StorageNamespace::Raw, name));

        CompositionContext {
            width: request.preview.size.width,
            height: request.preview.size.height,
            zoom: request.image.zoom,
            offset: (request.image.pos.x, request.image.pos.y),
            background,
            border: request.border.clone(),
            copyright: request.copyright.clone(),
            logo: request.logo.clone(),
            bars: request.bars.clone(),
            output: OutputTargets {
                final_dir: self.store.namespace_dir(StorageNamespace::Final),
                final_thumb_dir: self.store.thumb_dir(StorageNamespace::Final),
                raw_thumb,
            },
        }
    }

    async fn persist(
        &self,
        requester: &Requester,
        request: &CompositionRequest,
        raw: &RawSource,
        output: &CompositionOutput,
    ) -> Result<FinalImage, ComposeError> {
        let bar_texts = request.bar_texts();

        let original = match raw {
            RawSource::Generated(sentinel) => *sentinel,
            RawSource::Existing(existing) => OriginalRef::Raw(existing.id()),
            RawSource::Fresh {
                file_name, digest, ..
            } => {
                let (width, height) = output.source_size;
                let new_raw = RawImage::new(
                    file_name.clone(),
                    digest.clone(),
                    requester.id,
                    width,
                    height,
                    bar_texts.clone(),
                );
                OriginalRef::Raw(self.repository.insert_raw_image(&new_raw).await?)
            }
        };

        let meta = CompositionMeta {
            width: request.preview.size.width,
            height: request.preview.size.height,
            zoom: request.image.zoom,
            border: request.border.kind.to_string(),
            logo: request.logo.as_ref().map(|l| l.src.clone()),
            bar_texts: bar_texts.clone(),
            copyright: request
                .copyright
                .as_ref()
                .map(|c| c.text.clone())
                .filter(|t| !t.trim().is_empty()),
        };
        let image = FinalImage::new(
            output.file_name.clone(),
            output.thumb_file_name.clone(),
            original,
            meta,
            requester.id,
        );

        if let Err(e) = self.repository.insert_final_image(&image).await {
            if let RawSource::Fresh { .. } = raw {
                if let Some(raw_id) = original.raw_id() {
                    self.forget_raw(raw_id).await;
                }
            }
            return Err(e.into());
        }

        if let RawSource::Existing(existing) = raw {
            // texts are only a search aid; the composition itself succeeded
            if let Err(e) = self
                .repository
                .append_bar_texts(&existing.id(), &bar_texts)
                .await
            {
                warn!(raw_id = %existing.id(), error = %e, "failed to append bar texts");
            }
        }

        Ok(image)
    }

    async fn forget_raw(&self, raw_id: ImageId) {
        if let Err(e) = self.repository.delete(&raw_id).await {
            warn!(raw_id = %raw_id, error = %e, "failed to remove raw image record");
        }
    }

    /// Remove a raw file this request promoted; reused files are left alone
    async fn discard_fresh_raw(&self, raw: &RawSource) {
        if let RawSource::Fresh {
            file_name,
            created: true,
            ..
        } = raw
        {
            if let Err(e) = self.store.delete(StorageNamespace::Raw, file_name).await {
                warn!(file = %file_name, error = %e, "failed to remove promoted upload");
            }
        }
    }
}
