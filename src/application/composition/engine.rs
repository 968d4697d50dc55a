use std::sync::Arc;

use tracing::debug;

use super::context::CompositionContext;
use super::observer::{StageEvent, StageObserver};
use super::output::ScratchFiles;
use super::stage::{Stage, StageError, StageErrorKind};
use super::text::TextRenderer;
use super::working::WorkingImage;
use super::{acquire, bars, border, copyright, logo, output, transform};
use crate::application::ports::AssetSource;

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub jpeg_quality: u8,
    pub thumbnail_max_edge: u32,
    /// Decoder refuses sources wider or taller than this
    pub max_source_edge: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            jpeg_quality: 90,
            thumbnail_max_edge: 320,
            max_source_edge: 20_000,
        }
    }
}

/// What a successful run left on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositionOutput {
    pub file_name: String,
    pub thumb_file_name: String,
    /// Upright size of the background before cropping
    pub source_size: (u32, u32),
    pub raw_thumb_written: bool,
}

/// Runs the fixed stage sequence against one context.
///
/// Synchronous and CPU bound; async callers should move it onto a
/// blocking thread.
pub struct CompositionEngine {
    assets: Arc<dyn AssetSource>,
    text: Option<Arc<dyn TextRenderer>>,
    settings: EngineSettings,
}

impl CompositionEngine {
    pub fn new(
        assets: Arc<dyn AssetSource>,
        text: Option<Arc<dyn TextRenderer>>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            assets,
            text,
            settings,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Run every applicable stage; the first failure ends the run and
    /// removes whatever files it had written.
    pub fn compose(
        &self,
        ctx: &CompositionContext,
        observer: &dyn StageObserver,
    ) -> Result<CompositionOutput, StageError> {
        let kind = ctx.background_kind();
        let mut scratch = ScratchFiles::default();

        observer.on_event(&StageEvent::Started(Stage::Acquire));
        let mut working = acquire::acquire(ctx, self.settings.max_source_edge)
            .map_err(|kind| Self::fail(observer, Stage::Acquire, kind))?;
        observer.on_event(&StageEvent::Completed(Stage::Acquire));

        for stage in Stage::ALL.into_iter().skip(1) {
            if !stage.applies_to(kind) {
                observer.on_event(&StageEvent::Skipped(stage));
                continue;
            }
            observer.on_event(&StageEvent::Started(stage));
            self.execute(stage, ctx, &mut working, &mut scratch)
                .map_err(|kind| Self::fail(observer, stage, kind))?;
            observer.on_event(&StageEvent::Completed(stage));
        }

        let (Some(file_name), Some(thumb_file_name)) = (working.saved.take(), working.thumb.take())
        else {
            return Err(StageError::new(
                Stage::Save,
                StageErrorKind::Failed("no output was produced".to_string()),
            ));
        };
        scratch.commit();

        debug!(file_name = %file_name, background = %kind, "composition finished");
        Ok(CompositionOutput {
            file_name,
            thumb_file_name,
            source_size: working.source_size,
            raw_thumb_written: working.raw_thumb_written,
        })
    }

    fn execute(
        &self,
        stage: Stage,
        ctx: &CompositionContext,
        working: &mut WorkingImage,
        scratch: &mut ScratchFiles,
    ) -> Result<(), StageErrorKind> {
        let text = self.text.as_deref();
        let s = &self.settings;
        match stage {
            Stage::Acquire => Ok(()),
            Stage::Orient => acquire::orient(working),
            Stage::NormalizeColorProfile => acquire::normalize_color_profile(working),
            Stage::Crop => transform::crop(ctx, working),
            Stage::Resize => transform::resize(ctx, working),
            Stage::MakeRawThumb => output::make_raw_thumb(
                ctx,
                working,
                scratch,
                s.thumbnail_max_edge,
                s.jpeg_quality,
            ),
            Stage::AddBorder => border::add_border(ctx, working, self.assets.as_ref()),
            Stage::AddCopyright => copyright::add_copyright(ctx, working, text),
            Stage::AddLogo => logo::add_logo(ctx, working, self.assets.as_ref(), text),
            Stage::AddBars => bars::add_bars(ctx, working, text),
            Stage::Save => output::save(ctx, working, scratch, s.jpeg_quality),
            Stage::MakeFinalThumb => output::make_final_thumb(
                ctx,
                working,
                scratch,
                s.thumbnail_max_edge,
                s.jpeg_quality,
            ),
        }
    }

    fn fail(observer: &dyn StageObserver, stage: Stage, kind: StageErrorKind) -> StageError {
        let err = StageError::new(stage, kind);
        observer.on_event(&StageEvent::failed(&err));
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::composition::context::{
        BackgroundSource, BarSpec, BarStyle, BorderKind, BorderSpec, CopyrightSpec, LogoSpec,
        OutputTargets,
    };
    use crate::application::composition::observer::RecordingObserver;
    use crate::application::composition::text::TextExtent;
    use crate::application::ports::{AssetError, MockAssetSource};
    use crate::domain::value_objects::HexColor;
    use image::{Rgba, RgbaImage};
    use tempfile::TempDir;

    struct BoxFont;

    impl TextRenderer for BoxFont {
        fn measure(&self, text: &str, px: f32) -> TextExtent {
            TextExtent {
                width: (text.chars().count() as f32 * px * 0.5).round() as u32,
                height: px.round() as u32,
            }
        }

        fn draw(
            &self,
            canvas: &mut RgbaImage,
            text: &str,
            px: f32,
            origin: (i32, i32),
            color: Rgba<u8>,
        ) {
            let extent = self.measure(text, px);
            crate::application::composition::raster::fill_rect(
                canvas,
                origin.0 as i64,
                origin.1 as i64,
                extent.width,
                extent.height,
                color,
            );
        }
    }

    fn context(dir: &TempDir, background: BackgroundSource) -> CompositionContext {
        CompositionContext {
            width: 120,
            height: 60,
            zoom: 1.0,
            offset: (0.0, 0.0),
            background,
            border: BorderSpec {
                kind: BorderKind::Fixed,
                width: Some(2),
                color: None,
                asset: None,
            },
            copyright: Some(CopyrightSpec {
                text: "(c) Someone".to_string(),
                color: None,
            }),
            logo: Some(LogoSpec {
                src: "logos/green.svg".to_string(),
                subline: None,
            }),
            bars: vec![BarSpec {
                text: "Hello".to_string(),
                style: BarStyle::Headline,
                background: None,
                color: None,
            }],
            output: OutputTargets {
                final_dir: dir.path().join("final"),
                final_thumb_dir: dir.path().join("final/thumbs"),
                raw_thumb: None,
            },
        }
    }

    const LOGO_SVG: &[u8] = br#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="5">
        <rect width="10" height="5" fill="red"/></svg>"#;

    fn svg_assets() -> MockAssetSource {
        let mut assets = MockAssetSource::new();
        assets
            .expect_load()
            .returning(|_| Ok(LOGO_SVG.to_vec()));
        assets
    }

    fn no_files_in(dir: &std::path::Path) -> bool {
        std::fs::read_dir(dir).map_or(true, |mut entries| entries.next().is_none())
    }

    fn engine(assets: MockAssetSource) -> CompositionEngine {
        CompositionEngine::new(
            Arc::new(assets),
            Some(Arc::new(BoxFont)),
            EngineSettings::default(),
        )
    }

    #[test]
    fn test_gradient_composition_writes_jpeg_and_thumb() {
        let dir = TempDir::new().unwrap();
        let ctx = context(
            &dir,
            BackgroundSource::Gradient {
                from: HexColor::BLACK,
                to: HexColor::WHITE,
            },
        );
        let observer = RecordingObserver::default();

        let output = engine(svg_assets()).compose(&ctx, &observer).unwrap();

        assert!(output.file_name.ends_with(".jpg"));
        let saved = image::open(dir.path().join("final").join(&output.file_name)).unwrap();
        assert_eq!((saved.width(), saved.height()), (120, 60));
        assert!(dir.path().join("final/thumbs").join(&output.thumb_file_name).exists());
        assert_eq!(observer.skipped().len(), 5);
    }

    #[test]
    fn test_transparent_composition_skips_photo_stages_and_writes_png() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir, BackgroundSource::Transparent);
        let observer = RecordingObserver::default();

        let output = engine(svg_assets()).compose(&ctx, &observer).unwrap();

        assert!(output.file_name.ends_with(".png"));
        for stage in [
            Stage::Orient,
            Stage::NormalizeColorProfile,
            Stage::Crop,
            Stage::Resize,
            Stage::MakeRawThumb,
        ] {
            assert!(!observer.was_started(stage), "{} must not run", stage);
        }
        assert_eq!(
            observer.executed(),
            vec![
                Stage::Acquire,
                Stage::AddBorder,
                Stage::AddCopyright,
                Stage::AddLogo,
                Stage::AddBars,
                Stage::Save,
                Stage::MakeFinalThumb
            ]
        );
        let saved = image::open(dir.path().join("final").join(&output.file_name))
            .unwrap()
            .to_rgba8();
        // the centre was never painted, so it stays see-through
        assert_eq!(saved.get_pixel(30, 20).0[3], 0);
    }

    #[test]
    fn test_missing_logo_stops_before_bars_and_save() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir, BackgroundSource::Transparent);
        let observer = RecordingObserver::default();
        let mut assets = MockAssetSource::new();
        assets
            .expect_load()
            .returning(|r| Err(AssetError::NotFound(r.to_string())));

        let err = engine(assets).compose(&ctx, &observer).unwrap_err();

        assert_eq!(err.stage, Stage::AddLogo);
        assert_eq!(
            err.kind,
            StageErrorKind::AssetMissing("logos/green.svg".to_string())
        );
        assert!(!observer.was_started(Stage::AddBars));
        assert!(!observer.was_started(Stage::Save));
        assert!(no_files_in(&dir.path().join("final")));
    }

    #[test]
    fn test_copyright_without_font_is_asset_missing() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir, BackgroundSource::Transparent);
        let engine =
            CompositionEngine::new(Arc::new(svg_assets()), None, EngineSettings::default());

        let err = engine.compose(&ctx, &RecordingObserver::default()).unwrap_err();

        assert_eq!(err.stage, Stage::AddCopyright);
        assert_eq!(err.to_string(), "AddCopyright: asset missing: font");
    }

    #[test]
    fn test_unreadable_custom_source_is_invalid_image() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"not a jpeg").unwrap();
        let ctx = context(&dir, BackgroundSource::Custom { path });

        let err = engine(svg_assets())
            .compose(&ctx, &RecordingObserver::default())
            .unwrap_err();

        assert_eq!(err.stage, Stage::Acquire);
        assert!(matches!(err.kind, StageErrorKind::InvalidImage(_)));
    }
}
