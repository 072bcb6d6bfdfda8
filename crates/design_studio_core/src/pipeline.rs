//! crates/design_studio_core/src/pipeline.rs
//!
//! The design content pipeline: one generative call per stage, memoized for the
//! lifetime of the process, plus the image generation sub-step.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{Mutex, OnceCell};
use tracing::{error, info, warn};

use crate::domain::{ContentBlock, DesignAttributes, DesignPackage, Stage};
use crate::ports::{ContentGenerator, ImageGenerator, ImageRequest, PortError};
use crate::prompts;

pub const DEFAULT_IMAGE_SEED: u64 = 42;
pub const DEFAULT_IMAGE_SIZE: u32 = 1024;

/// Fixed parameters of every image generation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSettings {
    pub seed: u64,
    /// Edge length of the square output, in pixels.
    pub size: u32,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            seed: DEFAULT_IMAGE_SEED,
            size: DEFAULT_IMAGE_SIZE,
        }
    }
}

pub struct ContentPipeline {
    generator: Arc<dyn ContentGenerator>,
    images: Arc<dyn ImageGenerator>,
    image_settings: ImageSettings,
    stage_cache: Cache<(Stage, DesignAttributes)>,
    remark_cache: Cache<String>,
}

/// One write-once slot per key. A slot left empty by a failed call is retried
/// by the next caller.
type Cache<K> = Mutex<HashMap<K, Arc<OnceCell<String>>>>;

async fn cache_slot<K: Eq + Hash>(cache: &Cache<K>, key: K) -> Arc<OnceCell<String>> {
    cache.lock().await.entry(key).or_default().clone()
}

impl ContentPipeline {
    pub fn new(
        generator: Arc<dyn ContentGenerator>,
        images: Arc<dyn ImageGenerator>,
        image_settings: ImageSettings,
    ) -> Self {
        Self {
            generator,
            images,
            image_settings,
            stage_cache: Mutex::new(HashMap::new()),
            remark_cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn image_settings(&self) -> ImageSettings {
        self.image_settings
    }

    /// Runs one stage for `attrs`.
    ///
    /// Successful results are cached by `(stage, attrs)`; a repeated call with the
    /// same inputs is answered from the cache without a network call, and
    /// concurrent callers of the same inputs wait for the first one. Failures are
    /// returned as [`ContentBlock::Failed`] and are not cached.
    pub async fn run(&self, stage: Stage, attrs: &DesignAttributes) -> ContentBlock {
        let cell = cache_slot(&self.stage_cache, (stage, attrs.clone())).await;
        if let Some(text) = cell.get() {
            info!("Stage '{}' served from cache.", stage);
            return ContentBlock::Generated(text.clone());
        }

        let prompt = prompts::stage_prompt(stage, attrs);
        let started = Instant::now();
        let result = cell
            .get_or_try_init(|| async {
                let text = self.generator.generate(&prompt).await?;
                info!("Stage '{}' generated in {:?}.", stage, started.elapsed());
                Ok::<_, PortError>(text)
            })
            .await;
        match result {
            Ok(text) => ContentBlock::Generated(text.clone()),
            Err(e) => {
                error!("Stage '{}' failed after {:?}: {}", stage, started.elapsed(), e);
                ContentBlock::Failed {
                    kind: e.kind(),
                    message: e.cause(),
                }
            }
        }
    }

    /// Runs `stages` one after another for the same attributes.
    /// A failing stage never prevents the remaining stages from running.
    pub async fn run_stages(&self, stages: &[Stage], attrs: &DesignAttributes) -> DesignPackage {
        let mut package = DesignPackage::new(attrs.clone());
        for &stage in stages {
            let block = self.run(stage, attrs).await;
            package.blocks.insert(stage, block);
        }
        package
    }

    /// Asks for a short analytics remark. Cached by the full prompt text.
    pub async fn remark(&self, context: &str, dataset_summary: &str) -> ContentBlock {
        let prompt = prompts::trend_insight(context, dataset_summary);
        let cell = cache_slot(&self.remark_cache, prompt.clone()).await;
        let result = cell
            .get_or_try_init(|| async {
                let text = self.generator.generate(&prompt).await?;
                Ok::<_, PortError>(text.trim().to_string())
            })
            .await;

        match result {
            Ok(text) => ContentBlock::Generated(text.clone()),
            Err(e) => {
                error!("Insight remark for '{}' failed: {}", context, e);
                ContentBlock::Failed {
                    kind: e.kind(),
                    message: e.cause(),
                }
            }
        }
    }

    /// Generates images for `prompt` with the fixed seed and square size.
    ///
    /// Returns the image references in the order the generator produced them,
    /// or an empty list when the generator failed or returned nothing usable.
    pub async fn generate_image(&self, prompt: &str) -> Vec<String> {
        let request = ImageRequest {
            prompt: prompt.to_string(),
            seed: self.image_settings.seed,
            width: self.image_settings.size,
            height: self.image_settings.size,
        };

        let started = Instant::now();
        match self.images.generate_image(&request).await {
            Ok(refs) if refs.is_empty() => {
                warn!("Image generator returned no usable reference.");
                refs
            }
            Ok(refs) => {
                info!("Generated {} image(s) in {:?}.", refs.len(), started.elapsed());
                refs
            }
            Err(e) => {
                error!("Image generation failed: {}", e);
                Vec::new()
            }
        }
    }

    pub fn images(&self) -> &Arc<dyn ImageGenerator> {
        &self.images
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{ErrorKind, PortResult};
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Answers with the prompt's first line and counts calls.
    /// Fails for any prompt containing `fail_on`.
    #[derive(Default)]
    struct CountingGenerator {
        calls: AtomicUsize,
        fail_on: Option<&'static str>,
    }

    #[async_trait]
    impl ContentGenerator for CountingGenerator {
        async fn generate(&self, prompt: &str) -> PortResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(marker) = self.fail_on {
                if prompt.contains(marker) {
                    return Err(PortError::Upstream("quota exceeded".to_string()));
                }
            }
            Ok(prompt.lines().next().unwrap_or_default().to_string())
        }
    }

    struct FixedImages {
        result: PortResult<Vec<String>>,
        last_request: std::sync::Mutex<Option<ImageRequest>>,
    }

    impl FixedImages {
        fn new(result: PortResult<Vec<String>>) -> Self {
            Self {
                result,
                last_request: std::sync::Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl ImageGenerator for FixedImages {
        async fn generate_image(&self, request: &ImageRequest) -> PortResult<Vec<String>> {
            *self.last_request.lock().unwrap() = Some(request.clone());
            match &self.result {
                Ok(refs) => Ok(refs.clone()),
                Err(e) => Err(PortError::Upstream(e.to_string())),
            }
        }

        async fn fetch_image(&self, _reference: &str) -> PortResult<Bytes> {
            Ok(Bytes::new())
        }
    }

    fn attrs() -> DesignAttributes {
        DesignAttributes {
            design_name: "Midnight Halo".to_string(),
            demographic: "Professionals".to_string(),
            length: "Medium".to_string(),
            color: "Black".to_string(),
            braid_type: "Box Braids".to_string(),
            style_note: String::new(),
            selected_insights: vec!["Box braids peak in August".to_string()],
        }
    }

    fn pipeline(generator: Arc<CountingGenerator>) -> ContentPipeline {
        let images = Arc::new(FixedImages::new(Ok(vec!["a.png".to_string()])));
        ContentPipeline::new(generator, images, ImageSettings::default())
    }

    #[tokio::test]
    async fn identical_inputs_call_generator_once() {
        let generator = Arc::new(CountingGenerator::default());
        let pipeline = pipeline(generator.clone());

        let first = pipeline.run(Stage::Marketing, &attrs()).await;
        let second = pipeline.run(Stage::Marketing, &attrs()).await;

        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
        assert_eq!(first, second);
    }

    /// Counts calls and answers after a short delay, so overlapping callers
    /// are both in flight at once.
    #[derive(Default)]
    struct SlowGenerator {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ContentGenerator for SlowGenerator {
        async fn generate(&self, _prompt: &str) -> PortResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            Ok("slow answer".to_string())
        }
    }

    #[tokio::test]
    async fn overlapping_identical_runs_share_one_call() {
        let generator = Arc::new(SlowGenerator::default());
        let images = Arc::new(FixedImages::new(Ok(Vec::new())));
        let pipeline = Arc::new(ContentPipeline::new(
            generator.clone(),
            images,
            ImageSettings::default(),
        ));

        let tasks: Vec<_> = (0..2)
            .map(|_| {
                let pipeline = pipeline.clone();
                tokio::spawn(async move {
                    pipeline
                        .run(Stage::Marketing, &DesignAttributes::default())
                        .await
                })
            })
            .collect();
        let mut blocks = Vec::new();
        for task in tasks {
            blocks.push(task.await.unwrap());
        }

        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
        assert_eq!(blocks[0], ContentBlock::Generated("slow answer".to_string()));
        assert_eq!(blocks[0], blocks[1]);
    }

    #[tokio::test]
    async fn overlapping_identical_remarks_share_one_call() {
        let generator = Arc::new(SlowGenerator::default());
        let images = Arc::new(FixedImages::new(Ok(Vec::new())));
        let pipeline = ContentPipeline::new(generator.clone(), images, ImageSettings::default());

        let (a, b) = tokio::join!(
            pipeline.remark("Top Region", "Texas leads"),
            pipeline.remark("Top Region", "Texas leads"),
        );

        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn changed_attributes_miss_the_cache() {
        let generator = Arc::new(CountingGenerator::default());
        let pipeline = pipeline(generator.clone());

        let mut other = attrs();
        other.color = "Blonde".to_string();
        pipeline.run(Stage::Packaging, &attrs()).await;
        pipeline.run(Stage::Packaging, &other).await;
        pipeline.run(Stage::Visuals, &attrs()).await;

        assert_eq!(generator.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn failing_stage_degrades_and_others_still_run() {
        let generator = Arc::new(CountingGenerator {
            fail_on: Some("Marketing plan"),
            ..Default::default()
        });
        let pipeline = pipeline(generator.clone());

        let package = pipeline.run_stages(&Stage::ALL, &attrs()).await;

        assert_eq!(package.blocks.len(), Stage::ALL.len());
        let marketing = package.block(Stage::Marketing).unwrap();
        assert_eq!(
            marketing,
            &ContentBlock::Failed {
                kind: ErrorKind::Upstream,
                message: "quota exceeded".to_string()
            }
        );
        assert!(package
            .display_text(Stage::Marketing)
            .starts_with("Error generating"));
        assert_eq!(
            package.display_text(Stage::Marketing),
            "Error generating marketing plan: quota exceeded"
        );
        for stage in Stage::ALL.into_iter().filter(|s| *s != Stage::Marketing) {
            assert!(!package.block(stage).unwrap().is_failed(), "{stage}");
        }
    }

    #[tokio::test]
    async fn failures_are_not_memoized() {
        let generator = Arc::new(CountingGenerator {
            fail_on: Some("Customer costs"),
            ..Default::default()
        });
        let pipeline = pipeline(generator.clone());

        pipeline.run(Stage::CustomerCost, &attrs()).await;
        pipeline.run(Stage::CustomerCost, &attrs()).await;

        assert_eq!(generator.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn remark_is_trimmed_and_cached() {
        let generator = Arc::new(CountingGenerator::default());
        let pipeline = pipeline(generator.clone());

        let a = pipeline.remark("Top Region", "Texas leads").await;
        let b = pipeline.remark("Top Region", "Texas leads").await;

        assert_eq!(a, b);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn image_request_uses_fixed_seed_and_square_size() {
        let images = Arc::new(FixedImages::new(Ok(vec!["one.webp".to_string()])));
        let pipeline = ContentPipeline::new(
            Arc::new(CountingGenerator::default()),
            images.clone(),
            ImageSettings::default(),
        );

        let refs = pipeline.generate_image("copper knotless braids").await;

        assert_eq!(refs, vec!["one.webp".to_string()]);
        let request = images.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(request.seed, 42);
        assert_eq!((request.width, request.height), (1024, 1024));
    }

    #[tokio::test]
    async fn image_failure_yields_empty_list() {
        let images = Arc::new(FixedImages::new(Err(PortError::NoImage)));
        let pipeline = ContentPipeline::new(
            Arc::new(CountingGenerator::default()),
            images,
            ImageSettings::default(),
        );

        assert!(pipeline.generate_image("anything").await.is_empty());
    }
}
