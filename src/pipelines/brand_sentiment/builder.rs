use std::sync::Arc;

use super::pipeline::BrandSentimentPipeline;
use crate::brands::BrandLocator;
use crate::core::PipelineConfig;
use crate::data::BatchCollator;
use crate::loaders::{CheckpointLoader, ModelSource, TokenizerLoader};
use crate::models::{ForwardMode, TokenClassifier};
use crate::pipelines::utils::{DeviceRequest, DeviceSelectable};

pub struct BrandSentimentPipelineBuilder {
    source: ModelSource,
    locator: Arc<dyn BrandLocator + Send + Sync>,
    config: PipelineConfig,
    device_request: DeviceRequest,
}

impl BrandSentimentPipelineBuilder {
    pub fn new(source: ModelSource, locator: Arc<dyn BrandLocator + Send + Sync>) -> Self {
        Self {
            source,
            locator,
            config: PipelineConfig::default(),
            device_request: DeviceRequest::Auto,
        }
    }

    /// The pretrained Hinglish checkpoint from the Hub.
    pub fn hinglish(locator: Arc<dyn BrandLocator + Send + Sync>) -> Self {
        Self::new(ModelSource::default(), locator)
    }

    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> anyhow::Result<BrandSentimentPipeline> {
        let device = self.device_request.resolve()?;

        let tokenizer = TokenizerLoader::new(self.source.clone()).load()?;
        let checkpoint = CheckpointLoader::new(self.source).load(&device)?;
        let classifier = TokenClassifier::from_checkpoint(
            checkpoint.vb,
            &checkpoint.config,
            ForwardMode::Inference,
        )?;
        let collator = BatchCollator::new(tokenizer, self.locator, device, &self.config.collator)?;

        Ok(BrandSentimentPipeline::new(classifier, collator))
    }
}

impl DeviceSelectable for BrandSentimentPipelineBuilder {
    fn device_request_mut(&mut self) -> &mut DeviceRequest {
        &mut self.device_request
    }
}
