//! The job pipeline: artifact → recognition → aggregation or selection →
//! rendered output.
//!
//! This is what the scheduler executes while holding the execution gate.
//! Errors abort only the current job; they are converted to user messages
//! at the job boundary by the scheduler.

use crate::engine::{ImageRecognizer, ImageVariant, OcrPass, SpeechRecognizer, Translator};
use crate::error::{CaptionqError, Result};
use crate::job::{Artifact, JobMode, JobOutput, JobPhase, TempArtifact};
use crate::ocr::selector::NO_TEXT_RECOGNIZED;
use crate::ocr::{OcrEnsemble, PageText, pages};
use crate::render::{self, Footer, SyncDocument};
use crate::scheduler::{JobContext, JobExecutor};
use crate::transcript::{Aggregator, expand_segments};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Pipeline-wide options.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Upper bound on each recognition-engine call, so a stuck external
    /// call cannot hold the execution gate indefinitely. `None` disables
    /// the bound.
    pub recognition_timeout: Option<Duration>,
    /// OCR passes run per page.
    pub passes: Vec<OcrPass>,
    pub footer: Footer,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            recognition_timeout: Some(Duration::from_secs(120)),
            passes: vec![
                OcrPass::new(ImageVariant::Original, "default"),
                OcrPass::new(ImageVariant::Document, "default"),
                OcrPass::new(ImageVariant::Magic, "default"),
            ],
            footer: Footer::default(),
        }
    }
}

/// Executes one job end to end.
pub struct JobPipeline {
    speech: Arc<dyn SpeechRecognizer>,
    ensemble: OcrEnsemble,
    aggregator: Aggregator,
    options: PipelineOptions,
}

impl JobPipeline {
    pub fn new(
        speech: Arc<dyn SpeechRecognizer>,
        image: Arc<dyn ImageRecognizer>,
        translator: Arc<dyn Translator>,
        options: PipelineOptions,
    ) -> Self {
        let ensemble = OcrEnsemble::new(image, options.passes.clone());
        Self {
            speech,
            ensemble,
            aggregator: Aggregator::new(translator),
            options,
        }
    }

    /// Bound a recognition-engine call by the configured timeout.
    async fn bounded<T, F>(&self, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match self.options.recognition_timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(result) => result,
                Err(_) => Err(CaptionqError::RecognitionTimeout {
                    seconds: limit.as_secs(),
                }),
            },
            None => call.await,
        }
    }

    async fn run_speech(
        &self,
        ctx: &JobContext,
        artifact: &TempArtifact,
        mode: JobMode,
    ) -> Result<JobOutput> {
        ctx.report_phase(JobPhase::Fetching);
        let audio = artifact.read()?;

        ctx.report_phase(JobPhase::Recognizing);
        let segments = self.bounded(self.speech.transcribe(&audio)).await?;

        ctx.report_phase(JobPhase::Aggregating);
        let tokens = expand_segments(&segments);
        let lines = self
            .aggregator
            .aggregate(&tokens, ctx.request.target_lang.as_deref())
            .await;

        ctx.report_phase(JobPhase::Rendering);
        Ok(match mode {
            JobMode::Timestamped => JobOutput {
                text: render::render_transcript(&lines, &self.options.footer),
                sync: Some(SyncDocument::new(lines)),
            },
            JobMode::Whole => JobOutput {
                text: render::render_plain(&lines, &self.options.footer),
                sync: None,
            },
        })
    }

    async fn run_pages(&self, ctx: &JobContext, page_files: &[TempArtifact]) -> Result<JobOutput> {
        ctx.report_phase(JobPhase::Fetching);
        pages::check_page_count(page_files.len())?;
        let indices: Vec<usize> = match &ctx.request.page_range {
            Some(range) => pages::parse_page_range(range, page_files.len())?,
            None => (0..page_files.len()).collect(),
        };

        ctx.report_phase(JobPhase::Recognizing);
        let mut results = Vec::with_capacity(indices.len());
        for &index in &indices {
            let image = page_files[index].read()?;
            // A page that exceeds the engine time budget yields the
            // sentinel like any other failed page; the job continues.
            let page = match self.options.recognition_timeout {
                Some(limit) => {
                    tokio::time::timeout(limit, self.ensemble.recognize_page(index, &image))
                        .await
                        .unwrap_or(PageText {
                            index,
                            text: NO_TEXT_RECOGNIZED.to_string(),
                        })
                }
                None => self.ensemble.recognize_page(index, &image).await,
            };
            results.push(page);
        }

        ctx.report_phase(JobPhase::Rendering);
        Ok(JobOutput {
            text: render::render_pages(&results, &self.options.footer),
            sync: None,
        })
    }
}

#[async_trait::async_trait]
impl JobExecutor for JobPipeline {
    async fn execute(&self, ctx: &JobContext) -> Result<JobOutput> {
        match (&ctx.request.artifact, ctx.request.mode) {
            (Artifact::Audio(artifact), mode) => self.run_speech(ctx, artifact, mode).await,
            (Artifact::Pages(page_files), JobMode::Whole) => self.run_pages(ctx, page_files).await,
            (Artifact::Pages(_), JobMode::Timestamped) => Err(CaptionqError::InvalidMode {
                message: "page images cannot produce timestamped captions".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Segment;
    use crate::engine::mock::{MockImageRecognizer, MockSpeechRecognizer, MockTranslator};
    use crate::job::JobRequest;

    fn options() -> PipelineOptions {
        PipelineOptions {
            recognition_timeout: Some(Duration::from_secs(5)),
            passes: vec![
                OcrPass::new(ImageVariant::Original, "c1"),
                OcrPass::new(ImageVariant::Original, "c2"),
                OcrPass::new(ImageVariant::Original, "c3"),
            ],
            footer: Footer::new("captionq test"),
        }
    }

    fn speech_segments() -> Vec<Segment> {
        vec![
            Segment {
                text: "Hello world".to_string(),
                start: 0.0,
                end: 1.0,
            },
            Segment {
                text: "Next line".to_string(),
                start: 1.0,
                end: 1.8,
            },
        ]
    }

    fn pipeline_with(
        speech: MockSpeechRecognizer,
        image: MockImageRecognizer,
        translator: MockTranslator,
    ) -> JobPipeline {
        JobPipeline::new(
            Arc::new(speech),
            Arc::new(image),
            Arc::new(translator),
            options(),
        )
    }

    fn audio_request() -> JobRequest {
        JobRequest::speech(TempArtifact::from_bytes(b"audio").unwrap())
    }

    fn pages_request(count: usize) -> JobRequest {
        let page_files = (0..count)
            .map(|i| TempArtifact::from_bytes(format!("page {i}").as_bytes()).unwrap())
            .collect();
        JobRequest::pages(page_files)
    }

    async fn execute(pipeline: &JobPipeline, request: JobRequest) -> Result<JobOutput> {
        let ctx = JobContext::detached(1, request);
        pipeline.execute(&ctx).await
    }

    #[tokio::test]
    async fn speech_job_renders_timestamped_captions() {
        let pipeline = pipeline_with(
            MockSpeechRecognizer::new().with_segments(speech_segments()),
            MockImageRecognizer::new(),
            MockTranslator::uppercasing(),
        );

        let output = execute(&pipeline, audio_request()).await.unwrap();
        assert!(
            output
                .text
                .starts_with("[00:00] Hello world\n[00:01] Next line\n")
        );

        let sync = output.sync.unwrap();
        assert_eq!(sync.lines.len(), 2);
        assert_eq!(sync.lines[0].text, "Hello world");
        assert_eq!(sync.lines[0].end, 1.0);
        assert_eq!(sync.lines[1].end, 1.8);
        assert!(sync.lines.iter().all(|l| l.translation.is_none()));
    }

    #[tokio::test]
    async fn speech_job_translates_when_target_lang_set() {
        let pipeline = pipeline_with(
            MockSpeechRecognizer::new().with_segments(speech_segments()),
            MockImageRecognizer::new(),
            MockTranslator::uppercasing(),
        );

        let request = audio_request().with_target_lang("es");
        let output = execute(&pipeline, request).await.unwrap();
        let sync = output.sync.unwrap();
        assert_eq!(sync.lines[0].translation.as_deref(), Some("HELLO WORLD"));
        assert_eq!(sync.lines[1].translation.as_deref(), Some("NEXT LINE"));
        assert!(output.text.contains("        HELLO WORLD\n"));
    }

    #[tokio::test]
    async fn whole_mode_speech_renders_plain_text() {
        let pipeline = pipeline_with(
            MockSpeechRecognizer::new().with_segments(speech_segments()),
            MockImageRecognizer::new(),
            MockTranslator::uppercasing(),
        );

        let request = audio_request().with_mode(JobMode::Whole);
        let output = execute(&pipeline, request).await.unwrap();
        assert!(output.text.starts_with("Hello world\nNext line\n"));
        assert!(output.sync.is_none());
    }

    #[tokio::test]
    async fn empty_recognition_yields_empty_transcript_not_error() {
        let pipeline = pipeline_with(
            MockSpeechRecognizer::new(),
            MockImageRecognizer::new(),
            MockTranslator::uppercasing(),
        );

        let output = execute(&pipeline, audio_request()).await.unwrap();
        assert!(output.text.starts_with("\n--\n"));
        assert!(output.sync.unwrap().lines.is_empty());
    }

    #[tokio::test]
    async fn recognition_failure_propagates() {
        let pipeline = pipeline_with(
            MockSpeechRecognizer::new().with_failure(),
            MockImageRecognizer::new(),
            MockTranslator::uppercasing(),
        );

        let result = execute(&pipeline, audio_request()).await;
        assert!(matches!(
            result,
            Err(CaptionqError::RecognitionUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn slow_engine_times_out() {
        let mut opts = options();
        opts.recognition_timeout = Some(Duration::from_millis(10));
        let pipeline = JobPipeline::new(
            Arc::new(
                MockSpeechRecognizer::new()
                    .with_segments(speech_segments())
                    .with_delay(Duration::from_millis(200)),
            ),
            Arc::new(MockImageRecognizer::new()),
            Arc::new(MockTranslator::uppercasing()),
            opts,
        );

        let result = execute(&pipeline, audio_request()).await;
        assert!(matches!(
            result,
            Err(CaptionqError::RecognitionTimeout { .. })
        ));
    }

    #[tokio::test]
    async fn page_job_selects_best_candidate_per_page() {
        let pipeline = pipeline_with(
            MockSpeechRecognizer::new(),
            MockImageRecognizer::new()
                .with_response("original/c1", "ab")
                .with_response("original/c2", "abc")
                .with_response("original/c3", "xy"),
            MockTranslator::uppercasing(),
        );

        let output = execute(&pipeline, pages_request(1)).await.unwrap();
        assert!(output.text.starts_with("abc\n"));
        assert!(output.sync.is_none());
    }

    #[tokio::test]
    async fn page_without_text_yields_sentinel_and_job_continues() {
        let pipeline = pipeline_with(
            MockSpeechRecognizer::new(),
            MockImageRecognizer::new(),
            MockTranslator::uppercasing(),
        );

        let output = execute(&pipeline, pages_request(2)).await.unwrap();
        assert!(output.text.contains(NO_TEXT_RECOGNIZED));
        assert!(output.text.contains("Page 1:"));
        assert!(output.text.contains("Page 2:"));
    }

    #[tokio::test]
    async fn page_range_limits_recognized_pages() {
        let pipeline = pipeline_with(
            MockSpeechRecognizer::new(),
            MockImageRecognizer::new().with_response("original/c1", "content"),
            MockTranslator::uppercasing(),
        );

        let request = pages_request(3).with_page_range("2");
        let output = execute(&pipeline, request).await.unwrap();
        assert!(output.text.starts_with("content\n"));
        assert!(!output.text.contains("Page 1:"));
    }

    #[tokio::test]
    async fn malformed_page_range_is_validation_error() {
        let pipeline = pipeline_with(
            MockSpeechRecognizer::new(),
            MockImageRecognizer::new(),
            MockTranslator::uppercasing(),
        );

        let request = pages_request(3).with_page_range("3-1");
        let result = execute(&pipeline, request).await;
        assert!(matches!(result, Err(CaptionqError::InvalidPageRange { .. })));
    }

    #[tokio::test]
    async fn too_many_pages_rejected() {
        let pipeline = pipeline_with(
            MockSpeechRecognizer::new(),
            MockImageRecognizer::new(),
            MockTranslator::uppercasing(),
        );

        let result = execute(&pipeline, pages_request(pages::MAX_PAGES + 1)).await;
        assert!(matches!(result, Err(CaptionqError::TooManyPages { .. })));
    }

    #[tokio::test]
    async fn timestamped_pages_is_invalid_mode() {
        let pipeline = pipeline_with(
            MockSpeechRecognizer::new(),
            MockImageRecognizer::new(),
            MockTranslator::uppercasing(),
        );

        let request = pages_request(1).with_mode(JobMode::Timestamped);
        let result = execute(&pipeline, request).await;
        match result {
            Err(error) => assert!(error.user_message().contains("try a different mode")),
            Ok(_) => panic!("expected InvalidMode"),
        }
    }
}
