use crate::concept::{CreativeDirector, CreativeSpecification};
use crate::config::Config;
use crate::error::{PipelineFailure, Stage, StageError};
use crate::prompts;
use crate::script::{ScriptDocument, Scriptwriter};
use crate::stage::{StageInvoker, TextBackend, TokenUsage};
use crate::{logerr, logi, logok};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

pub const EXAMPLE_ONE_LINER: &str =
    "AI that turns meeting recordings into automated task assignments";

/// A non-empty product description that seeds a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductOneLiner(String);

impl ProductOneLiner {
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into().trim().to_string();
        if text.is_empty() {
            None
        } else {
            Some(Self(text))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductOneLiner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentUsage {
    pub agent: Stage,
    pub model: String,
    pub tokens: u64,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

impl AgentUsage {
    fn new(agent: Stage, model: &str, usage: TokenUsage) -> Self {
        Self {
            agent,
            model: model.to_string(),
            tokens: usage.total_tokens,
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineMetadata {
    pub completion_time: DateTime<Local>,
    pub creative_direction_time: DateTime<Local>,
    pub stages_completed: Vec<Stage>,
    pub agents_used: Vec<AgentUsage>,
    pub total_tokens: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineResult {
    pub status: RunStatus,
    pub product: ProductOneLiner,
    pub creative_specification: CreativeSpecification,
    pub script: ScriptDocument,
    pub final_prompt_for_video_generation: String,
    pub pipeline_metadata: PipelineMetadata,
}

/// Runs the creative director then the scriptwriter. The second stage
/// consumes the first stage's output, so the two never overlap.
#[derive(Clone)]
pub struct VideoConceptPipeline {
    creative_director: CreativeDirector,
    scriptwriter: Scriptwriter,
    verbose: bool,
}

impl VideoConceptPipeline {
    pub fn new(backend: Arc<dyn TextBackend>, cfg: &Config, verbose: bool) -> Self {
        let invoker =
            StageInvoker::new(backend, &cfg.text_model, &cfg.reasoning_effort).verbose(verbose);
        Self::from_stages(
            CreativeDirector::new(invoker.clone()),
            Scriptwriter::new(invoker),
            verbose,
        )
    }

    pub fn from_stages(
        creative_director: CreativeDirector,
        scriptwriter: Scriptwriter,
        verbose: bool,
    ) -> Self {
        Self {
            creative_director,
            scriptwriter,
            verbose,
        }
    }

    pub async fn run(&self, one_liner: &ProductOneLiner) -> Result<PipelineResult, PipelineFailure> {
        if self.verbose {
            logi("=".repeat(80));
            logi("VIDEO PRODUCTION PIPELINE STARTED");
            logi(format!("Pipeline Start: {}", Local::now().format("%Y-%m-%d %H:%M:%S")));
            logi(format!("Product: {}", one_liner));
            logi(format!(
                "Target: {}-second {} video for landing pages, social media, pitch decks",
                prompts::TARGET_SECONDS,
                prompts::TARGET_ASPECT_RATIO
            ));
            logi("STAGE 1/2: Creative Director Agent");
        }

        debug!(stage = %Stage::CreativeDirector, "stage started");
        let direction = match self.creative_director.run(one_liner.as_str()).await {
            Ok(direction) => direction,
            Err(source) => {
                return Err(self.fail(Stage::CreativeDirector, source, None));
            }
        };
        info!(tokens = direction.usage.total_tokens, "creative specification ready");

        if self.verbose {
            logi("STAGE 2/2: Scriptwriter Agent");
        }
        debug!(stage = %Stage::Scriptwriter, "stage started");
        let draft = match self
            .scriptwriter
            .run(&direction.specification, one_liner.as_str())
            .await
        {
            Ok(draft) => draft,
            Err(source) => {
                return Err(self.fail(
                    Stage::Scriptwriter,
                    source,
                    Some(direction.specification),
                ));
            }
        };
        info!(tokens = draft.usage.total_tokens, "script ready");

        let total = direction.usage + draft.usage;
        let result = PipelineResult {
            status: RunStatus::Success,
            product: one_liner.clone(),
            final_prompt_for_video_generation: draft.script.final_multimodal_prompt.clone(),
            pipeline_metadata: PipelineMetadata {
                completion_time: Local::now(),
                creative_direction_time: direction.timestamp,
                stages_completed: vec![Stage::CreativeDirector, Stage::Scriptwriter],
                agents_used: vec![
                    AgentUsage::new(Stage::CreativeDirector, &direction.model, direction.usage),
                    AgentUsage::new(Stage::Scriptwriter, &draft.model, draft.usage),
                ],
                total_tokens: total.total_tokens,
            },
            creative_specification: direction.specification,
            script: draft.script,
        };
        debug!("pipeline completed");

        if self.verbose {
            logok("PIPELINE COMPLETED SUCCESSFULLY");
            logi(format!(
                "FINAL PROMPT FOR VIDEO GENERATION:\n{}",
                result.final_prompt_for_video_generation
            ));
            logi(format!("Total Tokens Used: {}", result.pipeline_metadata.total_tokens));
            logi(format!(
                "Completion Time: {}",
                result.pipeline_metadata.completion_time.format("%Y-%m-%d %H:%M:%S")
            ));
        }

        Ok(result)
    }

    fn fail(
        &self,
        stage: Stage,
        source: StageError,
        creative_specification: Option<CreativeSpecification>,
    ) -> PipelineFailure {
        debug!(stage = %stage, "stage failed");
        if self.verbose {
            logerr(format!("{} Agent failed: {}", stage.label(), source));
        }
        PipelineFailure {
            stage,
            source,
            creative_specification,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_liner_must_be_non_empty() {
        assert!(ProductOneLiner::new("   ").is_none());
        let one_liner = ProductOneLiner::new("  AI coach for sales calls ").unwrap();
        assert_eq!(one_liner.as_str(), "AI coach for sales calls");
    }

    #[test]
    fn run_status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(RunStatus::Success).unwrap(),
            serde_json::json!("success")
        );
    }
}
