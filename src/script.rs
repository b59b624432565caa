use crate::concept::CreativeSpecification;
use crate::error::StageError;
use crate::prompts::{self, SCRIPTWRITER_SYSTEM_PROMPT, SCRIPTWRITER_USER_TEMPLATE};
use crate::stage::{StageInvoker, TokenUsage};
use crate::{logi, logw};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Strings as-is, numbers and booleans rendered, anything else absent.
fn loose_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn field_text(value: &Value, key: &str) -> String {
    loose_text(value.get(key)).unwrap_or_default()
}

fn loose_u32(value: Option<&Value>) -> Option<u32> {
    match value? {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Beat {
    pub timing: String,
    pub description: String,
    pub visual: String,
    pub text_overlay: Option<String>,
    pub camera: String,
}

impl Beat {
    fn from_value(value: &Value) -> Self {
        Self {
            timing: field_text(value, "timing"),
            description: field_text(value, "description"),
            visual: field_text(value, "visual"),
            text_overlay: loose_text(value.get("text_overlay")),
            camera: field_text(value, "camera"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NarrativeStructure {
    pub hook: Beat,
    pub core: Beat,
    pub closer: Beat,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Shot {
    pub shot_number: Option<u32>,
    pub timing: String,
    pub shot_type: String,
    pub action: String,
    pub camera_movement: String,
    pub lighting: String,
    pub visual_details: String,
}

impl Shot {
    fn from_value(value: &Value) -> Self {
        Self {
            shot_number: loose_u32(value.get("shot_number")),
            timing: field_text(value, "timing"),
            shot_type: field_text(value, "shot_type"),
            action: field_text(value, "action"),
            camera_movement: field_text(value, "camera_movement"),
            lighting: field_text(value, "lighting"),
            visual_details: field_text(value, "visual_details"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CopyElements {
    pub opening_text: Option<String>,
    pub mid_roll_text: Option<String>,
    pub closing_text: Option<String>,
    pub narration_script: String,
}

/// The scriptwriter's output. Only `final_multimodal_prompt` is required;
/// the other sections are kept as the model wrote them and read through
/// forgiving accessors. Timings are advisory text and are not checked
/// against the video length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptDocument {
    #[serde(default)]
    pub narrative_structure: Value,
    #[serde(default)]
    pub shot_breakdown: Value,
    #[serde(default)]
    pub copy_elements: Value,
    pub final_multimodal_prompt: String,
    #[serde(default)]
    pub technical_specs: Value,
    #[serde(default)]
    pub production_notes: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ScriptDocument {
    pub fn from_document(document: Value) -> Result<Self, StageError> {
        let raw = document.to_string();
        match document.get("final_multimodal_prompt") {
            Some(Value::String(prompt)) if !prompt.trim().is_empty() => {}
            None | Some(Value::Null) | Some(Value::String(_)) => {
                return Err(StageError::MissingFinalPrompt);
            }
            Some(_) => {
                return Err(StageError::InvalidJson {
                    reason: "final_multimodal_prompt must be a string".to_string(),
                    raw,
                });
            }
        }

        serde_json::from_value(document).map_err(|err| StageError::InvalidJson {
            reason: err.to_string(),
            raw,
        })
    }

    pub fn narrative(&self) -> NarrativeStructure {
        let beat = |name: &str| {
            self.narrative_structure
                .get(name)
                .map(Beat::from_value)
                .unwrap_or_default()
        };
        NarrativeStructure {
            hook: beat("hook"),
            core: beat("core"),
            closer: beat("closer"),
        }
    }

    /// Shot entries in order; non-object entries are skipped.
    pub fn shots(&self) -> Vec<Shot> {
        self.shot_breakdown
            .as_array()
            .map(|shots| {
                shots
                    .iter()
                    .filter(|shot| shot.is_object())
                    .map(Shot::from_value)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn copy(&self) -> CopyElements {
        let copy = &self.copy_elements;
        CopyElements {
            opening_text: loose_text(copy.get("opening_text")),
            mid_roll_text: loose_text(copy.get("mid_roll_text")),
            closing_text: loose_text(copy.get("closing_text")),
            narration_script: field_text(copy, "narration_script"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScriptDraft {
    pub script: ScriptDocument,
    pub usage: TokenUsage,
    pub model: String,
    pub timestamp: DateTime<Local>,
}

/// Second stage: creative specification plus one-liner in, script out.
#[derive(Clone)]
pub struct Scriptwriter {
    invoker: StageInvoker,
}

impl Scriptwriter {
    pub fn new(invoker: StageInvoker) -> Self {
        Self { invoker }
    }

    pub fn model(&self) -> &str {
        self.invoker.model()
    }

    pub fn user_prompt(specification: &CreativeSpecification, one_liner: &str) -> String {
        let spec_json = specification.to_pretty_json();
        prompts::fill(
            SCRIPTWRITER_USER_TEMPLATE,
            &[
                ("one_liner", one_liner),
                ("aspect_ratio", prompts::TARGET_ASPECT_RATIO),
                ("creative_specification", &spec_json),
            ],
        )
    }

    pub async fn run(
        &self,
        specification: &CreativeSpecification,
        one_liner: &str,
    ) -> Result<ScriptDraft, StageError> {
        let verbose = self.invoker.is_verbose();
        if verbose {
            logi("=".repeat(80));
            logi("SCRIPTWRITER AGENT - PROCESSING");
            logi(format!("Timestamp: {}", Local::now().format("%Y-%m-%d %H:%M:%S")));
            logi(format!("Model: {}", self.invoker.model()));
            logi(format!("Reasoning Effort: {}", self.invoker.reasoning_effort()));
            logi(format!("Target Duration: {} seconds", prompts::TARGET_SECONDS));
            logi(format!("Format: {}", prompts::TARGET_ASPECT_RATIO));
            logi(format!("Product: {}", one_liner));
            logi(format!(
                "Received Creative Specification:\n{}",
                specification.to_pretty_json()
            ));
            logi("Generating production-ready script and final prompt...");
        }

        let user_prompt = Self::user_prompt(specification, one_liner);
        let result = match self
            .invoker
            .invoke(SCRIPTWRITER_SYSTEM_PROMPT, &user_prompt)
            .await
        {
            Ok(output) => ScriptDocument::from_document(output.document).map(|script| ScriptDraft {
                script,
                usage: output.usage,
                model: output.model,
                timestamp: Local::now(),
            }),
            Err(err) => Err(err),
        };

        if let Err(err) = &result {
            if verbose {
                logw(format!("ERROR in Scriptwriter Agent: {}", err));
            }
        }
        result
    }
}
