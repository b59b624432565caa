//! Test utilities: scripted fakes for the text and video backends plus
//! canned stage replies.

pub mod mock_text;
pub mod mock_video;

#[allow(unused_imports)]
pub use mock_text::{MockTextBackend, MockReply};
#[allow(unused_imports)]
pub use mock_video::{MockVideoBackend, StatusStep};

use ai_video_concepts::PollPolicy;
use serde_json::{Value, json};
use std::time::Duration;

/// A creative specification carrying every field the creative stage asks for.
#[allow(dead_code)]
pub fn creative_spec_json() -> Value {
    json!({
        "core_concept": "Chaotic meetings become tidy task boards",
        "creative_goal": "Show time saved after every call",
        "tone": "confident",
        "mood": "energising",
        "pacing_strategy": "slow open, quick cuts, calm close",
        "visual_metaphor": "sticky notes flying into a clean kanban board",
        "camera_approach": "handheld push-ins",
        "aesthetic_style": "bright product minimalism",
        "key_moments": [
            {"moment": 1, "timing": "0-3s", "focus": "messy whiteboard", "why": "relatable pain"},
            {"moment": 2, "timing": "3-9s", "focus": "notes organising", "why": "the transformation"},
            {"moment": 3, "timing": "9-12s", "focus": "team relaxing", "why": "payoff"}
        ],
        "moodboard_keywords": ["clean", "kinetic", "warm"],
        "reference_styles": ["Apple keynote"]
    })
}

#[allow(dead_code)]
pub const FINAL_PROMPT: &str =
    "A 12-second 16:9 video: a cluttered whiteboard dissolves into a clean task board.";

#[allow(dead_code)]
pub fn script_json() -> Value {
    json!({
        "narrative_structure": {
            "hook": {"timing": "0-3s", "description": "Messy meeting", "visual": "whiteboard chaos",
                     "text_overlay": "Another meeting?", "camera": "push-in"},
            "core": {"timing": "3-9s", "description": "Tasks assign themselves", "visual": "notes fly",
                     "text_overlay": null, "camera": "tracking"},
            "closer": {"timing": "9-12s", "description": "Calm team", "visual": "green checks",
                       "text_overlay": "Meetings, done.", "camera": "pull-out"}
        },
        "shot_breakdown": [
            {"shot_number": 1, "timing": "0-3s", "shot_type": "medium", "action": "pan across board",
             "camera_movement": "push-in", "lighting": "fluorescent", "visual_details": "scribbles"}
        ],
        "copy_elements": {
            "opening_text": "Another meeting?",
            "closing_text": "Meetings, done.",
            "narration_script": "Every meeting ends with a plan."
        },
        "final_multimodal_prompt": FINAL_PROMPT,
        "technical_specs": {"duration": "12 seconds", "aspect_ratio": "16:9"},
        "production_notes": {"music_suggestion": "light electronic"}
    })
}

/// No waiting between polls or auth retries.
#[allow(dead_code)]
pub fn instant_policy(max_auth_retries: u32) -> PollPolicy {
    PollPolicy {
        interval: Duration::ZERO,
        auth_retry_delay: Duration::ZERO,
        max_auth_retries,
    }
}
