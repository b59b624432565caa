use crate::logok;
use crate::pipeline::PipelineResult;
use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone};
use once_cell::sync::OnceCell;
use regex::Regex;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use tokio::fs;

pub const SLUG_PREFIX_CHARS: usize = 30;
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

fn unsafe_chars_regex() -> Result<&'static Regex> {
    static UNSAFE_RE: OnceCell<Regex> = OnceCell::new();
    UNSAFE_RE.get_or_try_init(|| {
        Regex::new(r#"[/\\:*?"<>|]"#).context("failed to compile filename regex")
    })
}

/// Replaces path separators and other characters file systems reject.
fn safe_component(text: &str) -> String {
    match unsafe_chars_regex() {
        Ok(re) => re.replace_all(text, "_").into_owned(),
        Err(_) => text
            .chars()
            .map(|c| if r#"/\:*?"<>|"#.contains(c) { '_' } else { c })
            .collect(),
    }
}

/// First 30 characters of the description, spaces to underscores, lowercased.
pub fn product_slug(product: &str) -> String {
    let prefix: String = product.chars().take(SLUG_PREFIX_CHARS).collect();
    safe_component(&prefix.replace(' ', "_").to_lowercase())
}

pub fn prompt_filename<Tz>(product: &str, at: DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!(
        "prompt_{}_{}.txt",
        product_slug(product),
        at.format(TIMESTAMP_FORMAT)
    )
}

pub fn video_filename<Tz>(job_id: &str, at: DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!(
        "generated_video_{}_{}.mp4",
        at.format(TIMESTAMP_FORMAT),
        safe_component(job_id)
    )
}

/// Writes only the final prompt. With no filename, one is derived from the
/// product description and the current time.
pub async fn save_final_prompt(result: &PipelineResult, filename: Option<&Path>) -> Result<PathBuf> {
    let path = match filename {
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(prompt_filename(
            result.product.as_str(),
            chrono::Local::now(),
        )),
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create dir {}", parent.display()))?;
        }
    }
    fs::write(&path, result.final_prompt_for_video_generation.as_bytes())
        .await
        .with_context(|| format!("Failed to write prompt: {}", path.display()))?;

    logok(format!("Prompt saved to: {}", path.display()));
    Ok(path)
}

/// A prompt argument is a file when it names an existing `.txt` file.
pub fn is_prompt_file(arg: &str) -> bool {
    arg.ends_with(".txt") && Path::new(arg).is_file()
}

pub async fn load_prompt_file(path: &Path) -> Result<String> {
    let text = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to load prompt from {}", path.display()))?;
    let text = text.trim().to_string();
    if text.is_empty() {
        anyhow::bail!("Prompt file is empty: {}", path.display());
    }
    Ok(text)
}

/// Reads the prompt from a `.txt` file if `arg` names one, otherwise uses
/// `arg` itself as the prompt.
pub async fn resolve_prompt_arg(arg: &str) -> Result<String> {
    if is_prompt_file(arg) {
        return load_prompt_file(Path::new(arg)).await;
    }
    let text = arg.trim();
    if text.is_empty() {
        anyhow::bail!("Prompt is empty");
    }
    Ok(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn fixed_time() -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(2025, 1, 14)
            .unwrap()
            .and_hms_opt(2, 39, 58)
            .unwrap()
            .and_utc()
    }

    #[test]
    fn slug_lowercases_and_replaces_spaces() {
        assert_eq!(product_slug("AI coach for sales calls"), "ai_coach_for_sales_calls");
        assert_eq!(
            prompt_filename("AI coach for sales calls", fixed_time()),
            "prompt_ai_coach_for_sales_calls_20250114_023958.txt"
        );
    }

    #[test]
    fn slug_truncates_to_prefix_length() {
        let slug = product_slug("AI that turns meeting recordings into automated task assignments");
        assert_eq!(slug, "ai_that_turns_meeting_recordin");
        assert_eq!(slug.chars().count(), SLUG_PREFIX_CHARS);
    }

    #[test]
    fn slug_strips_path_characters() {
        assert_eq!(product_slug("CI/CD for ML: faster"), "ci_cd_for_ml__faster");
    }

    #[test]
    fn video_filename_has_timestamp_then_id() {
        assert_eq!(
            video_filename("video_abc", fixed_time()),
            "generated_video_20250114_023958_video_abc.mp4"
        );
    }

    #[test]
    fn video_filename_cannot_leave_the_output_dir() {
        let name = video_filename("../../etc/passwd", fixed_time());
        assert_eq!(name, "generated_video_20250114_023958_.._.._etc_passwd.mp4");
        assert!(!name.contains('/'));

        let joined = Path::new("out").join(video_filename(r"..\..\evil", fixed_time()));
        assert_eq!(joined.parent(), Some(Path::new("out")));
    }

    #[tokio::test]
    async fn prompt_arg_reads_txt_files_and_passes_text_through() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("prompt.txt");
        fs::write(&file, "  A drone shot over a city \n").await.unwrap();

        let from_file = resolve_prompt_arg(file.to_str().unwrap()).await.unwrap();
        assert_eq!(from_file, "A drone shot over a city");

        let literal = resolve_prompt_arg("A literal prompt").await.unwrap();
        assert_eq!(literal, "A literal prompt");

        let missing = dir.path().join("missing.txt");
        let as_text = resolve_prompt_arg(missing.to_str().unwrap()).await.unwrap();
        assert!(as_text.ends_with("missing.txt"));
    }

    #[tokio::test]
    async fn empty_prompt_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("empty.txt");
        fs::write(&file, "   \n").await.unwrap();

        assert!(resolve_prompt_arg(file.to_str().unwrap()).await.is_err());
        assert!(resolve_prompt_arg("   ").await.is_err());
    }
}
