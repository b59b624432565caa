use ai_video_concepts::api::{self, OpenAiVideos};
use ai_video_concepts::config::{Config, PollPolicy};
use ai_video_concepts::output;
use ai_video_concepts::video::{GenerationOutcome, JobStatus, VideoDuration, VideoJobClient, VideoModel};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

#[derive(Parser)]
#[command(
    name = "generate-video",
    about = "Generate a landscape video from a prompt and download it",
    version
)]
struct Args {
    /// Directory the finished video is written to
    #[arg(short = 'd', long, default_value = ".", global = true)]
    output_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Submit a prompt (text or a .txt file) and wait for the video
    Generate {
        prompt: String,

        /// sora-2-pro or sora-2 (asked interactively when omitted)
        #[arg(short, long)]
        model: Option<String>,

        /// Clip length; rounded down to 4, 8 or 12
        #[arg(short, long, default_value_t = 12)]
        seconds: u32,
    },
    /// Check an existing job and download it if it has completed
    Check { video_id: String },
}

fn rule() -> String {
    "=".repeat(80)
}

async fn choose_model() -> Result<VideoModel> {
    println!("\nSelect model:");
    for model in VideoModel::ALL {
        println!(
            "  {}. {} - {} (${:.2}/sec)",
            model.menu_key(),
            model.name(),
            model.description(),
            model.cost_per_second()
        );
    }

    let mut stdout = tokio::io::stdout();
    stdout.write_all(b"\nChoice (1 or 2): ").await?;
    stdout.flush().await?;
    let mut line = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;

    Ok(VideoModel::from_choice(&line).unwrap_or_else(|| {
        println!("Invalid choice, using {}", VideoModel::default().name());
        VideoModel::default()
    }))
}

async fn generate(client: &VideoJobClient, prompt_arg: &str, model: Option<String>, seconds: u32) -> Result<i32> {
    let prompt = output::resolve_prompt_arg(prompt_arg).await?;
    if output::is_prompt_file(prompt_arg) {
        println!("Loaded prompt from: {}", prompt_arg);
    }

    let model = match model.as_deref() {
        Some(name) => VideoModel::from_choice(name)
            .ok_or_else(|| anyhow::anyhow!("Unknown model: {} (expected sora-2-pro or sora-2)", name))?,
        None => choose_model().await?,
    };
    let duration = VideoDuration::capped(seconds);
    if duration.seconds() != seconds {
        println!("Using {} seconds (supported: 4, 8, 12)", duration.seconds());
    }

    println!("\n{}", rule());
    println!("VIDEO GENERATION");
    println!("{}", rule());

    let started = Instant::now();
    match client.generate(&prompt, model, duration).await? {
        GenerationOutcome::Downloaded { job, video } => {
            println!("\n{}", rule());
            println!("SUCCESS - VIDEO READY!");
            println!("{}", rule());
            println!("\nJob ID: {}", job.id);
            println!("File: {}", video.path.display());
            println!("Size: {:.2} MB", video.size_mb());
            println!("Duration: {} seconds", duration.seconds());
            println!("Cost: ${:.2}", model.estimated_cost(duration));
            println!("Total time: {:.1}s", started.elapsed().as_secs_f64());
            println!("{}\n", rule());
            Ok(0)
        }
        GenerationOutcome::Unsuccessful(job) => {
            println!("\n{}", rule());
            println!("VIDEO GENERATION {}", job.status.as_str().to_uppercase());
            println!("{}", rule());
            println!("\nJob ID: {}", job.id);
            if let Some(reason) = job.failure_reason() {
                println!("Reason: {}", reason);
            }
            println!(
                "Details: {}",
                serde_json::to_string_pretty(&job.payload).unwrap_or_default()
            );
            println!("{}\n", rule());
            Ok(1)
        }
    }
}

async fn check(client: &VideoJobClient, video_id: &str) -> Result<i32> {
    println!("\nChecking status of video: {}\n", video_id);
    let (job, video) = client.check(video_id).await?;

    match (job.status, video) {
        (_, Some(video)) => {
            println!("\nVideo saved to: {} ({:.2} MB)", video.path.display(), video.size_mb());
            Ok(0)
        }
        (JobStatus::Failed, None) => {
            println!("\nVideo generation failed");
            if let Some(reason) = job.failure_reason() {
                println!("Reason: {}", reason);
            }
            Ok(1)
        }
        (JobStatus::Canceled, None) => {
            println!("\nVideo generation was canceled");
            Ok(1)
        }
        (status, None) => {
            println!("\nVideo is still processing ({}). Check again later:", status);
            println!("  generate-video check {}", video_id);
            Ok(0)
        }
    }
}

async fn run(args: Args) -> Result<i32> {
    let cfg = Config::from_env()?;
    tokio::fs::create_dir_all(&args.output_dir).await?;
    let backend = Arc::new(OpenAiVideos::new(api::http_client()?, &cfg));
    let client = VideoJobClient::new(backend, PollPolicy::default()).with_output_dir(args.output_dir);

    match args.command {
        Command::Generate { prompt, model, seconds } => generate(&client, &prompt, model, seconds).await,
        Command::Check { video_id } => check(&client, &video_id).await,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let code = tokio::select! {
        res = run(args) => match res {
            Ok(code) => code,
            Err(err) => {
                eprintln!("\n[ERROR] {:#}", err);
                1
            }
        },
        _ = tokio::signal::ctrl_c() => {
            eprintln!("\n\nVideo generation cancelled by user");
            1
        }
    };
    std::process::exit(code);
}
