use ai_video_concepts::api::{self, OpenAiChat};
use ai_video_concepts::config::Config;
use ai_video_concepts::output;
use ai_video_concepts::pipeline::{EXAMPLE_ONE_LINER, ProductOneLiner, VideoConceptPipeline};
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};

#[derive(Parser)]
#[command(
    name = "ai-video-concepts",
    about = "Turn a one-line product description into a 12-second video prompt",
    version
)]
struct Args {
    /// Product one-liner (prompted for when omitted)
    #[arg(short = 'p', long)]
    one_liner: Option<String>,

    /// Hide backend processing details
    #[arg(short = 'q', long)]
    quiet: bool,

    /// Where to write the final prompt (default: derived from the product)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,
}

async fn ask(input: &mut Lines<BufReader<Stdin>>, question: &str) -> Result<String> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(question.as_bytes()).await?;
    stdout.flush().await?;

    let line = input.next_line().await?.unwrap_or_default();
    Ok(line.trim().to_string())
}

fn rule() -> String {
    "=".repeat(80)
}

async fn run(args: Args) -> Result<i32> {
    println!("\n{}", rule());
    println!("AI VIDEO PRODUCTION PIPELINE");
    println!("{}", rule());
    println!("\nWorkflow:");
    println!("  1. Drop your one-liner -> describe your product in a single sentence");
    println!("  2. AI agents collaborate -> Creative Director + Scriptwriter");
    println!("  3. Get a ready-to-ship prompt -> 12-second concept for landing pages & social");
    println!("{}\n", rule());

    let cfg = Config::from_env()?;
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let interactive = args.one_liner.is_none();

    let input = match args.one_liner {
        Some(text) => text,
        None => {
            println!("Enter your product one-liner:");
            println!("(Or press Enter to use example: '{}')\n", EXAMPLE_ONE_LINER);
            ask(&mut stdin, "> ").await?
        }
    };
    let one_liner = ProductOneLiner::new(input)
        .or_else(|| {
            println!("\nUsing example: {}\n", EXAMPLE_ONE_LINER);
            ProductOneLiner::new(EXAMPLE_ONE_LINER)
        })
        .context("no product one-liner given")?;

    let verbose = if args.quiet {
        false
    } else if !interactive {
        true
    } else {
        println!("\nShow backend processing details?");
        println!("  y = Yes, show me everything (RECOMMENDED)");
        println!("  n = No, just show final results");
        ask(&mut stdin, "\nChoice (y/n): ").await?.to_lowercase() != "n"
    };

    println!("\n{}", rule());
    println!("STARTING PIPELINE...");
    println!("{}", rule());

    let client = api::http_client()?;
    let backend = Arc::new(OpenAiChat::new(client, &cfg));
    let pipeline = VideoConceptPipeline::new(backend, &cfg, verbose);

    let result = match pipeline.run(&one_liner).await {
        Ok(result) => result,
        Err(failure) => {
            println!("\n{}", rule());
            println!("ERROR - PIPELINE FAILED");
            println!("{}", rule());
            println!("\nError: {}", failure);
            let details = serde_json::to_string_pretty(&failure.report()).unwrap_or_default();
            println!("Details: {}", details);
            println!("\n{}\n", rule());
            return Ok(1);
        }
    };

    let saved = output::save_final_prompt(&result, args.output.as_deref()).await?;

    println!("\n{}", rule());
    println!("SUCCESS - VIDEO CONCEPT READY!");
    println!("{}", rule());
    if !verbose {
        println!("\nFINAL PROMPT FOR VIDEO GENERATION:");
        println!("{}", "-".repeat(80));
        println!("{}", result.final_prompt_for_video_generation);
        println!("{}", "-".repeat(80));
    }

    let agents = result
        .pipeline_metadata
        .agents_used
        .iter()
        .map(|a| format!("{} ({})", a.agent, a.model))
        .collect::<Vec<_>>()
        .join(" + ");
    println!("\nPipeline Stats:");
    println!("  Total Tokens: {}", result.pipeline_metadata.total_tokens);
    println!("  Agents Used: {}", agents);
    println!("\nPrompt saved to: {}", saved.display());
    println!("\nNext steps:");
    println!("  -> Generate video: generate-video generate {}", saved.display());
    println!("  -> Video will be landscape format (12 seconds)");
    println!("{}\n", rule());

    Ok(0)
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
            eprintln!("\n\nPipeline cancelled by user");
            1
        }
    };
    std::process::exit(code);
}
