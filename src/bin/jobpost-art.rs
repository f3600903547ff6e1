//! CLI for jobpost-art - turn a job title into social media art.

use clap::{Args, Parser, Subcommand};
use jobpost_art::session::{LoadingMessages, LOADING_MESSAGE_INTERVAL};
use jobpost_art::{Config, JobTitle, Pipeline, Session, SessionError};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "jobpost-art")]
#[command(about = "Turn job titles into funny, conceptual 3D art for job posts (Gemini + Imagen)")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Log provider activity to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a creative prompt and render two images for a job title
    Generate(GenerateArgs),

    /// Only write the creative prompt for a job title
    Prompt(PromptArgs),

    /// Check that the configured models are reachable
    Health,
}

#[derive(Args)]
struct GenerateArgs {
    /// The job title, e.g. "Senior React Engineer"
    job_title: String,

    /// Directory the images are saved into
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Per-stage timeout in seconds (0 disables it)
    #[arg(long)]
    timeout: Option<u64>,

    /// Do not save the images, only report them
    #[arg(long)]
    no_save: bool,

    /// Do not print rotating loader messages
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Args)]
struct PromptArgs {
    /// The job title, e.g. "Senior React Engineer"
    job_title: String,

    /// Per-stage timeout in seconds (0 disables it)
    #[arg(long)]
    timeout: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::from_env()?;

    match cli.command {
        Commands::Generate(args) => generate(&config, args, cli.json).await,
        Commands::Prompt(args) => prompt(&config, args, cli.json).await,
        Commands::Health => health(&config, cli.json).await,
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "jobpost_art=debug"
    } else {
        "jobpost_art=warn"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn build_pipeline(config: &Config, timeout: Option<u64>) -> anyhow::Result<Pipeline> {
    let config = match timeout {
        Some(0) => config.clone().with_stage_timeout(None),
        Some(secs) => config
            .clone()
            .with_stage_timeout(Some(Duration::from_secs(secs))),
        None => config.clone(),
    };
    Ok(config.build_pipeline()?)
}

async fn generate(config: &Config, args: GenerateArgs, json_output: bool) -> anyhow::Result<()> {
    let pipeline = build_pipeline(config, args.timeout)?;
    let session = Session::new();
    session.set_job_title(&args.job_title);

    let mut updates = session.subscribe();
    let mut loader = LoadingMessages::new();
    let mut ticker = tokio::time::interval(LOADING_MESSAGE_INTERVAL);
    let narrate = !args.quiet && !json_output;
    let mut prompt_shown = false;

    let run = session.generate(&pipeline);
    tokio::pin!(run);

    let outcome = loop {
        tokio::select! {
            outcome = &mut run => break outcome,
            _ = ticker.tick(), if narrate => {
                if let Some(message) = loader.next() {
                    eprintln!("  {message}");
                }
            }
            Ok(()) = updates.changed(), if narrate && !prompt_shown => {
                if let Some(prompt) = updates.borrow_and_update().creative_prompt.clone() {
                    eprintln!("Creative prompt: \"{prompt}\"");
                    prompt_shown = true;
                }
            }
        }
    };

    let generation = match outcome {
        Ok(generation) => generation,
        Err(SessionError::Failed(failure)) => {
            if json_output {
                let result = serde_json::json!({
                    "success": false,
                    "error": failure.kind,
                    "message": failure.message,
                });
                println!("{}", serde_json::to_string_pretty(&result)?);
                std::process::exit(1);
            }
            anyhow::bail!(failure.message);
        }
        Err(e) => return Err(e.into()),
    };

    let mut saved = Vec::new();
    if !args.no_save {
        for index in 0..generation.images.len() {
            saved.push(session.export(index, &args.output_dir).await?);
        }
    }

    if json_output {
        let images: Vec<_> = generation
            .images
            .iter()
            .enumerate()
            .map(|(i, image)| {
                serde_json::json!({
                    "index": i,
                    "size_bytes": approx_decoded_len(&image.src),
                    "output": saved.get(i).map(|p| p.display().to_string()),
                })
            })
            .collect();
        let result = serde_json::json!({
            "success": true,
            "job_title": generation.job_title,
            "prompt": generation.prompt,
            "images": images,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        if !prompt_shown {
            println!("Creative prompt: \"{}\"", generation.prompt);
        }
        for (i, image) in generation.images.iter().enumerate() {
            match saved.get(i) {
                Some(path) => println!("Version {}: {}", i + 1, path.display()),
                None => println!(
                    "Version {}: {} bytes (not saved)",
                    i + 1,
                    approx_decoded_len(&image.src)
                ),
            }
        }
    }

    Ok(())
}

async fn prompt(config: &Config, args: PromptArgs, json_output: bool) -> anyhow::Result<()> {
    let pipeline = build_pipeline(config, args.timeout)?;
    let title = JobTitle::parse(&args.job_title)?;
    let prompt = pipeline.generate_prompt(&title).await?;

    if json_output {
        let result = serde_json::json!({
            "job_title": title,
            "prompt": prompt,
            "model": pipeline.text_provider().model(),
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{prompt}");
    }
    Ok(())
}

async fn health(config: &Config, json_output: bool) -> anyhow::Result<()> {
    let pipeline = config.build_pipeline()?;
    let text = pipeline.text_provider();
    let images = pipeline.image_provider();

    let (text_status, image_status) = tokio::join!(text.health_check(), images.health_check());

    #[derive(serde::Serialize)]
    struct ProviderHealth<'a> {
        name: &'a str,
        model: &'a str,
        ok: bool,
        error: Option<String>,
    }

    let report = [
        ProviderHealth {
            name: text.name(),
            model: text.model(),
            ok: text_status.is_ok(),
            error: text_status.as_ref().err().map(|e| e.to_string()),
        },
        ProviderHealth {
            name: images.name(),
            model: images.model(),
            ok: image_status.is_ok(),
            error: image_status.as_ref().err().map(|e| e.to_string()),
        },
    ];

    if json_output {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for p in &report {
            let status = if p.ok { "✓" } else { "✗" };
            println!("  {} {} ({})", status, p.name, p.model);
            if let Some(ref err) = p.error {
                println!("    {err}");
            }
        }
    }

    if report.iter().all(|p| p.ok) {
        Ok(())
    } else {
        anyhow::bail!("one or more providers are unavailable")
    }
}

/// Decoded size of a base64 data URI, without decoding it.
fn approx_decoded_len(src: &str) -> usize {
    let payload = src.split_once(',').map(|(_, data)| data).unwrap_or("");
    let padding = payload.chars().rev().take_while(|&c| c == '=').count();
    (payload.len() / 4 * 3).saturating_sub(padding)
}
