use clap::Parser;
use color_eyre::eyre::{Result, eyre};
use image_relevance::config::resolve_api_key;
use image_relevance::ranking::top;
use image_relevance::similarity::build_scorer;
use image_relevance::{OpenAiClient, Pipeline, RankerConfig, Report, Strategy};
use std::io::{Read, Write};
use std::path::PathBuf;
use std::time::Instant;
use std::{fs, io};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "image-relevance")]
#[command(about = "Rank images by how well their descriptions match a news text", long_about = None)]
#[command(version)]
struct Cli {
    /// Images to rank (jpg, jpeg or png)
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// News text
    #[arg(short, long, conflicts_with = "text_file")]
    text: Option<String>,

    /// Read the news text from a file ("-" for stdin)
    #[arg(short = 'f', long)]
    text_file: Option<PathBuf>,

    /// OpenAI API key. Falls back to OPENAI_API_KEY
    #[arg(long)]
    api_key: Option<String>,

    /// How descriptions are matched against the text
    #[arg(short, long, value_enum, default_value_t = Strategy::Llm)]
    strategy: Strategy,

    /// Chat model used for descriptions, translation and llm scoring
    #[arg(short, long)]
    model: Option<String>,

    /// Sentence-embedding model folder, or an ID under ~/.cache/image_relevance
    #[arg(long, default_value = "sentence-transformers/all-MiniLM-L6-v2")]
    embedding_model: String,

    /// Instruction sent along with every image
    #[arg(long)]
    prompt: Option<String>,

    /// Show descriptions as returned instead of translating them
    #[arg(long)]
    no_translate: bool,

    /// Only show the N most relevant images
    #[arg(short = 'n', long)]
    top: Option<usize>,

    /// Output JSON
    #[arg(long)]
    json: bool,
}

fn read_text(cli: &Cli) -> Result<String> {
    match (&cli.text, &cli.text_file) {
        (Some(text), _) => Ok(text.clone()),
        (None, Some(path)) if path.as_os_str() == "-" => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
        (None, Some(path)) => Ok(fs::read_to_string(path)?),
        (None, None) => Err(eyre!("Provide the news text with --text or --text-file")),
    }
}

fn write_report(out: &mut impl Write, report: &Report) -> io::Result<()> {
    writeln!(out, "Summary ({}): {}", report.language, report.summary)?;
    for failure in &report.failures {
        writeln!(out, "Error: {}: {}", failure.name, failure.error)?;
    }

    writeln!(out)?;
    writeln!(out, "Relevant images ({})", report.strategy)?;
    writeln!(out, "{:-<60}", "")?;
    for (i, item) in report.ranked.iter().enumerate() {
        let marker = if i == 0 { "★ " } else { "  " };
        writeln!(out, "{marker} {:<30} | {:>5.2}", item.name, item.relevance)?;
        writeln!(out, "     Description: {}", item.display_description)?;
    }
    Ok(())
}

fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let text = read_text(&cli)?;

    let api_key = resolve_api_key(cli.api_key.as_deref())?;
    let mut config = RankerConfig::from_env(api_key)?;
    if let Some(model) = &cli.model {
        config.model.clone_from(model);
    }
    if let Some(prompt) = &cli.prompt {
        config.describe_prompt.clone_from(prompt);
    }
    config.translate = !cli.no_translate;

    let client = OpenAiClient::new(config.clone())?;
    let scorer = build_scorer(cli.strategy, client.clone(), &cli.embedding_model)?;
    let mut pipeline = Pipeline::new(client, scorer)
        .with_describe_prompt(config.describe_prompt.as_str())
        .with_translation(config.translate);

    let start = Instant::now();
    let mut report = pipeline.run_paths(&text, &cli.images)?;
    info!(elapsed = ?start.elapsed(), model = %config.model, "done");

    if let Some(n) = cli.top {
        report.ranked = top(report.ranked, n);
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        write_report(&mut io::stdout().lock(), &report)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image_relevance::RankedImage;
    use image_relevance::pipeline::ImageFailure;

    fn ranked(name: &str, description: &str, relevance: f32) -> RankedImage {
        RankedImage {
            name: name.to_string(),
            description: description.to_string(),
            display_description: description.to_string(),
            relevance,
        }
    }

    fn render(report: &Report) -> String {
        let mut out = Vec::new();
        write_report(&mut out, report).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn summary_failures_and_ranking_are_rendered() {
        let report = Report {
            language: "Dutch".into(),
            summary: "Overstromingen in Valencia.".into(),
            strategy: "llm",
            ranked: vec![
                ranked("flood.png", "Water in de straat", 0.956),
                ranked("cat.png", "Een kat", 0.1),
            ],
            failures: vec![ImageFailure {
                name: "a.gif".into(),
                error: "Unsupported image".into(),
            }],
        };
        let text = render(&report);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Summary (Dutch): Overstromingen in Valencia.");
        assert_eq!(lines[1], "Error: a.gif: Unsupported image");
        assert_eq!(lines[3], "Relevant images (llm)");
        assert!(lines[5].starts_with("★  flood.png"));
        assert!(lines[5].ends_with("| 0.96"));
        assert_eq!(lines[6], "     Description: Water in de straat");
        assert!(lines[7].starts_with("   cat.png"));
        assert!(lines[7].ends_with("| 0.10"));
        assert!(!lines[7].contains('★'));
    }

    #[test]
    fn empty_ranking_still_renders_summary_and_failures() {
        let report = Report {
            language: "English".into(),
            summary: "Floods.".into(),
            strategy: "lexical",
            ranked: Vec::new(),
            failures: vec![ImageFailure {
                name: "a.gif".into(),
                error: "Unsupported image".into(),
            }],
        };
        let text = render(&report);
        assert!(text.starts_with("Summary (English): Floods.\nError: a.gif: Unsupported image\n"));
        assert!(!text.contains('★'));
    }
}
