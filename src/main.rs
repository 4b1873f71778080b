use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{ArgGroup, Parser};
use docgenservice::api::NO_CODE_SNIPPET;
use docgenservice::utils::normalize_user_input_path;
use docgenservice::{
    logging, pdf, Config, ContentType, DocumentationClient, GeminiBackend, RepositoryAnalyzer,
};
use tracing::info;

#[derive(Parser)]
#[command(author, version, about = "Generate documentation for code, PDFs and GitHub repositories", long_about = None)]
#[command(group(ArgGroup::new("source").required(true).args(["code", "pdf", "repo"])))]
struct Cli {
    /// Source file to document ("-" reads stdin)
    #[arg(long, value_name = "FILE")]
    code: Option<String>,

    /// PDF to extract and document
    #[arg(long, value_name = "FILE")]
    pdf: Option<String>,

    /// GitHub repository URL to clone and document
    #[arg(long, value_name = "URL")]
    repo: Option<String>,

    /// Config file (defaults to $DOCGEN_CONFIG or the user config dir)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the repository analysis as JSON instead of generating documentation
    #[arg(long, requires = "repo")]
    analysis_only: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    logging::init_stderr(&config.log_level)?;
    config.validate()?;

    let output = run(&cli, &config).await?;
    println!("{}", output);
    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => {
            let mut config = Config::from_file(path)?;
            config.apply_env();
            config
        }
        None => Config::load()?,
    };
    Ok(config)
}

async fn run(cli: &Cli, config: &Config) -> anyhow::Result<String> {
    if let Some(url) = &cli.repo {
        let analyzer = RepositoryAnalyzer::from_config(&config.analysis);
        let analysis = analyzer
            .analyze(url)
            .await
            .with_context(|| format!("Could not analyze repository {}", url))?;

        if cli.analysis_only {
            return Ok(serde_json::to_string_pretty(&analysis)?);
        }
        return Ok(client(config)?
            .generate(ContentType::GithubRepo, &analyzer.digest(&analysis))
            .await?);
    }

    if let Some(path) = &cli.pdf {
        let path = normalize_user_input_path(path);
        let text = pdf::extract_text_from_file(&path)
            .await
            .with_context(|| format!("Could not extract text from {}", path.display()))?;
        info!(path = %path.display(), chars = text.len(), "Extracted PDF text");
        return Ok(client(config)?.generate(ContentType::Pdf, &text).await?);
    }

    if let Some(path) = &cli.code {
        let snippet = read_source(path)?;
        if snippet.trim().is_empty() {
            bail!(NO_CODE_SNIPPET);
        }
        return Ok(client(config)?.generate(ContentType::Code, &snippet).await?);
    }

    bail!("one of --code, --pdf or --repo is required")
}

fn client(config: &Config) -> anyhow::Result<DocumentationClient> {
    let backend = GeminiBackend::new(&config.llm, &config.api_keys)?;
    Ok(DocumentationClient::new(Arc::new(backend), &config.llm))
}

fn read_source(arg: &str) -> anyhow::Result<String> {
    if arg == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read stdin")?;
        return Ok(buffer);
    }
    let path = normalize_user_input_path(arg);
    std::fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))
}
