//! Streams stdin through the block assembler, one line per chunk.
//!
//! ```text
//! $ printf '<think>\nhmm\n</think>\n**done**\n' | lumo-render --format json
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use tokio::io::{self, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use lumo_chat::markdown::extract_code_blocks;
use lumo_chat::storage::{get_storage, load_or_default};
use lumo_chat::{BlockAssembler, RenderBlock, RenderSettings, RenderUpdate};

#[derive(Parser, Debug)]
#[command(name = "lumo-render")]
#[command(about = "Render a streamed chat reply into HTML blocks")]
struct Args {
    /// Message id used for block and copy button ids
    #[arg(long, default_value = "cli")]
    message_id: String,

    /// Output format
    #[arg(long, value_enum, default_value = "json")]
    format: Format,

    /// Render settings JSON file (defaults to the saved settings)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the fenced code blocks of the input as JSON and exit
    #[arg(long)]
    extract_code: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Format {
    Json,
    Html,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum Output<'a> {
    Patch { index: usize, block: &'a RenderBlock },
    Replace { blocks: &'a [RenderBlock] },
    Final { blocks: &'a [RenderBlock] },
}

async fn load_settings(config: Option<&PathBuf>) -> Result<RenderSettings> {
    match config {
        Some(path) => {
            let data = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("reading {}", path.display()))?;
            RenderSettings::from_json(&data).with_context(|| format!("parsing {}", path.display()))
        }
        None => load_or_default(&get_storage().await?).await,
    }
}

fn render(output: &Output<'_>, format: Format) -> Result<String> {
    Ok(match format {
        Format::Json => serde_json::to_string(output)?,
        Format::Html => match output {
            Output::Patch { index, block } => format!("<!-- patch {index} -->\n{}", block.html),
            Output::Replace { blocks } => format!("<!-- replace -->\n{}", join_html(blocks)),
            Output::Final { blocks } => format!("<!-- final -->\n{}", join_html(blocks)),
        },
    })
}

fn join_html(blocks: &[RenderBlock]) -> String {
    blocks.iter().map(|b| b.html.as_str()).collect::<Vec<_>>().join("\n")
}

async fn emit(stdout: &mut io::Stdout, output: &Output<'_>, format: Format) -> Result<()> {
    let mut text = render(output, format)?;
    text.push('\n');
    stdout.write_all(text.as_bytes()).await?;
    // Flush so a consumer sees each update as soon as it exists
    stdout.flush().await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let mut stdout = io::stdout();

    if args.extract_code {
        let mut input = String::new();
        io::stdin().read_to_string(&mut input).await?;
        let snippets = extract_code_blocks(&input);
        stdout.write_all(serde_json::to_string_pretty(&snippets)?.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
        return Ok(());
    }

    let settings = load_settings(args.config.as_ref()).await?;
    let mut assembler = BlockAssembler::new(settings);
    let mut content = String::new();
    let mut mounted: Vec<RenderBlock> = Vec::new();

    let mut lines = BufReader::new(io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        content.push_str(&line);
        content.push('\n');

        let update = assembler.update(&args.message_id, &content, true, &mounted);
        match &update {
            RenderUpdate::Unchanged => debug!("chunk did not change the rendering"),
            RenderUpdate::Patch { index, block } => {
                emit(&mut stdout, &Output::Patch { index: *index, block }, args.format).await?
            }
            RenderUpdate::Replace(blocks) => emit(&mut stdout, &Output::Replace { blocks }, args.format).await?,
        }
        update.apply_to(&mut mounted);
    }

    let blocks = assembler.assemble(&args.message_id, &content, false);
    emit(&mut stdout, &Output::Final { blocks: &blocks }, args.format).await?;
    let (documents, fragments) = assembler.cache_sizes();
    info!(documents, fragments, "render finished");
    Ok(())
}
