use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use wiki_summary::client::{self, ClientError, McpClient};

#[derive(Parser)]
#[command(name = "wiki-summary-client")]
#[command(about = "Summarize a Wikipedia article through a wiki-summary tool host", long_about = None)]
#[command(version)]
struct Cli {
    /// SSE endpoint of the tool host
    #[arg(long, default_value = "http://localhost:8000/sse")]
    server_url: String,

    /// Article to summarize
    #[arg(long, default_value = "https://en.wikipedia.org/wiki/India")]
    article_url: String,

    /// Seconds to wait for each response from the host
    #[arg(long, default_value_t = client::DEFAULT_TIMEOUT.as_secs())]
    timeout_secs: u64,

    /// List the host's tools instead of summarizing
    #[arg(long)]
    list_tools: bool,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let timeout = Duration::from_secs(cli.timeout_secs);

    if cli.list_tools {
        if let Err(e) = list_tools(&cli.server_url, timeout).await {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
        return;
    }

    println!("Fetching and summarizing article...");
    let summary = client::summarize_article(&cli.server_url, &cli.article_url, timeout).await;

    println!("\nArticle Summary\n===============\n");
    println!("{summary}");
}

async fn list_tools(server_url: &str, timeout: Duration) -> Result<(), ClientError> {
    let mut session = McpClient::connect(server_url, timeout).await?;
    let info = session.initialize().await?;
    println!(
        "{} {}",
        info.server_info.name,
        info.server_info.version.unwrap_or_default()
    );

    for tool in session.list_tools().await? {
        println!("\n{}", tool.name);
        if let Some(description) = tool.description {
            println!("  {}", description.replace('\n', "\n  "));
        }
    }
    Ok(())
}
