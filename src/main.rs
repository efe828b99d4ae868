use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;
use serde::Serialize;

use pressfront::cli::{Cli, Command};
use pressfront::compose::{self, Composed};
use pressfront::config::SiteConfig;
use pressfront::fetch::PageFetcher;
use pressfront::fragment::FragmentKind;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    pressfront::logging::init().context("init logging")?;

    let cli = Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    let config = SiteConfig::resolve(cli.base_url.as_deref()).context("resolve site config")?;

    match cli.command {
        Command::Serve(args) => {
            pressfront::server::run(args.addr, config)
                .await
                .context("serve")?;
        }
        Command::Header => {
            let fetcher = PageFetcher::new(&config).context("build page fetcher")?;
            let composed = compose::fetch_fragment(&fetcher, &config, FragmentKind::Header).await;
            print_composed(composed).context("header")?;
        }
        Command::Footer => {
            let fetcher = PageFetcher::new(&config).context("build page fetcher")?;
            let composed = compose::fetch_fragment(&fetcher, &config, FragmentKind::Footer).await;
            print_composed(composed).context("footer")?;
        }
        Command::Styles(args) => {
            let fetcher = PageFetcher::new(&config).context("build page fetcher")?;
            let composed = compose::fetch_styles(&fetcher, &config, args.topic).await;
            print_composed(composed).context("styles")?;
        }
    }

    Ok(())
}

/// Prints the value even when degraded, then reports a fetch failure as an error.
fn print_composed<T: Serialize>(composed: Composed<T>) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&composed.value).context("serialize result")?;
    println!("{json}");

    if let Some(error) = composed.error {
        anyhow::bail!("remote site unavailable ({}): {}", error.code, error.message);
    }
    Ok(())
}
