use anyhow::Context;
use clap::Parser;
use fs_err as fs;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use vibe_tars::artifacts::ArtifactSink;
use vibe_tars::brief::{Channel, CreativeBrief, UserContext};
use vibe_tars::cache::ExpansionCache;
use vibe_tars::cli::{self, Command, GenerateArgs};
use vibe_tars::config::{ApiKeys, Config};
use vibe_tars::provider::ProviderSet;
use vibe_tars::server::Server;
use vibe_tars::studio::Studio;
use vibe_tars::wire::ExpandRequest;
use vibe_tars::{export, ux};

fn init_tracing(debug: bool) {
    let default = if debug { "vibe_tars=debug,info" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = cli::Args::parse();
    init_tracing(args.debug);

    let cfg = Config::load(args.config.as_deref())?;
    let keys = ApiKeys::from_env();
    if keys.anthropic.is_none() {
        warn!("ANTHROPIC_API_KEY is not set; Claude requests will fail");
    }
    if keys.openai.is_none() {
        warn!("OPENAI_API_KEY is not set; OpenAI requests will fail");
    }

    let providers = ProviderSet::from_config(&cfg, &keys)?;
    let mut studio = Studio::new(providers, ExpansionCache::new());
    if args.save_artifacts {
        info!(dir = %cfg.artifact_dir, "saving artifacts");
        studio = studio.with_artifacts(ArtifactSink::new(&cfg.artifact_dir));
    }

    match args.command {
        Command::Generate(g) => run_generate(&studio, &cfg, g).await,
        Command::Serve { bind } => {
            let addr = bind.unwrap_or_else(|| cfg.bind.clone());
            let server = Server::bind(&addr, Arc::new(studio))?;
            server.serve().await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn run_generate(studio: &Studio, cfg: &Config, g: GenerateArgs) -> anyhow::Result<ExitCode> {
    let brief = CreativeBrief::new(&g.product, &g.direction, &g.vibes, g.audience.as_deref())?;
    let channel = g.channel.as_deref().map(str::parse::<Channel>).transpose()?;
    let kind = g.provider.unwrap_or(cfg.provider);

    let result = match studio.generate(brief.clone(), kind).await {
        Ok(r) => r,
        Err(e) => {
            ux::show_error(&e);
            return Ok(ExitCode::FAILURE);
        }
    };
    ux::show_generation(&result);

    if let Some(dir) = &g.export {
        fs::create_dir_all(dir)?;
        let path = dir.join("generation.md");
        fs::write(&path, export::generation_markdown(&brief, &result))?;
        info!(path = %path.display(), "generation exported");
    }

    let choice = match g.expand {
        Some(n) if n >= 1 && n <= result.territories.len() => Some(n - 1),
        Some(n) => anyhow::bail!("--expand {n} is out of range (1-{})", result.territories.len()),
        None if g.interactive => ux::choose_territory(&result),
        None => None,
    };
    let Some(idx) = choice else {
        return Ok(ExitCode::SUCCESS);
    };

    let territory = result.territories[idx].clone();
    let session = studio.current().context("generation was superseded before expansion")?;
    let user_context = UserContext {
        focus_area: g.focus.clone().filter(|s| !s.trim().is_empty()),
        primary_channel: channel,
        target_audience: g.audience.clone().filter(|s| !s.trim().is_empty()),
    };
    let req = ExpandRequest {
        territory: territory.clone(),
        original_context: session.original_context(),
        user_context,
        is_update: false,
    };

    let expanded = match studio.expand(req).await {
        Ok(x) => x,
        Err(e) => {
            ux::show_error(&e);
            return Ok(ExitCode::FAILURE);
        }
    };
    ux::show_expansion(&territory, &expanded.entry.expansion, &expanded.entry.user_context, expanded.from_cache);

    if let Some(dir) = &g.export {
        let path = dir.join(export::export_file_name(&territory));
        let md = export::expansion_markdown(
            &territory,
            &expanded.entry.expansion,
            &expanded.entry.user_context,
            &session.original_context(),
        );
        fs::write(&path, md)?;
        info!(path = %path.display(), "expansion exported");
    }
    Ok(ExitCode::SUCCESS)
}
