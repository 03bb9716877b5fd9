use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

use crate::provider::ProviderKind;

#[derive(Parser, Debug)]
#[command(name = "vibe_tars", version, about = "Creative territories from a product, a direction and a set of vibes")]
pub struct Args {
    /// TOML config layered over the built-in defaults
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, default_value_t = false)]
    pub debug: bool,

    /// Write prompts, raw completions and recovered objects per action
    #[arg(long, global = true, default_value_t = false)]
    pub save_artifacts: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate an approach, a brainstorm and creative territories
    Generate(GenerateArgs),
    /// Serve POST /generate and POST /expand-territory
    Serve {
        #[arg(long)]
        bind: Option<String>,
    },
}

#[derive(ClapArgs, Debug)]
pub struct GenerateArgs {
    #[arg(long)]
    pub product: String,

    #[arg(long)]
    pub direction: String,

    #[arg(long, value_delimiter = ',')]
    pub vibes: Vec<String>,

    #[arg(long)]
    pub audience: Option<String>,

    #[arg(long, value_enum)]
    pub provider: Option<ProviderKind>,

    /// 1-based territory to expand right away
    #[arg(long)]
    pub expand: Option<usize>,

    /// Prompt for a territory to expand after generating
    #[arg(long, default_value_t = false)]
    pub interactive: bool,

    #[arg(long)]
    pub focus: Option<String>,

    /// Social, Digital, Experiential or Integrated
    #[arg(long)]
    pub channel: Option<String>,

    /// Directory receiving Markdown exports
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_args_parse() {
        let args = Args::try_parse_from([
            "vibe_tars", "--debug", "generate", "--product", "Sneakers", "--direction", "launch",
            "--vibes", "bold,retro", "--provider", "openai", "--expand", "2",
        ])
        .unwrap();
        assert!(args.debug);
        match args.command {
            Command::Generate(g) => {
                assert_eq!(g.vibes, vec!["bold", "retro"]);
                assert_eq!(g.provider, Some(ProviderKind::OpenAi));
                assert_eq!(g.expand, Some(2));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn serve_takes_optional_bind() {
        let args = Args::try_parse_from(["vibe_tars", "serve", "--bind", "0.0.0.0:9000"]).unwrap();
        assert!(matches!(args.command, Command::Serve { bind: Some(ref b) } if b == "0.0.0.0:9000"));
    }
}
