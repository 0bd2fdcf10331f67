//! Command-line interface for stacknav.
//!
//! One-shot subcommands load a trace from a file or stdin, run one command
//! and print the result. `serve` runs the JSON-RPC server instead.

use std::collections::HashMap;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::LevelFilter;

use stacknav_config::{Config, discover_providers};

use crate::context::{BufferContext, NoPrompt, SourceSelector};
use crate::deobfuscate::Deobfuscator;
use crate::resolver::{LspSymbolProvider, Resolver, SymbolProvider};
use crate::server::{self, Handlers};
use crate::session::Session;
use crate::sinks::{JumpTarget, RecordingJumpSink};

/// stacknav - navigate Java stack traces from an editor
#[derive(Debug, Parser)]
#[command(name = "stacknav")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, value_name = "LEVEL", global = true, value_parser = parse_level_arg)]
    pub log_level: Option<LevelFilter>,

    /// Settings file to use instead of ~/.config/stacknav/config.yaml
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the loaded frames, innermost first
    Frames {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Print path:line for each distinct frame that resolves to a source file
    Resolve {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        workspace: WorkspaceArgs,
    },
    /// Print the trace as compiler-style diagnostics
    Quickfix {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        workspace: WorkspaceArgs,
    },
    /// Run the trace through the deobfuscator and print the result
    Deobfuscate {
        #[command(flatten)]
        input: InputArgs,
        /// Mapping file handed to the deobfuscator
        #[arg(long, value_name = "FILE")]
        mapping: PathBuf,
    },
    /// Move from the cursor frame and print the jump target
    Nav {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        workspace: WorkspaceArgs,
        #[arg(value_enum)]
        motion: Motion,
        /// Frame index for `index`
        #[arg(value_name = "N")]
        index: Option<usize>,
    },
    /// Serve JSON-RPC requests on stdin/stdout
    Serve {
        #[command(flatten)]
        workspace: WorkspaceArgs,
    },
}

/// Where the trace comes from.
#[derive(Debug, Clone, Args)]
pub struct InputArgs {
    /// Read the buffer from FILE instead of stdin
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Cursor line (1-based); the trace around it is loaded
    #[arg(long, value_name = "N")]
    pub line: Option<usize>,

    /// Register name (`+`/`*` for the clipboard) or literal trace text
    #[arg(long, value_name = "SELECTOR")]
    pub from: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct WorkspaceArgs {
    /// Workspace root handed to language servers
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Motion {
    Top,
    Bottom,
    Up,
    Down,
    Index,
}

fn parse_level_arg(value: &str) -> Result<LevelFilter, String> {
    crate::debug::parse_level(value).ok_or_else(|| format!("unknown log level '{value}'"))
}

/// Load the settings file named on the command line, or the default one.
pub fn load_config(cli: &Cli) -> Result<Config> {
    match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Config::load().context("failed to load config"),
    }
}

/// Run the parsed command.
pub async fn run(cli: Cli, config: &Config) -> Result<()> {
    match cli.command {
        Commands::Frames { input } => {
            let session = load_session(&input, Arc::new(Resolver::new(Vec::new())), config)?;
            print!("{}", render_frames(&session)?);
        }
        Commands::Resolve { input, workspace } => {
            let resolver = build_resolver(config, &workspace);
            let session = load_session(&input, resolver, config)?;
            for item in session.pick_list().await?.items {
                println!("{}", JumpTarget::from(&item));
            }
        }
        Commands::Quickfix { input, workspace } => {
            let resolver = build_resolver(config, &workspace);
            let session = load_session(&input, resolver, config)?;
            for item in session.diagnostics().await? {
                println!("{item}");
            }
        }
        Commands::Deobfuscate { input, mapping } => {
            let mut session =
                load_session(&input, Arc::new(Resolver::new(Vec::new())), config)?;
            session.deobfuscate(Some(&mapping), &NoPrompt).await?;
            print!("{}", session.serialize()?);
        }
        Commands::Nav {
            input,
            workspace,
            motion,
            index,
        } => {
            let resolver = build_resolver(config, &workspace);
            let mut session = load_session(&input, resolver, config)?;
            let mut jump = RecordingJumpSink::default();
            let target = match motion {
                Motion::Top => Some(session.goto_top(&mut jump).await?),
                Motion::Bottom => Some(session.goto_bottom(&mut jump).await?),
                Motion::Up => session.step_up(&mut jump).await?,
                Motion::Down => session.step_down(&mut jump).await?,
                Motion::Index => Some(session.goto_index(index, &NoPrompt, &mut jump).await?),
            };
            match target {
                Some(target) => println!("{target}"),
                None => eprintln!("stacknav: already at the end of the stack trace"),
            }
        }
        Commands::Serve { workspace } => {
            let resolver = build_resolver(config, &workspace);
            let handlers = Handlers::new(
                resolver,
                config.deobfuscator.clone(),
                config.diagnostics.severity,
            );
            server::run_stdio(handlers)
                .await
                .context("JSON-RPC server I/O failed")?;
        }
    }
    Ok(())
}

/// Build a resolver over the discovered language servers that the config
/// enables, in the configured order.
pub fn build_resolver(config: &Config, workspace: &WorkspaceArgs) -> Arc<Resolver> {
    let root = workspace
        .root
        .clone()
        .unwrap_or_else(|| config.resolved_workspace_root());
    let mut discovered: HashMap<String, _> = discover_providers(&Config::config_dir())
        .into_iter()
        .map(|p| (p.identity.clone(), p))
        .collect();

    let mut providers: Vec<Arc<dyn SymbolProvider>> = Vec::new();
    for identity in &config.providers {
        let Some(record) = discovered.remove(identity) else {
            log::debug!("Provider '{identity}' is enabled but not discovered");
            continue;
        };
        if !record.installed {
            log::info!("Provider '{identity}' is not installed; skipping");
            continue;
        }
        match LspSymbolProvider::from_config(&record, root.clone()) {
            Some(provider) => providers.push(Arc::new(provider)),
            None => log::warn!("Provider '{identity}' has no run command for this platform"),
        }
    }
    log::info!(
        "Using {} symbol provider(s) with workspace root {}",
        providers.len(),
        root.display()
    );
    Arc::new(Resolver::new(providers))
}

fn load_session(input: &InputArgs, resolver: Arc<Resolver>, config: &Config) -> Result<Session> {
    let mut session = Session::new(
        resolver,
        Deobfuscator::new(&config.deobfuscator),
        config.diagnostics.severity,
    );
    let selector = input.from.as_deref().map(|s| SourceSelector::parse(Some(s)));

    let count = match selector {
        Some(SourceSelector::Register(name)) => {
            let ctx = BufferContext::default().with_system_clipboard(true);
            session.load(&SourceSelector::Register(name), &ctx)?
        }
        Some(SourceSelector::Text(text)) => session.load_text(&text)?,
        Some(SourceSelector::Cursor) | None => {
            let text = read_input(input.input.as_deref())?;
            match input.line {
                Some(line) => {
                    let ctx = BufferContext::new(&text, line);
                    session.load(&SourceSelector::Cursor, &ctx)?
                }
                None => session.load_text(&text)?,
            }
        }
    };
    log::info!("Loaded {count} frames");
    Ok(session)
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("failed to read stdin")?;
            Ok(text)
        }
    }
}

/// One line per frame, `> ` in front of the cursor frame.
pub fn render_frames(session: &Session) -> Result<String> {
    let navigator = session.navigator();
    let cursor = navigator.cursor()?;
    let mut out = String::new();
    for (i, frame) in navigator.sequence()?.iter().enumerate() {
        let index = i + 1;
        let marker = if index == cursor { ">" } else { " " };
        out.push_str(&format!("{marker} {index:>3} {frame}\n"));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_nav_index() {
        let cli = Cli::try_parse_from([
            "stacknav",
            "nav",
            "index",
            "3",
            "--line",
            "7",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(cli.log_level, Some(LevelFilter::Debug));
        match cli.command {
            Commands::Nav {
                input,
                motion,
                index,
                ..
            } => {
                assert_eq!(motion, Motion::Index);
                assert_eq!(index, Some(3));
                assert_eq!(input.line, Some(7));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_bad_log_level_rejected() {
        assert!(Cli::try_parse_from(["stacknav", "frames", "--log-level", "loud"]).is_err());
    }

    #[test]
    fn test_render_frames_marks_cursor() {
        let mut session = Session::new(
            Arc::new(Resolver::new(Vec::new())),
            Deobfuscator::default(),
            stacknav_config::Severity::Error,
        );
        let ctx = BufferContext::new(
            "Exception in thread \"main\" java.lang.Error\n\tat a.B.c(B.java:1)\n\tat a.D.e(D.java:2)",
            3,
        );
        session.load(&SourceSelector::Cursor, &ctx).unwrap();
        assert_eq!(
            render_frames(&session).unwrap(),
            "    1 at a.B.c(B.java:1)\n>   2 at a.D.e(D.java:2)\n"
        );
    }
}
