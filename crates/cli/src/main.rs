use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use skillrun_agent::{Orchestrator, ReplayModel, Role, Session, TurnReport};
use skillrun_core::Config;
use skillrun_core::logging::init_logging;
use skillrun_skills::{FenceGrammar, ScanOptions, SkillRegistry};
use skillrun_tools::ProcessExecutor;

const DEFAULT_CONFIG: &str = "skillrun.toml";

/// skillrun - discovers skills, extracts agent commands and runs them
#[derive(Parser, Debug)]
#[command(name = "skillrun")]
#[command(about = "Skill orchestration runtime for language-model agents", long_about = None)]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to skillrun.toml (default: ./skillrun.toml, defaults used when missing)
    #[arg(short, long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Skill root directory, overriding [skills].root
    #[arg(short, long, value_name = "DIR", global = true)]
    skills_dir: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write an example skillrun.toml
    Init {
        /// Destination (default: ./skillrun.toml)
        #[arg(value_name = "PATH")]
        path: Option<PathBuf>,
    },
    /// List discovered skills
    List,
    /// Print the skills section injected into the agent's instructions
    Prompt,
    /// Print a skill's full documentation
    Show {
        #[arg(value_name = "NAME")]
        name: String,
    },
    /// Report which skill, if any, a message invokes
    Detect {
        /// File holding the agent message, or - for stdin
        #[arg(value_name = "FILE", default_value = "-")]
        input: PathBuf,
    },
    /// Print the commands found in a message, one per line
    Extract {
        /// File holding the agent message, or - for stdin
        #[arg(value_name = "FILE", default_value = "-")]
        input: PathBuf,
    },
    /// Execute one command the way an extracted command is executed
    Run {
        /// Working directory (default: [exec].working_dir or the current directory)
        #[arg(short, long, value_name = "DIR")]
        dir: Option<PathBuf>,

        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true, value_name = "CMD")]
        command: Vec<String>,
    },
    /// Process one agent message end to end and print the feedback
    Turn {
        /// File holding the agent message, or - for stdin
        #[arg(value_name = "FILE", default_value = "-")]
        input: PathBuf,

        #[arg(short, long, value_name = "DIR")]
        dir: Option<PathBuf>,

        /// Print the turn report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run a whole session against scripted model responses
    Replay {
        /// TOML file of [[responses]] tables
        #[arg(value_name = "FILE")]
        responses: PathBuf,

        /// Task given to the agent
        #[arg(short, long)]
        task: String,

        #[arg(short, long, value_name = "DIR")]
        dir: Option<PathBuf>,

        /// Print the transcript as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    match run().await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    }
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    if let Commands::Init { path } = &cli.command {
        cmd_init(path.as_deref().unwrap_or(Path::new(DEFAULT_CONFIG)))?;
        return Ok(0);
    }

    let config_path = cli.config.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));
    let config = load_config(&config_path, cli.skills_dir.clone(), cli.verbose)?;
    let _guard = init_logging(&config.logging).context("Failed to initialize logging")?;

    match cli.command {
        Commands::Init { .. } => Ok(0),
        Commands::List => cmd_list(&config).map(|_| 0),
        Commands::Prompt => cmd_prompt(&config).map(|_| 0),
        Commands::Show { name } => cmd_show(&config, &name).map(|_| 0),
        Commands::Detect { input } => cmd_detect(&config, &read_input(&input)?),
        Commands::Extract { input } => cmd_extract(&config, &read_input(&input)?).map(|_| 0),
        Commands::Run { dir, command } => cmd_run(&config, dir, &command.join(" ")).await,
        Commands::Turn { input, dir, json } => cmd_turn(&config, dir, &read_input(&input)?, json).await,
        Commands::Replay { responses, task, dir, json } => cmd_replay(&config, dir, &responses, &task, json).await,
    }
}

/// Load config (defaults when the file is missing) and apply command-line overrides
fn load_config(path: &Path, skills_dir: Option<PathBuf>, verbose: bool) -> Result<Config> {
    let mut config =
        Config::load_or_default(path).with_context(|| format!("Failed to load config from {}", path.display()))?;

    if let Some(dir) = skills_dir {
        config.skills.root = dir;
    }
    if verbose {
        config.logging.level = "debug".to_string();
    }
    Ok(config)
}

fn cmd_init(path: &Path) -> Result<()> {
    if path.exists() {
        anyhow::bail!("{} already exists, not overwriting", path.display());
    }
    std::fs::write(path, Config::example()).context("Failed to write example config")?;
    println!("{} Created config at {}", "Success:".green().bold(), path.display());
    Ok(())
}

fn load_registry(config: &Config) -> Result<SkillRegistry> {
    SkillRegistry::scan_with(&config.skills.root, &ScanOptions::from(&config.skills))
        .with_context(|| format!("Failed to scan skills in {}", config.skills.root.display()))
}

fn working_dir(config: &Config, dir: Option<PathBuf>) -> Result<PathBuf> {
    match dir.or_else(|| config.exec.working_dir.clone()) {
        Some(dir) => Ok(dir),
        None => std::env::current_dir().context("Failed to determine current directory"),
    }
}

/// Read a message from `path`, or from stdin when `path` is `-`
fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).context("Failed to read stdin")?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
    }
}

fn cmd_list(config: &Config) -> Result<()> {
    let registry = load_registry(config)?;
    if registry.is_empty() {
        println!("{} No skills found in {}", "Info:".yellow().bold(), config.skills.root.display());
        return Ok(());
    }

    let width = registry.names().iter().map(|n| n.len()).max().unwrap_or(0);
    println!("{}", format!("Skills in {}", registry.root().display()).green().bold().underline());
    for skill in registry.iter() {
        println!(
            "  {:<width$}  {}  {} ({} scripts)",
            skill.name.cyan(),
            skill.description,
            skill.source_dir.display().dimmed(),
            skill.scripts.len(),
        );
    }
    Ok(())
}

fn cmd_prompt(config: &Config) -> Result<()> {
    let registry = load_registry(config)?;
    print!("{}", registry.render_prompt());
    Ok(())
}

fn cmd_show(config: &Config, name: &str) -> Result<()> {
    let registry = load_registry(config)?;
    let skill = registry
        .get(name)
        .with_context(|| format!("No skill named '{}' in {}", name, registry.root().display()))?;
    print!("{}", skill.full_content);
    Ok(())
}

/// Prints the triggered skill; exit status 1 when none is named
fn cmd_detect(config: &Config, text: &str) -> Result<i32> {
    let registry = load_registry(config)?;
    match registry.detect(text) {
        Some(skill) => {
            println!("{}", skill.name);
            Ok(0)
        }
        None => {
            eprintln!("{} No skill mentioned", "Info:".yellow().bold());
            Ok(1)
        }
    }
}

fn cmd_extract(config: &Config, text: &str) -> Result<()> {
    for command in FenceGrammar::from(&config.extract).extract(text) {
        println!("{command}");
    }
    Ok(())
}

async fn cmd_run(config: &Config, dir: Option<PathBuf>, command: &str) -> Result<i32> {
    let working_dir = working_dir(config, dir)?;
    let executor = ProcessExecutor::from_config(config, &working_dir);
    let outcome = executor.run(command, &working_dir).await;

    print!("{}", outcome.stdout);
    if outcome.stderr.ends_with('\n') || outcome.stderr.is_empty() {
        eprint!("{}", outcome.stderr);
    } else {
        eprintln!("{}", outcome.stderr);
    }

    if outcome.success {
        return Ok(0);
    }
    Ok(outcome.exit_code.filter(|code| *code != 0).unwrap_or(1))
}

async fn cmd_turn(config: &Config, dir: Option<PathBuf>, text: &str, json: bool) -> Result<i32> {
    let working_dir = working_dir(config, dir)?;
    let registry = Arc::new(load_registry(config)?);
    let mut orchestrator = Orchestrator::from_config(registry, config, &working_dir);

    let report = orchestrator.process_turn(text, &working_dir).await;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(if report.all_succeeded() { 0 } else { 1 })
}

fn print_report(report: &TurnReport) {
    if report.is_idle() {
        println!("{} Nothing to do", "Info:".yellow().bold());
        return;
    }
    println!("{}", report.feedback());
}

async fn cmd_replay(config: &Config, dir: Option<PathBuf>, responses: &Path, task: &str, json: bool) -> Result<i32> {
    let working_dir = working_dir(config, dir)?;
    let registry = Arc::new(load_registry(config)?);
    let mut model = ReplayModel::from_file(responses)
        .with_context(|| format!("Failed to load replay script {}", responses.display()))?;

    let mut session =
        Session::new(Orchestrator::from_config(registry, config, &working_dir), config.session.max_turns);
    let transcript = session.run(&mut model, task, &working_dir).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&transcript)?);
        return Ok(0);
    }

    for message in transcript.messages.iter().filter(|m| m.role != Role::System) {
        let label = match message.role {
            Role::User => "user".blue().bold().to_string(),
            Role::Assistant => "assistant".green().bold().to_string(),
            Role::System => "system".dimmed().to_string(),
        };
        println!("{} {}", label, message.timestamp.format("%H:%M:%S").dimmed());
        println!("{}\n", message.content.trim_end());
    }
    println!(
        "{} Session ended after {} turns ({:?})",
        "Info:".blue().bold(),
        transcript.turns.len(),
        transcript.stop
    );
    Ok(0)
}
