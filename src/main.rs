use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use postgen_patcher::config::{discover, load_from_path, PatcherConfig, CONFIG_FILE_NAME};
use postgen_patcher::{run, ChangeReport, PatchEngine, ReportLine, RunOptions, RunOutcome};
use similar::{ChangeTag, TextDiff};
use std::env;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "postgen-patcher")]
#[command(about = "Reapply project adaptations to freshly generated controller sources", long_about = None)]
#[command(version)]
struct Cli {
    /// Log rule decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Patch the generated files in place
    Apply {
        /// Project root (auto-detected if not specified)
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// Config file (defaults to <root>/postgen-patch.toml when present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Dry run - show what would be changed without modifying files
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,
    },

    /// Check that the generated files are fully patched; exits 1 if not
    Verify {
        /// Project root (auto-detected if not specified)
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// Config file (defaults to <root>/postgen-patch.toml when present)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// List the rules in application order
    Rules {
        /// Config file (defaults to ./postgen-patch.toml when present)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Apply {
            root,
            config,
            dry_run,
            diff,
        } => cmd_apply(root, config, dry_run, diff),

        Commands::Verify { root, config } => cmd_verify(root, config),

        Commands::Rules { config } => cmd_rules(config),
    }
}

/// Logs go to stderr so the summary on stdout stays clean. `RUST_LOG` wins
/// over `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Resolve the project root
///
/// Priority order:
/// 1. Explicit --root flag
/// 2. POSTGEN_PATCH_ROOT environment variable
/// 3. Nearest ancestor of the current directory holding a config file or
///    the generated header (as named by `--config` when given)
fn resolve_root(cli_root: Option<PathBuf>, config: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = cli_root {
        return path
            .canonicalize()
            .with_context(|| format!("project root does not exist: {}", path.display()));
    }

    if let Ok(env_path) = env::var("POSTGEN_PATCH_ROOT") {
        let path = PathBuf::from(&env_path);
        if path.exists() {
            return Ok(path.canonicalize()?);
        }
        eprintln!(
            "{}",
            format!("Warning: POSTGEN_PATCH_ROOT is set but path doesn't exist: {env_path}")
                .yellow()
        );
    }

    if let Some(path) = auto_detect_root(config)? {
        eprintln!(
            "{}",
            format!("Auto-detected project root: {}", path.display()).dimmed()
        );
        return Ok(path);
    }

    anyhow::bail!(
        "{}\n{}\n  {}\n  {}\n  {}",
        "Could not find the project root.".red(),
        "Try one of:".bold(),
        "1. cd into the firmware project: cd /path/to/firmware && postgen-patcher apply",
        "2. Specify explicitly: postgen-patcher apply --root /path/to/firmware",
        "3. Set environment variable: export POSTGEN_PATCH_ROOT=/path/to/firmware"
    )
}

fn auto_detect_root(config: Option<&Path>) -> Result<Option<PathBuf>> {
    let header = match config {
        Some(path) => load_from_path(path)?.targets.header,
        None => PatcherConfig::default().targets.header,
    };
    let current = env::current_dir()?;

    Ok(current
        .ancestors()
        .find(|ancestor| ancestor.join(CONFIG_FILE_NAME).is_file() || ancestor.join(&header).is_file())
        .map(Path::to_path_buf))
}

/// Helper: Show unified diff between original and patched content
fn display_diff(file: &Path, original: &str, modified: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (patched)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{change}").red(),
            ChangeTag::Insert => format!("+{change}").green(),
            ChangeTag::Equal => format!(" {change}").normal(),
        };
        print!("{sign}");
    }
}

fn print_report(outcome: &RunOutcome, dry_run: bool) {
    let report = ChangeReport::new(&outcome.edits(), &outcome.root, dry_run);

    for line in report.lines() {
        let text = line.to_string();
        match line {
            ReportLine::Title { .. } => println!("{}", text.bold()),
            ReportLine::Patched { .. } => println!("{}", text.green()),
            ReportLine::Detail(_) => println!("{}", text.dimmed()),
            ReportLine::Ok { .. } => println!("{text}"),
            ReportLine::NothingChanged => println!("{}", text.yellow()),
        }
    }
}

fn cmd_apply(
    root: Option<PathBuf>,
    config: Option<PathBuf>,
    dry_run: bool,
    show_diff: bool,
) -> Result<()> {
    let root = resolve_root(root, config.as_deref())?;
    let config = discover(&root, config.as_deref())?;

    let outcome = run(&root, &config, RunOptions { dry_run })?;
    print_report(&outcome, dry_run);

    if show_diff {
        for file in outcome.files.iter().filter(|file| file.edit.changed) {
            let shown = file
                .edit
                .path
                .strip_prefix(&outcome.root)
                .unwrap_or(&file.edit.path);
            display_diff(shown, file.document.original(), file.document.text());
        }
    }

    Ok(())
}

fn cmd_verify(root: Option<PathBuf>, config: Option<PathBuf>) -> Result<()> {
    let root = resolve_root(root, config.as_deref())?;
    let config = discover(&root, config.as_deref())?;

    let outcome = run(&root, &config, RunOptions { dry_run: true })?;
    print_report(&outcome, true);

    if outcome.any_changed() {
        eprintln!(
            "{}",
            "✗ Generated files are not fully patched; run `postgen-patcher apply`".red()
        );
        std::process::exit(1);
    }

    println!("{}", "✓ All adaptations present".green());
    Ok(())
}

fn cmd_rules(config: Option<PathBuf>) -> Result<()> {
    let cwd = env::current_dir()?;
    let config = discover(&cwd, config.as_deref())?;
    let engine = PatchEngine::from_config(&config)?;

    println!("{}", "Rules (application order):".bold());
    for (index, rule) in engine.rules().iter().enumerate() {
        println!(
            "  {:>2}. {:<40} {}",
            index + 1,
            rule.name(),
            rule.target().dimmed()
        );
    }

    Ok(())
}
