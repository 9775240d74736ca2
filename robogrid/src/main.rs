//! Robot-on-a-grid puzzle runner.
//!
//! Lists and shows catalog levels, expands programs written in the text
//! notation, and runs them with the same pacing as the game.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;

use robogrid::core::expand::expand;
use robogrid::core::grid::Level;
use robogrid::core::program::Program;
use robogrid::core::types::InstructionKind;
use robogrid::engine::handle::RunReport;
use robogrid::engine::pacer::SleepPacer;
use robogrid::engine::session::Session;
use robogrid::exit_codes;
use robogrid::io::catalog::{Catalog, resolve_catalog};
use robogrid::io::config::{DEFAULT_CONFIG_FILE, RobogridConfig, load_config, write_config};
use robogrid::io::notation::parse_program_checked;
use robogrid::io::report::{RunSummary, render_level, render_run};
use robogrid::logging;

#[derive(Parser)]
#[command(
    name = "robogrid",
    version,
    about = "Run instruction programs against robot grid puzzles"
)]
struct Cli {
    /// Config file (missing file means defaults).
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the levels in the catalog.
    Levels,
    /// Print a level grid and hint.
    Show {
        /// Level id.
        level: u32,
    },
    /// Print the expansion of a program, one unit per line.
    Expand {
        /// Program in text notation, e.g. "loop*2 { forward right }".
        program: String,
    },
    /// Run a program against a level.
    Run {
        /// Level id.
        level: u32,
        /// Program in text notation.
        program: String,
        /// Override the configured step delay.
        #[arg(long)]
        delay_ms: Option<u64>,
        /// Print the run report as JSON.
        #[arg(long)]
        json: bool,
        /// Accept commands the level's palette does not offer.
        #[arg(long)]
        allow_any: bool,
    },
    /// Write the default config file.
    InitConfig {
        /// Overwrite an existing file.
        #[arg(short, long)]
        force: bool,
    },
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::InitConfig { force } => cmd_init_config(&cli.config, force),
        Command::Levels => {
            let (_, catalog) = load_context(&cli.config)?;
            cmd_levels(&catalog)
        }
        Command::Show { level } => {
            let (_, catalog) = load_context(&cli.config)?;
            cmd_show(&catalog, level)
        }
        Command::Expand { program } => cmd_expand(&load_config(&cli.config)?, &program),
        Command::Run {
            level,
            program,
            delay_ms,
            json,
            allow_any,
        } => {
            let (config, catalog) = load_context(&cli.config)?;
            let args = RunArgs {
                level,
                program: &program,
                delay_ms,
                json,
                allow_any,
            };
            cmd_run(&config, &catalog, &args)
        }
    }
}

fn load_context(config_path: &Path) -> Result<(RobogridConfig, Catalog)> {
    let config = load_config(config_path)?;
    let catalog = resolve_catalog(config.catalog.as_deref())?;
    Ok((config, catalog))
}

fn cmd_init_config(path: &Path, force: bool) -> Result<i32> {
    if !force && path.exists() {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    write_config(path, &RobogridConfig::default())
        .with_context(|| format!("write {}", path.display()))?;
    println!("{}", path.display());
    Ok(exit_codes::OK)
}

fn cmd_levels(catalog: &Catalog) -> Result<i32> {
    for level in catalog.levels() {
        let commands: Vec<&str> = level.commands.iter().map(|kind| kind.as_str()).collect();
        println!(
            "{:>2}  {:<24} {}x{}  optimal {}  [{}]",
            level.id,
            level.name,
            level.grid_size,
            level.grid_size,
            level.optimal_moves,
            commands.join(", ")
        );
    }
    Ok(exit_codes::OK)
}

fn cmd_show(catalog: &Catalog, id: u32) -> Result<i32> {
    let level = find_level(catalog, id)?;
    println!("{}", render_level(level)?);
    Ok(exit_codes::OK)
}

/// Parse learner input, holding loop counts to the configured choices.
fn parse_authored(config: &RobogridConfig, text: &str) -> Result<Program> {
    parse_program_checked(text, config.default_repeat_count, |count| {
        config.is_loop_choice(count)
    })
    .context("parse program")
}

fn cmd_expand(config: &RobogridConfig, text: &str) -> Result<i32> {
    let program = parse_authored(config, text)?;
    for (index, unit) in expand(&program).iter().enumerate() {
        let id = unit.id.to_string();
        let marker = if unit.loop_marker { "  (loop)" } else { "" };
        println!("{:>4}  {:<4} {}{}", index, id, unit.kind.as_str(), marker);
    }
    Ok(exit_codes::OK)
}

struct RunArgs<'a> {
    level: u32,
    program: &'a str,
    delay_ms: Option<u64>,
    json: bool,
    allow_any: bool,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    level: u32,
    stars: u8,
    /// Set only after a win, when the catalog has a later level.
    next_level: Option<u32>,
    #[serde(flatten)]
    report: &'a RunReport,
}

fn cmd_run(config: &RobogridConfig, catalog: &Catalog, args: &RunArgs<'_>) -> Result<i32> {
    let level = find_level(catalog, args.level)?;
    let program = parse_authored(config, args.program)?;
    if program.is_empty() {
        bail!("program is empty");
    }
    if !args.allow_any {
        check_palette(level, &program.kinds_used())?;
    }

    let mut session = Session::new(level.clone(), config.max_expanded_units);
    *session.program_mut() = program;

    let pacer = SleepPacer::from_millis(args.delay_ms.unwrap_or(config.step_delay_ms));
    let mut steps = Vec::new();
    let report = session
        .run(&pacer, |step| steps.push(*step))
        .with_context(|| {
            format!(
                "program rejected: it expands past {} units",
                config.max_expanded_units
            )
        })?;
    let stars = session.stars(&report);
    let next = report
        .reached_target()
        .then(|| catalog.next_after(level.id))
        .flatten();

    if args.json {
        let payload = JsonReport {
            level: level.id,
            stars,
            next_level: next.map(|next| next.id),
            report: &report,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&payload).context("serialize run report")?
        );
    } else {
        let rendered = render_run(&RunSummary {
            level,
            program: session.program(),
            report: &report,
            steps: &steps,
            stars,
        })?;
        println!("{}", rendered);
        if let Some(next) = next {
            println!("Next level: {} {}", next.id, next.name);
        }
    }

    Ok(if report.reached_target() {
        exit_codes::OK
    } else {
        exit_codes::NOT_REACHED
    })
}

fn find_level(catalog: &Catalog, id: u32) -> Result<&Level> {
    catalog
        .get(id)
        .with_context(|| format!("no level with id {} ({} levels)", id, catalog.len()))
}

fn check_palette(level: &Level, used: &BTreeSet<InstructionKind>) -> Result<()> {
    let missing: Vec<&str> = used
        .iter()
        .filter(|kind| !level.allows(**kind))
        .map(|kind| kind.as_str())
        .collect();
    if !missing.is_empty() {
        bail!(
            "level {} does not offer: {} (use --allow-any to run anyway)",
            level.id,
            missing.join(", ")
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_run_with_flags() {
        let cli = Cli::parse_from([
            "robogrid",
            "run",
            "3",
            "loop*2 { forward }",
            "--delay-ms",
            "0",
            "--json",
        ]);
        let Command::Run {
            level,
            program,
            delay_ms,
            json,
            allow_any,
        } = cli.command
        else {
            panic!("expected run");
        };
        assert_eq!(level, 3);
        assert_eq!(program, "loop*2 { forward }");
        assert_eq!(delay_ms, Some(0));
        assert!(json);
        assert!(!allow_any);
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_FILE));
    }

    #[test]
    fn parse_init_config_force() {
        let cli = Cli::parse_from(["robogrid", "--config", "x.toml", "init-config", "--force"]);
        assert!(matches!(cli.command, Command::InitConfig { force: true }));
        assert_eq!(cli.config, PathBuf::from("x.toml"));
    }

    #[test]
    fn palette_check_names_missing_commands() {
        let catalog = robogrid::io::catalog::builtin_catalog().expect("catalog");
        let level = catalog.get(1).expect("level 1");
        let used = [InstructionKind::Forward, InstructionKind::Jump]
            .into_iter()
            .collect();
        let err = check_palette(level, &used).expect_err("jump not offered");
        assert!(err.to_string().contains("does not offer: jump"));
    }
}
