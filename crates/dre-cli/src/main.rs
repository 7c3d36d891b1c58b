//! Dialogue Runtime Engine - CLI
//!
//! Command-line interface to run, inspect and analyse dialogue programs.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use dre_core::{
    AnalysisContext, DialogueRuntime, MemoryVariableStorage, Program, ProgramLoader, ProgramWriter,
    RuntimeConfig,
};
use dre_host::{drive, sample_program, DialogueHandler};

/// Dialogue Runtime Engine
#[derive(Debug, Parser)]
#[command(name = "dre", about = "Run and inspect compiled dialogue programs")]
struct Cli {
    /// Increase log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Runtime configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a program, printing lines and commands
    Run {
        /// Program file (.json for JSON, anything else binary)
        program: PathBuf,

        /// Node to start from
        #[arg(short, long)]
        node: Option<String>,

        /// How options are chosen
        #[arg(long, value_enum, default_value_t = Choose::First)]
        choose: Choose,
    },

    /// Print a disassembly of a program
    Dump { program: PathBuf },

    /// List nodes with their tags
    Nodes { program: PathBuf },

    /// Report unused variables, undefined variables and unreachable nodes
    Analyze { program: PathBuf },

    /// Write the sample program
    Generate {
        path: PathBuf,

        /// Write JSON instead of binary
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Choose {
    /// Always take the first option
    First,
    /// Prompt on stdin
    Ask,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = execute(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn execute(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => RuntimeConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => RuntimeConfig::default(),
    };
    debug!(?config, "configuration");

    match cli.command {
        Command::Run {
            program,
            node,
            choose,
        } => {
            let mut runtime = runtime_for(&program, config)?;
            let mut console = Console::new(choose);
            let summary = drive(&mut runtime, node.as_deref(), &mut console)?;
            info!(?summary, "run complete");
        }
        Command::Dump { program } => {
            let runtime = runtime_for(&program, config)?;
            print!("{}", runtime.byte_code_dump());
        }
        Command::Nodes { program } => {
            let runtime = runtime_for(&program, config)?;
            for (name, tags) in runtime.tags_for_all_nodes() {
                if tags.is_empty() {
                    println!("{}", name);
                } else {
                    println!("{} [{}]", name, tags.join(", "));
                }
            }
        }
        Command::Analyze { program } => {
            let runtime = runtime_for(&program, config)?;
            let mut context = AnalysisContext::new(&runtime.config().default_start_node);
            runtime.analyze(&mut context);
            let diagnoses = context.finish();
            if diagnoses.is_empty() {
                println!("no issues found");
            }
            for diagnosis in diagnoses {
                println!("{}", diagnosis);
            }
        }
        Command::Generate { path, json } => {
            write_sample(&path, json)?;
            println!("wrote sample program to {}", path.display());
        }
    }
    Ok(())
}

fn load_program(path: &Path) -> Result<Program> {
    ProgramLoader::load_file(path).with_context(|| format!("failed to load {}", path.display()))
}

fn runtime_for(path: &Path, config: RuntimeConfig) -> Result<DialogueRuntime> {
    let program = load_program(path)?;
    let mut runtime = DialogueRuntime::with_config(MemoryVariableStorage::new(), config);
    runtime.use_tracing_handlers();
    runtime.load_program(program);
    Ok(runtime)
}

fn write_sample(path: &Path, json: bool) -> Result<()> {
    let program = sample_program()?;
    let bytes = if json {
        program.to_json()?.into_bytes()
    } else {
        ProgramWriter::encode(&program)
    };
    fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Prints to stdout and picks options per [`Choose`]
struct Console {
    choose: Choose,
}

impl Console {
    fn new(choose: Choose) -> Self {
        Console { choose }
    }

    fn prompt(count: usize) -> Result<usize> {
        let stdin = io::stdin();
        let mut input = String::new();
        loop {
            print!("> ");
            io::stdout().flush()?;
            input.clear();
            if stdin.lock().read_line(&mut input)? == 0 {
                bail!("stdin closed while waiting for a choice");
            }
            match input.trim().parse::<usize>() {
                Ok(n) if (1..=count).contains(&n) => return Ok(n - 1),
                _ => println!("enter a number from 1 to {}", count),
            }
        }
    }
}

impl DialogueHandler for Console {
    fn on_line(&mut self, text: &str) {
        println!("{}", text);
    }

    fn on_options(&mut self, options: &[String]) -> usize {
        for (i, option) in options.iter().enumerate() {
            println!("  {}. {}", i + 1, option);
        }
        match self.choose {
            Choose::First => 0,
            Choose::Ask => Self::prompt(options.len()).unwrap_or_else(|e| {
                eprintln!("Error: {:#}", e);
                // Out of range: the run fails with an invalid option error
                options.len()
            }),
        }
    }

    fn on_command(&mut self, text: &str) {
        println!("<<{}>>", text);
    }
}
