//! Command-line interface for the progress notification demo tool.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use rayon::prelude::*;

use crate::config::AppConfig;
use crate::progress::{ProgressHandle, ProgressState};
use crate::task::{next_task_id, TaskId};
use crate::transport::LocalTransport;
use crate::worker::{ChannelWorker, ConsoleWorker, WorkerRef};

const CALLBACK_TIMEOUT: Duration = Duration::from_secs(5);

/// Progress Notification Tool
///
/// Runs simulated background tasks that report their progress to a
/// notification worker through progress handles.
#[derive(Parser, Debug)]
#[command(name = "notify-progress")]
#[command(author = "Notification Platform Team")]
#[command(version = "0.1.0")]
#[command(about = "Forward de-duplicated task progress to a notification worker")]
#[command(long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a simulated task and show its progress
    Demo(DemoArgs),

    /// Write the default configuration as TOML
    InitConfig {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Options of the `demo` subcommand. Unset options fall back to the
/// configuration file, then to defaults.
#[derive(Args, Debug, Default)]
pub struct DemoArgs {
    /// Configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Number of work units
    #[arg(short, long)]
    pub total: Option<u64>,

    /// Worker threads (0 = number of CPUs)
    #[arg(short = 'j', long)]
    pub threads: Option<usize>,

    /// Milliseconds per work unit
    #[arg(short, long)]
    pub delay_ms: Option<u64>,

    /// Show a spinner before counting starts
    #[arg(long)]
    pub indeterminate_first: bool,

    /// Crash and restart the worker after this many units
    #[arg(long)]
    pub crash_at: Option<u64>,

    /// Print forwarded worker commands as JSON lines instead of drawing bars
    #[arg(long)]
    pub json: bool,
}

impl DemoArgs {
    /// Build the effective configuration.
    pub fn resolve_config(&self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::from_file(path)
                .with_context(|| format!("Failed to load {}", path.display()))?,
            None => AppConfig::default(),
        };

        if let Some(total) = self.total {
            config.demo.total = total;
        }
        if let Some(threads) = self.threads {
            config.demo.threads = threads;
        }
        if let Some(delay_ms) = self.delay_ms {
            config.demo.step_delay_ms = delay_ms;
        }
        if self.indeterminate_first {
            config.demo.indeterminate_first = true;
        }
        if self.crash_at.is_some() {
            config.demo.crash_at = self.crash_at;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Outcome of one simulated task.
#[derive(Debug, Clone, Copy)]
pub struct DemoSummary {
    /// Task that ran.
    pub task_id: TaskId,
    /// Progress at the moment the handle was closed.
    pub final_progress: ProgressState,
}

/// Run the CLI application.
pub fn run(cli: Cli) -> Result<()> {
    // Initialize logging
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug"))
            .init();
    } else if !cli.quiet {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .init();
    }

    match cli.command {
        Commands::Demo(args) => run_demo(args, cli.quiet),
        Commands::InitConfig { output, force } => run_init_config(output, force),
    }
}

/// Run demo command.
fn run_demo(args: DemoArgs, quiet: bool) -> Result<()> {
    let config = args.resolve_config()?;

    let summary = if args.json {
        let (worker, receiver) = ChannelWorker::new();
        let printer = std::thread::spawn(move || {
            for command in receiver.iter() {
                match serde_json::to_string(&command) {
                    Ok(line) => println!("{}", line),
                    Err(err) => log::warn!("Could not serialize {:?}: {}", command, err),
                }
            }
        });

        // The transport owns the only sender; dropping it ends the printer.
        let summary = run_task(Arc::new(worker), &config)?;
        if printer.join().is_err() {
            bail!("JSON printer thread panicked");
        }
        summary
    } else {
        run_task(Arc::new(console_worker(quiet)), &config)?
    };

    if !quiet {
        println!("{} finished at {}", summary.task_id, summary.final_progress);
    }
    Ok(())
}

/// Bars are drawn to stderr unless `quiet` is set.
fn console_worker(quiet: bool) -> ConsoleWorker {
    if quiet {
        ConsoleWorker::hidden()
    } else {
        ConsoleWorker::new()
    }
}

/// Simulate one task on a rayon pool, reporting through a single handle.
pub fn run_task(worker: WorkerRef, config: &AppConfig) -> Result<DemoSummary> {
    let demo = &config.demo;
    let transport = Arc::new(LocalTransport::new(worker, config.transport.clone()));
    let task_id = next_task_id();
    let handle = ProgressHandle::with_config(transport.clone(), task_id, &config.handle);
    let delay = Duration::from_millis(demo.step_delay_ms);

    if demo.indeterminate_first {
        handle.set_indeterminate_progress();
        std::thread::sleep(delay * 10);
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(demo.effective_threads())
        .build()
        .context("Failed to create thread pool")?;

    let done = AtomicU64::new(0);
    let crashed = AtomicBool::new(false);
    let total = demo.total;

    log::info!("{}: running {} units on {} thread(s)", task_id, total, pool.current_num_threads());
    pool.install(|| {
        (0..total).into_par_iter().for_each(|_| {
            std::thread::sleep(delay);
            let finished = done.fetch_add(1, Ordering::SeqCst) + 1;
            handle.set_progress(total as i64, finished as i64);

            if demo.crash_at == Some(finished) && !crashed.swap(true, Ordering::SeqCst) {
                log::warn!("Crashing worker at {}/{}", finished, total);
                transport.crash_worker();
                transport.start_worker();
            }
        });
    });

    // Let a restart's reconnect land before the final update.
    if !transport.wait_idle(CALLBACK_TIMEOUT) {
        log::warn!("{}: connection events still pending after {:?}", task_id, CALLBACK_TIMEOUT);
    }

    // Threads finish out of order; settle on the true final count.
    handle.set_progress(total as i64, done.load(Ordering::SeqCst) as i64);

    let summary = DemoSummary {
        task_id,
        final_progress: handle.progress(),
    };
    handle.close();
    Ok(summary)
}

/// Run init-config command.
fn run_init_config(output: Option<PathBuf>, force: bool) -> Result<()> {
    let text = AppConfig::default().to_toml_string()?;

    match output {
        Some(path) => {
            if path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            std::fs::write(&path, text)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            log::info!("Wrote default configuration to {}", path.display());
        }
        None => print!("{}", text),
    }
    Ok(())
}
