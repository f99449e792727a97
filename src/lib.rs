// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod report;
pub mod types;
pub mod watch;

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{resolve_options, Options};
use crate::engine::Pipeline;
use crate::exec::{CommandRunner, DryRunRunner, ProcessRunner};
use crate::fs::RealFileSystem;
use crate::watch::{directories_to_watch, spawn_notifier, PathFilter, WatchExpander};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - option resolution (config file + CLI flags)
/// - the OS notifier and the initial watch set
/// - the consolidation pipeline, reporting to stdout
/// - the command runner (real or dry-run)
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let options = resolve_options(&args)?;

    if args.check {
        print_check(&options);
        return Ok(());
    }

    let filter = PathFilter::new(options.exclude.clone());
    let dirs = directories_to_watch(&options.directories, options.subdirs, &filter);
    info!(count = dirs.len(), subdirs = options.subdirs, "directories to watch");

    let (registrar, source) = spawn_notifier()?;
    let mut expander = WatchExpander::new(registrar, options.subdirs);
    expander.watch_initial(&dirs)?;

    let runner: Box<dyn CommandRunner> = if options.dry_run {
        Box::new(DryRunRunner)
    } else {
        Box::new(ProcessRunner)
    };

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            eprintln!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
        debug!("Ctrl+C received");
    };

    let pipeline = Pipeline::new(options, expander, Arc::new(RealFileSystem));
    pipeline
        .run(source, runner, tokio::io::stdout(), shutdown)
        .await?;
    Ok(())
}

/// `--check` output: the effective options after layering.
fn print_check(options: &Options) {
    println!("settlewatch check");
    println!("  directories = {:?}", options.directories);
    println!("  latency = {:?}", options.latency);
    if options.is_raw() {
        println!("    (raw: every event reported on its own)");
    }
    match options.exclude {
        Some(ref re) => println!("  exclude = {:?}", re.as_str()),
        None => println!("  exclude = (none)"),
    }
    println!("  subdirs = {}", options.subdirs);
    println!("  long = {}", options.long_format);
    println!("  mode = {:?}", options.mode);
    match options.command {
        Some(ref cmd) => {
            println!("  command = {:?}", cmd);
            if options.dry_run {
                println!("    (dry-run: logged, not executed)");
            }
        }
        None => println!("  command = (none)"),
    }
}
