use std::{fs, process::ExitCode};

use clap::Parser;
use genr::{
    interpreter::{
        dataset::Dataset,
        evaluator::core::Context,
        output::{PrintSink, render},
    },
    run_with_context,
};
use tracing_subscriber::EnvFilter;

/// genr evaluates scripts of the genr econometric expression language:
/// series, matrices, scalars, strings, lists and bundles.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Tells genr to look at a file instead of a script.
    #[arg(short, long)]
    file: bool,

    /// Pipe mode automatically prints out the last value produced by the
    /// script.
    #[arg(short, long)]
    pipe_mode: bool,

    /// Starts with an empty dataset of this many observations.
    #[arg(short, long, default_value_t = 0)]
    nobs: usize,

    /// Does not print "generated missing values" warnings.
    #[arg(short, long)]
    quiet: bool,

    contents: String,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::try_from_env("GENR_LOG")
                                                  .unwrap_or_else(|_| EnvFilter::new("warn")))
                             .with_writer(std::io::stderr)
                             .with_target(false)
                             .init();

    let args = Args::parse();

    let script = if args.file {
        match fs::read_to_string(&args.contents) {
            Ok(script) => script,
            Err(_) => {
                eprintln!("Failed to read the input file '{}'. Perhaps this file does not exist?",
                          &args.contents);
                return ExitCode::FAILURE;
            },
        }
    } else {
        args.contents
    };

    let mut ctx = Context::with_dataset(Dataset::new(args.nobs), PrintSink::Stdout);
    ctx.settings.warnings = !args.quiet;

    match run_with_context(&mut ctx, &script) {
        Ok(result) => {
            if args.pipe_mode
               && let Some(v) = result
            {
                println!("{}", render(None, &v, &ctx.dataset));
            }
            ExitCode::SUCCESS
        },
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        },
    }
}
