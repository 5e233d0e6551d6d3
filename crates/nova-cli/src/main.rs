use anyhow::Result;
use clap::{Args, Parser, Subcommand};

mod commands;
mod config;
mod output;

use commands::Session;

/// Nova Physics build tool.
///
/// Compiles the Nova Physics C library with GCC or MSVC, keeps builds
/// incremental, fetches the SDL2 packages the example demos need and runs
/// the demos, benchmarks and test suite.
///
/// EXAMPLES:
///     nova build                   Build the static library
///     nova build -g -j 4           Debug build with 4 compiler processes
///     nova examples                Build and run the example demos
///     nova bench boxes             Build and run benchmarks/boxes.c
///     nova tests --no-simd         Run the test suite without SIMD
///     nova deps --force-deps       Download every dependency again
///
/// ENVIRONMENT VARIABLES:
///     NOVA_TARGET       Preferred compiler (gcc or msvc)
///     NOVA_JOBS         Default number of compiler processes
///     NOVA_OPT_LEVEL    Default optimization level (1-3)
///     NOVA_LOG          Tracing filter, e.g. 'nova_build=debug'
///     NO_COLOR          Set to disable colored output
#[derive(Parser)]
#[command(name = "nova")]
#[command(version)]
#[command(propagate_version = true)]
#[command(after_help = "For more information, see: https://github.com/kadir014/nova-physics")]
struct Cli {
    #[command(flatten)]
    flags: BuildFlags,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command
#[derive(Args, Debug, Clone, Default)]
struct BuildFlags {
    /// Compiler to use instead of auto-detection
    #[arg(long, global = true, value_parser = ["gcc", "msvc"])]
    target: Option<String>,

    /// Optimization level
    #[arg(short = 'O', long, global = true, value_parser = clap::value_parser!(u8).range(1..=3))]
    opt_level: Option<u8>,

    /// Debug build (debug info instead of optimization)
    #[arg(short = 'g', long, global = true)]
    debug: bool,

    /// Enable compiler warnings
    #[arg(short = 'w', long, global = true)]
    warnings: bool,

    /// Number of parallel compiler processes (default: CPU count)
    #[arg(short = 'j', long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    jobs: Option<u64>,

    /// Delete and download all dependencies again
    #[arg(long, global = true)]
    force_deps: bool,

    /// Clear the build cache before building
    #[arg(long, global = true)]
    clear: bool,

    /// Print every compiler command
    #[arg(short = 'v', long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Errors only
    #[arg(short = 'q', long, global = true)]
    quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Use single precision floats (NV_FLOAT)
    #[arg(short = 'f', long, global = true)]
    float: bool,

    /// Build with the Tracy profiler client
    #[arg(long, global = true)]
    enable_tracy: bool,

    /// Disable the built-in profiler (NV_PROFILE)
    #[arg(long, global = true)]
    no_profiler: bool,

    /// Disable SIMD code paths and native codegen
    #[arg(long, global = true)]
    no_simd: bool,

    /// Produce 32-bit output
    #[arg(long, global = true)]
    m32: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the Nova Physics static library
    ///
    /// Compiles every source in src/ and archives the objects into a static
    /// library in the build directory. Unchanged sources are not recompiled.
    ///
    /// EXAMPLES:
    ///     nova build                   Optimized build (-O3)
    ///     nova build -O 1 -w           Low optimization with warnings
    ///     nova build --clear           Rebuild from scratch
    #[command(visible_alias = "b")]
    Build,

    /// Build and run the example demos
    ///
    /// Downloads SDL2 and SDL2_ttf when they are missing, links the demos
    /// against them and runs the result from the build directory.
    ///
    /// EXAMPLES:
    ///     nova examples                Build and run the demos
    ///     nova example -g              Debug build of the demos
    #[command(visible_alias = "example")]
    Examples,

    /// Build and run a benchmark
    ///
    /// EXAMPLES:
    ///     nova bench boxes             Run benchmarks/boxes.c
    ///     nova bench pyramid.c         The extension is optional
    Bench {
        /// Benchmark name in the benchmarks directory
        name: String,
    },

    /// Build and run the test suite
    ///
    /// EXAMPLES:
    ///     nova tests                   Run tests/tests.c
    ///     nova tests -f                Run with single precision floats
    #[command(visible_alias = "test")]
    Tests,

    /// Check and download dependencies only
    ///
    /// EXAMPLES:
    ///     nova deps                    Download missing dependencies
    ///     nova deps --force-deps       Download everything again
    Deps,
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            output::print_failure(&e);
            1
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> Result<i32> {
    let session = Session::open(&cli.flags)?;

    match cli.command {
        Commands::Build => commands::build::run(&session),
        Commands::Examples => commands::examples::run(&session),
        Commands::Bench { name } => commands::bench::run(&session, &name),
        Commands::Tests => commands::tests::run(&session),
        Commands::Deps => commands::deps::run(&session),
    }
}

/// Install a stderr tracing subscriber when `NOVA_LOG` or `RUST_LOG` is set
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = match EnvFilter::try_from_env("NOVA_LOG") {
        Ok(filter) => filter,
        Err(_) if std::env::var_os("RUST_LOG").is_some() => EnvFilter::from_default_env(),
        Err(_) => return,
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true),
        )
        .with(filter)
        .init();
}
