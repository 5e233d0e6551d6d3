//! Nova Physics build system infrastructure
//!
//! Provides build orchestration for the Nova Physics C library including:
//! - Host platform detection
//! - Incremental builds (mtime cache + configuration fingerprint)
//! - GCC and MSVC backends behind one interface
//! - Parallel compilation across worker processes
//! - Running built programs and classifying crashes

pub mod builder;
pub mod cache;
pub mod error;
pub mod fingerprint;
pub mod options;
pub mod platform;
pub mod run;
pub mod scheduler;
pub mod source;
pub mod targets;
pub mod toolchain;

// Re-export main types
pub use builder::{BuildConfig, BuildOutcome, BuildRequest, BuildTimings, Builder};
pub use cache::{BuildCache, CacheQuery};
pub use error::{BuildError, BuildResult};
pub use fingerprint::{BuildFingerprint, Flow};
pub use options::{CompileOptions, FeatureToggles, LinkOptions, OptLevel, TRACY_LIBRARIES};
pub use platform::{Os, PlatformInfo};
pub use run::{classify_exit, exit_code_of, run_artifact, ExitClass, CRASH_CODES};
pub use scheduler::{
    collect_objects, CompilationJob, JobScheduler, PartitionStrategy, RoundRobin, ScheduleReport,
};
pub use source::{discover_sources, SourceFile, SOURCE_EXTENSIONS};
pub use targets::ArtifactKind;
pub use toolchain::{
    discover, BackendKind, CompilerBackend, CompilerCommand, GccBackend, MsvcBackend,
    ToolchainInfo, ToolchainSearch,
};
