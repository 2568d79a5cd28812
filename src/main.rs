//! dirperm - audit directory permissions and export them as CSV.
//!
//! Usage:
//!   dirperm [ROOTS]...                 Scan roots and write the report
//!   dirperm /srv --depth children      Root and its immediate subdirectories
//!   dirperm /srv --files --combined    Include files, one Path column
//!   dirperm /srv --stdout              Print the report instead of saving it
//!   dirperm --help                     Show help

mod profile;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use color_eyre::eyre::{Context, Result};
use tracing::{Level, debug};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use dirperm_core::DEFAULT_MAX_ROWS;
use dirperm_run::{
    DepthPolicy, PathMode, ReportWriter, ScanCoordinator, ScanOptions, ScanResult,
};

use profile::Profile;

const DEFAULT_OUTPUT_DIR: &str = "DirectoryPermissionsChecker";

#[derive(Parser)]
#[command(
    name = "dirperm",
    version,
    about = "Audit directory permissions and export them as CSV",
    long_about = "dirperm walks one or more root directories, reads the owner and \
                  access rules of every visited node, and writes one CSV row per \
                  (node, rule) pair.\n\n\
                  Nodes that cannot be read are listed in a separate log file."
)]
struct Cli {
    /// Root directories to scan
    #[arg(value_name = "ROOT")]
    roots: Vec<PathBuf>,

    /// Skip this directory and everything below it (repeatable)
    #[arg(short = 'x', long = "exclude", value_name = "PATH")]
    exclude: Vec<PathBuf>,

    /// Leave rules for this user or group out of the report (repeatable)
    #[arg(short = 'i', long = "exclude-identity", value_name = "NAME")]
    exclude_identity: Vec<String>,

    /// How far to descend: all, children or current
    #[arg(short, long, value_name = "DEPTH")]
    depth: Option<DepthPolicy>,

    /// Also report files inside visited directories
    #[arg(short, long)]
    files: bool,

    /// Render the full path in a single column instead of one column per level
    #[arg(short, long)]
    combined: bool,

    /// Omit the leading row-number column
    #[arg(long)]
    no_row_numbers: bool,

    /// Maximum number of report rows
    #[arg(long, value_name = "N")]
    max_rows: Option<usize>,

    /// Directory to write the report and log into
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Print the report to stdout and failures to stderr instead of writing files
    #[arg(long, conflicts_with = "output")]
    stdout: bool,

    /// Profile with scan defaults (defaults to <config dir>/dirperm/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let profile = profile::load(cli.config.as_deref())?;
    let output_dir = cli
        .output
        .clone()
        .or_else(|| profile.output.clone())
        .unwrap_or_else(default_output_dir);
    let options = scan_options(&cli, profile)?;

    let coordinator = ScanCoordinator::new(&options)?;

    let cancel = coordinator.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Cancelling...");
            cancel.cancel();
        }
    });

    let mut progress_rx = coordinator.subscribe();
    let progress_task = tokio::spawn(async move {
        while let Ok(progress) = progress_rx.recv().await {
            debug!(
                nodes = progress.nodes_scanned,
                failures = progress.failures,
                per_second = progress.nodes_per_second(),
                current = %progress.current_path.display(),
                "scan progress"
            );
        }
    });

    let outcome = coordinator.run().await.wrap_err("Scan failed")?;
    progress_task.abort();

    let Some(result) = outcome.into_result() else {
        eprintln!("The operation was canceled.");
        return Ok(ExitCode::from(130));
    };

    if cli.stdout {
        print_result(&result);
    } else {
        let writer = ReportWriter::new(output_dir);
        let written = writer.write(&result).wrap_err_with(|| {
            format!(
                "Failed to save the report to {}",
                writer.output_dir().display()
            )
        })?;

        println!("Report: {}", written.report_path.display());
        if let Some(log_path) = written.log_path {
            println!("Log:    {} ({} failure(s))", log_path.display(), result.log.len());
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Route `tracing` output to stderr.
fn init_tracing(verbose: bool) {
    let filter = log_filter(verbose, std::env::var("RUST_LOG").ok().as_deref());
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}

/// A valid `RUST_LOG` is used as given; `--verbose` still adds DEBUG on top.
/// Without one the default is WARN, or DEBUG when verbose.
fn log_filter(verbose: bool, rust_log: Option<&str>) -> EnvFilter {
    let configured = rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok());
    match configured {
        Some(filter) if verbose => filter.add_directive(Level::DEBUG.into()),
        Some(filter) => filter,
        None if verbose => EnvFilter::new("debug"),
        None => EnvFilter::new("warn"),
    }
}

/// Merge the profile with command-line flags. Lists accumulate; scalars given
/// on the command line win.
fn scan_options(cli: &Cli, profile: Profile) -> Result<ScanOptions> {
    let mut roots = profile.roots;
    roots.extend(cli.roots.iter().cloned());

    let mut exclude_paths = profile.exclude;
    exclude_paths.extend(cli.exclude.iter().cloned());

    let mut exclude_identities = profile.exclude_identities;
    exclude_identities.extend(cli.exclude_identity.iter().cloned());

    let path_mode = if cli.combined {
        PathMode::Combined
    } else {
        profile.path_mode.unwrap_or_default()
    };

    ScanOptions::builder()
        .roots(roots)
        .exclude_paths(exclude_paths)
        .exclude_identities(exclude_identities)
        .depth(Some(cli.depth.or(profile.depth).unwrap_or(DepthPolicy::All)))
        .include_files(cli.files || profile.files.unwrap_or(false))
        .path_mode(path_mode)
        .include_row_numbers(!cli.no_row_numbers && profile.row_numbers.unwrap_or(true))
        .max_rows(cli.max_rows.or(profile.max_rows).unwrap_or(DEFAULT_MAX_ROWS))
        .build()
        .wrap_err("No root directory given")
}

fn default_output_dir() -> PathBuf {
    dirs::document_dir()
        .map(|dir| dir.join(DEFAULT_OUTPUT_DIR))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn print_result(result: &ScanResult) {
    print!("{}", result.report);
    for line in result.log_lines() {
        eprintln!("{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::level_filters::LevelFilter;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("dirperm").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let options = scan_options(&parse(&["/srv"]), Profile::default()).unwrap();

        assert_eq!(options.roots, vec![PathBuf::from("/srv")]);
        assert_eq!(options.depth, Some(DepthPolicy::All));
        assert!(!options.include_files);
        assert_eq!(options.path_mode, PathMode::Split);
        assert!(options.include_row_numbers);
        assert_eq!(options.max_rows, DEFAULT_MAX_ROWS);
    }

    #[test]
    fn test_flags() {
        let cli = parse(&[
            "/a",
            "/b",
            "-x",
            "/a/tmp",
            "--exclude-identity",
            "root",
            "--depth",
            "current",
            "--files",
            "--combined",
            "--no-row-numbers",
            "--max-rows",
            "10",
        ]);
        let options = scan_options(&cli, Profile::default()).unwrap();

        assert_eq!(options.roots.len(), 2);
        assert_eq!(options.exclude_paths, vec![PathBuf::from("/a/tmp")]);
        assert_eq!(options.exclude_identities, vec!["root".to_string()]);
        assert_eq!(options.depth, Some(DepthPolicy::Current));
        assert!(options.include_files);
        assert_eq!(options.path_mode, PathMode::Combined);
        assert!(!options.include_row_numbers);
        assert_eq!(options.max_rows, 10);
    }

    #[test]
    fn test_profile_merge() {
        let profile = Profile::from_toml(
            r#"
            roots = ["/profile"]
            exclude-identities = ["Everyone"]
            depth = "children"
            row-numbers = false
            "#,
        )
        .unwrap();
        let cli = parse(&["/cli", "-i", "root", "--depth", "all"]);

        let options = scan_options(&cli, profile).unwrap();
        assert_eq!(
            options.roots,
            vec![PathBuf::from("/profile"), PathBuf::from("/cli")]
        );
        assert_eq!(options.exclude_identities, vec!["Everyone", "root"]);
        assert_eq!(options.depth, Some(DepthPolicy::All));
        assert!(!options.include_row_numbers);
    }

    #[test]
    fn test_roots_are_required() {
        assert!(scan_options(&parse(&[]), Profile::default()).is_err());
    }

    #[test]
    fn test_bad_depth_is_rejected() {
        assert!(Cli::try_parse_from(["dirperm", "/srv", "--depth", "deep"]).is_err());
    }

    #[test]
    fn test_rust_log_is_not_overridden() {
        assert_eq!(
            log_filter(false, Some("info")).max_level_hint(),
            Some(LevelFilter::INFO)
        );
        assert_eq!(
            log_filter(true, Some("info")).max_level_hint(),
            Some(LevelFilter::DEBUG)
        );
    }

    #[test]
    fn test_default_log_level() {
        assert_eq!(log_filter(false, None).max_level_hint(), Some(LevelFilter::WARN));
        assert_eq!(log_filter(true, None).max_level_hint(), Some(LevelFilter::DEBUG));
        assert_eq!(log_filter(false, Some("")).max_level_hint(), Some(LevelFilter::WARN));
    }

    #[test]
    fn test_default_output_dir() {
        let dir = default_output_dir();
        match dirs::document_dir() {
            Some(documents) => assert_eq!(dir, documents.join("DirectoryPermissionsChecker")),
            None => assert_eq!(dir, PathBuf::from(".")),
        }
    }

    #[test]
    fn test_stdout_conflicts_with_output() {
        assert!(Cli::try_parse_from(["dirperm", "/srv", "--stdout", "-o", "/tmp"]).is_err());
    }
}
