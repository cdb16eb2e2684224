use anyhow::Context;
use clap::Parser;
use proj2md::{
    Config, DEFAULT_OUTPUT_FILE_NAME, ExtensionRegistry, Pipeline, REGISTRY_FILE_NAME,
};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    name = "proj2md",
    version,
    author,
    about = "Render a project's directory tree and source files into one Markdown document",
    long_about = "Walks a project directory, draws its tree and appends the contents of every \
    file whose extension is listed in the extension registry, producing \
    project_document.md in the project root.\n\n\
    The registry is a single line of rules such as '*.py(python),*.md(markdown)', read from \
    searching_files.txt next to the executable unless --config is given.\n\n\
    USAGE EXAMPLES:\n  \
      # Document a project\n  \
      proj2md --proj-path ./my-project\n\n  \
      # Include dotfiles and dot-directories\n  \
      proj2md --proj-path ./my-project --include-hidden\n\n  \
      # Print to stdout with a custom registry\n  \
      proj2md -p ./my-project --config ./rules.txt --dry-run"
)]
struct Cli {
    /// Project root directory to document
    #[arg(
        short,
        long = "proj-path",
        alias = "proj_path",
        value_name = "PATH",
        required_unless_present = "list_extensions"
    )]
    proj_path: Option<PathBuf>,

    /// Include hidden files and directories (ignored by default)
    #[arg(long, alias = "include_hidden")]
    include_hidden: bool,

    /// Extension registry file (defaults to searching_files.txt next to the executable)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Name of the generated document inside the project root
    #[arg(short, long, default_value = DEFAULT_OUTPUT_FILE_NAME, value_name = "NAME")]
    output: String,

    /// Glob (relative to the project root) to leave out; can be repeated
    ///
    /// Example: proj2md -p . --exclude target --exclude "**/node_modules"
    #[arg(short, long, value_name = "GLOB")]
    exclude: Vec<String>,

    /// Registered files larger than this many bytes are marked unreadable
    #[arg(long, default_value_t = 10 * 1024 * 1024, value_name = "BYTES")]
    max_file_size: u64,

    /// Follow symbolic links
    #[arg(long)]
    follow_links: bool,

    /// Print the document to stdout instead of writing it
    #[arg(long)]
    dry_run: bool,

    /// Keep a timestamped copy of an existing document before replacing it
    #[arg(long)]
    backup: bool,

    /// Print the loaded extension registry and exit
    #[arg(long)]
    list_extensions: bool,

    /// Print run statistics as JSON instead of the summary table
    #[arg(long, conflicts_with = "dry_run")]
    json: bool,

    /// Only print warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_tracing(cli.quiet, cli.verbose);

    let registry = load_registry(cli.config.as_deref())?;

    if cli.list_extensions {
        for (ext, tag) in registry.iter() {
            println!("*.{ext}({tag})");
        }
        return Ok(());
    }

    let proj_path = cli.proj_path.context("--proj-path is required")?;

    let config = Config::builder()
        .root_dir(proj_path)
        .include_hidden(cli.include_hidden)
        .registry(registry)
        .output_file_name(cli.output)
        .exclude_patterns(cli.exclude)
        .max_file_size(cli.max_file_size)
        .follow_links(cli.follow_links)
        .dry_run(cli.dry_run)
        .backup_existing(cli.backup)
        .build()
        .context("Failed to build configuration")?;

    let (stats, markdown) = Pipeline::new(config)
        .context("Failed to create pipeline")?
        .run_with_output()
        .context("Pipeline execution failed")?;

    if cli.dry_run {
        print!("{markdown}");
    }

    if cli.json {
        println!("{}", stats.to_json()?);
    } else if !cli.quiet && !cli.dry_run {
        stats.print_summary();
    }

    Ok(())
}

/// Loads the registry from `--config`, the co-located file, or the built-in rules.
fn load_registry(explicit: Option<&Path>) -> anyhow::Result<ExtensionRegistry> {
    let exe = std::env::current_exe().ok();
    let exe_dir = exe.as_deref().and_then(Path::parent);
    if let Some(dir) = exe_dir {
        debug!("Looking for {} in {}", REGISTRY_FILE_NAME, dir.display());
    }

    ExtensionRegistry::resolve(explicit, exe_dir).context("Failed to load extension registry")
}

fn setup_tracing(quiet: bool, verbosity: u8) {
    let default = match (quiet, verbosity) {
        (true, _) => "proj2md=warn",
        (false, 0) => "proj2md=info",
        (false, 1) => "proj2md=debug",
        (false, _) => "proj2md=trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(default))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_json_conflicts_with_dry_run() {
        let err = Cli::try_parse_from(["proj2md", "-p", ".", "--dry-run", "--json"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);

        assert!(Cli::try_parse_from(["proj2md", "-p", ".", "--json"]).is_ok());
        assert!(Cli::try_parse_from(["proj2md", "-p", ".", "--dry-run"]).is_ok());
    }

    #[test]
    fn test_proj_path_required_unless_listing() {
        assert!(Cli::try_parse_from(["proj2md"]).is_err());

        let cli = Cli::try_parse_from(["proj2md", "--list-extensions"]).unwrap();
        assert!(cli.proj_path.is_none());

        let cli = Cli::try_parse_from(["proj2md", "--proj_path", "src", "--include_hidden"]).unwrap();
        assert_eq!(cli.proj_path, Some(PathBuf::from("src")));
        assert!(cli.include_hidden);
    }
}
