use crate::{
    config::Config,
    document::MarkdownRenderer,
    error::Result,
    scanner::{ScanStats, Scanner},
    writer::Writer,
};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};

/// Statistics collected during pipeline execution.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineStats {
    /// Project name shown in the document title
    pub project_name: String,

    /// Directories listed in the tree
    pub directories: usize,

    /// Files listed in the tree
    pub files: usize,

    /// Files with a content section
    pub collected_files: usize,

    /// Collected files marked unreadable
    pub unreadable_files: usize,

    /// Subdirectories that could not be listed
    pub walk_errors: usize,

    /// Bytes of file content embedded in the document
    pub content_bytes: u64,

    /// Size of the rendered document in bytes
    pub document_bytes: usize,

    /// Total execution time
    pub duration: Duration,

    /// Time spent scanning
    pub scan_duration: Duration,

    /// Time spent rendering
    pub render_duration: Duration,

    /// Time spent writing
    pub write_duration: Duration,

    /// Path of the document, `None` for dry runs
    pub output_path: Option<String>,

    /// Local time the run finished
    pub generated_at: String,
}

impl PipelineStats {
    /// Prints a human-readable summary to stdout.
    pub fn print_summary(&self) {
        println!("\n╔═══════════════════════════════════════════════════════╗");
        println!("║              proj2md Execution Summary                ║");
        println!("╠═══════════════════════════════════════════════════════╣");
        println!("║ Project:              {:<32}║", self.project_name);
        println!("║ Directories:          {:>8}                        ║", self.directories);
        println!("║ Files:                {:>8}                        ║", self.files);
        println!("║   - Collected:        {:>8}                        ║", self.collected_files);
        println!("║   - Unreadable:       {:>8}                        ║", self.unreadable_files);
        println!("║ Walk errors:          {:>8}                        ║", self.walk_errors);
        println!("║ Content bytes:        {:>8}                        ║", self.content_bytes);
        println!("║ Document bytes:       {:>8}                        ║", self.document_bytes);
        println!("║                                                       ║");
        println!("║ Timing Breakdown:                                     ║");
        println!(
            "║   - Scanning:         {:>8.2}s                     ║",
            self.scan_duration.as_secs_f64()
        );
        println!(
            "║   - Rendering:        {:>8.2}s                     ║",
            self.render_duration.as_secs_f64()
        );
        println!(
            "║   - Writing:          {:>8.2}s                     ║",
            self.write_duration.as_secs_f64()
        );
        println!(
            "║   - Total:            {:>8.2}s                     ║",
            self.duration.as_secs_f64()
        );
        println!("╚═══════════════════════════════════════════════════════╝");
        match &self.output_path {
            Some(path) => println!("Markdown document written to '{path}'.\n"),
            None => println!("Dry run: no file written.\n"),
        }
    }

    /// Serializes the statistics as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Orchestrates scan, render and write for one project.
pub struct Pipeline {
    config: Config,
    scanner: Scanner,
    renderer: MarkdownRenderer,
    writer: Writer,
}

impl Pipeline {
    /// Creates a new pipeline with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration validation fails
    /// - An exclusion pattern is invalid
    /// - The document template fails to load
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let scanner = Scanner::new(&config)?;
        let renderer = MarkdownRenderer::new()?;
        let writer = Writer::new(&config);

        Ok(Self {
            config,
            scanner,
            renderer,
            writer,
        })
    }

    /// Runs the pipeline, writing the document into the project root.
    ///
    /// # Errors
    ///
    /// Returns an error if the root cannot be walked, rendering fails or
    /// the document cannot be written. Per-file read failures are not
    /// errors; they appear as unreadable sections.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use proj2md::{Config, Pipeline};
    ///
    /// # fn main() -> anyhow::Result<()> {
    /// let config = Config::builder().root_dir("./my-project").build()?;
    /// let stats = Pipeline::new(config)?.run()?;
    /// stats.print_summary();
    /// # Ok(())
    /// # }
    /// ```
    pub fn run(self) -> Result<PipelineStats> {
        self.execute().map(|(stats, _)| stats)
    }

    /// Runs the pipeline and also returns the rendered Markdown.
    ///
    /// # Errors
    ///
    /// Same as [`Pipeline::run`].
    pub fn run_with_output(self) -> Result<(PipelineStats, String)> {
        self.execute()
    }

    #[instrument(skip(self), fields(root_dir = %self.config.root_dir.display()))]
    fn execute(self) -> Result<(PipelineStats, String)> {
        let start_time = Instant::now();

        info!("Stage 1/3: Scanning project...");
        let scan_start = Instant::now();
        let outcome = self.scanner.scan()?;
        let scan_duration = scan_start.elapsed();

        info!(
            "✓ Listed {} directories and {} files, collected {} in {:.2}s",
            outcome.stats.directories,
            outcome.stats.files,
            outcome.stats.collected,
            scan_duration.as_secs_f64()
        );

        if outcome.stats.unreadable > 0 {
            warn!(
                "{} collected file(s) could not be read and are marked in the document",
                outcome.stats.unreadable
            );
        }

        info!("Stage 2/3: Rendering Markdown...");
        let render_start = Instant::now();
        let markdown = self.renderer.render(&outcome.document)?;
        let render_duration = render_start.elapsed();

        let write_start = Instant::now();
        let output_path = if self.config.dry_run {
            warn!("Dry run mode enabled - skipping file write");
            None
        } else {
            info!("Stage 3/3: Writing document...");
            self.writer.write(&markdown)?;
            Some(self.writer.output_path().display().to_string())
        };
        let write_duration = write_start.elapsed();

        let content_bytes = outcome.document.files.iter().map(|f| f.size_bytes()).sum();

        let stats = build_stats(
            &outcome.document.project_name,
            &outcome.stats,
            content_bytes,
            markdown.len(),
            Timings {
                total: start_time.elapsed(),
                scan: scan_duration,
                render: render_duration,
                write: write_duration,
            },
            output_path,
        );

        info!(
            "✓ Pipeline completed successfully in {:.2}s",
            stats.duration.as_secs_f64()
        );

        Ok((stats, markdown))
    }
}

struct Timings {
    total: Duration,
    scan: Duration,
    render: Duration,
    write: Duration,
}

fn build_stats(
    project_name: &str,
    scan: &ScanStats,
    content_bytes: u64,
    document_bytes: usize,
    timings: Timings,
    output_path: Option<String>,
) -> PipelineStats {
    PipelineStats {
        project_name: project_name.to_string(),
        directories: scan.directories,
        files: scan.files,
        collected_files: scan.collected,
        unreadable_files: scan.unreadable,
        walk_errors: scan.walk_errors,
        content_bytes,
        document_bytes,
        duration: timings.total,
        scan_duration: timings.scan,
        render_duration: timings.render,
        write_duration: timings.write,
        output_path,
        generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
    }
}
