/*!
 * Command-line interface for dirdigest
 */

use std::io;
use std::sync::Arc;
use std::time::Instant;

use clap::{CommandFactory, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::ThreadPoolBuilder;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use dirdigest::attachment::apply_attachments;
use dirdigest::config::{Args, Config};
use dirdigest::report::{DigestReport, ReportFormat, Reporter};
use dirdigest::scanner::Scanner;
use dirdigest::settings::Settings;
use dirdigest::walker::enumerate_candidates;
use dirdigest::writer::write_output;

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("dirdigest={}", default_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() -> io::Result<()> {
    let args = Args::parse();

    if let Some(shell) = args.generate {
        let mut command = Args::command();
        let name = command.get_name().to_string();
        clap_complete::generate(shell, &mut command, name, &mut io::stdout());
        return Ok(());
    }

    init_tracing(args.verbose);

    let config = Config::from_args(args);
    config.validate()?;

    if let Err(e) = ThreadPoolBuilder::new()
        .num_threads(config.num_threads)
        .build_global()
    {
        warn!("Failed to set thread pool size: {}", e);
    }

    let settings = match &config.settings_path {
        Some(path) => Settings::load(path).unwrap_or_else(|e| {
            warn!("Ignoring unreadable settings {}: {}", path.display(), e);
            Settings::default()
        }),
        None => Settings::default(),
    };

    let progress = ProgressBar::new(0);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} {wide_msg:.dim.white} {pos}/{len} ({percent}%) ⏱️  {elapsed_precise}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    progress.enable_steady_tick(std::time::Duration::from_millis(100));
    progress.set_prefix("📊 Digest");
    progress.set_message(format!("📂 Scanning {}", config.target_dir.display()));

    let start_time = Instant::now();

    let scanner = Scanner::new(&config.target_dir, config.options)
        .sorted(config.sorted)
        .with_progress(Arc::new(progress.clone()));
    let root = scanner.root().to_path_buf();

    let allow_set = settings.allow_set(
        &root,
        enumerate_candidates(&root, config.options.include_hidden),
    );
    if let Some(allow) = &allow_set {
        info!("{} file(s) selected in {}", allow.len(), root.display());
    }

    let digest = scanner.with_allow_set(allow_set).build()?;

    let attachments = settings.active_attachments(&root);
    let text = apply_attachments(&digest.text, &attachments);

    progress.finish_and_clear();

    write_output(&text, config.output_file.as_deref())?;

    if config.report {
        let report = DigestReport {
            output: config
                .output_file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "stdout".to_string()),
            duration: start_time.elapsed(),
            included_count: digest.included_count,
            skipped_count: digest.skipped_count,
            attachment_count: attachments.len(),
            output_bytes: text.len(),
            files: digest.files,
        };
        Reporter::new(ReportFormat::ConsoleTable).print_report(&report);
    }

    Ok(())
}
