use std::path::Path;

use miette::{miette, Context, IntoDiagnostic, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};


/// Keeps the non-blocking log file writer alive. Dropping it flushes the
/// remaining log lines, so hold on to it until the program exits.
pub struct TracingGuard {
    _file_writer_guard: Option<WorkerGuard>,
}


/// Parses a level filter directive, e.g. `info` or `pathtree=debug,warn`.
pub fn parse_level_filter(directive: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(directive)
        .into_diagnostic()
        .wrap_err_with(|| miette!("Invalid log level filter: {directive}"))
}


/// Installs the global tracing subscriber: a console layer on stderr and,
/// if `log_file_output` is given, a file layer writing
/// the log file into its directory (which is created if missing).
pub fn initialize_tracing(
    console_level_filter: EnvFilter,
    log_file_output: Option<(EnvFilter, &Path, &str)>,
) -> Result<TracingGuard> {
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(console_level_filter);

    let Some((file_level_filter, log_file_output_directory, log_file_name)) = log_file_output
    else {
        tracing_subscriber::registry()
            .with(console_layer)
            .try_init()
            .into_diagnostic()
            .wrap_err("Failed to initialize tracing subscriber.")?;

        return Ok(TracingGuard {
            _file_writer_guard: None,
        });
    };


    std::fs::create_dir_all(log_file_output_directory)
        .into_diagnostic()
        .wrap_err_with(|| {
            miette!(
                "Failed to create missing log file output directory at {}.",
                log_file_output_directory.display()
            )
        })?;

    let file_appender = tracing_appender::rolling::never(log_file_output_directory, log_file_name);
    let (non_blocking_file_writer, file_writer_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file_writer)
        .with_ansi(false)
        .with_filter(file_level_filter);

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .into_diagnostic()
        .wrap_err("Failed to initialize tracing subscriber.")?;


    Ok(TracingGuard {
        _file_writer_guard: Some(file_writer_guard),
    })
}
