use clap::Parser;
use miette::{miette, Context, IntoDiagnostic, Result};
use pathtree::{
    cli::CLIArgs,
    configuration::{ConfigValue, Configuration, PathIndicator, ResolutionOptions, ScalarValue},
    logging::{initialize_tracing, parse_level_filter},
};
use tracing::info;


pub const LOG_FILE_NAME: &str = "pathtree.log";
pub const LOG_FILE_LEVEL_FILTER: &str = "debug";


fn render_value(value: &ConfigValue) -> Result<String> {
    match value {
        ConfigValue::Location(location) => Ok(location.to_string()),
        ConfigValue::Scalar(ScalarValue::String(string)) => Ok(string.clone()),
        other => serde_yaml::to_string(other)
            .into_diagnostic()
            .wrap_err("Failed to serialize configuration value."),
    }
}


fn load_configuration(cli_args: &CLIArgs) -> Result<Configuration> {
    let mut options = match cli_args.options_file_path.as_ref() {
        Some(path) => ResolutionOptions::load_from_path(path)
            .wrap_err_with(|| miette!("Failed to load options file {}.", path.display()))?,
        None => ResolutionOptions::default(),
    };

    if cli_args.heuristic_path_keys {
        options = options.with_path_indicator(PathIndicator::heuristic());
    }


    match (
        cli_args.configuration_file_path.as_ref(),
        cli_args.project_root.as_ref(),
    ) {
        (Some(path), Some(project_root)) => {
            Configuration::load_from_path_with_project_root(path, project_root, options)
        }
        (Some(path), None) => Configuration::load_from_path_with_options(path, options),
        (None, project_root) => {
            let path = pathtree::configuration::get_default_configuration_file_path()?;

            match project_root {
                Some(project_root) => {
                    Configuration::load_from_path_with_project_root(path, project_root, options)
                }
                None => Configuration::load_from_path_with_options(path, options),
            }
        }
    }
}


fn main() -> Result<()> {
    let cli_args = CLIArgs::parse();

    let log_file_output = match cli_args.log_file_directory.as_ref() {
        Some(directory) => Some((
            parse_level_filter(LOG_FILE_LEVEL_FILTER)?,
            directory.as_path(),
            LOG_FILE_NAME,
        )),
        None => None,
    };

    let logging_raii_guard = initialize_tracing(
        parse_level_filter(&cli_args.console_log_level)?,
        log_file_output,
    )
    .wrap_err("Failed to initialize tracing.")?;


    let configuration =
        load_configuration(&cli_args).wrap_err("Failed to load configuration file.")?;

    info!(
        project_root = %configuration.project_root,
        "Configuration loaded."
    );


    if cli_args.ensure_output_directories {
        configuration
            .ensure_output_directories()
            .wrap_err("Failed to create output directories.")?;
    }

    let output = match cli_args.get.as_deref() {
        Some(dotted_key_path) => render_value(
            configuration
                .lookup(dotted_key_path)
                .wrap_err_with(|| miette!("Could not look up {dotted_key_path}."))?,
        )?,
        None => serde_yaml::to_string(&configuration.tree)
            .into_diagnostic()
            .wrap_err("Failed to serialize configuration.")?,
    };

    println!("{}", output.trim_end());


    drop(logging_raii_guard);
    Ok(())
}
