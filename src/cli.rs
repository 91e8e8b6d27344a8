//! Command-line interface definitions for the `pathtree` binary.

use std::path::PathBuf;

use clap::Parser;



/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "pathtree",
    author,
    about = "Resolves a project's YAML configuration into absolute paths \
             and optionally creates its output directories.",
    version
)]
pub struct CLIArgs {
    /// This is the path to the configuration file to use.
    /// If unspecified, this defaults to `./config.yaml`.
    #[arg(
        short = 'c',
        long = "configuration-file-path",
        help = "Path to the configuration file to use. Defaults to ./config.yaml"
    )]
    pub configuration_file_path: Option<PathBuf>,

    #[arg(
        short = 'r',
        long = "project-root",
        help = "Directory relative locations are anchored to. \
                Defaults to the directory containing the configuration file."
    )]
    pub project_root: Option<PathBuf>,

    #[arg(
        long = "options-file-path",
        help = "TOML file with builder options (paths_key, anchor_key, \
                path_indicator, output_directory_targets)."
    )]
    pub options_file_path: Option<PathBuf>,

    #[arg(
        long = "heuristic-path-keys",
        help = "Also treat values outside the paths block as locations if their key \
                looks like a path (contains path, dir, root, working, ...)."
    )]
    pub heuristic_path_keys: bool,

    #[arg(
        short = 'g',
        long = "get",
        help = "Print only the value at this dotted key path, e.g. paths.results.plots."
    )]
    pub get: Option<String>,

    #[arg(
        long = "ensure-output-directories",
        help = "Create the configured output directories (by default `working` and \
                everything under `results`, except `root` entries)."
    )]
    pub ensure_output_directories: bool,

    #[arg(
        long = "console-log-level",
        default_value = "warn",
        help = "Level filter for console logging, e.g. info or pathtree=debug."
    )]
    pub console_log_level: String,

    #[arg(
        long = "log-file-directory",
        help = "If set, logs are also written (at debug level) to pathtree.log in this directory."
    )]
    pub log_file_directory: Option<PathBuf>,
}
