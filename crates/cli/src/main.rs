//! winsvc-exporter: export Windows service inventory as Prometheus metrics
//!
//! Usage:
//!   winsvc-exporter                                  # One pass via the SCM API
//!   winsvc-exporter --use-wmi --services-where "StartMode='Auto'"
//!   winsvc-exporter --output C:\textfile\services.prom --watch
//!
//! Output formats:
//!   --format text   Prometheus text exposition (default)
//!   --format json   JSON snapshot

use clap::{Parser, ValueEnum};
use owo_colors::{OwoColorize, Style};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use winsvc_core::{render, CollectorConfig, MetricRow, PassSummary};

/// Exit codes for scripting
mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const ERROR_GENERAL: i32 = 1;
    pub const ERROR_INVALID_INPUT: i32 = 4;
}

/// Configuration file support
mod config {
    use super::OutputFormat;
    use serde::Deserialize;
    use std::fs;
    use std::path::{Path, PathBuf};
    use winsvc_core::CollectorConfig;

    /// User configuration from ~/.winsvc-exporter/config.toml
    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    pub struct Config {
        /// Collector settings
        pub collector: CollectorConfig,
        /// Default output settings
        pub output: OutputConfig,
    }

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    pub struct OutputConfig {
        /// Output format used when --format is not given
        pub format: Option<OutputFormat>,
        /// Disable colored diagnostics by default
        pub no_color: bool,
    }

    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".winsvc-exporter").join("config.toml"))
    }

    pub fn parse_config(content: &str) -> Result<Config, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Load configuration from `path`, or the default location
    ///
    /// A missing default file is not an error; an explicitly named file must
    /// exist and parse.
    pub fn load_config(path: Option<&Path>) -> Result<Config, String> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match config_path() {
                Some(p) => (p, false),
                None => return Ok(Config::default()),
            },
        };

        if !path.exists() {
            if explicit {
                return Err(format!("Config file not found: {}", path.display()));
            }
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        parse_config(&content).map_err(|e| format!("Failed to parse {}: {}", path.display(), e))
    }

    /// Generate a sample config file content
    pub fn sample_config() -> &'static str {
        r#"# winsvc-exporter configuration file
# Place this file at ~/.winsvc-exporter/config.toml

[collector]
# WQL 'where' clause used by the WMI backend, e.g. "StartMode='Auto'".
# Ignored when use_live_api is true.
filter = ""
# Query the Service Control Manager API instead of WMI
use_live_api = true

[output]
# "text" (Prometheus exposition) or "json"
format = "text"
# Disable colored diagnostics
no_color = false
"#
    }

}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
enum OutputFormat {
    /// Prometheus text exposition format
    Text,
    /// JSON snapshot
    Json,
}

/// Windows service metrics exporter
///
/// Collects the state, start mode and status of every Windows service and
/// prints them as Prometheus metrics.
#[derive(Parser, Debug)]
#[command(name = "winsvc-exporter")]
#[command(version, about, long_about = None)]
#[command(after_help = "Examples:
  winsvc-exporter                                   One pass via the SCM API
  winsvc-exporter --use-wmi --services-where \"Name='WinRM'\"
  winsvc-exporter -o services.prom --watch          Refresh a textfile every 15s")]
struct Cli {
    /// WQL 'where' clause for the WMI backend. Limits the response to the
    /// services you specify and reduces the size of the response.
    #[arg(long, visible_alias = "collector.service.services-where", value_name = "WQL")]
    services_where: Option<String>,

    /// Collect through WMI instead of the Service Control Manager API
    #[arg(long, conflicts_with = "use_api")]
    use_wmi: bool,

    /// Collect through the Service Control Manager API (the default)
    #[arg(long)]
    use_api: bool,

    /// Output format
    #[arg(long, short = 'f', value_enum, value_name = "FORMAT")]
    format: Option<OutputFormat>,

    /// Write output to a file (replaced atomically) instead of stdout
    #[arg(long, short = 'o', value_name = "FILE")]
    output: Option<PathBuf>,

    /// Repeat the collection pass until interrupted
    #[arg(long, short = 'w')]
    watch: bool,

    /// Seconds between passes in watch mode
    #[arg(long, default_value = "15", value_name = "SECONDS")]
    interval: u64,

    /// Read configuration from this file instead of ~/.winsvc-exporter/config.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Generate a sample config file at ~/.winsvc-exporter/config.toml
    #[arg(long)]
    init_config: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Color configuration for diagnostics
struct Colors {
    success: Style,
    warning: Style,
    error: Style,
}

impl Colors {
    fn new(enabled: bool) -> Self {
        if enabled {
            Self {
                success: Style::new().green(),
                warning: Style::new().yellow(),
                error: Style::new().red().bold(),
            }
        } else {
            Self {
                success: Style::new(),
                warning: Style::new(),
                error: Style::new(),
            }
        }
    }
}

/// Settings resolved from the config file and the command line
#[derive(Debug)]
#[cfg_attr(not(windows), allow(dead_code))]
struct Settings {
    collector: CollectorConfig,
    format: OutputFormat,
    no_color: bool,
}

/// Apply config defaults (CLI flags override config)
fn resolve_settings(cli: &Cli, cfg: config::Config) -> Settings {
    let mut collector = cfg.collector;
    if let Some(filter) = &cli.services_where {
        collector.filter = filter.clone();
    }
    if cli.use_wmi {
        collector.use_live_api = false;
    }
    if cli.use_api {
        collector.use_live_api = true;
    }

    Settings {
        collector,
        format: cli.format.or(cfg.output.format).unwrap_or(OutputFormat::Text),
        no_color: cli.no_color || cfg.output.no_color,
    }
}

fn init_logging(verbose: u8) {
    use tracing_subscriber::EnvFilter;

    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "winsvc_exporter={level},winsvc_core={level},winsvc_platform_windows={level}"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let early_colors = Colors::new(!cli.no_color && supports_color());

    if cli.init_config {
        handle_init_config(&early_colors);
        return;
    }

    let cfg = match config::load_config(cli.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            print_error(&early_colors, &e);
            std::process::exit(exit_codes::ERROR_INVALID_INPUT);
        }
    };

    let settings = resolve_settings(&cli, cfg);
    let colors = Colors::new(!settings.no_color && supports_color());

    if cli.watch && cli.interval == 0 {
        print_error(&colors, "--interval must be at least 1 second");
        std::process::exit(exit_codes::ERROR_INVALID_INPUT);
    }

    let code = run(&cli, &settings, &colors);
    std::process::exit(code);
}

#[cfg(windows)]
fn run(cli: &Cli, settings: &Settings, colors: &Colors) -> i32 {
    use std::time::Duration;

    let collector = winsvc_platform_windows::service_collector(&settings.collector);

    loop {
        let outcome = collect_once(&collector, settings.format)
            .and_then(|(text, summary)| {
                write_output(cli.output.as_deref(), &text)?;
                Ok(summary)
            });

        match outcome {
            Ok(summary) => {
                tracing::info!(
                    backend = %summary.backend,
                    services = summary.services,
                    skipped = summary.skipped,
                    "collected service metrics"
                );
                if summary.skipped > 0 {
                    let message = format!(
                        "{} service(s) could not be queried and were skipped",
                        summary.skipped
                    );
                    print_warning(colors, &message);
                }
                if !cli.watch {
                    if let Some(path) = &cli.output {
                        eprintln!(
                            "{} Wrote {} rows for {} services to {}",
                            "success:".style(colors.success),
                            summary.rows,
                            summary.services,
                            path.display()
                        );
                    }
                    return exit_codes::SUCCESS;
                }
            }
            Err(e) => {
                print_error(colors, &e);
                if !cli.watch {
                    return exit_codes::ERROR_GENERAL;
                }
            }
        }

        std::thread::sleep(Duration::from_secs(cli.interval));
    }
}

#[cfg(windows)]
fn collect_once(
    collector: &winsvc_platform_windows::WindowsServiceCollector,
    format: OutputFormat,
) -> Result<(String, PassSummary), String> {
    let (rows, summary) = collector.collect_rows().map_err(|e| e.to_string())?;
    let text = render_rows(&rows, &summary, format)?;
    Ok((text, summary))
}

// Stub for non-Windows platforms
#[cfg(not(windows))]
fn run(_cli: &Cli, _settings: &Settings, colors: &Colors) -> i32 {
    print_error(colors, "This tool only works on Windows");
    exit_codes::ERROR_GENERAL
}

#[cfg_attr(not(windows), allow(dead_code))]
fn render_rows(
    rows: &[MetricRow],
    summary: &PassSummary,
    format: OutputFormat,
) -> Result<String, String> {
    match format {
        OutputFormat::Text => render::render_exposition(rows)
            .map_err(|e| format!("Failed to encode metrics: {}", e)),
        OutputFormat::Json => {
            let snapshot = render::Snapshot::now(rows, summary);
            render::render_json_string(&snapshot)
                .map(|mut s| {
                    s.push('\n');
                    s
                })
                .map_err(|e| format!("Failed to serialize snapshot: {}", e))
        }
    }
}

/// Write to stdout, or replace `path` via a temporary file in the same
/// directory so readers never see a partial file
#[cfg_attr(not(windows), allow(dead_code))]
fn write_output(path: Option<&Path>, text: &str) -> Result<(), String> {
    use std::fs;

    let Some(path) = path else {
        let mut stdout = io::stdout().lock();
        return stdout
            .write_all(text.as_bytes())
            .and_then(|_| stdout.flush())
            .map_err(|e| format!("Failed to write output: {}", e));
    };

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, text).map_err(|e| format!("Failed to write {}: {}", tmp.display(), e))?;
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        format!("Failed to replace {}: {}", path.display(), e)
    })
}

/// Write the sample config to the default location, refusing to overwrite
fn handle_init_config(colors: &Colors) {
    use std::fs;

    let Some(path) = config::config_path() else {
        print_error(colors, "Could not determine home directory");
        std::process::exit(exit_codes::ERROR_GENERAL);
    };

    if path.exists() {
        print_warning(colors, &format!("{} already exists, leaving it untouched", path.display()));
        std::process::exit(exit_codes::SUCCESS);
    }

    let written = path
        .parent()
        .map_or(Ok(()), fs::create_dir_all)
        .and_then(|_| fs::write(&path, config::sample_config()));

    if let Err(e) = written {
        print_error(colors, &format!("Failed to write {}: {}", path.display(), e));
        std::process::exit(exit_codes::ERROR_GENERAL);
    }

    eprintln!(
        "{} Wrote sample config to {}",
        "success:".style(colors.success),
        path.display()
    );
}

/// Print an error message
fn print_error(colors: &Colors, message: &str) {
    eprintln!("{} {}", "error:".style(colors.error), message);
}

/// Print a warning message
fn print_warning(colors: &Colors, message: &str) {
    eprintln!("{} {}", "warning:".style(colors.warning), message);
}

/// Whether diagnostics on stderr should be colored
fn supports_color() -> bool {
    use std::io::IsTerminal;

    let disabled = std::env::var_os("NO_COLOR").is_some()
        || std::env::var("TERM").is_ok_and(|term| term == "dumb");
    if disabled || !io::stderr().is_terminal() {
        return false;
    }

    #[cfg(windows)]
    {
        enable_vt_mode()
    }
    #[cfg(not(windows))]
    {
        true
    }
}

/// Turn on ANSI escape handling for the stderr console
#[cfg(windows)]
fn enable_vt_mode() -> bool {
    use std::os::windows::io::AsRawHandle;
    use windows::Win32::Foundation::HANDLE;
    use windows::Win32::System::Console::{
        GetConsoleMode, SetConsoleMode, CONSOLE_MODE, ENABLE_VIRTUAL_TERMINAL_PROCESSING,
    };

    let handle = HANDLE(io::stderr().as_raw_handle() as _);
    let mut mode = CONSOLE_MODE::default();
    unsafe {
        GetConsoleMode(handle, &mut mode).is_ok()
            && SetConsoleMode(handle, mode | ENABLE_VIRTUAL_TERMINAL_PROCESSING).is_ok()
    }
}
