use parking_lot::Mutex;
/// File-backed logging for stacknav
///
/// Every `log::info!()` / `log::warn!()` / ... call is routed to
/// `<temp_dir>/stacknav_debug.log` (`/tmp/stacknav_debug.log` on Unix).
/// Nothing is written to stdout, which carries JSON-RPC in server mode.
///
/// Level precedence: `--log-level` > `STACKNAV_LOG` > config `log_level` > off.
/// When `STACKNAV_LOG` is set the log is mirrored to stderr as well.
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::OnceLock;

use log::{LevelFilter, Log, Metadata, Record};

/// Environment variable that selects the log level and enables stderr mirroring.
pub const LOG_ENV_VAR: &str = "STACKNAV_LOG";

/// Path of the debug log file.
pub fn log_path() -> PathBuf {
    #[cfg(unix)]
    let path = PathBuf::from("/tmp/stacknav_debug.log");
    #[cfg(not(unix))]
    let path = std::env::temp_dir().join("stacknav_debug.log");
    path
}

struct DebugLogger {
    file: Option<std::fs::File>,
    mirror_stderr: bool,
}

impl DebugLogger {
    fn open(level: LevelFilter, mirror_stderr: bool) -> Self {
        let file = if level != LevelFilter::Off {
            match OpenOptions::new()
                .write(true)
                .truncate(true)
                .create(true)
                .open(log_path())
            {
                Ok(f) => Some(f),
                // Logging is best effort; an unwritable temp dir must not
                // stop the command.
                Err(_) => None,
            }
        } else {
            None
        };
        let mut logger = Self {
            file,
            mirror_stderr,
        };
        logger.write_raw(&format!(
            "\n{}\nstacknav debug session started at {} (level={level})\n{}\n",
            "=".repeat(80),
            get_timestamp(),
            "=".repeat(80)
        ));
        logger
    }

    fn write_raw(&mut self, msg: &str) {
        if let Some(ref mut file) = self.file {
            let _ = file.write_all(msg.as_bytes());
            let _ = file.flush();
        }
    }

    fn write_line(&mut self, line: &str) {
        self.write_raw(line);
        if self.mirror_stderr {
            let _ = std::io::stderr().write_all(line.as_bytes());
        }
    }
}

/// `log::Log` front end over the shared [`DebugLogger`].
struct LogBridge;

static LOGGER: OnceLock<Mutex<DebugLogger>> = OnceLock::new();
static BRIDGE: LogBridge = LogBridge;

impl Log for LogBridge {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if let Some(logger) = LOGGER.get() {
            let line = format_line(
                &get_timestamp(),
                record.level(),
                record.target(),
                &record.args().to_string(),
            );
            logger.lock().write_line(&line);
        }
    }

    fn flush(&self) {
        if let Some(logger) = LOGGER.get()
            && let Some(ref mut file) = logger.lock().file
        {
            let _ = file.flush();
        }
    }
}

fn get_timestamp() -> String {
    chrono::Local::now()
        .format("%Y-%m-%d %H:%M:%S%.6f")
        .to_string()
}

fn format_line(timestamp: &str, level: log::Level, target: &str, msg: &str) -> String {
    format!("[{timestamp}] [{level:<5}] [{target}] {msg}\n")
}

/// Parse a level name as used by `--log-level` and `STACKNAV_LOG`.
pub fn parse_level(value: &str) -> Option<LevelFilter> {
    value.trim().parse::<LevelFilter>().ok()
}

/// Pick the effective level from the CLI flag, the environment variable and
/// the config file, in that order.
pub fn effective_level(
    cli: Option<LevelFilter>,
    env: Option<&str>,
    config: LevelFilter,
) -> LevelFilter {
    cli.or_else(|| env.and_then(parse_level)).unwrap_or(config)
}

/// Install the logger. Safe to call more than once; later calls only adjust
/// the maximum level.
pub fn init_log_bridge(cli_level: Option<LevelFilter>, config_level: LevelFilter) {
    let env = std::env::var(LOG_ENV_VAR).ok();
    let level = effective_level(cli_level, env.as_deref(), config_level);
    let mirror_stderr = env.is_some();

    if LOGGER
        .set(Mutex::new(DebugLogger::open(level, mirror_stderr)))
        .is_ok()
    {
        // Fails only when another logger is already installed.
        let _ = log::set_logger(&BRIDGE);
    }
    log::set_max_level(level);
}
