use crate::config::{Config, LoggingConfig};
use crate::error::{Error, Result};
use crate::search::SearchRequest;
use crate::server::{self, AppState};
use clap::CommandFactory;
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;

/// Run the web server until interrupted.
pub async fn serve(config: Config) -> Result<()> {
    info!(
        "Using feed endpoint {} (cache TTL {}s)",
        config.search.endpoint, config.search.cache_ttl
    );
    server::serve(&config).await
}

/// Run a single, token-valid submission through the handler and print the fragment.
pub async fn search(config: &Config, query: String) -> Result<()> {
    let state = AppState::from_config(config)?;
    let session = uuid::Uuid::new_v4().to_string();
    let token = state.handler.verifier().issue(&session);

    let request = SearchRequest::submit(session, query, Some(token));
    let fragment = state.handler.handle(&request).await;
    println!("{}", fragment);
    Ok(())
}

/// Write a default configuration file.
pub fn init(config_path: Option<PathBuf>, force: bool) -> Result<()> {
    let path = match config_path {
        Some(path) => path,
        None => Config::config_file()?,
    };

    if path.exists() && !force {
        return Err(Error::Config(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }

    Config::default().save(&path)?;
    println!("✅ Wrote default configuration to {}", path.display());
    Ok(())
}

pub fn generate_completions(shell: Shell) {
    let mut cmd = crate::cli::Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
}

/// Initialize logging from config, with `--debug`/`--verbose` taking precedence.
///
/// The returned guard flushes the file writer and must be held until exit.
pub fn init_logging(debug: bool, verbose: bool, logging: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if debug {
        EnvFilter::new("debug")
    } else if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&logging.level))
            .map_err(|e| Error::Config(format!("Invalid log level {:?}: {}", logging.level, e)))?
    };

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_file(debug)
        .with_line_number(debug);

    let (result, guard) = if logging.log_to_file {
        let path = PathBuf::from(&logging.log_file);
        let directory = path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let file_name = path
            .file_name()
            .ok_or_else(|| Error::Config(format!("Invalid log file {:?}", logging.log_file)))?;
        std::fs::create_dir_all(&directory)?;

        let appender = tracing_appender::rolling::never(&directory, file_name);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let builder = builder.with_writer(writer).with_ansi(false);
        let result = if logging.json_format {
            builder.json().try_init()
        } else {
            builder.try_init()
        };
        (result, Some(guard))
    } else {
        let builder = builder.with_writer(io::stderr);
        let result = if logging.json_format {
            builder.json().try_init()
        } else {
            builder.try_init()
        };
        (result, None)
    };

    result.map_err(|e| Error::Config(format!("Failed to initialize logging: {}", e)))?;
    debug!("Logging initialized");
    Ok(guard)
}
