// Tracing setup for a host process.

use std::path::Path;

use anyhow::Context;

/// Default filter when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "bidwicket_core=info,bidwicket_app=info,warn";

/// Initialize tracing to log to `<log_dir>/bidwicket.log` (not the terminal,
/// which belongs to the display layer).
pub fn init_tracing(log_dir: &Path) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;

    let log_file = std::fs::File::create(log_dir.join("bidwicket.log"))
        .context("failed to create log file")?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
