use std::fs::OpenOptions;

const LOG_FILE: &str = "auction-visualizer.log";

/// Routes `log` records of both crates to stdout and the log file in the data dir.
pub fn setup(is_debug: bool) -> Result<(), fern::InitError> {
    let level = if is_debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    let log_path = data::data_path(Some(LOG_FILE));
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let log_file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&log_path)?;

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} [{}] {}: {}",
                chrono::Local::now().format("%H:%M:%S%.3f"),
                record.level(),
                record.target(),
                message
            ));
        })
        .level(log::LevelFilter::Warn)
        .level_for("auction_visualizer", level)
        .level_for("data", level)
        .chain(std::io::stdout())
        .chain(log_file)
        .apply()?;

    Ok(())
}
