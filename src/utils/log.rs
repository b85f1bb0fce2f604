use fern::colors::{Color, ColoredLevelConfig};

const CRATE_NAME: &str = "assert_utils";

/// Installs the diagnostic sink: every record goes to stderr with a
/// timestamp, a colored level and a shortened module path.
pub fn setup_logger() -> Result<(), fern::InitError> {
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    let colors = ColoredLevelConfig::new()
        .trace(Color::Cyan)
        .debug(Color::Magenta)
        .info(Color::Green)
        .warn(Color::BrightYellow)
        .error(Color::Red);

    fern::Dispatch::new()
        .level(level)
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%H:%M:%S%.3f]"),
                short_module_path(record.module_path().unwrap_or("")),
                colors.color(record.level()),
                message
            ))
        })
        .chain(std::io::stderr())
        .apply()?;
    Ok(())
}

fn short_module_path(path: &str) -> String {
    let module_path: Vec<&str> = path.split("::").collect();
    let len = module_path.len();
    if len > 2 && module_path[0] == CRATE_NAME {
        format!("..{}::{}", module_path[len - 2], module_path[len - 1])
    } else {
        path.to_string()
    }
}
