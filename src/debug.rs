use log::LevelFilter;
use std::io::Write;

/// Maps the `-v` count: 0 = warn, 1 = info, 2 = debug, 3+ = trace.
pub fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

pub fn init_logging(verbosity: u8) {
    let _ = env_logger::Builder::new()
        .filter_module("spnroast", level_for(verbosity))
        .filter_level(if verbosity >= 3 {
            LevelFilter::Debug
        } else {
            LevelFilter::Warn
        })
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] [{}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.args()
            )
        })
        .try_init();
}
