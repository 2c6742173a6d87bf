use crate::helpers::LogWriter;

use std::{fs::File, io, io::IsTerminal, path::Path};
use tokio::sync::mpsc;
use tracing_subscriber::{
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
    EnvFilter,
};

/// Initializes the logger. `verbosity` follows the config's `logger.level` (0-3); `logfile`
/// is only opened when `logger.mode = "file"`.
pub fn initialize_logger<P: AsRef<Path>>(verbosity: u8, to_file: bool, logfile: P) -> mpsc::Receiver<Vec<u8>> {
    match verbosity {
        0 => std::env::set_var("RUST_LOG", "info"),
        1 => std::env::set_var("RUST_LOG", "debug"),
        2 | 3 => std::env::set_var("RUST_LOG", "trace"),
        _ => std::env::set_var("RUST_LOG", "info"),
    };

    // EnvFilter cannot be cloned, so build one per layer.
    let [filter, filter2] = std::array::from_fn(|_| {
        EnvFilter::from_default_env()
            .add_directive("mio=off".parse().unwrap())
            .add_directive("tokio_util=off".parse().unwrap())
            .add_directive("reqwest=off".parse().unwrap())
            .add_directive("want=off".parse().unwrap())
    });

    let (log_sender, log_receiver) = mpsc::channel(1024);
    let log_sender = if to_file {
        let logfile_dir = logfile.as_ref().parent().expect("logfile path has no parent directory");
        if !logfile_dir.exists() {
            std::fs::create_dir_all(logfile_dir).expect("failed to create the logfile's parent directory");
        }
        let file = File::options().append(true).create(true).open(logfile).expect("failed to open the logfile");
        Some((log_sender, file))
    } else {
        None
    };

    match log_sender {
        Some((sender, file)) => {
            let sender_for_stdout = Some(sender);
            let _ = tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::Layer::default()
                        .with_ansi(false)
                        .with_writer(move || LogWriter::new(&sender_for_stdout))
                        .with_target(verbosity > 1)
                        .with_filter(filter),
                )
                .with(
                    tracing_subscriber::fmt::Layer::default()
                        .with_ansi(false)
                        .with_writer(file)
                        .with_target(verbosity > 1)
                        .with_filter(filter2),
                )
                .try_init();
        }
        None => {
            let _ = tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::Layer::default()
                        .with_ansi(io::stdout().is_terminal())
                        .with_target(verbosity > 1)
                        .with_filter(filter),
                )
                .try_init();
        }
    }

    log_receiver
}
