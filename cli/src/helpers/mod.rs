mod log_writer;
use log_writer::*;

pub mod logger;
pub use logger::*;

mod daemon;
pub use daemon::*;

#[cfg(target_family = "unix")]
use colored::*;
#[cfg(target_family = "unix")]
use nix::sys::resource::{getrlimit, Resource};

/// Check if the process's open-files limit is above the minimum needed to accept
/// `maxConn` stratum connections plus a Postgres pool, and warn if not.
#[cfg(target_family = "unix")]
pub fn check_open_files_limit(minimum: u64) {
    match getrlimit(Resource::RLIMIT_NOFILE) {
        Ok((soft_limit, _)) => {
            if soft_limit < minimum {
                let warning = [
                    format!("⚠️  Current open files limit ({soft_limit}) for this process is lower than recommended."),
                    format!("⚠️  Please raise it to at least {minimum} to ensure correct behavior of the proxy."),
                    "⚠️  See `ulimit` command and `/etc/security/limits.conf` for more details.".to_owned(),
                ]
                .join("\n")
                .yellow()
                .bold();
                eprintln!("\n{warning}\n");
            }
        }
        Err(err) => {
            let warning = [
                format!("⚠️  Couldn't check process's open files limit due to {err}."),
                format!("⚠️  Please make sure it's at least {minimum} to ensure correct behavior of the proxy."),
                "⚠️  See `ulimit` command and `/etc/security/limits.conf` for more details.".to_owned(),
            ]
            .join("\n")
            .yellow()
            .bold();
            eprintln!("\n{warning}\n");
        }
    };
}

#[cfg(not(target_family = "unix"))]
pub fn check_open_files_limit(_minimum: u64) {}
