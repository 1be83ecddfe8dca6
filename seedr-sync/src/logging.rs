use std::io::{self, Write};

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;

use crate::progress::TransferProgress;

/// Installs the global fmt subscriber. `RUST_LOG` takes precedence over the
/// `verbose` switch. Log lines are written with `progress` bars cleared so
/// the two never interleave on stderr.
pub fn init(verbose: bool, progress: &TransferProgress) {
    let default = if verbose {
        "info,seedr_sync=debug,seedr_core=debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // A second init (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(BarSafeStderr {
            progress: progress.clone(),
        })
        .try_init();
}

#[derive(Clone)]
struct BarSafeStderr {
    progress: TransferProgress,
}

impl Write for BarSafeStderr {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.progress.suspend(|| io::stderr().write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}

impl<'a> MakeWriter<'a> for BarSafeStderr {
    type Writer = BarSafeStderr;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
