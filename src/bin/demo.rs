//! Producer/consumer demo on the host runtime
//!
//! `TANDEM_LOG` sets the log level (default `info`), `TANDEM_PERIOD_MS` the
//! producer period (default 500) and `TANDEM_CYCLES` bounds the run; without
//! it the producer loops forever, as on the target.

use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{error, info, warn, LevelFilter};

use tandem_rtos::demo::{self, DemoConfig};
use tandem_rtos::{console, Kernel, KernelConfig, Record, SharedInput};

/// What the outside world writes into the shared input, one step per period
const STIMULUS: [Record; 6] = [
    Record::new(1, 0), // boost
    Record::new(1, 1), // restore
    Record::new(1, 1), // already restored, nothing
    Record::new(3, 0), // unknown id, nothing
    Record::new(1, 0), // boost again
    Record::new(1, 2), // consumer deletes itself
];

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("ignoring {key}={raw}: not a valid value");
            None
        }
    }
}

fn main() -> ExitCode {
    let level = env::var("TANDEM_LOG")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(LevelFilter::Info);
    if let Err(e) = console::init(level) {
        eprintln!("console logger unavailable: {e}");
    }

    let mut config = DemoConfig::default();
    if let Some(ms) = env_parse::<u64>("TANDEM_PERIOD_MS") {
        config = config.with_period(Duration::from_millis(ms));
    }
    if let Some(cycles) = env_parse::<u64>("TANDEM_CYCLES") {
        config = config.with_cycles(Some(cycles));
    }

    let mut kernel = Kernel::new(KernelConfig::default());
    let input = Arc::new(SharedInput::default());
    input.store(STIMULUS[0]);

    let clock = kernel.clock();
    let handles = match demo::spawn_demo(&mut kernel, &config, Arc::clone(&input), clock) {
        Ok(handles) => handles,
        Err(e) => {
            error!("{e}");
            demo::halt();
        }
    };

    // Input changes half a period out of phase with the producer's samples
    let period = config.period;
    let stimulus = Arc::clone(&input);
    let spawned = thread::Builder::new().name("stimulus".into()).spawn(move || {
        thread::sleep(period / 2);
        for record in STIMULUS.iter().skip(1) {
            thread::sleep(period);
            stimulus.store(*record);
        }
    });
    if let Err(e) = spawned {
        warn!("stimulus thread not started, input stays at {}: {e}", STIMULUS[0]);
    }

    match kernel.start() {
        Ok(stats) => {
            info!(
                "all tasks deleted: {} sent, {} dropped, {} bytes of heap used",
                handles.stats.sent(),
                handles.stats.dropped(),
                stats.heap_used
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
