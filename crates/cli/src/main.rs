//! HTIF simulation driver CLI.
//!
//! Thin glue around `htsim-core`: parses the host options, establishes the
//! byte channel (stdio by default, pseudo-terminal on request with fallback),
//! wires optional cache models, and runs the driver loop. All diagnostics go
//! to stderr; stdout may carry the protocol byte stream.

use std::cell::RefCell;
use std::process;
use std::rc::Rc;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use htsim_core::cache::CacheSim;
use htsim_core::channel::{HostChannel, StdioChannel};
use htsim_core::{SimConfig, SimError, Simulator};

/// How long the pseudo-terminal bootstrap waits for a peer to attach.
const PTY_ATTACH_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Parser, Debug)]
#[command(
    name = "htsim",
    author,
    version,
    about = "Host-target interface simulation driver",
    long_about = "Drives simulated cores while serving the HTIF protocol to an \
external host frontend over stdin/stdout or a pseudo-terminal."
)]
struct Cli {
    /// Simulate <N> processors.
    #[arg(short = 'p', long = "procs", value_name = "N", default_value_t = 1)]
    procs: usize,

    /// Provide <N> MB of target memory (0 = platform default).
    #[arg(short = 'm', long = "mem", value_name = "N", default_value_t = 0)]
    mem_mb: usize,

    /// Interactive debug mode (implies --pty).
    #[arg(short = 'd', long)]
    debug: bool,

    /// Allocate a pseudo-terminal for the protocol channel.
    #[arg(short = 't', long)]
    pty: bool,

    /// Instruction cache model: <sets>:<ways>:<block-bytes>.
    #[arg(long, value_name = "S:W:B")]
    ic: Option<String>,

    /// Data cache model: <sets>:<ways>:<block-bytes>.
    #[arg(long, value_name = "S:W:B")]
    dc: Option<String>,

    /// Shared L2 cache model: <sets>:<ways>:<block-bytes>.
    #[arg(long, value_name = "S:W:B")]
    l2: Option<String>,

    /// Target program the host frontend will load.
    #[arg(value_name = "TARGET")]
    target: String,

    /// Arguments passed through to the target program.
    #[arg(
        value_name = "TARGET_ARGS",
        allow_hyphen_values = true,
        trailing_var_arg = true
    )]
    target_args: Vec<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = SimConfig {
        nprocs: cli.procs,
        mem_mb: cli.mem_mb,
        debug: cli.debug,
        // -d hands the channel to an attached controller, so it needs the
        // terminal too.
        pty: cli.pty || cli.debug,
        icache: cli.ic,
        dcache: cli.dc,
        l2: cli.l2,
    };

    info!(target = %cli.target, args = ?cli.target_args, "target program");

    let channel = open_channel(&config);
    let mut sim = match Simulator::new(&config, channel) {
        Ok(sim) => sim,
        Err(e) => die(&e),
    };
    if let Err(e) = wire_caches(&mut sim, &config) {
        die(&e);
    }

    match sim.run() {
        Ok(()) => info!("simulation finished"),
        Err(e) => die(&e),
    }
}

/// Establishes the protocol channel, falling back to stdio when the
/// pseudo-terminal cannot be set up.
#[cfg(unix)]
fn open_channel(config: &SimConfig) -> Box<dyn HostChannel> {
    use htsim_core::channel::pty::PtyChannel;

    if config.pty {
        match PtyChannel::open(PTY_ATTACH_TIMEOUT) {
            Ok(pty) => {
                eprintln!("pty allocated: {}", pty.slave_path());
                return Box::new(pty);
            }
            Err(e) => warn!("{e}; falling back to stdio"),
        }
    }
    Box::new(StdioChannel::new())
}

#[cfg(not(unix))]
fn open_channel(config: &SimConfig) -> Box<dyn HostChannel> {
    if config.pty {
        warn!("pseudo-terminal channel unsupported on this platform; using stdio");
    }
    Box::new(StdioChannel::new())
}

/// Builds the configured cache models, chains L2 as the L1 miss handler, and
/// registers the L1 models as memory-access observers.
fn wire_caches(
    sim: &mut Simulator<Box<dyn HostChannel>>,
    config: &SimConfig,
) -> Result<(), SimError> {
    let l2 = config
        .l2
        .as_deref()
        .map(|spec| CacheSim::from_spec(spec, "L2$"))
        .transpose()?
        .map(|c| Rc::new(RefCell::new(c)));

    for (spec, name) in [(&config.icache, "I$"), (&config.dcache, "D$")] {
        let Some(spec) = spec.as_deref() else {
            continue;
        };
        let mut cache = CacheSim::from_spec(spec, name)?;
        if let Some(l2) = &l2 {
            cache.set_miss_handler(Rc::clone(l2));
        }
        sim.machine.register_tracer(Rc::new(RefCell::new(cache)));
    }
    Ok(())
}

fn die(err: &SimError) -> ! {
    eprintln!("htsim: {err}");
    process::exit(1);
}
