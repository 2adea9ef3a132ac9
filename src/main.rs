//! ndr - resolves a Node.js debug launch configuration and prints it for a debug adapter.

use anyhow::Context;
use clap::Parser;
use log::{info, warn};
use node_debug_resolver::resolver::activate::OsActivator;
use node_debug_resolver::resolver::auto::RuntimeAutoDetect;
use node_debug_resolver::resolver::config::{LaunchConfiguration, ProcessId};
use node_debug_resolver::resolver::host::NoPicker;
use node_debug_resolver::resolver::protocol::ProcessProbe;
use node_debug_resolver::resolver::{Resolution, ResolverBuilder};
use node_debug_resolver::ui::config::Settings;
use node_debug_resolver::ui::console::{ConsoleNotifier, ConsolePicker};
use std::io::Read;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Launch configuration file: a single configuration or a launch.json, `-` for stdin
    config: String,

    /// Name of a configuration in launch.json (default: the first one)
    #[clap(short, long)]
    name: Option<String>,

    /// Settings file (default: ~/.config/ndr/settings.toml)
    #[clap(long, env = "NDR_SETTINGS")]
    settings: Option<PathBuf>,

    /// Node.js executable for helper invocations and version checks
    #[clap(long, env = "NDR_NODE_RUNTIME")]
    node_runtime: Option<PathBuf>,

    /// Cancel interactive process selection instead of asking
    #[clap(long)]
    no_pick: bool,
}

fn read_document(source: &str) -> anyhow::Result<serde_json::Value> {
    let data = if source == "-" {
        let mut data = String::new();
        std::io::stdin()
            .read_to_string(&mut data)
            .context("Read launch configuration from stdin")?;
        data
    } else {
        std::fs::read_to_string(source).with_context(|| format!("Read {source}"))?
    };
    serde_json::from_str(&data).context("Parse launch configuration")
}

/// Interactive selection reads stdin, so it is off when the configuration came from stdin.
fn interactive_pick(args: &Args, config: &LaunchConfiguration) -> bool {
    if args.no_pick {
        return false;
    }
    let needs_pick = config
        .process_id
        .as_ref()
        .is_some_and(ProcessId::is_pick_command);
    if needs_pick && args.config == "-" {
        warn!(
            target: "resolver",
            "launch configuration is read from stdin, interactive process selection is not available"
        );
        return false;
    }
    true
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();

    let mut settings = Settings::load(args.settings.as_deref());
    if args.node_runtime.is_some() {
        settings.node_runtime = args.node_runtime.clone();
    }

    let document = read_document(&args.config)?;
    let mut config = LaunchConfiguration::from_document(document, args.name.as_deref())
        .context("Select launch configuration")?;

    let host = settings.host();
    let activator = match &settings.node_runtime {
        Some(runtime) => OsActivator::new().with_runtime(runtime),
        None => OsActivator::new(),
    };
    let auto_detect = RuntimeAutoDetect::new(host.clone())
        .with_runtime(settings.node_runtime.clone())
        .with_timeout(settings.probe_timeout());

    let probe = ProcessProbe::new().with_timeout(settings.probe_timeout());

    let builder = ResolverBuilder::new()
        .with_host(host)
        .with_notifier(ConsoleNotifier)
        .with_activator(activator)
        .with_probe(probe)
        .with_auto_detect(auto_detect);
    let resolver = if interactive_pick(&args, &config) {
        builder.with_picker(ConsolePicker).build()
    } else {
        builder.with_picker(NoPicker).build()
    };

    match resolver.resolve(&mut config)? {
        Resolution::Resolved(_) => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
        Resolution::Aborted => {
            info!(target: "resolver", "launch aborted");
            std::process::exit(1)
        }
    }
}
