use anyhow::Context;
use clap::Parser;
use gui_bridge::bridge::GuiBridge;
use gui_bridge::model::RigHandle;
use log::info;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::ScenarioConfig;
use workflow::runner::Runner;

mod generator;
mod gui_bridge;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Scripted fire-detection rig backend")]
struct Args {
    /// Address the REST and WebSocket endpoints listen on
    #[arg(long, default_value = "127.0.0.1:5000")]
    bind: SocketAddr,
    /// Load a scenario from YAML
    #[arg(long)]
    scenario: Option<PathBuf>,
    /// Override the scenario's random seed
    #[arg(long)]
    seed: Option<u64>,
    /// Simulate an unreachable ESP32 controller
    #[arg(long, default_value_t = false)]
    esp_offline: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut scenario = match args.scenario {
        Some(path) => ScenarioConfig::load(path)?,
        None => ScenarioConfig::default(),
    };
    if let Some(seed) = args.seed {
        scenario.seed = seed;
    }
    if args.esp_offline {
        scenario.esp_online = false;
    }

    let rig = RigHandle::new(scenario.initial_settings());
    let bridge = GuiBridge::new(Runner::new(scenario, rig));

    let runtime = TokioBuilder::new_multi_thread()
        .enable_all()
        .build()
        .context("creating simulator runtime")?;

    runtime.block_on(async move {
        let shutdown = async {
            if let Err(err) = signal::ctrl_c().await {
                log::error!("awaiting Ctrl+C failed: {err}");
            }
        };
        let (addr, server) = bridge
            .serve(args.bind, shutdown)
            .with_context(|| format!("binding {}", args.bind))?;
        info!("rig simulator listening on http://{addr} (ws://{addr}/socket), Ctrl+C to stop");
        server.await;
        info!("rig simulator stopped");
        Ok::<(), anyhow::Error>(())
    })
}
