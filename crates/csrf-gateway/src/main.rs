use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use csrf_gateway::configuration::GatewayConfig;
use csrf_gateway::metric::Metrics;
use csrf_gateway::server::Server;
use pingora::server::configuration::Opt;

#[derive(Parser, Debug)]
#[command(name = "csrf-gateway", long_about = None)]
struct Args {
    /// Gateway settings (upstream, cookie, exempt paths)
    #[arg(long, default_value = "gateway.yaml")]
    gateway: PathBuf,

    #[command(flatten)]
    server: Opt,
}

fn main() {
    // Enable basic logging; set RUST_LOG=info for visibility.
    env_logger::init();

    let args = Args::parse();

    let config = GatewayConfig::load(&args.gateway).expect("Failed to load gateway config");

    let mut server = Server::new(Some(args.server)).expect("Failed to create server");

    server
        .bootstrap(config, Arc::new(Metrics::default()))
        .expect("Failed to bootstrap server");

    server.run_forever();
}
