//! vbmcd - virtual BMC control-plane daemon

use clap::Parser;
use vbmc_cli::daemon::DaemonCli;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = DaemonCli::parse();
    if let Err(e) = cli.run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
