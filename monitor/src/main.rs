//! Main entry point for the integrity monitor

use actix_web::main as actix_main;
use common::{logging, Config, Result};
use integrity_monitor::MonitorServer;
use log::{info, warn};

const BANNER: &str = r#"
╔═══════════════════════════════════════════════════════════════════╗
║                                                                   ║
║   ██╗███╗   ██╗████████╗███████╗ ██████╗ ██████╗ ██╗████████╗     ║
║   ██║████╗  ██║╚══██╔══╝██╔════╝██╔════╝ ██╔══██╗██║╚══██╔══╝     ║
║   ██║██╔██╗ ██║   ██║   █████╗  ██║  ███╗██████╔╝██║   ██║        ║
║   ██║██║╚██╗██║   ██║   ██╔══╝  ██║   ██║██╔══██╗██║   ██║        ║
║   ██║██║ ╚████║   ██║   ███████╗╚██████╔╝██║  ██║██║   ██║        ║
║   ╚═╝╚═╝  ╚═══╝   ╚═╝   ╚══════╝ ╚═════╝ ╚═╝  ╚═╝╚═╝   ╚═╝        ║
║                                                                   ║
║   File Integrity Monitor v0.1.0                                   ║
║                                                                   ║
╚═══════════════════════════════════════════════════════════════════╝
"#;

#[actix_main]
async fn main() -> Result<()> {
    logging::init();

    println!("{}", BANNER);

    info!("Starting integrity monitor...");

    let config = Config::load()?;
    info!("Configuration loaded successfully");

    if config.enable_demo_keys {
        warn!("Demo key endpoint is enabled; do not run this in production");
    }

    let server = MonitorServer::new(&config)?;
    info!("✓ Server instance created successfully");

    server.start().await
}
