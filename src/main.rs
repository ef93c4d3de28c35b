//! flockbot server binary.
//!
//! ```bash
//! # Write ~/.flockbot/settings.toml and edit it
//! flockbot --init-config
//!
//! # Serve the webhook
//! MESSENGER_APP_SECRET=... flockbot --port 5000
//! ```

use anyhow::Result;
use clap::Parser;

use flockbot_lib::cli::{init_config, init_tracing, initialize, Args};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose)?;

    if args.init_config {
        let (path, created) = init_config(&args).await?;
        if created {
            println!("Wrote settings template to {}", path.display());
        } else {
            println!("Settings already exist at {}", path.display());
        }
        return Ok(());
    }

    let ctx = initialize(&args).await?;
    ctx.run().await
}
