use clap::Parser;
use client::{Console, RetryPolicy, Shell};
use log::info;
use shared::DEFAULT_PORT;
use std::time::Duration;
use tokio::io::BufReader;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value_t = format!("127.0.0.1:{}", DEFAULT_PORT))]
    server: String,

    /// Base delay in milliseconds between reconnect attempts
    #[arg(short = 'r', long, default_value = "1000")]
    retry_ms: u64,

    /// Reconnect attempts before giving up, 0 for no limit
    #[arg(short = 'm', long, default_value = "0")]
    max_retries: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();
    info!("Connecting to: {}", args.server);

    let console = Console::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout());
    let policy = RetryPolicy::new(Duration::from_millis(args.retry_ms), args.max_retries);
    let mut shell = Shell::new(console, &args.server, policy);

    let status = shell.connect(&args.server).await;
    println!("{}", status);

    shell.run().await?;

    Ok(())
}
