//! Test server executable. Listens on [BIND_DEFAULT] unless `--bind` is given,
//! stops on ctrl-c. For help run this command with `-h`.

#![warn(missing_docs)]

use afcache_testserver::server::{BIND_DEFAULT, serve};
use anyhow::{Context, Error};
use clap::Parser;
use futures::{channel::oneshot, try_join};
use log::LevelFilter;
use simple_logger::SimpleLogger;
use std::net::SocketAddr;
use tokio::signal::ctrl_c;

#[derive(Parser, Debug)]
#[command(version, about)]
struct Arguments {
    /// Address to listen on.
    #[arg(long, default_value = BIND_DEFAULT)]
    pub bind: SocketAddr,

    /// Log every sent block.
    #[arg(short, long)]
    pub verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Error> {
    let arguments = Arguments::parse();

    SimpleLogger::new()
        .with_level(if arguments.verbose {
            LevelFilter::Trace
        } else {
            LevelFilter::Info
        })
        .init()
        .context("logger init")?;

    // ctrl_c handler
    let (shutdown_sender, shutdown_receiver) = oneshot::channel::<()>();
    let ctrl_c_runner = async move {
        ctrl_c().await?;
        // server already gone is fine
        let _ = shutdown_sender.send(());
        Ok::<_, Error>(())
    };

    // server
    let server_runner = serve(arguments.bind, None, shutdown_receiver);

    // combine and run
    try_join!(ctrl_c_runner, server_runner)?;

    Ok(())
}
