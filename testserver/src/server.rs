//! Server loop. Contains [serve], accepting connections and answering with
//! [responder::respond] until shutdown is requested.

use crate::responder;
use anyhow::Error;
use futures::{
    channel::oneshot,
    future::{Either, select},
    pin_mut,
};
use http::Request;
use hyper::{body::Incoming, server::conn::http1, service::service_fn};
use hyper_util::{rt::TokioIo, server::graceful::GracefulShutdown};
use std::{convert::Infallible, net::SocketAddr};
use tokio::net::TcpListener;

/// Default listening address.
pub const BIND_DEFAULT: &str = "127.0.0.1:49000";

/// Runs http server listening on `bind`, notifying `bind_ready_sender` when
/// server is ready (with actual address, useful when binding port 0) and
/// shutting down gracefully when `shutdown_receiver` yields.
pub async fn serve(
    bind: SocketAddr,
    bind_ready_sender: Option<oneshot::Sender<SocketAddr>>,
    shutdown_receiver: oneshot::Receiver<()>,
) -> Result<(), Error> {
    log::trace!("starting server");

    // pin shutdown future
    pin_mut!(shutdown_receiver);

    // make hyper service
    let service_fn = service_fn(|request: Request<Incoming>| async move {
        let (parts, _body) = request.into_parts();

        log::info!("{} {}", parts.method, parts.uri);
        let response = responder::respond(&parts.method, &parts.uri, &parts.headers);

        Ok::<_, Infallible>(response)
    });

    // graceful shutdown watcher
    let graceful = GracefulShutdown::new();

    // server listener
    let listener = TcpListener::bind(bind).await?;

    // get final listening port
    let bind = listener.local_addr()?;
    log::info!("listening on http://{bind}");

    // notify that server is ready
    if let Some(bind_ready_sender) = bind_ready_sender {
        // receiver not waiting anymore is not our problem
        let _ = bind_ready_sender.send(bind);
    }

    // main loop
    log::trace!("entering main server loop");
    loop {
        let listener_accept = listener.accept();
        pin_mut!(listener_accept);

        match select(listener_accept, &mut shutdown_receiver).await {
            Either::Left((result, _)) => {
                let (stream, remote_address) = result?;
                log::trace!("new connection from {remote_address}");

                let io = TokioIo::new(stream);

                let connection = http1::Builder::new().serve_connection(io, service_fn);
                let graceful_connection = graceful.watch(connection);

                tokio::spawn(async move {
                    if let Err(error) = graceful_connection.await {
                        log::warn!("connection from {remote_address} failed: {error}");
                    }
                });
            }
            Either::Right((_result, _)) => {
                // sender dropped is treated as shutdown request as well
                log::trace!("got exit signal");
                break;
            }
        }
    }

    log::trace!("waiting for active connections to shutdown");
    graceful.shutdown().await;

    log::trace!("exiting server");
    Ok(())
}
