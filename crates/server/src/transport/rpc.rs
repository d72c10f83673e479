//! tarpc transport for the twinfed server

use futures::prelude::*;
use std::sync::Arc;
use tarpc::server::{self, Channel};
use tarpc::tokio_serde::formats::Json;
use tokio_util::codec::{Framed, LengthDelimitedCodec};
use tracing::{debug, error, info};
use twinfed::FederationEngine;

use crate::handler::Handler;
use crate::protocol::TwinService;

/// Run the tarpc RPC server until `shutdown` resolves.
pub async fn run_server(
    listener: tokio::net::TcpListener,
    engine: Arc<FederationEngine>,
    mut shutdown: impl Future<Output = ()> + Unpin + Send + 'static,
) -> anyhow::Result<()> {
    let handler = Handler::new(engine);

    info!("twinfed RPC server listening on {}", listener.local_addr()?);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((socket, peer)) => {
                        debug!("RPC connection from {}", peer);
                        let server = handler.clone();
                        tokio::spawn(async move {
                            let framed = Framed::new(socket, LengthDelimitedCodec::new());
                            let transport = tarpc::serde_transport::new(
                                framed,
                                Json::default()
                            );

                            server::BaseChannel::with_defaults(transport)
                                .execute(server.serve())
                                .for_each(|response| async move {
                                    tokio::spawn(response);
                                })
                                .await;
                        });
                    }
                    Err(e) => {
                        error!("Accept error: {}", e);
                    }
                }
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received, stopping RPC server...");
                break;
            }
        }
    }

    Ok(())
}
