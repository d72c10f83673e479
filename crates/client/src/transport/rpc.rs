//! tarpc transport for the twinfed client

use std::net::SocketAddr;
use std::time::{Duration, SystemTime};
use tarpc::client;
use tarpc::context;
use tarpc::tokio_serde::formats::Json;
use thiserror::Error;
use twinfed_server::{Health, TwinServiceClient};
use twinfed_types::query::{ErrorBody, QueryResponse, SpaceQuery};

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Connection error: {0}")]
    Connection(#[from] std::io::Error),
    #[error("RPC error: {0}")]
    Rpc(#[from] tarpc::client::RpcError),
    #[error("Server error: {0}")]
    Server(#[from] ErrorBody),
}

impl ClientError {
    /// HTTP-style status of a server-side rejection.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Server(body) => Some(body.status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Clone)]
pub struct TwinClient {
    client: TwinServiceClient,
    timeout: Option<Duration>,
}

impl TwinClient {
    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        let transport = tarpc::serde_transport::tcp::connect(addr, Json::default).await?;
        let client = TwinServiceClient::new(client::Config::default(), transport).spawn();
        Ok(Self {
            client,
            timeout: None,
        })
    }

    /// Per-call deadline. Defaults to tarpc's own.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn context(&self) -> context::Context {
        let mut ctx = context::current();
        if let Some(timeout) = self.timeout {
            ctx.deadline = SystemTime::now() + timeout;
        }
        ctx
    }

    /// Measurements of every space below `space` between two ISO-8601 instants.
    pub async fn spaces(&self, space: &str, start: &str, end: &str) -> Result<QueryResponse> {
        self.query(SpaceQuery::new(space, start, end)).await
    }

    pub async fn query(&self, query: SpaceQuery) -> Result<QueryResponse> {
        Ok(self.client.spaces(self.context(), query).await??)
    }

    pub async fn health(&self) -> Result<Health> {
        Ok(self.client.health(self.context()).await?)
    }
}
