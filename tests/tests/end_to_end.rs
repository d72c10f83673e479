use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use twinfed::types::query::FailureKind;
use twinfed::{
    Config, FederationEngine, RawItem, StoreError, TimeSeriesStore, load_graph_fixture,
    load_measurement_fixture,
};
use twinfed_client::{HttpClientError, TwinClient, TwinHttpClient};
use twinfed_server::{run_http_server, run_server};

const DAY_START: &str = "2025-06-15T00:00:00Z";
const DAY_END: &str = "2025-06-15T23:59:59Z";

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../fixtures")
        .join(name)
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "twinfed_server=info,twinfed=info,info".into()),
        )
        .try_init()
        .ok();
}

fn house_engine() -> anyhow::Result<Arc<FederationEngine>> {
    Ok(Arc::new(
        FederationEngine::builder()
            .graph_fixture(fixture("home_graph.json"))
            .measurement_fixture(fixture("sensor_data.json"))
            .build()?,
    ))
}

/// Start both transports over one engine. Returns (rpc, http) addresses.
async fn spawn_servers(engine: Arc<FederationEngine>) -> anyhow::Result<(SocketAddr, SocketAddr)> {
    init_tracing();

    let rpc = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let http = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addrs = (rpc.local_addr()?, http.local_addr()?);

    let rpc_engine = Arc::clone(&engine);
    tokio::spawn(async move {
        let _ = run_server(rpc, rpc_engine, futures::future::pending()).await;
    });
    tokio::spawn(async move {
        let _ = run_http_server(http, engine, futures::future::pending()).await;
    });

    // Give them a moment to start
    tokio::time::sleep(Duration::from_millis(100)).await;

    Ok(addrs)
}

#[tokio::test]
async fn test_transports_agree() -> anyhow::Result<()> {
    let (rpc_addr, http_addr) = spawn_servers(house_engine()?).await?;

    let rpc = TwinClient::connect(rpc_addr).await?;
    let http = TwinHttpClient::new(&format!("http://{}", http_addr))?;

    let over_rpc = rpc.spaces("House", DAY_START, DAY_END).await?;
    let over_http = http.spaces("House", DAY_START, DAY_END).await?;

    assert_eq!(over_rpc, over_http);
    assert_eq!(over_rpc.spaces.len(), 6);

    let lounge = over_rpc.space("Lounge").unwrap();
    assert_eq!(lounge.sensors[0].id, "24e124710b423527");
    let humidity = lounge.measurement("humidity").unwrap();
    assert_eq!(humidity.unit, "%");
    assert_eq!(humidity.summary.as_ref().unwrap().count, 13);

    assert_eq!(http.health().await?.status, "healthy");
    assert_eq!(rpc.health().await?.status, "healthy");

    Ok(())
}

#[tokio::test]
async fn test_http_client_sees_error_status() -> anyhow::Result<()> {
    let (_, http_addr) = spawn_servers(house_engine()?).await?;
    let http = TwinHttpClient::new(&format!("http://{}/", http_addr))?;

    match http.spaces("House", "15/06/2025", DAY_END).await {
        Err(HttpClientError::Server(body)) => {
            assert_eq!(body.status, 400);
            assert!(body.error.contains("startDate"));
        }
        other => panic!("expected a 400, got {:?}", other.map(|r| r.spaces.len())),
    }

    Ok(())
}

#[tokio::test]
async fn test_concurrent_clients() -> anyhow::Result<()> {
    let (rpc_addr, _) = spawn_servers(house_engine()?).await?;

    let mut handles = Vec::new();
    for space in ["House", "Level 1", "Lounge", "10 North St.", "Garage"] {
        let client = TwinClient::connect(rpc_addr).await?;
        handles.push(tokio::spawn(async move {
            client
                .spaces(space, DAY_START, DAY_END)
                .await
                .map(|r| (space, r.spaces.len()))
        }));
    }

    let mut counts = Vec::new();
    for handle in handles {
        counts.push(handle.await??);
    }
    assert_eq!(
        counts,
        vec![
            ("House", 6),
            ("Level 1", 5),
            ("Lounge", 2),
            ("10 North St.", 8),
            ("Garage", 0)
        ]
    );

    Ok(())
}

/// Fixture-backed store where one sensor hangs past any reasonable deadline.
struct Hanging {
    inner: twinfed::MemoryTimeSeries,
    stuck: &'static str,
}

impl TimeSeriesStore for Hanging {
    fn range_query(
        &self,
        partition_key: &str,
        start: i64,
        end: i64,
    ) -> Result<Vec<RawItem>, StoreError> {
        if partition_key == self.stuck {
            std::thread::sleep(Duration::from_millis(1_500));
        }
        self.inner.range_query(partition_key, start, end)
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_deadline_yields_partial_result() -> anyhow::Result<()> {
    let series = Hanging {
        inner: load_measurement_fixture(fixture("sensor_data.json"), Default::default())?,
        stuck: "24e124148e423058",
    };
    let engine = FederationEngine::new(
        Arc::new(load_graph_fixture(fixture("home_graph.json"))?),
        Arc::new(series),
        Config::default().with_request_timeout(Duration::from_millis(500)),
    );
    let (rpc_addr, _) = spawn_servers(Arc::new(engine)).await?;
    let client = TwinClient::connect(rpc_addr).await?;

    let response = client.spaces("House", DAY_START, DAY_END).await?;

    assert_eq!(response.failures.len(), 1);
    assert_eq!(response.failures[0].sensor_id, "24e124148e423058");
    assert_eq!(response.failures[0].kind, FailureKind::Timeout);

    let fridge = response.space("Refrigerator").unwrap();
    assert!(fridge.measurements.is_empty());
    assert!(!response.space("Bedroom 1").unwrap().measurements.is_empty());

    Ok(())
}
