//! Dispatcher Integration Tests
//!
//! These tests run real TCP fake proxies on 127.0.0.1 and verify that the
//! client:
//! - Sends typed requests and decodes typed responses
//! - Fails over from dead or unavailable proxies
//! - Does not retry requests the server rejected
//! - Stops after the attempt budget
//! - Keeps the balancing counters consistent under concurrency

use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use uuid::Uuid;
use ytrpc_client::request::{LockNode, MountTable, RemountTable, StartMerge, UnmountTable};
use ytrpc_client::{
    BalancingDispatcher, ClientConfig, DispatchConfig, EndpointPool, RetryConfig, TcpRpcTransport, YtClient,
};
use ytrpc_common::protocol::{RequestHeader, RpcResponse, WireMessage};
use ytrpc_common::transport::{JsonCodec, TcpTransportAsync};
use ytrpc_common::{LockMode, MergeMode, RichYPath, YPath, YtError};
use ytrpc_metrics::BalancingMetricsRegistry;

type Handler = Arc<dyn Fn(&WireMessage) -> Option<RpcResponse> + Send + Sync>;

/// Fake RPC proxy that runs on a separate task
///
/// The handler sees every decoded request; returning `None` closes the
/// connection without replying.
struct TestProxy {
    addr: String,
    calls: Arc<AtomicUsize>,
    headers: Arc<Mutex<Vec<RequestHeader>>>,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestProxy {
    async fn new(handler: Handler) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let calls = Arc::new(AtomicUsize::new(0));
        let headers = Arc::new(Mutex::new(Vec::new()));
        let (shutdown_tx, mut shutdown_rx) = tokio::sync::oneshot::channel();

        let task_calls = calls.clone();
        let task_headers = headers.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    result = listener.accept() => {
                        let Ok((mut stream, _)) = result else { continue };
                        let handler = handler.clone();
                        let calls = task_calls.clone();
                        let headers = task_headers.clone();

                        tokio::spawn(async move {
                            let transport = TcpTransportAsync::default();
                            let Ok(frame) = transport.receive_message(&mut stream).await else { return };
                            let request = JsonCodec::decode_request(&frame).unwrap();
                            calls.fetch_add(1, Ordering::SeqCst);
                            headers.lock().unwrap().push(request.header.clone());

                            if let Some(response) = handler(&request) {
                                let encoded = JsonCodec::encode_response(&response).unwrap();
                                let _ = transport.send_message(&mut stream, &encoded).await;
                            }
                        });
                    }
                    _ = &mut shutdown_rx => {
                        break;
                    }
                }
            }
        });

        Self {
            addr,
            calls,
            headers,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Replies `{}` to everything
    async fn ok() -> Self {
        Self::new(Arc::new(|req: &WireMessage| {
            Some(RpcResponse::success(req.header.request_id, json!({})))
        }))
        .await
    }

    /// Replies with a server error code
    async fn failing(code: i32) -> Self {
        Self::new(Arc::new(move |req: &WireMessage| {
            Some(RpcResponse::error(req.header.request_id, code, "proxy says no"))
        }))
        .await
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn headers(&self) -> Vec<RequestHeader> {
        self.headers.lock().unwrap().clone()
    }
}

impl Drop for TestProxy {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// An address nothing listens on
async fn dead_addr() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    drop(listener);
    addr
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn fast_config() -> DispatchConfig {
    DispatchConfig {
        retry: RetryConfig {
            max_attempts: 3,
            initial_backoff_ms: 1,
            max_backoff_ms: 5,
            backoff_multiplier: 2.0,
        },
        default_timeout_ms: 2000,
        ..Default::default()
    }
}

fn client(addrs: Vec<String>) -> (YtClient, Arc<BalancingMetricsRegistry>) {
    let metrics = Arc::new(BalancingMetricsRegistry::new());
    let pool = Arc::new(EndpointPool::new(addrs));
    let dispatcher = BalancingDispatcher::with_config(pool, Arc::new(TcpRpcTransport::default()), fast_config())
        .with_metrics(metrics.clone());
    (
        YtClient::from_dispatcher(Arc::new(dispatcher), Some("ytrpc-tests".to_string())),
        metrics,
    )
}

fn path(p: &str) -> YPath {
    YPath::new(p).unwrap()
}

// ============================================================================
// Basic Functionality Tests
// ============================================================================

#[tokio::test]
async fn test_table_calls() {
    init_tracing();
    let proxy = TestProxy::ok().await;
    let (client, metrics) = client(vec![proxy.addr.clone()]);

    client.mount_table(&MountTable::new(path("//tmp/t"))).await.unwrap();
    client.unmount_table(&UnmountTable::new(path("//tmp/t"))).await.unwrap();
    client.remount_table(&RemountTable::new(path("//tmp/t"))).await.unwrap();

    let methods: Vec<String> = proxy.headers().into_iter().map(|h| h.method).collect();
    assert_eq!(methods, vec!["mount_table", "unmount_table", "remount_table"]);
    assert_eq!(metrics.total(), 3);
    assert_eq!(metrics.inflight(), 0);
}

#[tokio::test]
async fn test_lock_node_returns_ids() {
    let lock_id = Uuid::new_v4();
    let node_id = Uuid::new_v4();
    let proxy = TestProxy::new(Arc::new(move |req: &WireMessage| {
        assert_eq!(req.body["mode"], 2);
        Some(RpcResponse::success(
            req.header.request_id,
            json!({ "lock_id": lock_id, "node_id": node_id }),
        ))
    }))
    .await;
    let (client, _metrics) = client(vec![proxy.addr.clone()]);

    let rsp = client
        .lock_node(&LockNode::new(path("//tmp/node"), LockMode::Shared))
        .await
        .unwrap();

    assert_eq!(rsp.lock_id, lock_id);
    assert_eq!(rsp.node_id, node_id);
}

#[tokio::test]
async fn test_start_merge_returns_operation_id() {
    let operation_id = Uuid::new_v4();
    let seen_spec = Arc::new(Mutex::new(Value::Null));
    let spec_slot = seen_spec.clone();
    let proxy = TestProxy::new(Arc::new(move |req: &WireMessage| {
        *spec_slot.lock().unwrap() = req.body["spec"].clone();
        Some(RpcResponse::success(
            req.header.request_id,
            json!({ "operation_id": operation_id }),
        ))
    }))
    .await;
    let (client, _metrics) = client(vec![proxy.addr.clone()]);

    let request = StartMerge::builder()
        .add_input_table(RichYPath::new(path("//tmp/a")))
        .add_input_table(path("//tmp/b"))
        .with_output_table(path("//tmp/out"))
        .with_mode(MergeMode::Ordered)
        .build()
        .unwrap();
    let id = client.start_merge(&request).await.unwrap();

    assert_eq!(id, operation_id);
    let spec = seen_spec.lock().unwrap().clone();
    assert_eq!(spec["mode"], "ordered");
    assert_eq!(spec["input_table_paths"], json!(["//tmp/a", "//tmp/b"]));
}

#[tokio::test]
async fn test_header_carries_options() {
    let proxy = TestProxy::ok().await;
    let (client, _metrics) = client(vec![proxy.addr.clone()]);

    let trace_id = Uuid::new_v4();
    let request = RemountTable::builder()
        .with_path(path("//tmp/t"))
        .with_timeout(Duration::from_millis(1500))
        .with_trace_id(trace_id, true)
        .build()
        .unwrap();
    client.remount_table(&request).await.unwrap();

    let header = &proxy.headers()[0];
    assert_eq!(header.service, "ApiService");
    assert_eq!(header.timeout_ms, Some(1500));
    assert_eq!(header.trace_id, Some(trace_id));
    assert!(header.trace_sampled);
    assert_eq!(header.user_agent.as_deref(), Some("ytrpc-tests"));
    assert!(!header.retry);
}

#[tokio::test]
async fn test_request_user_agent_wins_over_client_default() {
    let proxy = TestProxy::ok().await;
    let (client, _metrics) = client(vec![proxy.addr.clone()]);

    let request = RemountTable::builder()
        .with_path(path("//tmp/t"))
        .with_user_agent("custom-agent")
        .build()
        .unwrap();
    client.remount_table(&request).await.unwrap();

    assert_eq!(proxy.headers()[0].user_agent.as_deref(), Some("custom-agent"));
}

// ============================================================================
// Failover Tests
// ============================================================================

#[tokio::test]
async fn test_failover_from_dead_proxy() {
    init_tracing();
    let proxy = TestProxy::ok().await;
    let dead = dead_addr().await;
    let (client, metrics) = client(vec![dead.clone(), proxy.addr.clone()]);

    client.remount_table(&RemountTable::new(path("//tmp/t"))).await.unwrap();

    assert_eq!(proxy.calls(), 1);
    assert!(proxy.headers()[0].retry);
    assert_eq!(metrics.failover(), 1);
    assert_eq!(metrics.total(), 1);
    assert_eq!(metrics.inflight(), 0);
    assert!(!client.pool().endpoint(&dead).unwrap().is_live());
}

#[tokio::test]
async fn test_failover_on_unavailable_code() {
    let busy = TestProxy::failing(105).await;
    let proxy = TestProxy::ok().await;
    let (client, metrics) = client(vec![busy.addr.clone(), proxy.addr.clone()]);

    client.remount_table(&RemountTable::new(path("//tmp/t"))).await.unwrap();

    assert_eq!(busy.calls(), 1);
    assert_eq!(proxy.calls(), 1);
    assert_eq!(metrics.failover(), 1);
    assert_eq!(
        busy.headers()[0].request_id,
        proxy.headers()[0].request_id
    );
}

#[tokio::test]
async fn test_failover_when_proxy_hangs_up() {
    let rude = TestProxy::new(Arc::new(|_: &WireMessage| -> Option<RpcResponse> { None })).await;
    let proxy = TestProxy::ok().await;
    let (client, metrics) = client(vec![rude.addr.clone(), proxy.addr.clone()]);

    client.remount_table(&RemountTable::new(path("//tmp/t"))).await.unwrap();

    assert_eq!(rude.calls(), 1);
    assert_eq!(proxy.calls(), 1);
    assert_eq!(metrics.failover(), 1);
}

#[tokio::test]
async fn test_unhealthy_proxy_is_skipped_afterwards() {
    let dead = dead_addr().await;
    let proxy = TestProxy::ok().await;
    let (client, metrics) = client(vec![dead, proxy.addr.clone()]);

    for _ in 0..5 {
        client.remount_table(&RemountTable::new(path("//tmp/t"))).await.unwrap();
    }

    assert_eq!(proxy.calls(), 5);
    assert_eq!(metrics.failover(), 1);
    assert_eq!(client.pool().list_live_endpoints().len(), 1);
}

// ============================================================================
// Error Handling Tests
// ============================================================================

#[tokio::test]
async fn test_no_retry_on_rejected_request() {
    let proxy = TestProxy::failing(500).await;
    let other = TestProxy::ok().await;
    let (client, metrics) = client(vec![proxy.addr.clone(), other.addr.clone()]);

    let err = client
        .remount_table(&RemountTable::new(path("//tmp/t")))
        .await
        .unwrap_err();

    assert!(matches!(err, YtError::UnrecoverableDispatch { code: 500, .. }));
    assert!(err.to_string().contains("proxy says no"));
    // Should only be called once (no retries for permanent errors)
    assert_eq!(proxy.calls(), 1);
    assert_eq!(other.calls(), 0);
    assert_eq!(metrics.failover(), 0);
}

#[tokio::test]
async fn test_retry_budget_exhausted() {
    let a = TestProxy::failing(105).await;
    let b = TestProxy::failing(108).await;
    let (client, metrics) = client(vec![a.addr.clone(), b.addr.clone()]);

    let err = client
        .remount_table(&RemountTable::new(path("//tmp/t")))
        .await
        .unwrap_err();

    assert!(matches!(err, YtError::RetryBudgetExhausted { attempts: 3, .. }));
    assert_eq!(a.calls() + b.calls(), 3);
    assert_eq!(metrics.failover(), 2);
    assert_eq!(metrics.inflight(), 0);
}

#[tokio::test]
async fn test_all_proxies_dead() {
    let (client, metrics) = client(vec![dead_addr().await, dead_addr().await]);

    let err = client
        .remount_table(&RemountTable::new(path("//tmp/t")))
        .await
        .unwrap_err();

    match err {
        YtError::RetryBudgetExhausted { last, .. } => assert!(last.is_recoverable()),
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(metrics.inflight(), 0);
}

#[tokio::test]
async fn test_no_endpoints() {
    let (client, _metrics) = client(vec![]);
    let err = client
        .remount_table(&RemountTable::new(path("//tmp/t")))
        .await
        .unwrap_err();
    assert!(matches!(err, YtError::NoEndpoints));
}

// ============================================================================
// Concurrent Requests Tests
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_calls() {
    let proxies = vec![TestProxy::ok().await, TestProxy::ok().await];
    let (client, metrics) = client(proxies.iter().map(|p| p.addr.clone()).collect());

    let tasks = (0..20)
        .map(|i| {
            let client = client.clone();
            tokio::spawn(async move {
                let request = RemountTable::new(path(&format!("//tmp/t{}", i)));
                client.remount_table(&request).await
            })
        })
        .collect::<Vec<_>>();

    let results = futures::future::join_all(tasks).await;

    for result in results {
        assert!(result.unwrap().is_ok());
    }
    assert_eq!(proxies[0].calls() + proxies[1].calls(), 20);
    assert!(proxies[0].calls() > 0 && proxies[1].calls() > 0);
    assert_eq!(metrics.total(), 20);
    assert_eq!(metrics.inflight(), 0);
    assert_eq!(metrics.failover(), 0);
}

// ============================================================================
// Configuration Tests
// ============================================================================

#[tokio::test]
async fn test_client_with_config_talks_tcp() {
    let proxy = TestProxy::ok().await;
    let config = ClientConfig {
        user_agent: Some("configured".to_string()),
        dispatch: fast_config(),
        ..Default::default()
    };
    let client = YtClient::with_config(vec![proxy.addr.clone()], config);

    client.remount_table(&RemountTable::new(path("//tmp/t"))).await.unwrap();

    assert_eq!(proxy.headers()[0].user_agent.as_deref(), Some("configured"));
}

#[tokio::test]
async fn test_disabled_proxy_is_not_used() {
    let a = TestProxy::ok().await;
    let b = TestProxy::ok().await;
    let (client, _metrics) = client(vec![a.addr.clone(), b.addr.clone()]);

    assert!(client.pool().disable_endpoint(&a.addr));
    for _ in 0..4 {
        client.remount_table(&RemountTable::new(path("//tmp/t"))).await.unwrap();
    }

    assert_eq!(a.calls(), 0);
    assert_eq!(b.calls(), 4);
}
