//! HTTP API end-to-end over a real socket

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tfdeploy_api_http::{AgentInbox, ApiServer, ApiState};
use tfdeploy_core::application::{DeployService, Worker};
use tfdeploy_core::port::id_provider::UuidProvider;
use tfdeploy_core::port::provisioner::mocks::MockProvisioner;
use tfdeploy_core::port::quota_guard::mocks::MockQuotaGuard;
use tfdeploy_core::port::time_provider::SystemTimeProvider;
use tfdeploy_core::port::workspace::mocks::MockWorkspaceManager;
use tfdeploy_infra_memory::MemoryJobStore;
use tokio::sync::oneshot;

const SECRET: &str = "agent-s3cret";

struct Running {
    addr: SocketAddr,
    client: reqwest::Client,
    shutdown: Option<oneshot::Sender<()>>,
    server: tokio::task::JoinHandle<std::io::Result<()>>,
}

impl Running {
    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn get(&self, path: &str) -> (u16, Value) {
        let resp = self.client.get(self.url(path)).send().await.unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap_or(Value::Null))
    }

    async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.server.await.unwrap().unwrap();
    }
}

async fn start(provisioner: MockProvisioner) -> Running {
    let time_provider = Arc::new(SystemTimeProvider);
    let store = Arc::new(MemoryJobStore::new(time_provider.clone()));
    let worker = Worker::new(
        store.clone(),
        Arc::new(MockWorkspaceManager::new()),
        Arc::new(provisioner),
        HashMap::new(),
    );
    let deploy = DeployService::new(
        store,
        Arc::new(MockQuotaGuard::approving()),
        worker,
        Arc::new(UuidProvider),
        time_provider.clone(),
    );
    let state = ApiState::new(
        Arc::new(deploy),
        Arc::new(AgentInbox::new(time_provider)),
        SECRET,
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();
    let server = tokio::spawn(ApiServer::serve(listener, state, async move {
        let _ = rx.await;
    }));

    Running {
        addr,
        client: reqwest::Client::new(),
        shutdown: Some(tx),
        server,
    }
}

async fn poll_until_terminal(running: &Running, status_url: &str) -> Value {
    for _ in 0..200 {
        let (status, body) = running.get(status_url).await;
        assert_eq!(status, 200);
        if body["status"] == "done" || body["status"] == "error" {
            return body;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("job at {} never finished", status_url);
}

#[tokio::test]
async fn test_deploy_and_poll_to_done() {
    let running = start(MockProvisioner::new_success("Apply complete! Resources: 1 added")).await;

    let resp = running
        .client
        .post(running.url("/trigger-deploy"))
        .form(&[("tf_code", "resource \"x\" {}"), ("do_token", "dop_v1_ok")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 202);
    let accepted: Value = resp.json().await.unwrap();
    assert_eq!(accepted["status"], "accepted");

    let status_url = accepted["status_url"].as_str().unwrap().to_string();
    let job = poll_until_terminal(&running, &status_url).await;

    assert_eq!(job["status"], "done");
    assert_eq!(job["message"], "Apply complete! Resources: 1 added");
    assert_eq!(job["job_id"], accepted["job_id"]);

    running.stop().await;
}

#[tokio::test]
async fn test_init_failure_over_http() {
    let running = start(MockProvisioner::new_init_failure("no such provider")).await;

    let accepted: Value = running
        .client
        .post(running.url("/trigger-deploy"))
        .json(&json!({"tf_code": "resource \"x\" {}", "do_token": "dop_v1_ok"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let job = poll_until_terminal(&running, accepted["status_url"].as_str().unwrap()).await;

    assert_eq!(job["status"], "error");
    assert_eq!(job["message"], "Terraform init failed");
    assert_eq!(job["details"], "no such provider");

    running.stop().await;
}

#[tokio::test]
async fn test_validation_and_not_found() {
    let running = start(MockProvisioner::new_success("Apply complete!")).await;

    let resp = running
        .client
        .post(running.url("/trigger-deploy"))
        .form(&[("tf_code", "resource \"x\" {}")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "error");

    let (status, body) = running.get("/jobs/no-such-job").await;
    assert_eq!(status, 404);
    assert_eq!(body, json!({"error": "job not found"}));

    let (status, body) = running.get("/healthz").await;
    assert_eq!(status, 200);
    assert_eq!(body["jobs"]["pending"], 0);

    running.stop().await;
}

#[tokio::test]
async fn test_agent_inbox_roundtrip() {
    let running = start(MockProvisioner::new_success("Apply complete!")).await;

    let resp = running
        .client
        .post(running.url("/agent/push"))
        .json(&json!({"code": "resource \"a\" {}"}))
        .header("X-Agent-Secret", "wrong")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);

    let mut last_ts = 0;
    for code in ["resource \"a\" {}", "resource \"b\" {}"] {
        let resp = running
            .client
            .post(running.url("/agent/push"))
            .json(&json!({"code": code}))
            .header("X-Agent-Secret", SECRET)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 200);
        let body: Value = resp.json().await.unwrap();
        let ts = body["ts"].as_i64().unwrap();
        assert!(ts > last_ts);
        last_ts = ts;
    }

    let (_, latest) = running.get("/agent/latest").await;
    assert_eq!(latest, json!({"code": "resource \"b\" {}", "ts": last_ts}));

    running.stop().await;
}
