// ABOUTME: Test support utilities.
// ABOUTME: Scripted fake transport, recording clock, and Portainer payload builders.

// Each test binary only uses some of these helpers, so allow dead_code.
#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use rollcall::api::PortainerClient;
use rollcall::engine::{Clock, Engine};
use rollcall::transport::{ApiRequest, ApiResponse, Method, Transport, TransportError};
use rollcall::types::EnvironmentId;
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Once};
use std::time::Duration;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter =
            EnvFilter::from_default_env().add_directive("rollcall=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub const ENV: EnvironmentId = EnvironmentId::new(3);

/// Canned reply for one request.
#[derive(Debug, Clone)]
pub enum Reply {
    Json(u16, Value),
    Text(u16, String),
    Refused,
}

impl Reply {
    pub fn ok(body: Value) -> Self {
        Reply::Json(200, body)
    }

    fn into_result(self) -> Result<ApiResponse, TransportError> {
        match self {
            Reply::Json(status, body) => Ok(ApiResponse::new(status, body.to_string())),
            Reply::Text(status, body) => Ok(ApiResponse::new(status, body)),
            Reply::Refused => Err(TransportError::Connection("connection refused".to_string())),
        }
    }
}

/// Replies are consumed in order per route; the last one repeats.
#[derive(Default)]
pub struct FakeTransport {
    routes: Mutex<HashMap<(String, String), VecDeque<Reply>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

fn route_key(method: Method, path: &str) -> (String, String) {
    (method.to_string(), path.to_string())
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on(&self, method: Method, path: &str, reply: Reply) -> &Self {
        self.routes
            .lock()
            .entry(route_key(method, path))
            .or_default()
            .push_back(reply);
        self
    }

    pub fn on_get(&self, path: &str, reply: Reply) -> &Self {
        self.on(Method::Get, path, reply)
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.requests().iter().map(|r| r.path.clone()).collect()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    pub fn mutating_requests(&self) -> Vec<ApiRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method.is_mutating())
            .collect()
    }

    /// JSON body of the only request sent to `method path`.
    pub fn body_of(&self, method: Method, path: &str) -> Value {
        let requests: Vec<_> = self
            .requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect();
        assert_eq!(requests.len(), 1, "expected one {} {}", method, path);
        let body = requests[0].body.clone().expect("request has a body");
        serde_json::from_slice(&body).unwrap()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        self.requests.lock().push(request.clone());

        let reply = {
            let mut routes = self.routes.lock();
            match routes.get_mut(&route_key(request.method, &request.path)) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        reply
            .unwrap_or_else(|| Reply::Json(404, json!({"message": "no such route"})))
            .into_result()
    }
}

/// Records requested sleeps and returns immediately.
#[derive(Debug, Clone, Default)]
pub struct RecordingClock {
    sleeps: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingClock {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().clone()
    }
}

#[async_trait]
impl Clock for RecordingClock {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().push(duration);
    }
}

pub type TestEngine = Engine<PortainerClient<Arc<FakeTransport>>, RecordingClock>;

pub fn engine(transport: &Arc<FakeTransport>, clock: &RecordingClock) -> TestEngine {
    Engine::with_clock(PortainerClient::new(transport.clone()), clock.clone())
}

// Paths

pub fn docker(rest: &str) -> String {
    format!("/api/endpoints/{}/docker{}", ENV, rest)
}

pub fn swarm_path() -> String {
    docker("/swarm")
}

pub fn tasks_path() -> String {
    docker("/tasks")
}

pub fn containers_path() -> String {
    docker("/containers/json")
}

// Payloads

pub fn swarm_mode(transport: &FakeTransport) {
    transport.on_get(&swarm_path(), Reply::ok(json!({"ID": "swarm-cluster-1"})));
}

pub fn standalone_mode(transport: &FakeTransport) {
    transport.on_get(
        &swarm_path(),
        Reply::Json(
            503,
            json!({"message": "This node is not a swarm manager."}),
        ),
    );
}

pub fn task(id: &str, image: &str, state: &str) -> Value {
    json!({
        "ID": id,
        "ServiceID": "svc",
        "NodeID": format!("node-{}", id),
        "DesiredState": "running",
        "Status": {"State": state, "ContainerStatus": {"ContainerID": format!("c-{}", id)}},
        "Spec": {"ContainerSpec": {"Image": image}}
    })
}

pub fn container(name: &str, image: &str, state: &str) -> Value {
    json!({
        "Id": format!("id-{}", name),
        "Names": [format!("/{}", name)],
        "Image": image,
        "State": state,
        "Status": "Up 2 minutes"
    })
}

pub fn service(id: &str, name: &str, image: &str, version: u64) -> Value {
    json!({
        "ID": id,
        "Version": {"Index": version},
        "Spec": {
            "Name": name,
            "Labels": {
                "com.docker.stack.namespace": "shop",
                "com.docker.stack.image": image
            },
            "TaskTemplate": {
                "ContainerSpec": {"Image": image, "Env": ["LOG=info"]},
                "RestartPolicy": {"Condition": "any"}
            },
            "Mode": {"Replicated": {"Replicas": 2}}
        }
    })
}
