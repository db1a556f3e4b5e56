//! HTTP transport integration tests
//!
//! Runs a small in-process hyper server that behaves like a remote actor
//! endpoint: it assigns an address, deduplicates resent messages by offset,
//! and echoes anything sent to `actor:echoer` back to its source.
//!
//! Run with: cargo test --test integration_http_transport

use actorlink_core::client::{ActorClient, ClientConfig};
use actorlink_core::exchange::Communicator;
use actorlink_core::message::Message;
use actorlink_core::transport::{HttpTransport, Transport, TransportError};
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server, StatusCode};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

const ASSIGNED: &str = "servlet:0782d5a941fc97cabf18";
const WAIT: Duration = Duration::from_secs(5);

#[derive(Default)]
struct EndpointState {
    /// Every distinct message received from the client
    received: Vec<Value>,
    /// Every message ever queued for the client
    outgoing: Vec<Value>,
}

async fn handle(
    state: Arc<Mutex<EndpointState>>,
    req: Request<Body>,
) -> Result<Response<Body>, Infallible> {
    let path = req.uri().path().to_string();
    let response = match (req.method(), path.as_str()) {
        (&Method::GET, "/actor/address") => Response::new(Body::from(ASSIGNED)),
        (&Method::POST, "/actor/rfm") => {
            let bytes = hyper::body::to_bytes(req.into_body()).await.unwrap_or_default();
            match serde_json::from_slice::<Value>(&bytes) {
                Ok(body) => Response::new(Body::from(reflect(&state, &body).to_string())),
                Err(_) => bad_request(),
            }
        }
        (&Method::GET, "/broken/address") => Response::builder()
            .status(StatusCode::INTERNAL_SERVER_ERROR)
            .body(Body::from("Server Error"))
            .unwrap_or_default(),
        (&Method::POST, "/broken/rfm") => Response::new(Body::from("{not json")),
        _ => Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Body::empty())
            .unwrap_or_default(),
    };
    Ok(response)
}

fn bad_request() -> Response<Body> {
    Response::builder()
        .status(StatusCode::BAD_REQUEST)
        .body(Body::empty())
        .unwrap_or_default()
}

fn reflect(state: &Mutex<EndpointState>, body: &Value) -> Value {
    let mut state = state.lock();
    let in_offset = body["inQueueOffset"].as_u64().unwrap_or(0) as usize;
    let out_offset = body["outQueueOffset"].as_u64().unwrap_or(0) as usize;

    if let Some(entries) = body["inQueue"].as_array() {
        for (i, entry) in entries.iter().enumerate() {
            // Skip anything already seen in an earlier, unacknowledged round
            if in_offset + i < state.received.len() {
                continue;
            }
            state.received.push(entry.clone());
            if entry["destination"] == "actor:echoer" {
                state.outgoing.push(json!({
                    "source": "actor:echoer",
                    "destination": entry["source"].clone(),
                    "type": entry["type"].clone(),
                    "data": entry["data"].clone()
                }));
            }
        }
    }

    let pending: Vec<Value> = state.outgoing.iter().skip(out_offset).cloned().collect();
    json!({ "outQueue": pending })
}

async fn spawn_endpoint() -> (SocketAddr, Arc<Mutex<EndpointState>>) {
    let state = Arc::new(Mutex::new(EndpointState::default()));
    let service_state = Arc::clone(&state);
    let make_svc = make_service_fn(move |_conn| {
        let state = Arc::clone(&service_state);
        async move {
            Ok::<_, Infallible>(service_fn(move |req| handle(Arc::clone(&state), req)))
        }
    });

    let server = Server::bind(&([127, 0, 0, 1], 0).into()).serve(make_svc);
    let addr = server.local_addr();
    tokio::spawn(server);
    (addr, state)
}

// ============================================================================
// TRANSPORT
// ============================================================================

#[tokio::test]
async fn test_fetch_text() {
    let (addr, _) = spawn_endpoint().await;
    let transport = HttpTransport::new();

    let text = transport
        .fetch_text(&format!("http://{}/actor/address", addr))
        .await
        .unwrap();
    assert_eq!(text, ASSIGNED);
}

#[tokio::test]
async fn test_error_status_carries_body() {
    let (addr, _) = spawn_endpoint().await;
    let transport = HttpTransport::new();

    let err = transport
        .fetch_text(&format!("http://{}/broken/address", addr))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        TransportError::Status {
            status: 500,
            body: "Server Error".to_string()
        }
    );
}

#[tokio::test]
async fn test_post_json_rejects_malformed_response() {
    let (addr, _) = spawn_endpoint().await;
    let transport = HttpTransport::new();

    let err = transport
        .post_json(&format!("http://{}/broken/rfm", addr), json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::InvalidBody(_)));
}

#[tokio::test]
async fn test_communicator_over_http() {
    let (addr, state) = spawn_endpoint().await;
    let communicator = Communicator::new(
        format!("http://{}/actor/", addr),
        Arc::new(HttpTransport::new()),
    );

    let address = communicator.discover().await.unwrap();
    assert_eq!(address.to_string(), ASSIGNED);

    let outgoing = vec![Message::new(
        address.clone(),
        "actor:echoer".parse().unwrap(),
        "java.lang.String",
        json!("testmsg"),
    )];
    let id = address.last_element().to_string();

    let first = communicator.reflect(&id, 0, 0, &outgoing).await.unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].destination(), &address);
    assert_eq!(first[0].data(), &json!("testmsg"));

    // Resending the same snapshot does not duplicate it on the remote side
    let again = communicator.reflect(&id, 0, 0, &outgoing).await.unwrap();
    assert_eq!(again.len(), 1);
    assert_eq!(state.lock().received.len(), 1);

    let acked = communicator.reflect(&id, 1, 1, &[]).await.unwrap();
    assert!(acked.is_empty());
}

// ============================================================================
// END TO END
// ============================================================================

#[tokio::test]
async fn test_client_echo_round_trip() {
    let (addr, state) = spawn_endpoint().await;
    let config = ClientConfig::new(format!("http://{}/actor", addr))
        .with_poll_interval(Duration::from_millis(10));
    let client = ActorClient::with_http(config);

    let mut replies = client.subscribe(ASSIGNED).unwrap();
    client.start().unwrap();

    let me = client.address().await.unwrap();
    let sender = me.append_suffix(["subsystem1"]).unwrap();
    client
        .write_message(&sender, "actor:echoer", "java.lang.String", json!("ping"))
        .unwrap();

    let echoed = timeout(WAIT, replies.recv()).await.unwrap().unwrap();
    assert_eq!(echoed.source().to_string(), "actor:echoer");
    assert_eq!(echoed.destination(), &sender);
    assert_eq!(echoed.message_type(), "java.lang.String");
    assert_eq!(echoed.data(), &json!("ping"));

    assert_eq!(state.lock().received.len(), 1);
    client.shutdown();
}
