use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;

use serde_json::json;

use portraitgen_comfy::{ComfyClient, PromptSink, SinkError};

/// Serves canned JSON answers on a loopback port until the test process exits.
/// `answer` maps the request path to a status code and body.
fn serve(answer: fn(&str) -> (u16, &'static str)) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("local addr");
    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { continue };
            let path = read_request_path(&mut stream);
            let (status, body) = answer(&path);
            let reason = if status < 400 { "OK" } else { "Error" };
            let response = format!(
                "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes());
        }
    });
    format!("http://{addr}")
}

fn read_request_path(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0_u8; 4096];
    let head_end = loop {
        let read = stream.read(&mut chunk).unwrap_or(0);
        if read == 0 {
            return String::new();
        }
        buf.extend_from_slice(&chunk[..read]);
        if let Some(end) = buf.windows(4).position(|window| window == b"\r\n\r\n") {
            break end;
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let body_len = head
        .lines()
        .find_map(|line| {
            line.to_ascii_lowercase()
                .strip_prefix("content-length:")
                .map(|value| value.trim().parse::<usize>().unwrap_or(0))
        })
        .unwrap_or(0);
    while buf.len() < head_end + 4 + body_len {
        let read = stream.read(&mut chunk).unwrap_or(0);
        if read == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..read]);
    }

    head.lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or_default()
        .to_string()
}

fn workflow() -> serde_json::Value {
    json!({ "3": { "class_type": "KSampler", "inputs": { "seed": 12345 } } })
}

#[tokio::test]
async fn submit_returns_prompt_id() {
    let base_url = serve(|path| match path {
        "/system_stats" => (200, "{}"),
        "/prompt" => (200, r#"{"prompt_id": "abc-123", "number": 4}"#),
        "/queue" => (200, r#"{"queue_running": [], "queue_pending": [[1, "x"], [2, "y"]]}"#),
        _ => (404, "{}"),
    });
    let client = ComfyClient::new(&base_url);

    assert!(client.probe().await);
    assert_eq!(client.submit(&workflow()).await.expect("submit"), "abc-123");

    let queue = client.queue_status().await.expect("queue");
    assert_eq!(queue.running, 0);
    assert_eq!(queue.pending, 2);
}

#[tokio::test]
async fn rejected_prompt_carries_status_and_body() {
    let base_url = serve(|path| match path {
        "/system_stats" => (200, "{}"),
        _ => (400, r#"{"error": "invalid prompt"}"#),
    });
    let client = ComfyClient::new(&base_url);

    match client.submit(&workflow()).await {
        Err(SinkError::Status { status, body }) => {
            assert_eq!(status, 400);
            assert!(body.contains("invalid prompt"));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn response_without_prompt_id_is_an_error() {
    let base_url = serve(|path| match path {
        "/system_stats" => (200, "{}"),
        _ => (200, r#"{"number": 7}"#),
    });
    let client = ComfyClient::new(&base_url);

    assert!(matches!(
        client.submit(&workflow()).await,
        Err(SinkError::MissingPromptId)
    ));
}
