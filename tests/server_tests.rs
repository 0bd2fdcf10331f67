//! JSON-RPC server over an in-memory pipe.

mod common;

use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, duplex};

use common::{CHAINED_TRACE, resolver_with, sample_provider};
use stacknav::server::{Handlers, serve};
use stacknav_config::{DeobfuscatorConfig, Severity};

/// Feed `requests` (one per line) to a fresh server and collect every
/// response line.
async fn exchange(requests: &[Value]) -> Vec<Value> {
    let handlers = Handlers::new(
        resolver_with(sample_provider()),
        DeobfuscatorConfig::default(),
        Severity::Warning,
    );
    let (client, server_io) = duplex(64 * 1024);
    let (server_read, server_write) = tokio::io::split(server_io);
    let server = tokio::spawn(serve(handlers, BufReader::new(server_read), server_write));

    let (client_read, mut client_write) = tokio::io::split(client);
    for request in requests {
        let line = format!("{request}\n");
        client_write.write_all(line.as_bytes()).await.unwrap();
    }
    client_write.write_all(b"this is not json\n").await.unwrap();
    client_write.shutdown().await.unwrap();

    server.await.unwrap().unwrap();

    let mut responses = Vec::new();
    let mut lines = BufReader::new(client_read).lines();
    while let Some(line) = lines.next_line().await.unwrap() {
        responses.push(serde_json::from_str(&line).unwrap());
    }
    responses
}

fn request(id: u64, method: &str, params: Value) -> Value {
    json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params})
}

#[tokio::test]
async fn test_load_navigate_export() {
    let lines: Vec<&str> = CHAINED_TRACE.lines().collect();
    let responses = exchange(&[
        request(1, "load", json!({"context": "buf1", "lines": lines, "cursor_line": 3})),
        request(2, "bottom", json!({"context": "buf1"})),
        request(3, "up", json!({"context": "buf1"})),
        request(4, "quickfix", json!({"context": "buf1"})),
        request(5, "picklist", json!({"context": "buf1"})),
        request(6, "pick", json!({"context": "buf1", "position": 2})),
        request(7, "goto", json!({"context": "buf1", "index": 5})),
    ])
    .await;

    // Seven answers plus the parse error for the trailing garbage line.
    assert_eq!(responses.len(), 8);

    assert_eq!(responses[0]["id"], 1);
    assert_eq!(responses[0]["result"]["count"], 5);
    assert_eq!(responses[0]["result"]["cursor"], 4);
    assert_eq!(
        responses[0]["result"]["frames"][0],
        "at com.example.io.Writer.flush(Writer.java:99)"
    );

    assert_eq!(responses[1]["result"]["cursor"], 1);
    assert_eq!(responses[1]["result"]["target"]["path"], "/src/io/Writer.java");
    assert_eq!(responses[1]["result"]["target"]["line"], 99);

    assert_eq!(responses[2]["result"]["cursor"], 2);
    assert_eq!(responses[2]["result"]["target"]["line"], 120);

    let items = responses[3]["result"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 4);
    assert_eq!(items[2]["severity"], "warning");
    assert_eq!(items[2]["column"], 1);

    assert_eq!(responses[4]["result"]["items"].as_array().unwrap().len(), 4);

    assert_eq!(responses[5]["result"]["cursor"], 3);
    assert_eq!(responses[5]["result"]["target"]["path"], "/src/app/Service.java");

    // Frame 5 is `Main`, which no provider knows.
    assert_eq!(responses[6]["error"]["code"], -32000);
    assert_eq!(
        responses[6]["error"]["message"],
        "class 'com.example.app.Main' not found by any language server"
    );

    assert_eq!(responses[7]["id"], Value::Null);
    assert_eq!(responses[7]["error"]["code"], -32700);
}

#[tokio::test]
async fn test_notifications_run_without_response() {
    let responses = exchange(&[
        json!({"jsonrpc": "2.0", "method": "load", "params": {"from": CHAINED_TRACE}}),
        request(1, "serialize", json!({})),
    ])
    .await;
    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0]["id"], 1);
    assert!(
        responses[0]["result"]["text"]
            .as_str()
            .unwrap()
            .starts_with("at com.example.io.Writer.flush(Writer.java:99)\n")
    );
}

#[tokio::test]
async fn test_errors_map_to_codes() {
    let responses = exchange(&[
        request(1, "top", json!({"context": "empty"})),
        request(2, "rewind", json!({})),
        request(3, "pick", json!({"position": "first"})),
        json!({"jsonrpc": "2.0", "id": 4}),
        request(5, "load", json!({"from": "not a stack trace at all"})),
    ])
    .await;
    let codes: Vec<i64> = responses
        .iter()
        .map(|r| r["error"]["code"].as_i64().unwrap())
        .collect();
    assert_eq!(codes, vec![-32000, -32601, -32602, -32600, -32000, -32700]);
    assert_eq!(responses[0]["error"]["message"], "no stack trace loaded");
    assert_eq!(responses[4]["error"]["message"], "no stack trace found");
}
