use pipeline_tools::fetch::{fetch_all, FetchError, Headers, HttpJsonSource, JsonSource};
use serde_json::json;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Serve canned answers on 127.0.0.1 by path:
/// `/items?page=N` pages of records, `/failing` 500s, `/garbled` a non-JSON 200,
/// `/slow` a response after two seconds.
async fn serve() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(answer(stream));
        }
    });
    addr
}

async fn answer(mut stream: TcpStream) {
    let mut request = Vec::new();
    let mut buf = [0u8; 1024];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => request.extend_from_slice(&buf[..n]),
        }
    }

    let request = String::from_utf8_lossy(&request);
    let path = request.split_whitespace().nth(1).unwrap_or("/").to_string();

    let (status, body) = if let Some(page) = path.strip_prefix("/items?page=") {
        let page: u64 = page.parse().unwrap_or(0);
        // Earlier pages answer later
        tokio::time::sleep(Duration::from_millis(40u64.saturating_sub(page * 10))).await;
        let body = json!({"items": [{"page": page, "idx": 0}, {"page": page, "idx": 1}]});
        ("200 OK", body.to_string())
    } else if path.starts_with("/failing") {
        ("500 Internal Server Error", r#"{"error":"boom"}"#.to_string())
    } else if path.starts_with("/garbled") {
        ("200 OK", "<html>not json".to_string())
    } else if path.starts_with("/slow") {
        tokio::time::sleep(Duration::from_secs(2)).await;
        ("200 OK", "{}".to_string())
    } else {
        ("404 Not Found", "{}".to_string())
    };

    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

#[tokio::test]
async fn test_fetch_all_over_http_keeps_page_order() {
    let addr = serve().await;
    let prefix = format!("http://{}/items?page=", addr);

    let table = fetch_all(&prefix, &Headers::new(), 3, "items", 2).await.unwrap();

    let pages: Vec<u64> = table.column("page").unwrap().map(|v| v.as_u64().unwrap()).collect();
    assert_eq!(pages, vec![1, 1, 2, 2, 3, 3]);
    assert_eq!(table.columns(), &["page", "idx"]);
}

#[tokio::test]
async fn test_non_success_status_is_a_status_error() {
    let addr = serve().await;
    let prefix = format!("http://{}/failing?page=", addr);

    let err = fetch_all(&prefix, &Headers::new(), 2, "items", 2).await.unwrap_err();

    assert!(matches!(err, FetchError::Status { status: 500, .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_malformed_body_is_a_decode_error() {
    let addr = serve().await;
    let prefix = format!("http://{}/garbled?page=", addr);

    let err = fetch_all(&prefix, &Headers::new(), 1, "items", 1).await.unwrap_err();

    assert!(matches!(err, FetchError::Decode { .. }));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_slow_response_is_a_retryable_timeout() {
    let addr = serve().await;
    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(100))
        .build()
        .unwrap();
    let source = HttpJsonSource::with_client(client);

    let err = source
        .get_json(&format!("http://{}/slow?page=1", addr), &Headers::new())
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Timeout { .. }));
    assert!(err.is_retryable());
}
