//! HTTP Client Tests
//!
//! Exercise the real streaming clients against a minimal one-shot HTTP
//! responder on a loopback socket, checking what goes over the wire and how
//! each kind of response surfaces on the stream.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::time::timeout;

use ragchat_core::{
    run_upload, ChatBackend, ChatEvent, ChatItem, ChatStreamClient, ConversationStore,
    PromptTemplate, StreamError, UploadBackend, UploadFile, UploadState, UploadStreamClient,
    ERROR_STATUS,
};

const TEST_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// One-shot Responder
// ============================================================================

/// The request as seen by the responder
struct CapturedRequest {
    head: String,
    body: Vec<u8>,
}

impl CapturedRequest {
    fn header(&self, name: &str) -> Option<String> {
        self.head.lines().find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case(name)
                .then(|| value.trim().to_string())
        })
    }

    fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

async fn read_request(socket: &mut TcpStream) -> CapturedRequest {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.unwrap();
        assert!(n > 0, "client closed before sending headers");
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = find_subsequence(&buf, b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let content_length = head
        .lines()
        .find_map(|line| {
            let (key, value) = line.split_once(':')?;
            if key.trim().eq_ignore_ascii_case("content-length") {
                value.trim().parse::<usize>().ok()
            } else {
                None
            }
        })
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    CapturedRequest {
        head,
        body: buf[header_end..].to_vec(),
    }
}

/// Serve exactly one request with `response`
///
/// With `hold_open` the socket stays open after the response is written,
/// so the body never reaches EOF.
async fn serve_once(
    response: String,
    hold_open: bool,
) -> (String, oneshot::Receiver<CapturedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;
        let _ = tx.send(request);
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.flush().await.unwrap();
        if hold_open {
            tokio::time::sleep(Duration::from_secs(60)).await;
        } else {
            let _ = socket.shutdown().await;
        }
    });

    (base_url, rx)
}

fn event_stream_response(lines: &[&str]) -> String {
    let mut response = String::from(
        "HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\nConnection: close\r\n\r\n",
    );
    for line in lines {
        response.push_str(line);
        response.push('\n');
    }
    response
}

fn chat_client(base_url: &str) -> ChatStreamClient {
    ChatStreamClient::new(
        base_url,
        "secret-token",
        PromptTemplate::default(),
        reqwest::Client::new(),
    )
}

async fn collect_chat(client: &ChatStreamClient, query: &str) -> Vec<ChatItem> {
    let mut rx = client.send_query(query).await;
    let mut items = Vec::new();
    timeout(TEST_TIMEOUT, async {
        while let Some(item) = rx.recv().await {
            items.push(item);
        }
    })
    .await
    .expect("stream did not end");
    items
}

// ============================================================================
// Chat Client
// ============================================================================

#[tokio::test]
async fn test_chat_request_shape() {
    let (base_url, captured) = serve_once(
        event_stream_response(&[r#"data: {"type":"done"}"#]),
        false,
    )
    .await;

    let items = collect_chat(&chat_client(&base_url), "Thủ đô là gì?").await;
    assert_eq!(items, vec![Ok(ChatEvent::Done)]);

    let request = captured.await.unwrap();
    assert!(request.head.starts_with("POST /api/v1/ask HTTP/1.1"));
    assert_eq!(request.header("authorization").as_deref(), Some("Bearer secret-token"));
    assert_eq!(request.header("accept").as_deref(), Some("text/event-stream"));

    let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
    let question = body["question"].as_str().unwrap();
    assert_eq!(question, PromptTemplate::default().render("Thủ đô là gì?"));
}

#[tokio::test]
async fn test_chat_stream_decodes_events_in_order() {
    let (base_url, _captured) = serve_once(
        event_stream_response(&[
            r#"data: {"type":"status","data":"Retrieving"}"#,
            "",
            r#"data: {"type":"source","data":"faq.pdf"}"#,
            ": keep-alive",
            r#"data: {"type":"answer_part","data":"Hà "}"#,
            r#"data: {"type":"answer_part","data":"Nội"}"#,
            r#"data: {"type":"done"}"#,
        ]),
        false,
    )
    .await;

    let items = collect_chat(&chat_client(&base_url), "q").await;
    assert_eq!(
        items,
        vec![
            Ok(ChatEvent::Status("Retrieving".to_string())),
            Ok(ChatEvent::Source("faq.pdf".to_string())),
            Ok(ChatEvent::AnswerPart("Hà ".to_string())),
            Ok(ChatEvent::AnswerPart("Nội".to_string())),
            Ok(ChatEvent::Done),
        ]
    );
}

#[tokio::test]
async fn test_chat_stops_after_terminal_event() {
    let (base_url, _captured) = serve_once(
        event_stream_response(&[
            r#"data: {"type":"generation_error","data":"OOM"}"#,
            r#"data: {"type":"answer_part","data":"late"}"#,
        ]),
        true,
    )
    .await;

    let items = collect_chat(&chat_client(&base_url), "q").await;
    assert_eq!(items, vec![Ok(ChatEvent::GenerationError("OOM".to_string()))]);
}

#[tokio::test]
async fn test_chat_non_success_status_is_single_error() {
    let response = "HTTP/1.1 401 Unauthorized\r\nContent-Length: 12\r\nConnection: close\r\n\r\nbad token!!!";
    let (base_url, _captured) = serve_once(response.to_string(), false).await;

    let items = collect_chat(&chat_client(&base_url), "q").await;
    assert_eq!(
        items,
        vec![Err(StreamError::Status {
            status: 401,
            body: "bad token!!!".to_string(),
        })]
    );
}

#[tokio::test]
async fn test_chat_connection_refused() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let items = collect_chat(&chat_client(&base_url), "q").await;
    assert_eq!(items.len(), 1);
    assert!(matches!(items[0], Err(StreamError::Connect(_))));
}

#[tokio::test]
async fn test_chat_connection_refused_commits_error_turn() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let mut store = ConversationStore::new();
    ragchat_core::run_chat(&chat_client(&base_url), &mut store, "q", |_| {}).await;

    let turn = store.get_turn(0).unwrap();
    assert_eq!(turn.status, ERROR_STATUS);
    assert!(turn.reply.content.starts_with("Error: Error connecting to API"));
}

// ============================================================================
// Upload Client
// ============================================================================

#[tokio::test]
async fn test_upload_sends_one_part_per_file() {
    let (base_url, captured) = serve_once(
        event_stream_response(&[r#"data: {"type":"upload_done","data":"2 files"}"#]),
        false,
    )
    .await;
    let client = UploadStreamClient::new(base_url, reqwest::Client::new());
    let files = vec![
        UploadFile::new("a.txt", b"alpha contents".to_vec(), "text/plain"),
        UploadFile::new("b.pdf", b"%PDF-1.7".to_vec(), "application/pdf"),
    ];

    let state = timeout(TEST_TIMEOUT, run_upload(&client, files, |_| {}))
        .await
        .unwrap();
    assert_eq!(state, UploadState::Complete);

    let request = captured.await.unwrap();
    assert!(request.head.starts_with("POST /api/v1/upload HTTP/1.1"));
    assert_eq!(request.header("accept").as_deref(), Some("text/event-stream"));
    assert!(request.header("authorization").is_none());
    assert!(request
        .header("content-type")
        .unwrap()
        .starts_with("multipart/form-data; boundary="));

    let body = request.body_text();
    assert_eq!(body.matches(r#"name="files""#).count(), 2);
    assert!(body.contains(r#"filename="a.txt""#));
    assert!(body.contains(r#"filename="b.pdf""#));
    assert!(body.contains("alpha contents"));
    assert!(body.contains("application/pdf"));
}

#[tokio::test]
async fn test_upload_stops_at_failure() {
    let (base_url, _captured) = serve_once(
        event_stream_response(&[
            r#"data: {"type":"upload_task","data":"Parsing"}"#,
            r#"data: {"type":"upload_task","data":"Embedding"}"#,
            r#"data: {"type":"upload_failed","data":"Embedding failed"}"#,
            r#"data: {"type":"upload_task","data":"late"}"#,
        ]),
        true,
    )
    .await;
    let client = UploadStreamClient::new(base_url, reqwest::Client::new());
    let files = vec![UploadFile::new("a.txt", b"a".to_vec(), "text/plain")];

    let mut rx = client.upload_files(files).await;
    let mut tags = Vec::new();
    timeout(TEST_TIMEOUT, async {
        while let Some(item) = rx.recv().await {
            tags.push(item.unwrap().text());
        }
    })
    .await
    .unwrap();

    assert_eq!(tags, vec!["Parsing", "Embedding", "Embedding failed"]);
}

#[tokio::test]
async fn test_upload_server_error_fails_batch() {
    let response = "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 4\r\nConnection: close\r\n\r\nboom";
    let (base_url, _captured) = serve_once(response.to_string(), false).await;
    let client = UploadStreamClient::new(base_url, reqwest::Client::new());

    let state = timeout(
        TEST_TIMEOUT,
        run_upload(&client, vec![UploadFile::new("a.txt", vec![], "text/plain")], |_| {}),
    )
    .await
    .unwrap();
    assert_eq!(state, UploadState::Failed);
}
