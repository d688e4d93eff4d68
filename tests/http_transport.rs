use cra_rs::{Config, HttpTransport, SearchError, Transport, query};
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// Serve exactly one request with `status` and `body`; hands back the request line.
fn serve_once(status: &'static str, body: &'static str) -> (String, mpsc::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut request_line = String::new();
        reader.read_line(&mut request_line).unwrap();
        // Drain headers.
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).unwrap() == 0 || line == "\r\n" {
                break;
            }
        }
        let mut stream = stream;
        write!(
            stream,
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
        .unwrap();
        stream.flush().unwrap();
        let _ = tx.send(request_line.trim_end().to_string());
    });
    (format!("http://{addr}/search"), rx)
}

fn transport_for(endpoint: String) -> HttpTransport {
    let cfg = Config {
        endpoint,
        timeout: Some(Duration::from_secs(5)),
        ..Config::default()
    };
    HttpTransport::new(&cfg).unwrap()
}

#[test]
fn sends_canonical_query_and_decodes_posts() {
    let (endpoint, requests) = serve_once(
        "200 OK",
        r#"{"query":"bitcoin etf","total_results":1,"posts":[{"id":"a1","title":"ETF approved","upvotes":900,"num_comments":80,"relevance_score":0.77}]}"#,
    );
    let transport = transport_for(endpoint);
    let q = query::build("bitcoin etf", Some("3"), Some("25")).unwrap();

    let payload = transport.fetch(&q).unwrap();
    assert_eq!(payload.posts.len(), 1);
    assert_eq!(payload.posts[0].upvotes, 900);

    let request_line = requests.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(
        request_line,
        "GET /search?q=bitcoin%20etf&n=3&upvotes_min=25 HTTP/1.1"
    );
}

#[test]
fn non_success_status_is_transport_error() {
    let (endpoint, _requests) = serve_once("500 Internal Server Error", r#"{"detail":"boom"}"#);
    let transport = transport_for(endpoint);
    let q = query::build("Bitcoin", None, None).unwrap();
    let err = transport.fetch(&q).unwrap_err();
    assert_eq!(err, SearchError::Transport("HTTP error! status: 500".into()));
}

#[test]
fn error_field_on_success_status_is_protocol_error() {
    let (endpoint, _requests) = serve_once("200 OK", r#"{"error":"index not ready"}"#);
    let transport = transport_for(endpoint);
    let q = query::build("Bitcoin", None, None).unwrap();
    let err = transport.fetch(&q).unwrap_err();
    assert_eq!(err, SearchError::Protocol("index not ready".into()));
}

#[test]
fn unreachable_service_is_network_error() {
    // Bind then drop to get a port nobody listens on.
    let port = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let transport = transport_for(format!("http://127.0.0.1:{port}/search"));
    let q = query::build("Bitcoin", None, None).unwrap();
    match transport.fetch(&q) {
        Err(SearchError::Transport(msg)) => assert!(msg.starts_with("network error"), "{msg}"),
        other => panic!("expected transport error, got {other:?}"),
    }
}
