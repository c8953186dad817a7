use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream, duplex};

use crate::body::{Outgoing, tunnel};
use crate::h1::Connection;
use crate::http::StatusCode;
use crate::request::Request;
use crate::response::Response;
use crate::server::Config;
use crate::service::{Service, from_fn};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Read one response head, up to and including the blank line.
async fn read_head(client: &mut DuplexStream) -> String {
    let mut head = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        let read = client.read(&mut byte).await.unwrap();
        assert!(
            read > 0,
            "eof before the header block completed: {:?}",
            String::from_utf8_lossy(&head),
        );
        head.push(byte[0]);
        if head.ends_with(b"\r\n\r\n") {
            break;
        }
    }
    String::from_utf8(head).unwrap()
}

fn content_length(head: &str) -> usize {
    head.lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse().unwrap())
        })
        .expect("no content-length header")
}

async fn read_body(client: &mut DuplexStream, len: usize) -> Vec<u8> {
    let mut body = vec![0u8; len];
    client.read_exact(&mut body).await.unwrap();
    body
}

fn spawn_hello(io: DuplexStream) -> tokio::task::JoinHandle<()> {
    let service = Arc::new(from_fn(|_| async {
        Response::new(Outgoing::full("Hello World!"))
    }));
    tokio::spawn(Connection::new(io, service))
}

#[tokio::test]
async fn test_simple_exchange() {
    let (mut client, server) = duplex(4096);
    let task = spawn_hello(server);

    client
        .write_all(b"GET / HTTP/1.1\r\nHost: example.com\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();

    let head = read_head(&mut client).await;
    assert!(head.starts_with("HTTP/1.1 200 OK\r\n"), "head: {head}");
    assert!(head.contains("Content-Length: 12\r\n"), "head: {head}");
    assert!(head.contains("Server: "), "head: {head}");
    assert!(head.contains("Date: "), "head: {head}");
    assert!(!head.to_ascii_lowercase().contains("transfer-encoding"), "head: {head}");

    let body = read_body(&mut client, 12).await;
    assert_eq!(body, b"Hello World!");

    // the response requested close, the connection ends
    let mut rest = Vec::new();
    client.read_to_end(&mut rest).await.unwrap();
    assert!(rest.is_empty());
    task.await.unwrap();
}

#[tokio::test]
async fn test_request_head_normalization() {
    let (mut client, server) = duplex(4096);
    let service = Arc::new(from_fn(|request: Request| async move {
        let uri = request.uri();
        let body = format!(
            "{} {} {} host={} port={:?} connection={}",
            request.method(),
            uri.path(),
            request.version(),
            uri.host(),
            uri.port(),
            request.headers().get("connection").unwrap().as_str(),
        );
        Response::new(Outgoing::full(body))
    }));
    let task = tokio::spawn(Connection::new(server, service));

    client
        .write_all(b"GET / HTTP/1.1\r\nHost: example.com:80\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();

    let head = read_head(&mut client).await;
    let body = read_body(&mut client, content_length(&head)).await;
    // the default port is suppressed from the normalized authority
    assert_eq!(
        body,
        b"GET / HTTP/1.1 host=example.com port=None connection=close",
    );
    task.await.unwrap();
}

#[tokio::test]
async fn test_keep_alive_serves_sequential_requests() {
    let (mut client, server) = duplex(4096);
    let task = spawn_hello(server);

    client
        .write_all(b"GET /first HTTP/1.1\r\nHost: example.com\r\n\r\n")
        .await
        .unwrap();

    let head = read_head(&mut client).await;
    assert!(head.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(!head.to_ascii_lowercase().contains("connection: close"), "head: {head}");
    read_body(&mut client, 12).await;

    // the same connection serves another request
    client
        .write_all(b"GET /second HTTP/1.1\r\nHost: example.com\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();

    let head = read_head(&mut client).await;
    assert!(head.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(head.to_ascii_lowercase().contains("connection: close"), "head: {head}");
    read_body(&mut client, 12).await;

    let mut rest = Vec::new();
    client.read_to_end(&mut rest).await.unwrap();
    assert!(rest.is_empty());
    task.await.unwrap();
}

#[tokio::test]
async fn test_content_length_body_across_fragments() {
    let (mut client, server) = duplex(4096);
    let service = Arc::new(from_fn(|request: Request| async move {
        let body = request.into_body().collect().await.unwrap();
        Response::new(Outgoing::full(body))
    }));
    let task = tokio::spawn(Connection::new(server, service));

    client
        .write_all(b"POST /echo HTTP/1.1\r\nHost: example.com\r\nContent-Length: 11\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    // deliver the body in fragments
    for fragment in [&b"hello"[..], b" ", b"world"] {
        client.write_all(fragment).await.unwrap();
        tokio::task::yield_now().await;
    }

    let head = read_head(&mut client).await;
    assert!(head.starts_with("HTTP/1.1 200 OK\r\n"));
    let body = read_body(&mut client, content_length(&head)).await;
    assert_eq!(body, b"hello world");
    task.await.unwrap();
}

#[tokio::test]
async fn test_chunked_request_body() {
    let (mut client, server) = duplex(4096);
    let service = Arc::new(from_fn(|request: Request| async move {
        assert_eq!(request.body().size_hint(), (0, None));
        let body = request.into_body().collect().await.unwrap();
        Response::new(Outgoing::full(body))
    }));
    let task = tokio::spawn(Connection::new(server, service));

    client
        .write_all(b"POST /echo HTTP/1.1\r\nHost: example.com\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    for fragment in [&b"5\r\nhel"[..], b"lo\r\n6\r\n world", b"\r\n0\r\n\r\n"] {
        client.write_all(fragment).await.unwrap();
        tokio::task::yield_now().await;
    }

    let head = read_head(&mut client).await;
    assert!(head.starts_with("HTTP/1.1 200 OK\r\n"));
    let body = read_body(&mut client, content_length(&head)).await;
    assert_eq!(body, b"hello world");
    task.await.unwrap();
}

#[tokio::test]
async fn test_zero_length_body_ends_immediately() {
    let (mut client, server) = duplex(4096);
    let service = Arc::new(from_fn(|mut request: Request| async move {
        // observable end before any further connection bytes
        let first = request.body_mut().read().await;
        assert!(first.is_none());
        Response::new(Outgoing::full("ok"))
    }));
    let task = tokio::spawn(Connection::new(server, service));

    client
        .write_all(b"POST /none HTTP/1.1\r\nHost: example.com\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();

    let head = read_head(&mut client).await;
    assert!(head.starts_with("HTTP/1.1 200 OK\r\n"));
    task.await.unwrap();
}

#[tokio::test]
async fn test_unread_body_is_drained_for_keep_alive() {
    let (mut client, server) = duplex(4096);
    // the handler never touches the body, close protection: dropping it must
    // not kill the connection
    let task = spawn_hello(server);

    // only part of the declared body is sent with the head, the rest is
    // still in flight when the handler responds
    client
        .write_all(b"POST /upload HTTP/1.1\r\nHost: example.com\r\nContent-Length: 5\r\n\r\nhe")
        .await
        .unwrap();

    let head = read_head(&mut client).await;
    assert!(head.starts_with("HTTP/1.1 200 OK\r\n"));
    read_body(&mut client, 12).await;

    // the engine drains the dropped body and keeps serving: deliver the
    // remainder followed by a health check on the same connection
    client
        .write_all(b"llo")
        .await
        .unwrap();
    client
        .write_all(b"GET /health HTTP/1.1\r\nHost: example.com\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let head = read_head(&mut client).await;
    assert!(head.starts_with("HTTP/1.1 200 OK\r\n"));
    read_body(&mut client, 12).await;
    task.await.unwrap();
}

#[tokio::test]
async fn test_streaming_response_is_chunked() {
    struct Chunks(std::collections::VecDeque<&'static str>);

    impl futures_core::Stream for Chunks {
        type Item = Result<bytes::Bytes, BoxError>;

        fn poll_next(
            mut self: std::pin::Pin<&mut Self>,
            _: &mut std::task::Context<'_>,
        ) -> std::task::Poll<Option<Self::Item>> {
            std::task::Poll::Ready(
                self.0.pop_front().map(|s| Ok(bytes::Bytes::from_static(s.as_bytes()))),
            )
        }
    }

    let (mut client, server) = duplex(4096);
    let service = Arc::new(from_fn(|_| async {
        let chunks = Chunks(["hello", "", " world"].into_iter().collect());
        Response::new(Outgoing::stream(chunks))
    }));
    let task = tokio::spawn(Connection::new(server, service));

    client
        .write_all(b"GET /stream HTTP/1.1\r\nHost: example.com\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();

    let head = read_head(&mut client).await;
    assert!(head.starts_with("HTTP/1.1 200 OK\r\n"), "head: {head}");
    assert!(head.contains("Transfer-Encoding: chunked\r\n"), "head: {head}");
    assert!(!head.to_ascii_lowercase().contains("content-length"), "head: {head}");

    let mut wire = Vec::new();
    client.read_to_end(&mut wire).await.unwrap();
    // the empty chunk contributes nothing, the terminal chunk closes the body
    assert_eq!(wire, b"5\r\nhello\r\n6\r\n world\r\n0\r\n\r\n");
    task.await.unwrap();
}

#[tokio::test]
async fn test_http10_stream_is_close_delimited() {
    struct Once(Option<&'static str>);

    impl futures_core::Stream for Once {
        type Item = Result<bytes::Bytes, BoxError>;

        fn poll_next(
            mut self: std::pin::Pin<&mut Self>,
            _: &mut std::task::Context<'_>,
        ) -> std::task::Poll<Option<Self::Item>> {
            std::task::Poll::Ready(
                self.0.take().map(|s| Ok(bytes::Bytes::from_static(s.as_bytes()))),
            )
        }
    }

    let (mut client, server) = duplex(4096);
    let service = Arc::new(from_fn(|_| async {
        Response::new(Outgoing::stream(Once(Some("plain stream"))))
    }));
    let task = tokio::spawn(Connection::new(server, service));

    client
        .write_all(b"GET / HTTP/1.0\r\n\r\n")
        .await
        .unwrap();

    let head = read_head(&mut client).await;
    assert!(head.starts_with("HTTP/1.0 200 OK\r\n"), "head: {head}");
    let lower = head.to_ascii_lowercase();
    assert!(!lower.contains("transfer-encoding"), "head: {head}");
    assert!(!lower.contains("content-length"), "head: {head}");

    // the body runs to the end of the connection
    let mut body = Vec::new();
    client.read_to_end(&mut body).await.unwrap();
    assert_eq!(body, b"plain stream");
    task.await.unwrap();
}

#[tokio::test]
async fn test_head_suppresses_body_bytes() {
    let (mut client, server) = duplex(4096);
    let service = Arc::new(from_fn(|_| async {
        Response::new(Outgoing::full("abc"))
    }));
    let task = tokio::spawn(Connection::new(server, service));

    client
        .write_all(b"HEAD / HTTP/1.1\r\nHost: example.com\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();

    let head = read_head(&mut client).await;
    assert!(head.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(head.contains("Content-Length: 3\r\n"), "head: {head}");

    // no body bytes follow the head
    let mut rest = Vec::new();
    client.read_to_end(&mut rest).await.unwrap();
    assert!(rest.is_empty(), "unexpected body bytes: {rest:?}");
    task.await.unwrap();
}

#[tokio::test]
async fn test_framing_rejections() {
    async fn reject(request: &[u8], expected: &str, served: &Arc<AtomicBool>) {
        let (mut client, server) = duplex(4096);
        let served = Arc::clone(served);
        let service = Arc::new(from_fn(move |_| {
            served.store(true, Ordering::SeqCst);
            async { Response::new(Outgoing::empty()) }
        }));
        let task = tokio::spawn(Connection::new(server, service));

        client.write_all(request).await.unwrap();
        let head = read_head(&mut client).await;
        assert!(head.starts_with(expected), "expected {expected}, head: {head}");
        assert!(head.contains("Connection: close\r\n"));

        let mut rest = Vec::new();
        client.read_to_end(&mut rest).await.unwrap();
        assert!(rest.is_empty());
        task.await.unwrap();
    }

    let served = Arc::new(AtomicBool::new(false));

    // transfer-encoding together with content-length
    reject(
        b"POST / HTTP/1.1\r\nHost: a\r\nTransfer-Encoding: chunked\r\nContent-Length: 3\r\n\r\n",
        "HTTP/1.1 400 ",
        &served,
    )
    .await;
    // unsupported coding
    reject(
        b"POST / HTTP/1.1\r\nHost: a\r\nTransfer-Encoding: gzip\r\n\r\n",
        "HTTP/1.1 501 ",
        &served,
    )
    .await;
    // duplicate content-length
    reject(
        b"POST / HTTP/1.1\r\nHost: a\r\nContent-Length: 3\r\nContent-Length: 3\r\n\r\n",
        "HTTP/1.1 400 ",
        &served,
    )
    .await;
    // non numeric content-length
    reject(
        b"POST / HTTP/1.1\r\nHost: a\r\nContent-Length: 3x\r\n\r\n",
        "HTTP/1.1 400 ",
        &served,
    )
    .await;
    // unsupported version
    reject(b"GET / HTTP/2.0\r\nHost: a\r\n\r\n", "HTTP/1.1 505 ", &served).await;
    // authority-form outside CONNECT
    reject(b"GET example.com:80 HTTP/1.1\r\nHost: a\r\n\r\n", "HTTP/1.1 400 ", &served).await;
    // asterisk-form outside OPTIONS
    reject(b"GET * HTTP/1.1\r\nHost: a\r\n\r\n", "HTTP/1.1 400 ", &served).await;
    // absolute-form with a fragment
    reject(
        b"GET http://example.com/p#frag HTTP/1.1\r\nHost: a\r\n\r\n",
        "HTTP/1.1 400 ",
        &served,
    )
    .await;
    // host header carrying a full uri
    reject(
        b"GET / HTTP/1.1\r\nHost: http://example.com\r\n\r\n",
        "HTTP/1.1 400 ",
        &served,
    )
    .await;
    // missing host on HTTP/1.1
    reject(b"GET / HTTP/1.1\r\n\r\n", "HTTP/1.1 400 ", &served).await;

    // none of these ever reached the handler
    assert!(!served.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_oversized_header_block() {
    let (mut client, server) = duplex(16 * 1024);
    let service = Arc::new(from_fn(|_| async {
        Response::new(Outgoing::empty())
    }));
    let config = Arc::new(Config {
        max_header_bytes: 512,
        ..Config::default()
    });
    let task = tokio::spawn(Connection::with_config(server, service, config));

    let mut request = Vec::from(&b"GET / HTTP/1.1\r\nHost: example.com\r\n"[..]);
    request.extend_from_slice(format!("X-Filler: {}\r\n\r\n", "x".repeat(1024)).as_bytes());
    client.write_all(&request).await.unwrap();

    let head = read_head(&mut client).await;
    assert!(head.starts_with("HTTP/1.1 431 "), "head: {head}");
    task.await.unwrap();
}

#[tokio::test]
async fn test_handler_failure_yields_bare_500() {
    struct Failing;

    impl Service<Request> for Failing {
        type Response = Response;
        type Error = BoxError;
        type Future = std::future::Ready<Result<Response, BoxError>>;

        fn call(&self, _: Request) -> Self::Future {
            std::future::ready(Err("database exploded: secret dsn".into()))
        }
    }

    let (mut client, server) = duplex(4096);
    let task = tokio::spawn(Connection::new(server, Arc::new(Failing)));

    client
        .write_all(b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n")
        .await
        .unwrap();

    let head = read_head(&mut client).await;
    assert!(head.starts_with("HTTP/1.1 500 "), "head: {head}");
    assert!(head.contains("Content-Length: 0\r\n"), "head: {head}");

    // the cause is never leaked to the client
    let mut rest = Vec::new();
    client.read_to_end(&mut rest).await.unwrap();
    assert!(rest.is_empty());
    task.await.unwrap();
}

#[tokio::test]
async fn test_middleware_stack_as_service() {
    use crate::headers::HeaderValue;
    use crate::middleware::Stack;

    let (mut client, server) = duplex(4096);
    let stack = Stack::builder()
        .wrap(|request, next| async move {
            let mut response = next.run(request).await?;
            response
                .headers_mut()
                .insert("X-Wrapped", HeaderValue::from_static("1"));
            Ok(response)
        })
        .endpoint(|_| async { Response::new(Outgoing::full("stacked")) });
    let task = tokio::spawn(Connection::new(server, Arc::new(stack)));

    client
        .write_all(b"GET / HTTP/1.1\r\nHost: example.com\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();

    let head = read_head(&mut client).await;
    assert!(head.starts_with("HTTP/1.1 200 OK\r\n"), "head: {head}");
    assert!(head.contains("X-Wrapped: 1\r\n"), "head: {head}");
    let body = read_body(&mut client, content_length(&head)).await;
    assert_eq!(body, b"stacked");
    task.await.unwrap();
}

#[tokio::test]
async fn test_upgrade_tunnel_forwards_raw_bytes() {
    let (mut client, server) = duplex(4096);
    let service = Arc::new(from_fn(|_| async {
        let (tunnel_body, stream) = tunnel();
        tokio::spawn(async move {
            // speak the upgraded protocol, a plain echo
            let (mut read, mut write) = tokio::io::split(stream);
            let _ = tokio::io::copy(&mut read, &mut write).await;
        });
        let mut response = Response::new(tunnel_body.into());
        *response.status_mut() = StatusCode::SWITCHING_PROTOCOLS;
        response
    }));
    let task = tokio::spawn(Connection::new(server, service));

    client
        .write_all(b"GET /chat HTTP/1.1\r\nHost: example.com\r\nUpgrade: echo\r\n\r\n")
        .await
        .unwrap();

    let head = read_head(&mut client).await;
    assert!(head.starts_with("HTTP/1.1 101 "), "head: {head}");
    assert!(head.to_ascii_lowercase().contains("connection: upgrade"), "head: {head}");

    // raw bytes flow both ways, no http framing
    client.write_all(b"ping").await.unwrap();
    let echoed = read_body(&mut client, 4).await;
    assert_eq!(echoed, b"ping");

    client.write_all(b"more data").await.unwrap();
    let echoed = read_body(&mut client, 9).await;
    assert_eq!(echoed, b"more data");

    client.shutdown().await.unwrap();
    let mut rest = Vec::new();
    client.read_to_end(&mut rest).await.unwrap();
    assert!(rest.is_empty());
    task.await.unwrap();
}

#[tokio::test]
async fn test_timeout_answers_408() {
    let (mut client, server) = duplex(4096);
    let service = Arc::new(from_fn(|_| async {
        Response::new(Outgoing::empty())
    }));
    let config = Arc::new(Config {
        header_timeout: Some(Duration::from_millis(50)),
        ..Config::default()
    });
    let task = tokio::spawn(Connection::with_config(server, service, config));

    // an idle client never completes its header block
    client.write_all(b"GET / HTT").await.unwrap();

    let head = read_head(&mut client).await;
    assert!(head.starts_with("HTTP/1.1 408 "), "head: {head}");
    task.await.unwrap();
}

#[tokio::test]
async fn test_request_body_error_reaches_the_reader() {
    let (mut client, server) = duplex(4096);
    let service = Arc::new(from_fn(|request: Request| async move {
        let result = request.into_body().collect().await;
        assert!(result.is_err(), "broken chunked framing must fail the body");
        Response::new(Outgoing::full("saw it"))
    }));
    let task = tokio::spawn(Connection::new(server, service));

    client
        .write_all(b"POST / HTTP/1.1\r\nHost: a\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nhelloXX")
        .await
        .unwrap();

    // body errors do not write a response on their own, the handler already
    // owns the exchange and still answers
    let head = read_head(&mut client).await;
    assert!(head.starts_with("HTTP/1.1 200 OK\r\n"), "head: {head}");
    // broken framing poisons the connection
    assert!(head.to_ascii_lowercase().contains("connection: close"), "head: {head}");
    task.await.unwrap();
}
