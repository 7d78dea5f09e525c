//! HTTP tests for the apilayer provider against a local one-shot server.
//!
//! The server answers each accepted connection with the next canned
//! response and hands the raw request back to the test for inspection.

use chrono::NaiveDate;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use tap_exchangerates_core::data::retry::no_jitter;
use tap_exchangerates_core::data::{ApilayerProvider, FetchError, RateProvider, RetryPolicy};
use tap_exchangerates_core::ExchangeSpec;

const OK_BODY: &str = r#"{"success":true,"historical":true,"base":"USD","date":"2024-01-01","rates":{"EUR":0.9,"GBP":0.8}}"#;

struct CannedServer {
    base_url: String,
    requests: mpsc::Receiver<String>,
}

/// Serve `responses` in order, one per connection, then stop.
fn serve(responses: Vec<(u16, &'static str)>) -> CannedServer {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        for (status, body) in responses {
            let (mut stream, _) = listener.accept().unwrap();
            let request = read_request_head(&stream);
            let _ = tx.send(request);

            let reason = match status {
                200 => "OK",
                403 => "Forbidden",
                429 => "Too Many Requests",
                503 => "Service Unavailable",
                _ => "Status",
            };
            let response = format!(
                "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();
        }
    });

    CannedServer {
        base_url: format!("http://{addr}"),
        requests: rx,
    }
}

fn read_request_head(stream: &std::net::TcpStream) -> String {
    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let mut head = String::new();
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).unwrap() == 0 || line == "\r\n" {
            break;
        }
        head.push_str(&line);
    }
    head
}

fn exchange() -> ExchangeSpec {
    ExchangeSpec {
        base: "USD".into(),
        symbols: vec!["EUR".into(), "GBP".into()],
    }
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn provider(server: &CannedServer) -> ApilayerProvider {
    ApilayerProvider::new("secret-key")
        .unwrap()
        .with_base_url(server.base_url.clone())
        .with_retry_policy(
            RetryPolicy::constant(Duration::from_millis(5)).with_jitter(no_jitter),
        )
}

#[test]
fn sends_date_path_query_and_apikey_header() {
    let server = serve(vec![(200, OK_BODY)]);
    let payload = provider(&server).fetch(date(), &exchange()).unwrap();

    assert_eq!(payload.base, "USD");
    assert_eq!(payload.date, "2024-01-01");
    assert_eq!(payload.rate("EUR"), Some(0.9));
    assert_eq!(payload.raw["success"], serde_json::json!(true));

    let request = server.requests.recv().unwrap();
    let request_line = request.lines().next().unwrap();
    assert!(
        request_line.starts_with("GET /2024-01-01?base=USD&symbols=EUR%2CGBP "),
        "unexpected request line: {request_line}"
    );
    assert!(request
        .lines()
        .any(|l| l.eq_ignore_ascii_case("apikey: secret-key")));
}

#[test]
fn retries_server_errors_until_success() {
    let server = serve(vec![
        (503, "{}"),
        (503, "{}"),
        (503, "{}"),
        (503, "{}"),
        (200, OK_BODY),
    ]);
    let payload = provider(&server).fetch(date(), &exchange()).unwrap();

    assert_eq!(payload.rates.len(), 2);
    assert_eq!(server.requests.try_iter().count(), 5);
}

#[test]
fn rate_limit_is_retried() {
    let server = serve(vec![(429, "{}"), (200, OK_BODY)]);
    assert!(provider(&server).fetch(date(), &exchange()).is_ok());
}

#[test]
fn exhausted_retries_surface_last_error() {
    let server = serve(vec![
        (503, "down"),
        (503, "down"),
        (503, "down"),
        (503, "down"),
        (503, "still down"),
    ]);
    let err = provider(&server).fetch(date(), &exchange()).unwrap_err();

    match err {
        FetchError::Http { status, body, url } => {
            assert_eq!(status, 503);
            assert_eq!(body, "still down");
            assert!(url.contains("/2024-01-01?base=USD"));
        }
        other => panic!("expected HTTP error, got {other:?}"),
    }
    assert_eq!(server.requests.try_iter().count(), 5);
}

#[test]
fn client_errors_are_not_retried() {
    let server = serve(vec![(403, r#"{"message":"Invalid authentication credentials"}"#)]);
    let err = provider(&server).fetch(date(), &exchange()).unwrap_err();

    assert!(matches!(err, FetchError::Http { status: 403, .. }));
    assert!(!err.is_retryable());
    assert_eq!(server.requests.try_iter().count(), 1);
}

#[test]
fn integer_and_null_rates_decode() {
    let body = r#"{"success":true,"base":"USD","date":"2024-01-01","rates":{"JPY":150,"XXX":null}}"#;
    let server = serve(vec![(200, body)]);
    let payload = provider(&server).fetch(date(), &exchange()).unwrap();

    assert_eq!(payload.rate("JPY"), Some(150.0));
    assert_eq!(payload.rates["XXX"], None);
    assert_eq!(payload.raw, serde_json::from_str::<serde_json::Value>(body).unwrap());
}

#[test]
fn malformed_body_is_a_decode_error() {
    let server = serve(vec![(200, "<html>maintenance</html>")]);
    let err = provider(&server).fetch(date(), &exchange()).unwrap_err();
    assert!(matches!(err, FetchError::Decode { .. }));
}
