//! End-to-end exchanges: render a request/response with the writer side,
//! then parse the exact same bytes back with the reader side.

use std::io::{BufReader, Cursor};

use hootwire::message::{Method, StatusCode, Version};
use hootwire::reader::{
    body_reader_for, read_headers, read_request_line, read_status_line, resolve_request_framing,
    resolve_response_framing, ReadLimits,
};
use hootwire::writer::MessageWriter;

/// 445 bytes of filler, standing in for the Lorem-ipsum payload spec.md
/// §8 scenario S1/S2 use. Exact content doesn't matter to the codec;
/// only the length and byte-exact round trip do.
fn lorem_ipsum_445() -> Vec<u8> {
    let line = b"Lorem ipsum dolor sit amet, consectetur adipiscing elit. ";
    let mut out = Vec::with_capacity(445);
    while out.len() < 445 {
        let remaining = 445 - out.len();
        out.extend_from_slice(&line[..remaining.min(line.len())]);
    }
    out.truncate(445);
    out
}

#[test]
fn s1_sized_exchange_round_trips_byte_for_byte() {
    let payload = lorem_ipsum_445();
    let mut wire = Vec::new();
    let mut w = MessageWriter::request(&mut wire, &Method::Post, "/hello-world", Version::Http11)
        .unwrap();
    w.headers_mut().append("Host", "test.com").unwrap();
    w.declare_sized(payload.len() as u64).unwrap();
    w.write_body(&payload).unwrap();
    w.close().unwrap();

    let mut r = BufReader::new(Cursor::new(wire));
    let limits = ReadLimits::default();
    let request_line = read_request_line(&mut r, limits).unwrap();
    assert_eq!(request_line.method, Method::Post);
    assert_eq!(request_line.target, "/hello-world");

    let mut headers = read_headers(&mut r, limits).unwrap();
    assert_eq!(headers.first("Host"), Some("test.com"));
    assert_eq!(headers.first("Content-Length"), Some("445"));

    let framing = resolve_request_framing(&mut headers).unwrap();
    let mut body = body_reader_for(&mut r, framing, limits);
    assert_eq!(body.read_all().unwrap(), payload);
    body.close().unwrap();
}

#[test]
fn s2_chunked_request_with_trailer_round_trips() {
    let payload = lorem_ipsum_445();
    let mut wire = Vec::new();
    let mut w = MessageWriter::request(&mut wire, &Method::Get, "/hello-world", Version::Http11)
        .unwrap();
    w.headers_mut().append("Host", "test.com").unwrap();
    w.declare_chunked().unwrap();
    w.trailers_mut().unwrap().append("Test", "123").unwrap();
    w.write_body(&payload).unwrap();
    w.close().unwrap();

    let mut r = BufReader::new(Cursor::new(wire));
    let limits = ReadLimits::default();
    let request_line = read_request_line(&mut r, limits).unwrap();
    assert_eq!(request_line.method, Method::Get);

    let mut headers = read_headers(&mut r, limits).unwrap();
    assert!(headers.has_chunked_transfer_encoding());

    let framing = resolve_request_framing(&mut headers).unwrap();
    let mut body = body_reader_for(&mut r, framing, limits);
    assert_eq!(body.read_all().unwrap(), payload);
    body.close().unwrap();
    assert_eq!(body.trailers().first("Test"), Some("123"));
}

#[test]
fn sized_request_round_trips_byte_for_byte() {
    let mut wire = Vec::new();
    let mut w = MessageWriter::request(&mut wire, &Method::Put, "/resource/1", Version::Http11)
        .unwrap();
    w.headers_mut().append("Host", "example.com").unwrap();
    w.headers_mut()
        .append("Content-Type", "text/plain")
        .unwrap();
    w.declare_sized(11).unwrap();
    w.write_body(b"hello ").unwrap();
    w.write_body(b"world").unwrap();
    w.close().unwrap();

    let mut r = BufReader::new(Cursor::new(wire));
    let limits = ReadLimits::default();
    let request_line = read_request_line(&mut r, limits).unwrap();
    assert_eq!(request_line.method, Method::Put);
    assert_eq!(request_line.target, "/resource/1");

    let mut headers = read_headers(&mut r, limits).unwrap();
    // Case-insensitive lookup regardless of the casing the writer used.
    assert_eq!(headers.first("host"), Some("example.com"));
    assert_eq!(headers.first("CONTENT-TYPE"), Some("text/plain"));

    let framing = resolve_request_framing(&mut headers).unwrap();
    let mut body = body_reader_for(&mut r, framing, limits);
    assert_eq!(body.read_all().unwrap(), b"hello world");
    body.close().unwrap();
}

#[test]
fn chunked_response_with_trailer_round_trips() {
    let mut wire = Vec::new();
    let mut w = MessageWriter::response(&mut wire, Version::Http11, StatusCode(200), "OK")
        .unwrap();
    w.declare_chunked_with_size(4).unwrap();
    w.trailers_mut()
        .unwrap()
        .append("X-Checksum", "abc123")
        .unwrap();
    w.write_body(b"streamed payload").unwrap();
    w.close().unwrap();

    let mut r = BufReader::new(Cursor::new(wire));
    let limits = ReadLimits::default();
    let status_line = read_status_line(&mut r, limits).unwrap();
    assert_eq!(status_line.status, StatusCode(200));

    let mut headers = read_headers(&mut r, limits).unwrap();
    assert!(headers.has_chunked_transfer_encoding());

    let framing = resolve_response_framing(&Method::Get, status_line.status, &mut headers)
        .unwrap();
    let mut body = body_reader_for(&mut r, framing, limits);
    let data = body.read_all().unwrap();
    assert_eq!(data, b"streamed payload");
    body.close().unwrap();
    assert_eq!(body.trailers().first("X-Checksum"), Some("abc123"));
}

#[test]
fn chunked_framing_wins_even_when_content_length_also_present() {
    // Property 9: when both framing headers are present, chunked wins and
    // Content-Length is stripped before the headers are considered final.
    let mut wire = Vec::new();
    let mut w = MessageWriter::response(&mut wire, Version::Http11, StatusCode(200), "OK")
        .unwrap();
    w.headers_mut()
        .append("Content-Length", "999")
        .unwrap();
    w.declare_chunked().unwrap();
    w.write_body(b"hi").unwrap();
    w.close().unwrap();

    let mut r = BufReader::new(Cursor::new(wire));
    let limits = ReadLimits::default();
    let status_line = read_status_line(&mut r, limits).unwrap();
    let mut headers = read_headers(&mut r, limits).unwrap();
    assert!(!headers.contains("Content-Length"));

    let framing = resolve_response_framing(&Method::Get, status_line.status, &mut headers)
        .unwrap();
    let mut body = body_reader_for(&mut r, framing, limits);
    assert_eq!(body.read_all().unwrap(), b"hi");
    body.close().unwrap();
}

#[test]
fn head_response_has_no_body_even_with_content_length() {
    let mut wire = Vec::new();
    let mut w = MessageWriter::response(&mut wire, Version::Http11, StatusCode(200), "OK")
        .unwrap();
    w.headers_mut().append("Content-Length", "500").unwrap();
    w.close().unwrap();

    let mut r = BufReader::new(Cursor::new(wire));
    let limits = ReadLimits::default();
    let status_line = read_status_line(&mut r, limits).unwrap();
    let mut headers = read_headers(&mut r, limits).unwrap();
    let framing = resolve_response_framing(&Method::Head, status_line.status, &mut headers)
        .unwrap();
    let mut body = body_reader_for(&mut r, framing, limits);
    assert_eq!(body.read_all().unwrap(), Vec::<u8>::new());
}
