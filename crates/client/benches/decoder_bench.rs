use bytes::BytesMut;
use criterion::{Criterion, criterion_group, criterion_main};
use http::Method;
use micro_http_client::codec::{ChunkSizeDecoder, HeadEncoder, HeadLine, HeaderDecoder, StatusLineDecoder};
use micro_http_client::config::ClientConfig;
use micro_http_client::connection::HttpConnection;
use micro_http_client::transport::{ConnectTarget, Connector, Io};
use std::{
    hint::black_box,
    io,
    pin::Pin,
    task::{Context, Poll},
};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio_util::codec::{Decoder, Encoder};

// Mock IO replaying a canned response
struct MockIO {
    read_data: &'static [u8],
    read_pos: usize,
}

impl AsyncRead for MockIO {
    fn poll_read(mut self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        let remaining = &self.read_data[self.read_pos..];
        let amt = std::cmp::min(remaining.len(), buf.remaining());
        buf.put_slice(&remaining[..amt]);
        self.read_pos += amt;
        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for MockIO {
    fn poll_write(self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &[u8]) -> Poll<Result<usize, io::Error>> {
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), io::Error>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), io::Error>> {
        Poll::Ready(Ok(()))
    }
}

impl Io for MockIO {}

#[derive(Clone, Copy)]
struct MockConnector(&'static [u8]);

impl Connector for MockConnector {
    type Io = MockIO;

    async fn connect(&self, _target: &ConnectTarget) -> io::Result<Self::Io> {
        Ok(MockIO { read_data: self.0, read_pos: 0 })
    }
}

const CHUNKED_RESPONSE: &[u8] = b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nTransfer-Encoding: chunked\r\n\r\n\
    4\r\nWiki\r\n5\r\npedia\r\nE\r\n in\r\n\r\nchunks.\r\n0\r\n\r\n";

fn bench_head_decoder(c: &mut Criterion) {
    let head = b"HTTP/1.1 200 OK\r\nServer: bench\r\nContent-Type: text/plain\r\nContent-Length: 12\r\n\r\n";

    c.bench_function("decode_response_head", |b| {
        b.iter(|| {
            let mut bytes = BytesMut::from(&head[..]);
            black_box(StatusLineDecoder::new(65536).decode(&mut bytes).unwrap());
            black_box(HeaderDecoder::new(65536, 100).decode(&mut bytes).unwrap());
        });
    });
}

fn bench_chunk_size_decoder(c: &mut Criterion) {
    c.bench_function("decode_chunk_size", |b| {
        b.iter(|| {
            let mut bytes = BytesMut::from(&b"1fa0;name=value\r\n"[..]);
            black_box(ChunkSizeDecoder::new(65536).decode(&mut bytes).unwrap());
        });
    });
}

fn bench_head_encoder(c: &mut Criterion) {
    c.bench_function("encode_request_head", |b| {
        b.iter(|| {
            let mut bytes = BytesMut::new();
            let mut encoder = HeadEncoder;
            encoder.encode(HeadLine::Request { method: &Method::GET, target: "/index.html" }, &mut bytes).unwrap();
            encoder.encode(HeadLine::Header { name: &b"Host"[..], values: &[&b"localhost"[..]] }, &mut bytes).unwrap();
            encoder.encode(HeadLine::End, &mut bytes).unwrap();
            black_box(bytes);
        });
    });
}

fn bench_chunked_exchange(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("chunked_exchange", |b| {
        b.to_async(&runtime).iter(|| async {
            let connector = MockConnector(CHUNKED_RESPONSE);
            let mut connection =
                HttpConnection::with_config("localhost", None, ClientConfig::default(), connector).unwrap();
            connection.request(&Method::GET, "/", None, &[]).await.unwrap();
            let mut response = connection.get_response().await.unwrap();
            black_box(response.read(None).await.unwrap());
        });
    });
}

criterion_group!(benches, bench_head_decoder, bench_chunk_size_decoder, bench_head_encoder, bench_chunked_exchange);
criterion_main!(benches);
