use std::io;
use std::net::Ipv4Addr;
use std::pin::Pin;
use std::task::{Context, Poll};

use rand::Rng;
use tokio::io::{AsyncRead, ReadBuf};

use crate::shared_types::Address;

/// A byte source whose every read fails.
pub(crate) struct FailingReader;

impl AsyncRead for FailingReader {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Poll::Ready(Err(io::Error::new(io::ErrorKind::Other, "disk on fire")))
    }
}

pub(crate) fn render_records(addresses: &[Address]) -> Vec<u8> {
    let mut out = Vec::with_capacity(addresses.len() * 16);
    for &address in addresses {
        out.extend_from_slice(Ipv4Addr::from(address).to_string().as_bytes());
        out.push(b'\n');
    }
    out
}

pub(crate) fn random_records(count: usize) -> Vec<u8> {
    let mut rng = rand::rng();
    let addresses: Vec<Address> = (0..count).map(|_| rng.random()).collect();
    render_records(&addresses)
}
