/// Big-endian packing of the four octets of a dotted-decimal IPv4 address.
pub(crate) type Address = u32;

pub(crate) type ByteCount = u64;

pub(crate) type WorkerId = usize;

/// Outcome of filling one chunk buffer from the byte source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Fill {
    /// One past the last record delimiter in the buffer.
    pub(crate) len: usize,
    /// `false` once the source has nothing left to give.
    pub(crate) more: bool,
}
