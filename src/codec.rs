use thiserror::Error;

use crate::shared_types::Address;

pub(crate) const RECORD_DELIMITER: u8 = b'\n';
pub(crate) const OCTET_DELIMITER: u8 = b'.';

/// `255.255.255.255\n`
pub(crate) const MAX_RECORD_LEN: usize = 16;
/// `0.0.0.0\n`
pub(crate) const MIN_RECORD_LEN: usize = 8;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ParseErrorKind {
    #[error("unexpected byte {0:#04x}")]
    InvalidByte(u8),
    #[error("empty octet")]
    EmptyOctet,
    #[error("octet has more than 3 digits")]
    TooManyDigits,
    #[error("octet value {0} is above 255")]
    OctetOutOfRange(u16),
    #[error("record does not have exactly four octets")]
    WrongOctetCount,
    #[error("record is not terminated")]
    Truncated,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("malformed record at byte {offset} of chunk: {kind}")]
pub(crate) struct ParseError {
    pub(crate) offset: usize,
    pub(crate) kind: ParseErrorKind,
}

/// Accumulates decimal digits from `index` up to the next `.` or newline.
///
/// Returns the index just past the terminator. The input is trusted: there is
/// no bounds or digit validation, and an octet above 255 wraps.
#[inline(always)]
pub(crate) fn parse_octet_run(buf: &[u8], mut index: usize) -> (usize, u8) {
    let mut value: u8 = 0;
    loop {
        let byte = buf[index];
        index += 1;
        if byte == OCTET_DELIMITER || byte == RECORD_DELIMITER {
            return (index, value);
        }
        value = value.wrapping_mul(10).wrapping_add(byte.wrapping_sub(b'0'));
    }
}

/// Parses one `a.b.c.d\n` record starting at `index` into `(a<<24)|(b<<16)|(c<<8)|d`.
///
/// Returns the index just past the record delimiter so the caller can keep
/// scanning the same buffer.
#[inline(always)]
pub(crate) fn parse_address(buf: &[u8], index: usize) -> (usize, Address) {
    let (index, a) = parse_octet_run(buf, index);
    let (index, b) = parse_octet_run(buf, index);
    let (index, c) = parse_octet_run(buf, index);
    let (index, d) = parse_octet_run(buf, index);
    (index, u32::from_be_bytes([a, b, c, d]))
}

/// Bounds-checked counterpart of [`parse_address`] used in strict mode.
pub(crate) fn parse_address_checked(
    buf: &[u8],
    start: usize,
) -> Result<(usize, Address), ParseError> {
    let fail = |kind| ParseError {
        offset: start,
        kind,
    };

    let mut index = start;
    let mut address: Address = 0;
    for octet in 0..4 {
        let terminator = if octet == 3 {
            RECORD_DELIMITER
        } else {
            OCTET_DELIMITER
        };
        let mut value: u16 = 0;
        let mut digits = 0;
        loop {
            let Some(&byte) = buf.get(index) else {
                return Err(fail(ParseErrorKind::Truncated));
            };
            index += 1;
            match byte {
                b'0'..=b'9' => {
                    digits += 1;
                    if digits > 3 {
                        return Err(fail(ParseErrorKind::TooManyDigits));
                    }
                    value = value * 10 + (byte - b'0') as u16;
                }
                b if b == terminator => break,
                OCTET_DELIMITER | RECORD_DELIMITER => {
                    return Err(fail(ParseErrorKind::WrongOctetCount))
                }
                other => return Err(fail(ParseErrorKind::InvalidByte(other))),
            }
        }
        if digits == 0 {
            return Err(fail(ParseErrorKind::EmptyOctet));
        }
        if value > u8::MAX as u16 {
            return Err(fail(ParseErrorKind::OctetOutOfRange(value)));
        }
        address = (address << 8) | value as Address;
    }
    Ok((index, address))
}
