/// Number of bytes needed to pad `len` up to a 32-bit boundary.
pub(crate) fn get_padding_size(len: usize) -> usize {
    if len % 4 == 0 { 0 } else { 4 - (len % 4) }
}

/// Writes RFC 3550 padding: zeros, with the pad count in the last byte.
pub(crate) fn put_padding(buf: &mut [u8], offset: usize, padding_size: usize) {
    if padding_size == 0 {
        return;
    }
    let end = offset + padding_size;
    buf[offset..end].fill(0);
    buf[end - 1] = padding_size as u8;
}
