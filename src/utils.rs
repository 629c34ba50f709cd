use std::io::{self, Read, Seek, SeekFrom};

/// Reads exactly `buffer.len()` bytes from a reader at a given byte offset.
///
/// # Arguments
///
/// - `reader`: The image to read from.
/// - `offset`: The offset in bytes where the read starts.
/// - `buffer`: The buffer to fill.
///
/// # Errors
///
/// Returns an `io::Error` of kind `UnexpectedEof` if the image ends before the buffer is full.
pub fn read_at<T: Read + Seek>(reader: &mut T, offset: u64, buffer: &mut [u8]) -> io::Result<()> {
    reader.seek(SeekFrom::Start(offset))?;

    reader.read_exact(buffer).map_err(|err| {
        io::Error::new(
            err.kind(),
            format!(
                "Failed to read {} bytes at offset {offset}: {err}",
                buffer.len()
            ),
        )
    })
}

/// Reads at most `len` bytes from a reader at a given byte offset.
///
/// Unlike [`read_at`], a read that reaches the end of the image is not an error: the returned
/// vector is simply shorter than `len` (possibly empty).
///
/// # Arguments
///
/// - `reader`: The image to read from.
/// - `offset`: The offset in bytes where the read starts.
/// - `len`: The maximum count of bytes to read.
pub fn read_up_to<T: Read + Seek>(reader: &mut T, offset: u64, len: usize) -> io::Result<Vec<u8>> {
    reader.seek(SeekFrom::Start(offset))?;

    let mut buffer = Vec::with_capacity(len);
    reader.take(len as u64).read_to_end(&mut buffer)?;

    Ok(buffer)
}

/// Returns the length in bytes of the image, leaving the cursor at its start.
pub fn stream_len<T: Seek>(reader: &mut T) -> io::Result<u64> {
    let len = reader.seek(SeekFrom::End(0))?;
    reader.seek(SeekFrom::Start(0))?;
    Ok(len)
}
