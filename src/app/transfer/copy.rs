//! Cancellable body copy

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::counting::CountingWriter;
use super::session::TransferSession;
use crate::errors::DownloadResult;

/// Copy `reader` into `writer` in chunks of `buffer_size`, counting bytes into the session.
///
/// Cancellation is checked before every read and also interrupts a read that
/// is waiting for data. Read and write errors are returned as-is; a sink that
/// stops accepting bytes fails with `WriteZero`. Returns the number of bytes
/// copied.
pub async fn copy_with_cancel<R, W>(
    reader: &mut R,
    writer: &mut W,
    session: &TransferSession,
    buffer_size: usize,
) -> DownloadResult<u64>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut buf = vec![0u8; buffer_size.max(1)];
    let mut sink = CountingWriter::new(writer, session.counter());
    let mut copied: u64 = 0;

    loop {
        if session.cancellation().is_cancelled() {
            return Err(session.cancellation_error());
        }

        let n = tokio::select! {
            biased;
            _ = session.cancellation().cancelled() => {
                return Err(session.cancellation_error());
            }
            read = reader.read(&mut buf) => read?,
        };
        if n == 0 {
            return Ok(copied);
        }

        sink.write_all(&buf[..n]).await?;
        copied += n as u64;
    }
}
