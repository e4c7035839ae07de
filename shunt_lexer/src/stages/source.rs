//! Byte source stage

use super::{StageError, StageReport, SOURCE_STAGE};
use crate::channel::{CancelToken, StageSender};
use crate::logging::codes;
use crate::{log_success, log_warning};
use std::io::ErrorKind;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Read `reader` to its end in chunks of `chunk_size` bytes.
///
/// End of input is signalled by closing `output`, never by an in-band byte.
/// A read error is logged and treated as end of input.
pub async fn run_source<R>(
    mut reader: R,
    output: StageSender<Vec<u8>>,
    cancel: CancelToken,
    chunk_size: usize,
) -> Result<StageReport, StageError>
where
    R: AsyncRead + Unpin + Send,
{
    let (mut report, started) = StageReport::start(SOURCE_STAGE);
    let chunk_size = chunk_size.max(1);

    loop {
        let mut chunk = vec![0u8; chunk_size];
        let read = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(StageError::Cancelled { stage: SOURCE_STAGE }),
            read = reader.read(&mut chunk) => read,
        };

        match read {
            Ok(0) => break,
            Ok(n) => {
                chunk.truncate(n);
                report.items_in += n;
                output.send(chunk).await?;
                report.items_out += 1;
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                log_warning!(code = codes::source::SOURCE_READ_ERROR,
                    "Read failed; treating as end of input",
                    "error" => e,
                    "bytes_read" => report.items_in
                );
                break;
            }
        }
    }

    log_success!(codes::success::SOURCE_DRAINED, "Byte source drained",
        "bytes" => report.items_in
    );
    Ok(report.finish(started))
}
