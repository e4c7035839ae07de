//! Byte lookahead stage

use super::{StageError, StageReport, LOOKAHEAD_STAGE};
use crate::channel::{StageReceiver, StageSender};
use crate::logging::codes;
use crate::log_success;
use crate::tokens::{CharEvent, CharFrame, Lookahead};

/// Reframe byte chunks into one `(current, next)` frame per byte.
///
/// The last frame carries [`Lookahead::End`], and a single
/// [`CharEvent::End`] follows it once the byte channel closes.
pub async fn run_lookahead(
    mut input: StageReceiver<Vec<u8>>,
    output: StageSender<CharEvent>,
) -> Result<StageReport, StageError> {
    let (mut report, started) = StageReport::start(LOOKAHEAD_STAGE);
    let mut pending: Option<u8> = None;

    while let Some(chunk) = input.recv().await? {
        report.items_in += chunk.len();
        for byte in chunk {
            if let Some(current) = pending.replace(byte) {
                output
                    .send(CharEvent::Frame(CharFrame::new(current, Lookahead::Byte(byte))))
                    .await?;
                report.items_out += 1;
            }
        }
    }

    if let Some(current) = pending {
        output
            .send(CharEvent::Frame(CharFrame::new(current, Lookahead::End)))
            .await?;
        report.items_out += 1;
    }
    output.send(CharEvent::End).await?;

    log_success!(codes::success::LOOKAHEAD_COMPLETE, "Lookahead framing complete",
        "frames" => report.items_out
    );
    Ok(report.finish(started))
}
