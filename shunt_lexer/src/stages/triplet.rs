//! Token triplet stage

use super::{StageError, StageReport, TRIPLET_STAGE};
use crate::channel::{StageReceiver, StageSender};
use crate::logging::codes;
use crate::pipeline::FatalError;
use crate::tokens::{PartialWindowPolicy, Token, TripletRing, TripletWindow};
use crate::log_success;

/// Slide a three-token window over the token stream.
///
/// Stops after the window whose newest slot is EndOfStream. A token channel
/// that closes before EndOfStream is a fatal truncation.
pub async fn run_triplets(
    mut input: StageReceiver<Token>,
    output: StageSender<TripletWindow>,
    policy: PartialWindowPolicy,
) -> Result<StageReport, StageError> {
    let (mut report, started) = StageReport::start(TRIPLET_STAGE);
    let mut ring = TripletRing::new(policy);

    while !ring.is_finished() {
        let token = input
            .recv()
            .await?
            .ok_or(FatalError::TruncatedStream {
                stage: TRIPLET_STAGE,
            })?;
        report.items_in += 1;

        if let Some(window) = ring.push(token)? {
            output.send(window).await?;
            report.items_out += 1;
        }
    }

    if let Some(token) = input.recv().await? {
        ring.push(token)?;
    }

    log_success!(codes::success::TRIPLET_WINDOWING_COMPLETE, "Triplet windowing complete",
        "tokens" => ring.consumed(),
        "windows" => report.items_out
    );
    Ok(report.finish(started))
}
