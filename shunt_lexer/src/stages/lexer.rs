//! Lexer stage

use super::{StageError, StageReport, LEXER_STAGE};
use crate::channel::{StageReceiver, StageSender};
use crate::config::runtime::LexicalPreferences;
use crate::lexical::{LexDiagnostic, LexerStateMachine, LexicalMetrics};
use crate::logging::codes;
use crate::pipeline::FatalError;
use crate::tokens::{CharEvent, Token};
use crate::log_success;

#[derive(Debug, Clone)]
pub struct LexerStageOutput {
    pub report: StageReport,
    pub metrics: LexicalMetrics,
}

/// Drive a [`LexerStateMachine`] from the frame channel.
///
/// Tokens go to `output` in order, ending with EndOfStream. Data diagnostics
/// go to `diagnostics` as soon as they are raised. A frame channel that
/// closes before [`CharEvent::End`] is a fatal truncation; a frame that
/// arrives after it is a fatal ordering error.
pub async fn run_lexer(
    mut input: StageReceiver<CharEvent>,
    output: StageSender<Token>,
    diagnostics: StageSender<LexDiagnostic>,
    preferences: LexicalPreferences,
) -> Result<LexerStageOutput, StageError> {
    let (mut report, started) = StageReport::start(LEXER_STAGE);
    let mut machine = LexerStateMachine::with_preferences(preferences);
    let mut completed = Vec::new();

    while !machine.is_finished() {
        let event = input
            .recv()
            .await?
            .ok_or(FatalError::TruncatedStream { stage: LEXER_STAGE })?;
        report.items_in += 1;

        machine.feed(event, &mut completed)?;

        for diagnostic in machine.take_diagnostics() {
            diagnostics.send(diagnostic).await?;
        }
        for token in completed.drain(..) {
            output.send(token).await?;
            report.items_out += 1;
        }
    }

    // Anything after End is rejected by the finished machine
    if let Some(event) = input.recv().await? {
        machine.feed(event, &mut completed)?;
    }

    let metrics = machine.into_metrics();
    log_success!(codes::success::TOKENIZATION_COMPLETE, "Tokenization complete",
        "tokens" => metrics.total_tokens,
        "strings" => metrics.string_literals,
        "diagnostics" => metrics.diagnostics
    );

    Ok(LexerStageOutput {
        report: report.finish(started),
        metrics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{stage_channel, CancellationSource};
    use crate::lexical::char_events;
    use crate::tokens::{CharFrame, Lookahead, TokenClass};
    use assert_matches::assert_matches;

    struct Harness {
        frames: StageSender<CharEvent>,
        tokens: StageReceiver<Token>,
        diagnostics: StageReceiver<LexDiagnostic>,
        task: tokio::task::JoinHandle<Result<LexerStageOutput, StageError>>,
    }

    fn start() -> Harness {
        let cancel = CancellationSource::new();
        let token = cancel.token();
        let (frame_tx, frame_rx) = stage_channel(8, &token, "lookahead");
        let (token_tx, token_rx) = stage_channel(64, &token, LEXER_STAGE);
        let (diag_tx, diag_rx) = stage_channel(8, &token, LEXER_STAGE);
        let task = tokio::spawn(run_lexer(
            frame_rx,
            token_tx,
            diag_tx,
            LexicalPreferences::default(),
        ));
        Harness {
            frames: frame_tx,
            tokens: token_rx,
            diagnostics: diag_rx,
            task,
        }
    }

    async fn collect<T>(receiver: &mut StageReceiver<T>) -> Vec<T> {
        let mut items = Vec::new();
        while let Some(item) = receiver.recv().await.unwrap() {
            items.push(item);
        }
        items
    }

    #[tokio::test]
    async fn test_tokens_stream_through() {
        let mut harness = start();
        for event in char_events(b"foo(x)") {
            harness.frames.send(event).await.unwrap();
        }
        drop(harness.frames);

        let tokens = collect(&mut harness.tokens).await;
        let classes: Vec<_> = tokens.iter().map(Token::class).collect();
        assert_eq!(
            classes,
            vec![
                TokenClass::Function,
                TokenClass::LeftBracket,
                TokenClass::Operand,
                TokenClass::RightBracket,
                TokenClass::EndOfStream,
            ]
        );

        let output = harness.task.await.unwrap().unwrap();
        assert_eq!(output.report.items_in, 7);
        assert_eq!(output.report.items_out, 5);
        assert_eq!(output.metrics.count(TokenClass::Function), 1);
    }

    #[tokio::test]
    async fn test_diagnostics_are_forwarded() {
        let mut harness = start();
        for event in char_events(b"'open") {
            harness.frames.send(event).await.unwrap();
        }
        drop(harness.frames);

        let tokens = collect(&mut harness.tokens).await;
        assert_eq!(tokens[0], Token::new(TokenClass::String, "open"));

        let diagnostics = collect(&mut harness.diagnostics).await;
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].error_code(),
            codes::lexical::UNTERMINATED_STRING
        );
        assert!(harness.task.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_missing_end_is_truncation() {
        let mut harness = start();
        harness
            .frames
            .send(CharEvent::Frame(CharFrame::new(b'a', Lookahead::End)))
            .await
            .unwrap();
        drop(harness.frames);

        let tokens = collect(&mut harness.tokens).await;
        assert!(tokens.is_empty());
        assert_matches!(
            harness.task.await.unwrap(),
            Err(StageError::Fatal(FatalError::TruncatedStream { stage: LEXER_STAGE }))
        );
    }

    #[tokio::test]
    async fn test_frame_after_end_is_fatal() {
        let harness = start();
        harness.frames.send(CharEvent::End).await.unwrap();
        harness
            .frames
            .send(CharEvent::Frame(CharFrame::new(b'z', Lookahead::End)))
            .await
            .unwrap();

        assert_matches!(
            harness.task.await.unwrap(),
            Err(StageError::Fatal(FatalError::Lexer(_)))
        );
    }
}
