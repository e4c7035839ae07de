//! Concurrent tokenizer pipeline
//!
//! ```text
//! reader -> source -> lookahead -> lexer -> [triplet] -> caller
//!                                    \-> diagnostics collector
//! ```
//!
//! Each stage runs as its own tokio task connected by bounded channels. A
//! fatal error in any stage cancels the rest; the first non-secondary fatal
//! error is what the caller sees. The `run_*` methods bound the whole run by
//! the configured timeout and cancel it on expiry.

mod config;
mod error;
mod info;
mod result;
mod stats;
mod validation;

pub use config::{ChannelCapacities, PipelineConfig};
pub use error::{FatalError, PipelineError, StageError};
pub use info::{get_pipeline_info, PipelineInfo};
pub use result::{PipelineOutcome, PipelineReport, RunSummary};
pub use stats::PipelineStats;
pub use validation::validate_pipeline;

use crate::channel::{stage_channel, CancellationSource, StageReceiver};
use crate::config::runtime::RuntimeConfig;
use crate::lexical::LexDiagnostic;
use crate::logging::codes;
use crate::stages::{
    self, LexerStageOutput, StageReport, DIAGNOSTICS_STAGE, LEXER_STAGE, LOOKAHEAD_STAGE,
    SOURCE_STAGE, TRIPLET_STAGE,
};
use crate::tokens::{Token, TripletWindow};
use crate::log_error;
use std::future::Future;
use std::time::Instant;
use tokio::io::AsyncRead;
use tokio::task::{JoinError, JoinHandle};

type StageTask<T> = JoinHandle<Result<T, StageError>>;

/// Tokenizer pipeline factory. Must be used inside a tokio runtime.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn from_runtime(runtime: &RuntimeConfig) -> Result<Self, PipelineError> {
        Ok(Self {
            config: PipelineConfig::from_runtime(runtime)?,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Start a run whose output is the token stream
    pub fn spawn_tokens<R>(&self, reader: R) -> RunningPipeline<Token>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let started = Instant::now();
        let cancel = CancellationSource::new();
        let (tokens, tasks) = self.spawn_front(reader, &cancel);

        RunningPipeline {
            output: tokens,
            cancel,
            tasks,
            started,
        }
    }

    /// Start a run whose output is the triplet window stream
    pub fn spawn_triplets<R>(&self, reader: R) -> RunningPipeline<TripletWindow>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let started = Instant::now();
        let cancel = CancellationSource::new();
        let (tokens, mut tasks) = self.spawn_front(reader, &cancel);

        let (window_tx, window_rx) =
            stage_channel(self.config.capacities.triplets, &cancel.token(), TRIPLET_STAGE);
        tasks.triplet = Some(spawn_stage(
            TRIPLET_STAGE,
            cancel.clone(),
            stages::run_triplets(tokens, window_tx, self.config.partial_windows),
        ));

        RunningPipeline {
            output: window_rx,
            cancel,
            tasks,
            started,
        }
    }

    /// Tokenize `reader` to completion within the configured timeout
    pub async fn run_tokens<R>(&self, reader: R) -> Result<PipelineOutcome<Token>, PipelineError>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let outcome = self.run_to_completion(self.spawn_tokens(reader)).await?;
        outcome.log_success("tokens");
        Ok(outcome)
    }

    /// Window `reader` to completion within the configured timeout
    pub async fn run_triplets<R>(
        &self,
        reader: R,
    ) -> Result<PipelineOutcome<TripletWindow>, PipelineError>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let outcome = self.run_to_completion(self.spawn_triplets(reader)).await?;
        outcome.log_success("triplets");
        Ok(outcome)
    }

    async fn run_to_completion<T>(
        &self,
        running: RunningPipeline<T>,
    ) -> Result<PipelineOutcome<T>, PipelineError> {
        let cancel = running.canceller();

        match tokio::time::timeout(self.config.timeout, running.collect()).await {
            Ok(result) => result,
            Err(_) => {
                cancel.cancel();
                let after_ms = self.config.timeout_ms();
                log_error!(codes::pipeline::PIPELINE_TIMEOUT, "Pipeline timed out; run cancelled",
                    "after_ms" => after_ms
                );
                Err(PipelineError::TimedOut { after_ms })
            }
        }
    }

    fn spawn_front<R>(
        &self,
        reader: R,
        cancel: &CancellationSource,
    ) -> (StageReceiver<Token>, StageTasks)
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let token = cancel.token();
        let capacities = self.config.capacities;

        let (byte_tx, byte_rx) = stage_channel(capacities.bytes, &token, SOURCE_STAGE);
        let (frame_tx, frame_rx) = stage_channel(capacities.frames, &token, LOOKAHEAD_STAGE);
        let (token_tx, token_rx) = stage_channel(capacities.tokens, &token, LEXER_STAGE);
        let (diag_tx, diag_rx) = stage_channel(capacities.diagnostics, &token, DIAGNOSTICS_STAGE);

        let tasks = StageTasks {
            source: spawn_stage(
                SOURCE_STAGE,
                cancel.clone(),
                stages::run_source(reader, byte_tx, token, self.config.read_chunk_size),
            ),
            lookahead: spawn_stage(
                LOOKAHEAD_STAGE,
                cancel.clone(),
                stages::run_lookahead(byte_rx, frame_tx),
            ),
            lexer: spawn_stage(
                LEXER_STAGE,
                cancel.clone(),
                stages::run_lexer(frame_rx, token_tx, diag_tx, self.config.lexical.clone()),
            ),
            triplet: None,
            diagnostics: tokio::spawn(collect_diagnostics(
                diag_rx,
                cancel.clone(),
                self.config.abort_on_data_error,
                self.config.max_diagnostics,
            )),
        };

        (token_rx, tasks)
    }
}

/// A started run: an output stream plus the handles of its stage tasks.
///
/// Dropping it without [`join`](Self::join) leaves the stages to wind down
/// on their own once they notice the output is gone.
#[derive(Debug)]
pub struct RunningPipeline<T> {
    output: StageReceiver<T>,
    cancel: CancellationSource,
    tasks: StageTasks,
    started: Instant,
}

impl<T> RunningPipeline<T> {
    /// Next output item. `None` once the output closes or the run is
    /// cancelled; [`join`](Self::join) tells which.
    pub async fn recv(&mut self) -> Option<T> {
        self.output.recv().await.ok().flatten()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// A handle that can cancel this run from elsewhere
    pub fn canceller(&self) -> CancellationSource {
        self.cancel.clone()
    }

    /// Wait for every stage and report the run. Output not yet received is
    /// discarded, which surfaces as `StageDisconnected` if a stage was still
    /// sending.
    pub async fn join(self) -> Result<PipelineReport, PipelineError> {
        let RunningPipeline {
            output,
            tasks,
            started,
            ..
        } = self;
        drop(output);
        tasks.join(started).await
    }

    /// Receive every item, then join
    pub async fn collect(mut self) -> Result<PipelineOutcome<T>, PipelineError> {
        let mut items = Vec::new();
        while let Some(item) = self.recv().await {
            items.push(item);
        }
        let report = self.join().await?;
        Ok(PipelineOutcome::new(items, report))
    }
}

#[derive(Debug)]
struct StageTasks {
    source: StageTask<StageReport>,
    lookahead: StageTask<StageReport>,
    lexer: StageTask<LexerStageOutput>,
    triplet: Option<StageTask<StageReport>>,
    diagnostics: JoinHandle<DiagnosticLog>,
}

impl StageTasks {
    async fn join(self, started: Instant) -> Result<PipelineReport, PipelineError> {
        let mut failures = Vec::new();

        let source = settle(SOURCE_STAGE, self.source.await, &mut failures);
        let lookahead = settle(LOOKAHEAD_STAGE, self.lookahead.await, &mut failures);
        let lexer = settle(LEXER_STAGE, self.lexer.await, &mut failures);
        let triplet = match self.triplet {
            Some(task) => settle(TRIPLET_STAGE, task.await, &mut failures),
            None => None,
        };
        let diagnostics = match self.diagnostics.await {
            Ok(log) => log,
            Err(error) => {
                failures.push(join_failure(DIAGNOSTICS_STAGE, error));
                DiagnosticLog::default()
            }
        };

        if let Some(diagnostic) = diagnostics.abort {
            return Err(PipelineError::Data(diagnostic));
        }
        if let Some(error) = root_cause(failures) {
            return Err(error);
        }

        let (Some(source), Some(lookahead), Some(lexer)) = (source, lookahead, lexer) else {
            return Err(PipelineError::Cancelled);
        };

        Ok(PipelineReport {
            stats: PipelineStats {
                bytes: source.items_in,
                frames: lookahead.items_out,
                tokens: lexer.report.items_out,
                windows: triplet.map_or(0, |report| report.items_out),
                diagnostics: diagnostics.total,
                duration: started.elapsed(),
            },
            diagnostics: diagnostics.kept,
            metrics: lexer.metrics,
        })
    }
}

/// Spawn a stage task. A fatal failure is logged and cancels the run.
fn spawn_stage<T, F>(stage: &'static str, cancel: CancellationSource, future: F) -> StageTask<T>
where
    T: Send + 'static,
    F: Future<Output = Result<T, StageError>> + Send + 'static,
{
    tokio::spawn(async move {
        let result = future.await;
        if let Err(StageError::Fatal(error)) = &result {
            log_error!(error.error_code(), &error.to_string(), "stage" => stage);
            cancel.cancel();
        }
        result
    })
}

fn settle<T>(
    stage: &'static str,
    joined: Result<Result<T, StageError>, JoinError>,
    failures: &mut Vec<StageError>,
) -> Option<T> {
    match joined {
        Ok(Ok(value)) => Some(value),
        Ok(Err(error)) => {
            failures.push(error);
            None
        }
        Err(error) => {
            failures.push(join_failure(stage, error));
            None
        }
    }
}

fn join_failure(stage: &'static str, error: JoinError) -> StageError {
    if !error.is_panic() {
        return StageError::Cancelled { stage };
    }

    let payload = error.into_panic();
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string());

    StageError::Fatal(FatalError::StagePanicked { stage, message })
}

/// Primary fatal errors outrank their downstream echoes, which outrank
/// plain cancellation
fn root_cause(failures: Vec<StageError>) -> Option<PipelineError> {
    let mut secondary = None;
    let mut cancelled = false;

    for failure in failures {
        match failure {
            StageError::Fatal(error) if !error.is_secondary() => {
                return Some(PipelineError::Fatal(error))
            }
            StageError::Fatal(error) => {
                secondary.get_or_insert(error);
            }
            StageError::Cancelled { .. } => cancelled = true,
        }
    }

    match secondary {
        Some(error) => Some(PipelineError::Fatal(error)),
        None if cancelled => Some(PipelineError::Cancelled),
        None => None,
    }
}

#[derive(Debug, Default)]
struct DiagnosticLog {
    kept: Vec<LexDiagnostic>,
    total: usize,
    abort: Option<LexDiagnostic>,
}

async fn collect_diagnostics(
    mut input: StageReceiver<LexDiagnostic>,
    cancel: CancellationSource,
    abort_on_data_error: bool,
    limit: usize,
) -> DiagnosticLog {
    let mut log = DiagnosticLog::default();

    while let Ok(Some(diagnostic)) = input.recv().await {
        log.total += 1;
        if log.kept.len() < limit {
            log.kept.push(diagnostic.clone());
        }

        if abort_on_data_error {
            log_error!(codes::pipeline::DATA_ERROR_ABORT, "Aborting run on data error",
                "error" => diagnostic
            );
            log.abort = Some(diagnostic);
            cancel.cancel();
            break;
        }
    }

    log
}
