use shunt_lexer::config::runtime::RuntimeConfig;
use shunt_lexer::lexical::LexDiagnostic;
use shunt_lexer::output::{OutputError, OutputFormat, Render};
use shunt_lexer::pipeline::{self, Pipeline, PipelineError, PipelineOutcome};
use shunt_lexer::tokens::PartialWindowPolicy;
use shunt_lexer::logging::{self, codes};
use std::env;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use tokio::io::AsyncRead;

const EXIT_FAILURE: u8 = 1;
const EXIT_DATA_ERRORS: u8 = 2;

/// Command-line options layered over the runtime configuration
#[derive(Debug)]
struct CliOptions {
    input: String,
    config_file: Option<String>,
    triplets: bool,
    json: bool,
    fill_partial: bool,
    timeout_ms: Option<u64>,
    fail_on_data_error: bool,
    abort_on_data_error: bool,
    no_escape_warnings: bool,
    summary: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("shunt-lexer");

    if args.iter().skip(1).any(|a| a == "--help" || a == "-h") {
        print_help(program);
        return ExitCode::SUCCESS;
    }

    let options = match parse_options(&args[1..]) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("Error: {}", message);
            eprintln!("Usage: {} <input|-> [options]", program);
            eprintln!("       {} --help", program);
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    match run(options).await {
        Ok(code) => code,
        Err(error) => {
            eprintln!("Error: {}", error);
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

async fn run(options: CliOptions) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let runtime = build_runtime_config(&options)?;

    // Logging must be configured before the first event is emitted
    let initialized = logging::config::init_runtime_preferences(runtime.logging.clone())
        .and_then(|()| logging::init_global_logging())
        .and_then(|()| pipeline::validate_pipeline());
    if let Err(message) = initialized {
        logging::report_initialization_failure(&message);
        return Ok(ExitCode::from(EXIT_FAILURE));
    }

    let pipeline = Pipeline::from_runtime(&runtime)?;
    let format = runtime.output.format;

    let result = if options.input == "-" {
        execute(&pipeline, &runtime, tokio::io::stdin(), format).await
    } else {
        let file = match tokio::fs::File::open(Path::new(&options.input)).await {
            Ok(file) => file,
            Err(e) => {
                shunt_lexer::log_error!(
                    codes::source::SOURCE_OPEN_FAILURE,
                    "Cannot open input",
                    "path" => options.input.as_str(),
                    "error" => e
                );
                return Err(format!("Cannot open '{}': {}", options.input, e).into());
            }
        };
        execute(&pipeline, &runtime, file, format).await
    };

    let run = match result {
        Ok(run) => run,
        Err(RunError::Pipeline(error)) => {
            report_pipeline_error(&error);
            return Ok(ExitCode::from(EXIT_FAILURE));
        }
        Err(RunError::Output(error)) => return Err(error.into()),
        Err(RunError::Io(error)) => return Err(error.into()),
    };

    for diagnostic in &run.diagnostics {
        eprintln!("warning: {}", diagnostic);
    }
    if runtime.output.include_summary {
        eprintln!("{}", run.summary_json);
    }

    if options.fail_on_data_error && run.data_errors > 0 {
        return Ok(ExitCode::from(EXIT_DATA_ERRORS));
    }
    Ok(ExitCode::SUCCESS)
}

/// What the CLI needs from a finished run once the items are written
struct RunResult {
    diagnostics: Vec<LexDiagnostic>,
    data_errors: usize,
    summary_json: String,
}

#[derive(Debug, thiserror::Error)]
enum RunError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error(transparent)]
    Output(#[from] OutputError),
    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

async fn execute<R>(
    pipeline: &Pipeline,
    runtime: &RuntimeConfig,
    reader: R,
    format: OutputFormat,
) -> Result<RunResult, RunError>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    if runtime.output.emit_triplets {
        let outcome = pipeline.run_triplets(reader).await?;
        write_items(&outcome, format, "triplets")
    } else {
        let outcome = pipeline.run_tokens(reader).await?;
        write_items(&outcome, format, "tokens")
    }
}

fn write_items<T: Render>(
    outcome: &PipelineOutcome<T>,
    format: OutputFormat,
    mode: &str,
) -> Result<RunResult, RunError> {
    let stdout = std::io::stdout();
    let mut out = std::io::BufWriter::new(stdout.lock());
    for item in &outcome.items {
        writeln!(out, "{}", item.render(format)?)?;
    }
    out.flush()?;

    Ok(RunResult {
        diagnostics: outcome.diagnostics.clone(),
        data_errors: outcome.stats.diagnostics,
        summary_json: outcome
            .summary(mode)
            .to_json()
            .map_err(OutputError::from)?,
    })
}

fn report_pipeline_error(error: &PipelineError) {
    eprintln!("error[{}]: {}", error.error_code().as_str(), error);
    if let PipelineError::TimedOut { .. } = error {
        eprintln!("  hint: raise --timeout-ms if the input is large or arrives slowly");
    }
}

fn build_runtime_config(options: &CliOptions) -> Result<RuntimeConfig, Box<dyn std::error::Error>> {
    let mut runtime = match &options.config_file {
        Some(path) => RuntimeConfig::load_from_file(Path::new(path))?,
        None => RuntimeConfig::default(),
    };

    if options.triplets {
        runtime.output.emit_triplets = true;
    }
    if options.json {
        runtime.output.format = OutputFormat::Json;
    }
    if options.fill_partial {
        runtime.pipeline.partial_windows = PartialWindowPolicy::Fill;
    }
    if let Some(timeout_ms) = options.timeout_ms {
        runtime.pipeline.timeout_ms = timeout_ms;
    }
    if options.abort_on_data_error {
        runtime.pipeline.abort_on_data_error = true;
    }
    if options.no_escape_warnings {
        runtime.lexical.report_unrecognized_escapes = false;
    }
    if options.summary {
        runtime.output.include_summary = true;
    }

    Ok(runtime)
}

fn parse_options(args: &[String]) -> Result<CliOptions, String> {
    let mut input = None;
    let mut options = CliOptions {
        input: String::new(),
        config_file: None,
        triplets: false,
        json: false,
        fill_partial: false,
        timeout_ms: None,
        fail_on_data_error: false,
        abort_on_data_error: false,
        no_escape_warnings: false,
        summary: false,
    };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--triplets" => options.triplets = true,
            "--json" => options.json = true,
            "--fill-partial" => options.fill_partial = true,
            "--fail-on-data-error" => options.fail_on_data_error = true,
            "--abort-on-data-error" => options.abort_on_data_error = true,
            "--no-escape-warnings" => options.no_escape_warnings = true,
            "--summary" => options.summary = true,
            "--timeout-ms" => {
                let value = args.get(i + 1).ok_or("--timeout-ms requires a number")?;
                let timeout = value
                    .parse::<u64>()
                    .map_err(|_| format!("Invalid timeout '{}'", value))?;
                options.timeout_ms = Some(timeout);
                i += 1;
            }
            "--config" => {
                let value = args.get(i + 1).ok_or("--config requires a file path")?;
                options.config_file = Some(value.clone());
                i += 1;
            }
            "-" => input = Some("-".to_string()),
            flag if flag.starts_with("--") => {
                eprintln!("Warning: Unknown option '{}'", flag);
            }
            path => {
                if input.is_some() {
                    return Err(format!("Unexpected extra input '{}'", path));
                }
                input = Some(path.to_string());
            }
        }
        i += 1;
    }

    options.input = input.ok_or("No input given; use '-' for stdin")?;
    Ok(options)
}

fn print_help(program_name: &str) {
    println!("shunt-lexer v{}", env!("CARGO_PKG_VERSION"));
    println!("Streaming expression tokenizer");
    println!();
    println!("USAGE:");
    println!("    {} <input> [options]      # Tokenize a file", program_name);
    println!("    {} - [options]            # Tokenize stdin", program_name);
    println!();
    println!("OPTIONS:");
    println!("    --help                  Show this help message");
    println!("    --triplets              Emit three-token windows instead of tokens");
    println!("    --json                  Emit JSON lines instead of tab-separated records");
    println!("    --fill-partial          Emit windows before three tokens, padding with filler");
    println!("    --timeout-ms N          Abort the run after N milliseconds");
    println!("    --fail-on-data-error    Exit with status 2 if any data error was reported");
    println!("    --abort-on-data-error   Cancel the run at the first data error");
    println!("    --no-escape-warnings    Do not report unrecognized escapes in strings");
    println!("    --summary               Print a JSON run summary to stderr");
    println!("    --config FILE           Load runtime preferences from a TOML file");
    println!();
    println!("OUTPUT:");
    println!("    Records: <LABEL>\\t<escaped text>, one per line; triplets join three with '|'");
    println!("    Labels:  OPRND FUNCT BRLFT BRGHT COMMA SEMICOLON BLKST BLKEND");
    println!("             DEREF STRNG OPER UNARY BLANK EOS");
    println!("             FILL marks window slots before the first token (--fill-partial)");
    println!("    JSON:    non-UTF-8 text also carries its raw values in \"bytes\"");
    println!();
    println!("EXIT STATUS:");
    println!("    0  success");
    println!("    1  fatal pipeline error, timeout or cancellation");
    println!("    2  data errors reported and --fail-on-data-error given");
    println!();

    let pipeline_info = pipeline::get_pipeline_info();
    println!("PIPELINE:");
    for line in pipeline_info.report().lines() {
        println!("    {}", line);
    }
}
