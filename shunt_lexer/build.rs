// build.rs - TOML-driven constant generation
use std::env;
use std::fs;
use std::path::Path;

#[derive(serde::Deserialize)]
struct CompileTimeConfig {
    lexical: LexicalLimits,
    channels: ChannelLimits,
    pipeline: PipelineLimits,
    logging: LoggingLimits,
}

#[derive(serde::Deserialize)]
struct LexicalLimits {
    max_token_length: usize,
    metrics_buffer_size: usize,
}

#[derive(serde::Deserialize)]
struct ChannelLimits {
    byte_channel_capacity: usize,
    frame_channel_capacity: usize,
    token_channel_capacity: usize,
    triplet_channel_capacity: usize,
    diagnostic_channel_capacity: usize,
    read_chunk_size: usize,
}

#[derive(serde::Deserialize)]
struct PipelineLimits {
    default_timeout_ms: u64,
    max_timeout_ms: u64,
}

#[derive(serde::Deserialize)]
struct LoggingLimits {
    max_error_collection: usize,
    log_buffer_size: usize,
    max_log_message_length: usize,
    security_min_log_level: u8,
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=SHUNT_BUILD_PROFILE");
    println!("cargo:rerun-if-env-changed=SHUNT_CONFIG_DIR");

    let profile = env::var("SHUNT_BUILD_PROFILE").unwrap_or_else(|_| "development".to_string());
    let config_dir = env::var("SHUNT_CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

    // Workspace root is the parent of the shunt_lexer directory
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap();
    let workspace_root = Path::new(&manifest_dir)
        .parent()
        .expect("Could not find workspace root (parent directory)");

    let config_path = workspace_root
        .join(&config_dir)
        .join(format!("{}.toml", profile));

    println!("cargo:rerun-if-changed={}", config_path.display());

    if !config_path.exists() {
        panic!(
            "Configuration file not found: {}\nWorkspace root: {}\nLooking for: {}/{}/{}.toml",
            config_path.display(),
            workspace_root.display(),
            workspace_root.display(),
            config_dir,
            profile
        );
    }

    let config_content = fs::read_to_string(&config_path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", config_path.display(), e));

    let config: CompileTimeConfig = toml::from_str(&config_content)
        .unwrap_or_else(|e| panic!("Invalid TOML in {}: {}", config_path.display(), e));

    validate_limits(&config, &profile);
    generate_constants(&config, &profile);
}

fn validate_limits(config: &CompileTimeConfig, profile: &str) {
    const ABSOLUTE_MAX_TOKEN_LENGTH: usize = 1 << 20;
    const ABSOLUTE_MAX_CHANNEL_CAPACITY: usize = 1 << 20;
    const ABSOLUTE_MAX_TIMEOUT_MS: u64 = 3_600_000;

    if config.lexical.max_token_length == 0
        || config.lexical.max_token_length > ABSOLUTE_MAX_TOKEN_LENGTH
    {
        panic!("LIMITS: max_token_length must be in 1..={}", ABSOLUTE_MAX_TOKEN_LENGTH);
    }

    let capacities = [
        ("byte_channel_capacity", config.channels.byte_channel_capacity),
        ("frame_channel_capacity", config.channels.frame_channel_capacity),
        ("token_channel_capacity", config.channels.token_channel_capacity),
        ("triplet_channel_capacity", config.channels.triplet_channel_capacity),
        ("diagnostic_channel_capacity", config.channels.diagnostic_channel_capacity),
    ];
    for (name, capacity) in capacities {
        // tokio::sync::mpsc::channel panics on a zero capacity
        if capacity == 0 || capacity > ABSOLUTE_MAX_CHANNEL_CAPACITY {
            panic!("LIMITS: {} must be in 1..={}", name, ABSOLUTE_MAX_CHANNEL_CAPACITY);
        }
    }

    if config.channels.read_chunk_size == 0 {
        panic!("LIMITS: read_chunk_size must be positive");
    }

    if config.pipeline.max_timeout_ms > ABSOLUTE_MAX_TIMEOUT_MS {
        panic!("LIMITS: max_timeout_ms exceeds absolute maximum");
    }

    if config.pipeline.default_timeout_ms == 0
        || config.pipeline.default_timeout_ms > config.pipeline.max_timeout_ms
    {
        panic!("LIMITS: default_timeout_ms must be in 1..=max_timeout_ms");
    }

    if config.logging.security_min_log_level > 2 {
        panic!("LIMITS: security_min_log_level too high (max: 2)");
    }

    if profile == "production" && config.pipeline.max_timeout_ms > 600_000 {
        panic!("PRODUCTION: max_timeout_ms too high for production");
    }
}

fn generate_constants(config: &CompileTimeConfig, profile: &str) {
    let out_dir = env::var("OUT_DIR").unwrap();
    let output_path = Path::new(&out_dir).join("constants.rs");

    let constants_code = format!(
        r#"
// Generated compile-time constants from TOML configuration
// Profile: {}
// DO NOT EDIT - Generated by build.rs

pub mod compile_time {{
    pub mod lexical {{
        pub const MAX_TOKEN_LENGTH: usize = {};
        pub const METRICS_BUFFER_SIZE: usize = {};
    }}

    pub mod channels {{
        pub const BYTE_CHANNEL_CAPACITY: usize = {};
        pub const FRAME_CHANNEL_CAPACITY: usize = {};
        pub const TOKEN_CHANNEL_CAPACITY: usize = {};
        pub const TRIPLET_CHANNEL_CAPACITY: usize = {};
        pub const DIAGNOSTIC_CHANNEL_CAPACITY: usize = {};
        pub const READ_CHUNK_SIZE: usize = {};
    }}

    pub mod pipeline {{
        pub const DEFAULT_TIMEOUT_MS: u64 = {};
        pub const MAX_TIMEOUT_MS: u64 = {};
    }}

    pub mod logging {{
        pub const MAX_ERROR_COLLECTION: usize = {};
        pub const LOG_BUFFER_SIZE: usize = {};
        pub const MAX_LOG_MESSAGE_LENGTH: usize = {};
        pub const SECURITY_MIN_LOG_LEVEL: u8 = {};
    }}
}}
"#,
        profile,
        // Lexical
        config.lexical.max_token_length,
        config.lexical.metrics_buffer_size,
        // Channels
        config.channels.byte_channel_capacity,
        config.channels.frame_channel_capacity,
        config.channels.token_channel_capacity,
        config.channels.triplet_channel_capacity,
        config.channels.diagnostic_channel_capacity,
        config.channels.read_chunk_size,
        // Pipeline
        config.pipeline.default_timeout_ms,
        config.pipeline.max_timeout_ms,
        // Logging
        config.logging.max_error_collection,
        config.logging.log_buffer_size,
        config.logging.max_log_message_length,
        config.logging.security_min_log_level,
    );

    fs::write(output_path, constants_code).unwrap();
}
