use crate::logging::codes;

/// Validate that the pipeline and its modules are properly configured
pub fn validate_pipeline() -> Result<(), String> {
    crate::log_debug!("Validating pipeline configuration");

    crate::lexical::init_lexical_analysis_logging()?;
    crate::lexical::validate_tokenization()?;

    let pipeline_codes = [
        codes::triplet::TOKEN_AFTER_END_OF_STREAM,
        codes::pipeline::TRUNCATED_STREAM,
        codes::pipeline::STAGE_DISCONNECTED,
        codes::pipeline::STAGE_PANICKED,
        codes::pipeline::PIPELINE_CANCELLED,
        codes::pipeline::PIPELINE_TIMEOUT,
        codes::pipeline::DATA_ERROR_ABORT,
    ];
    for code in pipeline_codes {
        if codes::get_error_metadata(code.as_str()).is_none() {
            return Err(format!(
                "Pipeline error code {} not found in metadata registry",
                code.as_str()
            ));
        }
    }

    super::PipelineConfig::default()
        .validate()
        .map_err(|e| e.to_string())?;

    let info = super::get_pipeline_info();
    crate::log_success!(
        codes::success::SYSTEM_INITIALIZATION_COMPLETED,
        "Pipeline validation succeeded",
        "stages_validated" => info.stages.len(),
        "profile" => info.build_profile
    );

    Ok(())
}
