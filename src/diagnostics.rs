//! Configuration diagnostics.
//!
//! Verifies that every credential and input source needed for a pipeline
//! run is present, without calling any remote service.

use crate::config::Config;

/// Result of a single configuration check.
#[derive(Debug, PartialEq)]
pub enum CheckResult {
    /// Value is present and usable
    Ok,
    /// Value is missing
    Missing,
    /// Value is present but suspicious
    Warning(String),
}

/// Check that a required value is present and non-empty.
fn check_required(value: Option<&str>) -> CheckResult {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => CheckResult::Ok,
        _ => CheckResult::Missing,
    }
}

/// Check that an endpoint is present and uses https.
fn check_endpoint(value: Option<&str>) -> CheckResult {
    match value.map(str::trim) {
        None => CheckResult::Missing,
        Some(v) if v.is_empty() => CheckResult::Missing,
        Some(v) if !v.starts_with("https://") => {
            CheckResult::Warning(format!("endpoint '{}' does not use https", v))
        }
        Some(_) => CheckResult::Ok,
    }
}

/// Exactly one of the two input sources must be set.
fn check_input_source(audio_uri: Option<&str>, container_uri: Option<&str>) -> CheckResult {
    let audio = audio_uri.map(str::trim).filter(|v| !v.is_empty());
    let container = container_uri.map(str::trim).filter(|v| !v.is_empty());
    match (audio, container) {
        (Some(_), Some(_)) => CheckResult::Warning(
            "both AUDIO_URI and CONTAINER_URI are set; set exactly one".to_string(),
        ),
        (None, None) => CheckResult::Missing,
        _ => CheckResult::Ok,
    }
}

/// Print one check line; returns false when the value is missing.
fn report_check(label: &str, hint: &str, result: &CheckResult) -> bool {
    print!("{}: ", label);
    match result {
        CheckResult::Ok => {
            println!("✓ OK");
            true
        }
        CheckResult::Missing => {
            println!("✗ MISSING");
            println!("  {}", hint);
            false
        }
        CheckResult::Warning(msg) => {
            println!("⚠ WARNING: {}", msg);
            true
        }
    }
}

/// Run all configuration checks and print results.
///
/// Returns true when a pipeline run could start with this configuration.
pub fn check_configuration(config: &Config) -> bool {
    println!("Checking configuration...\n");

    let mut ready = true;

    ready &= report_check(
        "Speech key",
        "Set AZURE_SPEECH_KEY or speech.key in the config file",
        &check_required(config.speech.key.as_deref()),
    );
    ready &= report_check(
        "Speech endpoint",
        "Set AZURE_SPEECH_ENDPOINT or speech.endpoint in the config file",
        &check_endpoint(config.speech.endpoint.as_deref()),
    );

    // The input source gets bespoke handling: a conflict is reported as a
    // warning but still blocks a run.
    print!("Input source: ");
    match check_input_source(
        config.speech.audio_uri.as_deref(),
        config.speech.container_uri.as_deref(),
    ) {
        CheckResult::Ok => println!("✓ OK"),
        CheckResult::Missing => {
            println!("✗ MISSING");
            println!("  Set exactly one of AUDIO_URI or CONTAINER_URI");
            ready = false;
        }
        CheckResult::Warning(msg) => {
            println!("⚠ WARNING: {}", msg);
            ready = false;
        }
    }

    ready &= report_check(
        "OpenAI key",
        "Set AZURE_OPENAI_KEY or openai.key in the config file",
        &check_required(config.openai.key.as_deref()),
    );
    ready &= report_check(
        "OpenAI endpoint",
        "Set AZURE_OPENAI_ENDPOINT or openai.endpoint in the config file",
        &check_endpoint(config.openai.endpoint.as_deref()),
    );

    println!("Deployment: ✓ OK ({})", config.openai.deployment);

    println!();
    if ready {
        println!("✓ Configuration complete, ready to run.");
    } else {
        println!("⚠ Configuration incomplete. Fix the items above and try again.");
    }

    ready
}
