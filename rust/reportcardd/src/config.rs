//! Sidecar configuration.
//!
//! CLI flags with environment fallbacks. A `.env` file next to the process is
//! loaded before parsing.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_AI_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-pro:generateContent";

/// reportcardd - report-card dashboard sidecar
#[derive(Parser, Debug, Clone)]
#[command(name = "reportcardd")]
#[command(about = "Report-card dashboard sidecar speaking newline-delimited JSON over stdio")]
pub struct Args {
    /// Workspace to open at startup (otherwise selected over IPC)
    #[arg(long, env = "REPORTCARD_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "REPORTCARD_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Text generation endpoint
    #[arg(long, env = "REPORTCARD_AI_ENDPOINT", default_value = DEFAULT_AI_ENDPOINT)]
    pub ai_endpoint: String,

    /// API key for the text generation service
    #[arg(long, env = "REPORTCARD_AI_API_KEY", hide_env_values = true)]
    pub ai_api_key: Option<String>,

    #[arg(long, env = "REPORTCARD_AI_TEMPERATURE", default_value = "0.7")]
    pub ai_temperature: f64,

    #[arg(long, env = "REPORTCARD_AI_MAX_OUTPUT_TOKENS", default_value = "2048")]
    pub ai_max_output_tokens: u32,

    /// Delay between exported sections, in milliseconds
    #[arg(long, env = "REPORTCARD_EXPORT_SETTLE_MS", default_value = "500")]
    pub export_settle_ms: u64,

    /// Export resolution multiplier
    #[arg(long, env = "REPORTCARD_EXPORT_PIXEL_RATIO", default_value = "2")]
    pub export_pixel_ratio: u32,
}

impl Args {
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=2.0).contains(&self.ai_temperature) {
            return Err("REPORTCARD_AI_TEMPERATURE must be between 0.0 and 2.0".to_string());
        }
        if self.ai_max_output_tokens == 0 {
            return Err("REPORTCARD_AI_MAX_OUTPUT_TOKENS must be greater than 0".to_string());
        }
        if !(1..=4).contains(&self.export_pixel_ratio) {
            return Err("REPORTCARD_EXPORT_PIXEL_RATIO must be between 1 and 4".to_string());
        }
        Ok(())
    }

    pub fn export_settle(&self) -> Duration {
        Duration::from_millis(self.export_settle_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["reportcardd"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).expect("parse")
    }

    #[test]
    fn explicit_flags_override_defaults() {
        let args = parse(&[
            "--ai-temperature",
            "1.5",
            "--export-settle-ms",
            "0",
            "--export-pixel-ratio",
            "3",
        ]);
        assert_eq!(args.ai_temperature, 1.5);
        assert_eq!(args.export_settle(), Duration::ZERO);
        assert_eq!(args.export_pixel_ratio, 3);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn out_of_range_values_fail_validation() {
        assert!(parse(&["--ai-temperature", "2.5"]).validate().is_err());
        assert!(parse(&["--ai-max-output-tokens", "0"]).validate().is_err());
        assert!(parse(&["--export-pixel-ratio", "5"]).validate().is_err());
    }
}
