//! Config handling

use std::path::PathBuf;
use std::time::Duration;

use tracing::log::LevelFilter;
use url::Url;

use crate::cli::{CliOptions, CursorMode, PoolLocation};
use crate::error::ConfigError;
use crate::ftp::FtpSettings;

/// Sets up logging based on the debug flag
pub fn setup_logging(debug: bool) -> Result<(), Box<std::io::Error>> {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut logger = simple_logger::SimpleLogger::new()
        .with_utc_timestamps()
        .with_level(level);
    if !debug {
        logger = logger
            .with_module_level("rustls", LevelFilter::Info)
            .with_module_level("hyper_util", LevelFilter::Info)
            .with_module_level("h2", LevelFilter::Info)
            .with_module_level("reqwest", LevelFilter::Warn)
            .with_module_level("suppaftp", LevelFilter::Warn);
    }
    logger.init().map_err(|err| {
        eprintln!("Failed to initialize logger: {}", err);
        Box::new(std::io::Error::other(err))
    })
}

/// Settings for the language model call.
#[derive(Clone)]
pub struct GeneratorConfig {
    /// Bearer credential, passed through untouched.
    pub api_key: String,
    /// API root, without the trailing `/chat/completions`.
    pub base_url: String,
    /// Model name.
    pub model: String,
    /// Response token cap.
    pub max_tokens: u32,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Instruction sent with the image.
    pub prompt: String,
}

impl std::fmt::Debug for GeneratorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("timeout", &self.timeout)
            .field("prompt", &self.prompt)
            .finish()
    }
}

/// Everything a run needs, resolved once at startup.
#[derive(Clone, Debug)]
pub struct Config {
    /// Model settings.
    pub generator: GeneratorConfig,
    /// FTP credentials, absent when nothing touches the remote host.
    pub ftp: Option<FtpSettings>,
    /// Local image pool.
    pub image_dir: PathBuf,
    /// Local record path.
    pub output_file: PathBuf,
    /// Used-image history path.
    pub used_images_file: PathBuf,
    /// Cursor strategy.
    pub cursor: CursorMode,
    /// Pool listing location.
    pub pool_source: PoolLocation,
    /// Remote pool directory, relative to the FTP base path.
    pub remote_pool_dir: String,
    /// Public site root used to build absolute image URLs.
    pub public_base_url: Option<Url>,
    /// Skip FTP publishing.
    pub skip_upload: bool,
}

impl Config {
    /// Builds the run configuration, checking that required values are present.
    pub fn from_cli(cli: &CliOptions) -> Result<Self, ConfigError> {
        let api_key = require("OPENAI_API_KEY", cli.openai_api_key.as_deref())?;

        let needs_ftp = !cli.skip_upload || cli.pool_source == PoolLocation::Remote;
        let ftp = if needs_ftp {
            Some(FtpSettings {
                host: require("FTP_HOST", cli.ftp_host.as_deref())?,
                user: require("FTP_USER", cli.ftp_user.as_deref())?,
                password: require("FTP_PASS", cli.ftp_pass.as_deref())?,
                base_path: cli.ftp_base_path.trim().to_string(),
            })
        } else {
            None
        };

        let public_base_url = match cli.public_base_url.as_deref().map(str::trim) {
            Some(value) if !value.is_empty() => Some(
                Url::parse(value).map_err(|err| ConfigError::InvalidUrl(value.to_string(), err))?,
            ),
            _ => None,
        };

        Ok(Self {
            generator: GeneratorConfig {
                api_key,
                base_url: cli.openai_base_url.trim_end_matches('/').to_string(),
                model: cli.model.clone(),
                max_tokens: cli.max_tokens,
                timeout: Duration::from_secs(cli.request_timeout),
                prompt: cli.prompt.clone(),
            },
            ftp,
            image_dir: cli.image_dir.clone(),
            output_file: cli.output_file.clone(),
            used_images_file: cli.used_images_file.clone(),
            cursor: cli.cursor,
            pool_source: cli.pool_source,
            remote_pool_dir: cli.remote_pool_dir.clone(),
            public_base_url,
            skip_upload: cli.skip_upload,
        })
    }
}

fn require(name: &'static str, value: Option<&str>) -> Result<String, ConfigError> {
    match value.map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        _ => Err(ConfigError::Missing(name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(args: &[&str]) -> CliOptions {
        let mut argv = vec!["dailyhaiku"];
        argv.extend_from_slice(args);
        CliOptions::try_parse_from(argv).expect("parse cli")
    }

    #[test]
    fn local_only_run_needs_no_ftp_credentials() {
        let cli = parse(&["--openai-api-key", "sk-test", "--skip-upload"]);
        let config = Config::from_cli(&cli).expect("config");
        assert!(config.ftp.is_none());
        assert_eq!(config.generator.api_key, "sk-test");
        assert_eq!(config.generator.max_tokens, 100);
        assert_eq!(config.cursor, CursorMode::History);
    }

    #[test]
    fn missing_api_key_is_reported() {
        let cli = parse(&["--skip-upload", "--openai-api-key", "  "]);
        match Config::from_cli(&cli) {
            Err(ConfigError::Missing(name)) => assert_eq!(name, "OPENAI_API_KEY"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn uploading_requires_ftp_credentials() {
        let cli = parse(&["--openai-api-key", "sk-test", "--ftp-host", "ftp.example.org"]);
        match Config::from_cli(&cli) {
            Err(ConfigError::Missing(name)) => assert_eq!(name, "FTP_USER"),
            other => panic!("unexpected result: {other:?}"),
        }

        let cli = parse(&[
            "--openai-api-key",
            "sk-test",
            "--ftp-host",
            "ftp.example.org",
            "--ftp-user",
            "poet",
            "--ftp-pass",
            "secret",
            "--ftp-base-path",
            "/www/",
        ]);
        let ftp = Config::from_cli(&cli).expect("config").ftp.expect("ftp");
        assert_eq!(ftp.host, "ftp.example.org");
        assert_eq!(ftp.base_path, "/www/");
    }

    #[test]
    fn remote_pool_requires_ftp_even_without_upload() {
        let cli = parse(&[
            "--openai-api-key",
            "sk-test",
            "--skip-upload",
            "--pool-source",
            "remote",
        ]);
        assert!(matches!(
            Config::from_cli(&cli),
            Err(ConfigError::Missing("FTP_HOST"))
        ));
    }

    #[test]
    fn public_base_url_must_parse() {
        let cli = parse(&[
            "--openai-api-key",
            "sk-test",
            "--skip-upload",
            "--public-base-url",
            "not a url",
        ]);
        assert!(matches!(
            Config::from_cli(&cli),
            Err(ConfigError::InvalidUrl(_, _))
        ));
    }
}
