//! CLI parser
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::constants::{
    DEFAULT_IMAGE_DIR, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_OPENAI_BASE_URL,
    DEFAULT_OUTPUT_FILE, DEFAULT_PROMPT, DEFAULT_REMOTE_POOL_DIR,
    DEFAULT_REQUEST_TIMEOUT_SECONDS, DEFAULT_USED_IMAGES_FILE,
};

/// How the previous run's choice is remembered.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum CursorMode {
    /// Keep a local list of every image used in the current cycle.
    #[default]
    History,
    /// Read the last image back out of the published record and take the next one.
    Pointer,
}

/// Where the image pool is listed from.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum PoolLocation {
    /// A directory on this machine.
    #[default]
    Local,
    /// A directory on the FTP host.
    Remote,
}

#[derive(Parser, Debug)]
#[command(name = "dailyhaiku")]
#[command(about = "Pick the next image, ask a vision model for a haiku, publish both")]
/// CLI Options
pub struct CliOptions {
    #[clap(long, help = "Enable debug logging", env = "HAIKU_DEBUG")]
    /// Enable debug logging. Env: HAIKU_DEBUG
    pub debug: bool,

    #[clap(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    /// Model provider API key.
    /// Env: OPENAI_API_KEY
    pub openai_api_key: Option<String>,

    #[clap(long, default_value = DEFAULT_OPENAI_BASE_URL, env = "OPENAI_BASE_URL")]
    /// API root for chat completions.
    /// Env: OPENAI_BASE_URL
    pub openai_base_url: String,

    #[clap(long, default_value = DEFAULT_MODEL, env = "HAIKU_MODEL")]
    /// Vision model used to write the haiku. Env: HAIKU_MODEL
    pub model: String,

    #[clap(long, default_value_t = DEFAULT_MAX_TOKENS, env = "HAIKU_MAX_TOKENS")]
    /// Response token cap. Env: HAIKU_MAX_TOKENS
    pub max_tokens: u32,

    #[clap(long, default_value_t = DEFAULT_REQUEST_TIMEOUT_SECONDS, env = "HAIKU_REQUEST_TIMEOUT")]
    /// Seconds to wait for the model. Env: HAIKU_REQUEST_TIMEOUT
    pub request_timeout: u64,

    #[clap(long, default_value = DEFAULT_PROMPT, env = "HAIKU_PROMPT")]
    /// Instruction sent with the image. Env: HAIKU_PROMPT
    pub prompt: String,

    #[clap(long, default_value = DEFAULT_IMAGE_DIR, env = "HAIKU_IMAGE_DIR")]
    /// Local image pool, defaults to `images`.
    /// Env: HAIKU_IMAGE_DIR
    pub image_dir: PathBuf,

    #[clap(long, default_value = DEFAULT_OUTPUT_FILE, env = "HAIKU_OUTPUT_FILE")]
    /// Local copy of the published record.
    /// Env: HAIKU_OUTPUT_FILE
    pub output_file: PathBuf,

    #[clap(long, default_value = DEFAULT_USED_IMAGES_FILE, env = "HAIKU_USED_IMAGES_FILE")]
    /// History of images used this cycle.
    /// Env: HAIKU_USED_IMAGES_FILE
    pub used_images_file: PathBuf,

    #[clap(long, value_enum, default_value_t = CursorMode::History, env = "HAIKU_CURSOR")]
    /// Env: HAIKU_CURSOR
    pub cursor: CursorMode,

    #[clap(long, value_enum, default_value_t = PoolLocation::Local, env = "HAIKU_POOL_SOURCE")]
    /// Env: HAIKU_POOL_SOURCE
    pub pool_source: PoolLocation,

    #[clap(long, default_value = DEFAULT_REMOTE_POOL_DIR, env = "HAIKU_REMOTE_POOL_DIR")]
    /// Remote pool directory, relative to the FTP base path.
    /// Env: HAIKU_REMOTE_POOL_DIR
    pub remote_pool_dir: String,

    #[clap(long, env = "HAIKU_PUBLIC_BASE_URL")]
    /// Public site root, eg `https://example.org/`. When set the record points at an absolute image URL.
    /// Env: HAIKU_PUBLIC_BASE_URL
    pub public_base_url: Option<String>,

    #[clap(long, env = "FTP_HOST")]
    /// FTP host, `host` or `host:port`. Env: FTP_HOST
    pub ftp_host: Option<String>,

    #[clap(long, env = "FTP_USER")]
    /// Env: FTP_USER
    pub ftp_user: Option<String>,

    #[clap(long, env = "FTP_PASS", hide_env_values = true)]
    /// Env: FTP_PASS
    pub ftp_pass: Option<String>,

    #[clap(long, default_value = "", env = "FTP_BASE_PATH")]
    /// Remote directory everything is published under.
    /// Env: FTP_BASE_PATH
    pub ftp_base_path: String,

    #[clap(long, env = "HAIKU_SKIP_UPLOAD")]
    /// Only write the record locally. Env: HAIKU_SKIP_UPLOAD
    pub skip_upload: bool,
}
