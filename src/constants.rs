//! Shared constants/defaults for things
//!

/// Image file extensions that can join the pool, compared case-insensitively.
pub const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// The default local image pool directory
pub const DEFAULT_IMAGE_DIR: &str = "images";

/// Where the current record lives locally
pub const DEFAULT_OUTPUT_FILE: &str = "haikus/haiku.json";

/// Where the used-image history lives locally
pub const DEFAULT_USED_IMAGES_FILE: &str = "haikus/used_images.json";

/// Record path on the remote host, relative to the base path.
pub const REMOTE_RECORD_PATH: &str = "haikus/haiku.json";

/// Directory on the remote host that published images are uploaded into.
pub const REMOTE_IMAGE_DIR: &str = "images";

/// Default remote directory listed when the pool lives on the remote host.
pub const DEFAULT_REMOTE_POOL_DIR: &str = "pool";

/// Prefix for the `image` field of a record when no public base URL is set.
pub const RECORD_IMAGE_PREFIX: &str = "images";

/// OpenAI-compatible API root
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Vision-capable chat model
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Caps the length of the generated haiku.
pub const DEFAULT_MAX_TOKENS: u32 = 100;

/// Seconds before an API request is abandoned.
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 60;

/// Instruction sent alongside the image.
pub const DEFAULT_PROMPT: &str = "Write a haiku inspired by this image. Do not explain it.";

/// Port used when the FTP host doesn't name one.
pub const DEFAULT_FTP_PORT: u16 = 21;
