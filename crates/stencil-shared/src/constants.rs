/// Maximum accepted screenshot size in bytes (10 MiB)
pub const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Maximum length of an upload title or library item name, in characters
pub const MAX_LABEL_LEN: usize = 255;

/// Default HTTP port of the reference backend
pub const DEFAULT_HTTP_PORT: u16 = 8000;

/// Path of the template endpoints below the API root
pub const TEMPLATES_PATH: &str = "/templates";

/// Path prefix under which stored media (images, archives) is served
pub const MEDIA_PREFIX: &str = "/media";

/// Fixed suffix of downloaded artifact archives
pub const ARTIFACT_SUFFIX: &str = "template.zip";
