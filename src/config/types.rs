use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub stream: StreamConfig,

    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StreamConfig {
    /// Bytes handed to the parser per append (default: 4096)
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Container format of input files
    #[serde(default)]
    pub format: StreamFormat,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            format: StreamFormat::default(),
        }
    }
}

fn default_chunk_size() -> usize {
    4096
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamFormat {
    /// Detect from magic bytes
    #[default]
    Auto,
    Webm,
    Isobmff,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LogConfig {
    /// Default tracing filter, used when RUST_LOG is not set
    #[serde(default)]
    pub filter: Option<String>,
}
