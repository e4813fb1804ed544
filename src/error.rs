pub type TilemergeResult<T> = Result<T, TilemergeError>;

#[derive(thiserror::Error, Debug)]
pub enum TilemergeError {
    #[error("validation error: {0}")]
    Validation(String),

    /// An external collaborator process (metadata/extraction tool) failed.
    /// Carries the tool's diagnostic output.
    #[error("external tool error: {0}")]
    ExternalTool(String),

    /// A single tile failed to decode. Recorded per job and surfaced once
    /// all workers have finished.
    #[error("tile decode error: {0}")]
    Decode(String),

    #[error("unsupported output format: {0}")]
    UnsupportedFormat(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TilemergeError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn external_tool(msg: impl Into<String>) -> Self {
        Self::ExternalTool(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn unsupported_format(msg: impl Into<String>) -> Self {
        Self::UnsupportedFormat(msg.into())
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            TilemergeError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(
            TilemergeError::external_tool("x")
                .to_string()
                .contains("external tool error:")
        );
        assert!(
            TilemergeError::decode("x")
                .to_string()
                .contains("tile decode error:")
        );
        assert!(
            TilemergeError::unsupported_format(".bmp")
                .to_string()
                .contains("unsupported output format:")
        );
    }

    #[test]
    fn io_preserves_source() {
        let err = TilemergeError::io("create 'out.png'", std::io::Error::other("boom"));
        assert!(err.to_string().contains("create 'out.png'"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
