use std::path::PathBuf;

/// Error types for the biscuit-console library.
///
/// Detection itself never fails: inconclusive results are domain values
/// such as [`ColorScheme::Unknown`](crate::discovery::color_scheme::ColorScheme::Unknown).
/// Errors are reserved for invalid caller input.
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    /// A program name handed to `has_program` contained a shell
    /// metacharacter or control character.
    #[error("Invalid program name {name:?}: contains disallowed character {character:?}")]
    InvalidProgramName { name: String, character: char },

    /// A file link target does not exist on the filesystem.
    #[error("The path '{}' is not a valid path on the file system", .0.display())]
    InvalidFilePath(PathBuf),

    /// Not one of the CSS named colors.
    #[error("Unknown named color: {0}")]
    UnknownColor(String),

    /// An `rgb_text` color spec could not be parsed.
    ///
    /// Expected `"r g b"` or `"r g b / r g b"` with each channel in 0-255.
    #[error("Invalid color spec: {0:?}")]
    InvalidColorSpec(String),

    /// IO error occurred during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type for biscuit-console operations.
pub type Result<T> = std::result::Result<T, ConsoleError>;
