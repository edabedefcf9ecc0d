use crate::error::InputError;
use std::path::{Path, PathBuf};

/// Handle to an image chosen by the user, typically a file picker selection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageReference(PathBuf);

impl ImageReference {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl From<PathBuf> for ImageReference {
    fn from(path: PathBuf) -> Self {
        Self(path)
    }
}

impl From<&str> for ImageReference {
    fn from(path: &str) -> Self {
        Self(PathBuf::from(path))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
}

impl ImageFormat {
    pub fn from_path(path: &Path) -> Result<Self, InputError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| InputError::UnsupportedFormat("missing file extension".to_string()))?;

        match extension.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Ok(ImageFormat::Jpeg),
            "png" => Ok(ImageFormat::Png),
            _ => Err(InputError::UnsupportedFormat(extension.to_string())),
        }
    }
}

/// Readable image handed to the image adapters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageInput {
    /// Where the bytes were read from.
    pub path: PathBuf,
    /// Encoding, taken from the file extension.
    pub format: ImageFormat,
    /// Raw encoded image, never empty.
    pub bytes: Vec<u8>,
}

/// Turns an [`ImageReference`] into bytes an adapter can consume.
pub trait ImageResolver {
    fn resolve(&self, reference: &ImageReference) -> Result<ImageInput, InputError>;
}

/// Resolves references against the local filesystem.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileImageResolver;

impl ImageResolver for FileImageResolver {
    fn resolve(&self, reference: &ImageReference) -> Result<ImageInput, InputError> {
        let path = reference.path();
        let format = ImageFormat::from_path(path)?;

        let bytes = std::fs::read(path).map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => InputError::Missing(path.to_path_buf()),
            _ => InputError::Unreadable {
                path: path.to_path_buf(),
                source,
            },
        })?;

        if bytes.is_empty() {
            return Err(InputError::Unreadable {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "file is empty"),
            });
        }

        Ok(ImageInput {
            path: path.to_path_buf(),
            format,
            bytes,
        })
    }
}
