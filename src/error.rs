#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid layout parameter `{field}`: {reason}")]
    InvalidParams { field: &'static str, reason: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, Error>;
