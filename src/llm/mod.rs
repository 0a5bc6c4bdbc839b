pub mod gemini;
pub mod media;

pub use gemini::{generate_transformation_image, GeminiSettings, ImageGenerationError};
pub use media::{decode_photo, PhotoError, PhotoPayload};
