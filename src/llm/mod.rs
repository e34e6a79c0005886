pub mod gemini;
pub mod media;
pub mod replicate;

pub use gemini::{build_caption_system_prompt, generate_caption, CaptionTone};
pub use replicate::{
    generate_instagram_image, GeneratedImage, ImageGenerationError, ImageGenerationOptions,
};
