pub mod builder;
pub mod templates;

pub use builder::{
    build_enhanced_prompt, build_prompt_preview, catalog_snapshot, validate_prompt_request,
    PromptRequest,
};
