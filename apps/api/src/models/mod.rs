pub mod content;
pub mod upload;

pub use content::GeneratedContent;
pub use upload::{Category, UploadedFile};
