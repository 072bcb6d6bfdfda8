pub mod db;
pub mod gemini_llm;
pub mod image_gen;
pub mod openai_llm;
pub mod pdf;
pub mod storage;

pub use db::DbAdapter;
pub use gemini_llm::GeminiContentAdapter;
pub use image_gen::GradioImageAdapter;
pub use openai_llm::OpenAiContentAdapter;
pub use pdf::PdfReportAdapter;
pub use storage::BucketStorageAdapter;
