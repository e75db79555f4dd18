pub mod pdf;
pub mod video;

pub use pdf::PdfTextExtractor;
pub use video::VideoTranscriptExtractor;
