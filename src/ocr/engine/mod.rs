mod geom;
mod parse;
mod preprocess;
mod tesseract;
mod text;

pub use preprocess::{normalize, normalize_buffer, normalized};
pub use tesseract::{TesseractEngine, list_tesseract_languages};

pub(crate) use preprocess::DEFAULT_THRESHOLD;
pub(crate) use tesseract::DEFAULT_COMMAND;
