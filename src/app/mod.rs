pub mod app;
pub mod printer;

pub use app::{App, InitProps};
pub use printer::TranscriptPrinter;
