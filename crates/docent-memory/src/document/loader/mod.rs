mod csv;
#[cfg(feature = "pdf")]
mod pdf;
mod text;

pub use self::csv::CsvLoader;
#[cfg(feature = "pdf")]
pub use self::pdf::PdfLoader;
pub use self::text::TextLoader;
