pub mod chromium;
pub mod cloudinary;
pub mod pdfshift;
pub mod smtp;

pub use chromium::ChromiumRenderer;
pub use cloudinary::CloudinaryStorage;
pub use pdfshift::PdfShiftRenderer;
pub use smtp::SmtpMailer;
