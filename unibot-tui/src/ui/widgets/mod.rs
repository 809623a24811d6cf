mod footer;
mod header;
mod spinner;

pub use footer::Footer;
pub use header::Header;
pub use spinner::Spinner;
