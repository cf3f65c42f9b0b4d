pub mod digest;
pub mod table;

pub use digest::{render_digest, write_issue_digest, DigestInput};
pub use table::{write_csv, write_csv_file};
