pub mod error;
pub mod parse;

use crate::util::item::Business;

/// Read a ledger file into its businesses
///
/// `None` means a fatal error was recorded; `errs` may additionally hold
/// nonfatal warnings that are worth printing either way.
pub fn read_businesses(filename: &str, errs: &mut error::Record) -> Option<Vec<Business>> {
    let contents = match std::fs::read_to_string(filename) {
        Ok(contents) => contents,
        Err(_) => {
            errs.make("File not found")
                .text(format!("Ledger file loaded is '{}'", filename))
                .hint("rename existing file or pass another one on the command line");
            return None;
        }
    };
    let businesses = parse::extract(filename, errs, &contents);
    if errs.is_fatal() {
        None
    } else {
        Some(businesses)
    }
}
