//! Query preprocessing for speech-to-text school references
//!
//! Speech-to-text frequently glues the school-type letters to the number
//! ("ms88"). The resolver's exact stage needs "ms 88", so the space is put
//! back before resolution.

use once_cell::sync::Lazy;
use regex::Regex;

/// (prefix)(m|p|i + s)(digits)(rest); case-insensitive, letters and digits
/// glued with no separator, both ends word bounded
static GLUED_SCHOOL_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)^(.*?)\b([mpi]s)(\d+)\b(.*)$").expect("glued school number pattern is valid")
});

/// Re-insert a space between a glued school-type code and its number
///
/// Only the first occurrence is rewritten; text without one is returned
/// unchanged.
pub fn preprocess_query(text: &str) -> String {
    match GLUED_SCHOOL_NUMBER.captures(text) {
        Some(caps) => {
            let rewritten = format!("{}{} {}{}", &caps[1], &caps[2], &caps[3], &caps[4]);
            tracing::debug!(query = %text, rewritten = %rewritten, "Split glued school number");
            rewritten
        }
        None => text.to_string(),
    }
}
