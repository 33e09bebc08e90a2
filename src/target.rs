//! Download target naming

use crate::models::{DownloadTarget, RowRecord};

/// Default origin and path prefix of the text archive.
pub const DEFAULT_BASE_URI: &str = "https://www.jaredhettinger.io/lit/txt/";

/// Build the remote URI and local file stem for a row.
///
/// The remote archive names files `<last name> - <title>.txt`, so the pieces are
/// concatenated verbatim. Nothing is escaped.
pub fn build(row: &RowRecord, base_uri: &str) -> DownloadTarget {
    let slug = format!("{} - {}.txt", row.author_last_name, row.work_title);

    DownloadTarget {
        uri: format!("{}{}", base_uri, slug),
        local_name: row.author_last_name.clone(),
    }
}
