//! Netscape bookmark file output
//!
//! Renders collected profile records as a Netscape-format bookmark file
//! importable by every mainstream browser. Records are grouped into folders
//! by last-name initial; folders and the entries within them are sorted.

use std::collections::BTreeMap;
use std::path::Path;

use crate::models::ProfileRecord;

const HEADER: &str = "<!DOCTYPE NETSCAPE-Bookmark-file-1>\n\
<!-- This is an automatically generated file.\n\
     It will be read and overwritten.\n\
     DO NOT EDIT! -->\n\
<META HTTP-EQUIV=\"Content-Type\" CONTENT=\"text/html; charset=UTF-8\">\n\
<TITLE>Bookmarks</TITLE>\n\
<H1>LinkedIn Profiles</H1>\n";

/// Render records as a Netscape bookmark document
#[must_use]
pub fn render(records: &[ProfileRecord]) -> String {
    let timestamp = chrono::Utc::now().timestamp();

    // BTreeMap keeps the folder initials sorted
    let mut groups: BTreeMap<char, Vec<&ProfileRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(record.last_initial()).or_default().push(record);
    }

    let mut out = String::from(HEADER);
    out.push_str("<DL><p>\n");

    for (initial, mut members) in groups {
        members.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));

        out.push_str(&format!(
            "    <DT><H3 ADD_DATE=\"{timestamp}\">{initial}</H3>\n    <DL><p>\n"
        ));
        for record in members {
            out.push_str(&format!(
                "        <DT><A HREF=\"{}\" ADD_DATE=\"{timestamp}\">{}</A>\n",
                html_escape::encode_double_quoted_attribute(&record.url),
                html_escape::encode_text(&label(record)),
            ));
        }
        out.push_str("    </DL><p>\n");
    }

    out.push_str("</DL><p>\n");
    out
}

/// Write the bookmark file to disk
///
/// # Errors
///
/// Propagates filesystem errors from the underlying write.
pub async fn write_file(path: &Path, records: &[ProfileRecord]) -> std::io::Result<()> {
    tokio::fs::write(path, render(records)).await?;
    tracing::info!(path = %path.display(), records = records.len(), "Bookmark file written");
    Ok(())
}

/// Human-readable link label: name, then role and employer when known
fn label(record: &ProfileRecord) -> String {
    match (&record.title, &record.company) {
        (Some(title), Some(company)) => {
            format!("{} - {title} at {company}", record.name)
        }
        (Some(title), None) => format!("{} - {title}", record.name),
        (None, Some(company)) => format!("{} - {company}", record.name),
        (None, None) => record.name.clone(),
    }
}
