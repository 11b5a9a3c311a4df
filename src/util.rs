//! Path and naming helpers shared across the pipeline.

/// Extensions of spine entries that carry readable text.
const CONTENT_EXTENSIONS: [&str; 3] = ["html", "xhtml", "htm"];

/// Normalize an archive-internal path for lookups.
///
/// Replaces backslashes with forward slashes and strips a leading slash.
/// Packages authored on Windows occasionally declare hrefs with backslashes
/// or in rooted form; ZIP entry names use neither. Case is left alone here.
/// Lowercasing happens only where lookup keys are built, since the original
/// entry name is what the archive read needs.
pub fn normalize_entry_path(path: &str) -> String {
    let forward = path.replace('\\', "/");
    match forward.strip_prefix('/') {
        Some(stripped) => stripped.to_string(),
        None => forward,
    }
}

/// Base name of an archive entry without its extension.
///
/// `"OEBPS/Text/chapter1.xhtml"` becomes `"chapter1"`. A leading dot does
/// not count as an extension separator.
pub fn entry_stem(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(0) | None => name,
        Some(i) => &name[..i],
    }
}

/// Whether an archive entry is a content document by extension.
///
/// Spine entries pointing at anything else (images, stylesheets) are
/// skipped by the conversion loop.
pub fn is_content_document(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    match lower.rsplit_once('.') {
        Some((_, ext)) => CONTENT_EXTENSIONS.contains(&ext),
        None => false,
    }
}
