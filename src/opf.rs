//! Package metadata resolution.
//!
//! Walks `META-INF/container.xml` to the OPF package document, then the
//! package's manifest and spine, producing the spine-ordered list of content
//! document paths. quick-xml performs no DTD entity expansion and never
//! touches the network or filesystem while parsing, so hostile XML cannot
//! make resolution do anything but fail.

use std::collections::HashMap;

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::archive::Archive;
use crate::decode::decode;
use crate::error::{Error, Result};

/// Fixed location of the container document inside every EPUB.
pub const CONTAINER_PATH: &str = "META-INF/container.xml";

/// Manifest `<item>` declaration: a resource id and its location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestItem {
    pub id: String,
    pub href: String,
}

/// Spine `<itemref>`: an ordered reference into the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpineEntry {
    pub idref: String,
}

/// Resolve the archive's reading order.
///
/// Every failure mode (missing container, unparseable XML, absent package
/// document) is logged and collapses to an empty order; the caller treats an
/// empty order as fatal for the whole conversion.
pub fn reading_order(archive: &mut Archive) -> Vec<String> {
    match try_reading_order(archive) {
        Ok(order) => order,
        Err(e) => {
            log::warn!("failed to resolve reading order: {e}");
            Vec::new()
        }
    }
}

fn try_reading_order(archive: &mut Archive) -> Result<Vec<String>> {
    let container = archive.read(CONTAINER_PATH)?;
    let package_path = find_package_path(&decode(&container).text)?;

    // The package document itself is looked up through the case-insensitive
    // index, same as the hrefs it declares.
    let package_entry = archive
        .resolve(&package_path)
        .map(str::to_string)
        .ok_or_else(|| Error::EntryNotFound(package_path.clone()))?;
    let package = archive.read(&package_entry)?;

    let base_dir = package_path
        .rsplit_once('/')
        .map(|(dir, _)| dir.to_string())
        .unwrap_or_default();

    let (manifest, spine) = parse_package(&decode(&package).text)?;
    Ok(resolve_spine(&manifest, &spine, &base_dir))
}

/// Extract the `full-path` attribute of the first `rootfile` element.
fn find_package_path(container: &str) -> Result<String> {
    let mut reader = Reader::from_str(container);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(e)) | Ok(Event::Start(e))
                if local_name(e.name().as_ref()) == b"rootfile" =>
            {
                for attr in e.attributes().flatten() {
                    if attr.key.as_ref() == b"full-path" {
                        return Ok(String::from_utf8(attr.value.to_vec())?);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(e)),
            _ => {}
        }
    }

    Err(Error::MissingElement(
        "rootfile full-path in container.xml".into(),
    ))
}

/// Parse the package document's manifest items and spine references.
fn parse_package(content: &str) -> Result<(Vec<ManifestItem>, Vec<SpineEntry>)> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut manifest: Vec<ManifestItem> = Vec::new();
    let mut spine: Vec<SpineEntry> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match local_name(e.name().as_ref()) {
                b"item" => {
                    let mut id = String::new();
                    let mut href = String::new();
                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"id" => id = String::from_utf8(attr.value.to_vec())?,
                            b"href" => href = String::from_utf8(attr.value.to_vec())?,
                            _ => {}
                        }
                    }
                    if !id.is_empty() {
                        manifest.push(ManifestItem { id, href });
                    }
                }
                b"itemref" => {
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"idref" {
                            spine.push(SpineEntry {
                                idref: String::from_utf8(attr.value.to_vec())?,
                            });
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(e)),
            _ => {}
        }
    }

    Ok((manifest, spine))
}

/// Resolve spine references against the manifest, in spine order.
///
/// Duplicate manifest ids: last declaration wins. Spine references to
/// unknown ids are dropped.
fn resolve_spine(manifest: &[ManifestItem], spine: &[SpineEntry], base_dir: &str) -> Vec<String> {
    let mut by_id: HashMap<&str, &str> = HashMap::new();
    for item in manifest {
        by_id.insert(&item.id, &item.href);
    }

    let mut order = Vec::new();
    for entry in spine {
        match by_id.get(entry.idref.as_str()) {
            Some(href) => order.push(join_href(base_dir, href)),
            None => log::debug!("spine references unknown manifest id: {}", entry.idref),
        }
    }
    order
}

/// Join an href to the package document's directory unless it is rooted.
fn join_href(base_dir: &str, href: &str) -> String {
    if base_dir.is_empty() || href.starts_with('/') {
        href.to_string()
    } else {
        format!("{base_dir}/{href}")
    }
}

/// Extract local name from potentially namespaced XML name
fn local_name(name: &[u8]) -> &[u8] {
    name.iter()
        .rposition(|&b| b == b':')
        .map(|i| &name[i + 1..])
        .unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTAINER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

    #[test]
    fn test_find_package_path() {
        assert_eq!(find_package_path(CONTAINER).unwrap(), "OEBPS/content.opf");
    }

    #[test]
    fn test_find_package_path_namespaced() {
        let xml = r#"<c:container xmlns:c="urn:x"><c:rootfile full-path="book.opf"/></c:container>"#;
        assert_eq!(find_package_path(xml).unwrap(), "book.opf");
    }

    #[test]
    fn test_find_package_path_missing() {
        let err = find_package_path("<container/>").unwrap_err();
        assert!(matches!(err, Error::MissingElement(_)));
    }

    #[test]
    fn test_find_package_path_malformed() {
        // Unclosed tags surface as a parse error or a missing element;
        // either way the caller maps it to an empty reading order.
        assert!(find_package_path("<x full-path='y'>").is_err());
        assert!(find_package_path("not xml at all").is_err());
    }

    #[test]
    fn test_parse_package() {
        let opf = r#"<package>
  <manifest>
    <item id="c1" href="c1.xhtml" media-type="application/xhtml+xml"/>
    <item id="c2" href="c2.xhtml" media-type="application/xhtml+xml"/>
    <item id="css" href="style.css" media-type="text/css"/>
  </manifest>
  <spine>
    <itemref idref="c1"/>
    <itemref idref="c2"/>
  </spine>
</package>"#;
        let (manifest, spine) = parse_package(opf).unwrap();
        assert_eq!(manifest.len(), 3);
        assert_eq!(manifest[0], ManifestItem { id: "c1".into(), href: "c1.xhtml".into() });
        assert_eq!(spine.len(), 2);
        assert_eq!(spine[1], SpineEntry { idref: "c2".into() });
    }

    #[test]
    fn test_resolve_spine_order_preserved() {
        let manifest = vec![
            ManifestItem { id: "b".into(), href: "b.xhtml".into() },
            ManifestItem { id: "a".into(), href: "a.xhtml".into() },
        ];
        let spine = vec![
            SpineEntry { idref: "a".into() },
            SpineEntry { idref: "b".into() },
        ];
        assert_eq!(
            resolve_spine(&manifest, &spine, "OEBPS"),
            vec!["OEBPS/a.xhtml", "OEBPS/b.xhtml"]
        );
    }

    #[test]
    fn test_resolve_spine_unknown_idref_skipped() {
        let manifest = vec![ManifestItem { id: "a".into(), href: "a.xhtml".into() }];
        let spine = vec![
            SpineEntry { idref: "a".into() },
            SpineEntry { idref: "ghost".into() },
            SpineEntry { idref: "a".into() },
        ];
        assert_eq!(
            resolve_spine(&manifest, &spine, ""),
            vec!["a.xhtml", "a.xhtml"]
        );
    }

    #[test]
    fn test_resolve_spine_duplicate_id_last_wins() {
        let manifest = vec![
            ManifestItem { id: "a".into(), href: "old.xhtml".into() },
            ManifestItem { id: "a".into(), href: "new.xhtml".into() },
        ];
        let spine = vec![SpineEntry { idref: "a".into() }];
        assert_eq!(resolve_spine(&manifest, &spine, ""), vec!["new.xhtml"]);
    }

    #[test]
    fn test_join_href_rooted() {
        assert_eq!(join_href("OEBPS", "/images/x.xhtml"), "/images/x.xhtml");
        assert_eq!(join_href("OEBPS", "ch1.xhtml"), "OEBPS/ch1.xhtml");
        assert_eq!(join_href("", "ch1.xhtml"), "ch1.xhtml");
    }

    #[test]
    fn test_local_name() {
        assert_eq!(local_name(b"opf:item"), b"item");
        assert_eq!(local_name(b"item"), b"item");
    }
}
