//! GEDI ground-truth/hypothesis XML reader.
//!
//! Zones are the direct children of the first `DL_PAGE` of the document,
//! each carrying `gedi_type`, `id`, `col`, `row`, `width` and `height`.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::debug;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::core::geometry::BBox;
use crate::core::model::RegionSet;
use crate::parser::RegionLoader;

pub const DEFAULT_GEDI_TYPE: &str = "Area";

#[derive(Debug, Clone)]
pub struct GediLoader {
    gedi_type: String,
}

impl GediLoader {
    pub fn new(gedi_type: impl Into<String>) -> Self {
        Self {
            gedi_type: gedi_type.into(),
        }
    }
}

impl Default for GediLoader {
    fn default() -> Self {
        Self::new(DEFAULT_GEDI_TYPE)
    }
}

impl RegionLoader for GediLoader {
    fn load_regions(&self, path: &Path) -> Result<RegionSet> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read GEDI file: {}", path.display()))?;
        parse_gedi_str(&content, &self.gedi_type)
            .with_context(|| format!("invalid GEDI file: {}", path.display()))
    }
}

fn attributes(element: &BytesStart<'_>) -> Result<HashMap<String, String>> {
    let mut attrs = HashMap::new();
    for attr in element.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        attrs.insert(key, value);
    }
    Ok(attrs)
}

fn int_attr(attrs: &HashMap<String, String>, key: &str) -> Result<i64> {
    let raw = attrs
        .get(key)
        .with_context(|| format!("zone is missing the `{key}` attribute"))?;
    raw.trim()
        .parse()
        .with_context(|| format!("zone attribute `{key}` is not an integer: {raw:?}"))
}

fn read_zone(element: &BytesStart<'_>, gedi_type: &str, regions: &mut RegionSet) -> Result<()> {
    let attrs = attributes(element)?;
    match attrs.get("gedi_type") {
        Some(kind) if kind == gedi_type => {}
        Some(_) => return Ok(()),
        None => {
            debug!(
                "skipping untyped page child <{}>",
                String::from_utf8_lossy(element.local_name().as_ref())
            );
            return Ok(());
        }
    }

    let id = int_attr(&attrs, "id")?;
    let bbox = BBox::from_xywh(
        int_attr(&attrs, "col")? as f64,
        int_attr(&attrs, "row")? as f64,
        int_attr(&attrs, "width")? as f64,
        int_attr(&attrs, "height")? as f64,
    );
    regions.insert(id, bbox.to_shape());
    Ok(())
}

pub fn parse_gedi_str(content: &str, gedi_type: &str) -> Result<RegionSet> {
    let mut reader = Reader::from_str(content);
    reader.trim_text(true);
    let mut buf = Vec::new();

    let mut regions = RegionSet::new();
    let mut depth = 0usize;
    let mut document_depth: Option<usize> = None;
    let mut page_depth: Option<usize> = None;
    let mut page_seen = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                match e.local_name().as_ref() {
                    b"DL_DOCUMENT" if document_depth.is_none() => document_depth = Some(depth),
                    b"DL_PAGE" if document_depth.is_some() && !page_seen => {
                        page_seen = true;
                        page_depth = Some(depth);
                    }
                    _ if page_depth.map(|d| d + 1) == Some(depth) => {
                        read_zone(&e, gedi_type, &mut regions)?;
                    }
                    _ => {}
                }
                depth += 1;
            }
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"DL_PAGE" if document_depth.is_some() && !page_seen => page_seen = true,
                _ if page_depth.map(|d| d + 1) == Some(depth) => {
                    read_zone(&e, gedi_type, &mut regions)?;
                }
                _ => {}
            },
            Ok(Event::End(_)) => {
                depth = depth.saturating_sub(1);
                if page_depth == Some(depth) {
                    page_depth = None;
                }
                if document_depth == Some(depth) && !page_seen {
                    document_depth = None;
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => anyhow::bail!(
                "XML error at byte {}: {err}",
                reader.buffer_position()
            ),
            _ => {}
        }
        buf.clear();
    }

    if !page_seen {
        anyhow::bail!("no DL_PAGE element inside a DL_DOCUMENT");
    }
    Ok(regions)
}
