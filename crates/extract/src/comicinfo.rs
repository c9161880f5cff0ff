//! ComicRack `ComicInfo.xml` parsing.

use crate::error::{ErrorKind, Result};
use crate::models::{Credit, Metadata, PageInfo, Role};
use exn::ResultExt;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::str::FromStr;
use tracing::instrument;

const ROOT_ELEMENT: &str = "ComicInfo";
const PAGES_ELEMENT: &str = "Pages";
const PAGE_ELEMENT: &str = "Page";

/// Parse an embedded `ComicInfo.xml` document into [`Metadata`].
///
/// An empty (or whitespace-only) document yields empty metadata rather than
/// an error. The page count is left at zero: only the archive knows how many
/// pages it really has, see [`Metadata::reconcile_page_count`].
#[instrument(skip(xml), fields(xml_size = xml.len()))]
pub fn parse(xml: &str) -> Result<Metadata> {
    let xml = xml.trim_start_matches('\u{feff}');
    let mut metadata = Metadata::default();
    if xml.trim().is_empty() {
        return Ok(metadata);
    }

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut stack: Vec<String> = Vec::new();
    let mut text = String::new();
    let mut seen_root = false;

    loop {
        let event = reader
            .read_event()
            .or_raise(|| ErrorKind::MalformedXml(format!("at byte {}", reader.error_position())))?;
        match event {
            Event::Start(element) => {
                let name = element_name(&element);
                check_root(&mut seen_root, &name)?;
                if is_page(&stack, &name) {
                    metadata.pages.push(page_info(&element, metadata.pages.len())?);
                }
                stack.push(name);
                text.clear();
            },
            Event::Empty(element) => {
                let name = element_name(&element);
                check_root(&mut seen_root, &name)?;
                if is_page(&stack, &name) {
                    metadata.pages.push(page_info(&element, metadata.pages.len())?);
                }
            },
            Event::Text(content) => {
                let content = content
                    .unescape()
                    .or_raise(|| ErrorKind::MalformedXml(format!("at byte {}", reader.buffer_position())))?;
                text.push_str(&content);
            },
            Event::CData(content) => text.push_str(&String::from_utf8_lossy(&content.into_inner())),
            Event::End(_) => {
                if stack.len() == 2 {
                    apply_field(&mut metadata, &stack[1], text.trim());
                }
                stack.pop();
                text.clear();
            },
            Event::Eof => break,
            _ => {},
        }
    }
    if !seen_root {
        exn::bail!(ErrorKind::MalformedXml("no root element".to_string()));
    }
    Ok(metadata)
}

fn element_name(element: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(element.local_name().as_ref()).into_owned()
}

fn check_root(seen_root: &mut bool, name: &str) -> Result<()> {
    if !*seen_root {
        if name != ROOT_ELEMENT {
            exn::bail!(ErrorKind::InvalidDocument(name.to_string()));
        }
        *seen_root = true;
    }
    Ok(())
}

fn is_page(stack: &[String], name: &str) -> bool {
    name == PAGE_ELEMENT && stack.last().is_some_and(|parent| parent == PAGES_ELEMENT)
}

fn page_info(element: &BytesStart<'_>, position: usize) -> Result<PageInfo> {
    let mut page = PageInfo::new(position);
    for attribute in element.attributes() {
        let attribute = attribute.or_raise(|| ErrorKind::MalformedXml("invalid <Page> attribute".to_string()))?;
        let value = attribute
            .unescape_value()
            .or_raise(|| ErrorKind::MalformedXml("invalid <Page> attribute value".to_string()))?;
        match attribute.key.local_name().as_ref() {
            b"Image" => page.index = number("Page/Image", &value).unwrap_or(position),
            b"ImageSize" => page.size = number("Page/ImageSize", &value),
            b"ImageWidth" => page.width = number("Page/ImageWidth", &value),
            b"ImageHeight" => page.height = number("Page/ImageHeight", &value),
            _ => {},
        }
    }
    Ok(page)
}

fn apply_field(metadata: &mut Metadata, name: &str, value: &str) {
    if value.is_empty() {
        return;
    }
    let owned = || Some(value.to_string());
    match name {
        "Title" => metadata.title = owned(),
        "Series" => metadata.series = owned(),
        "Number" => metadata.issue = owned(),
        "Count" => metadata.issue_count = number("Count", value),
        "Volume" => metadata.volume = number("Volume", value),
        "Summary" => metadata.description = owned(),
        "Notes" => metadata.notes = owned(),
        "Year" => metadata.year = number("Year", value),
        "Month" => metadata.month = number("Month", value),
        "Day" => metadata.day = number("Day", value),
        "Publisher" => metadata.publisher = owned(),
        "Web" => metadata.web = owned(),
        "ScanInformation" => metadata.scan_info = owned(),
        "PageCount" => metadata.page_count = number("PageCount", value).unwrap_or_default(),
        "StoryArc" => metadata.story_arcs.extend(split_list(value).map(String::from)),
        "Writer" => push_credits(metadata, value, Role::Writer),
        "Penciller" => push_credits(metadata, value, Role::Penciller),
        "Inker" => push_credits(metadata, value, Role::Inker),
        "Colorist" => push_credits(metadata, value, Role::Colorist),
        "Letterer" => push_credits(metadata, value, Role::Letterer),
        "CoverArtist" => push_credits(metadata, value, Role::CoverArtist),
        "Editor" => push_credits(metadata, value, Role::Editor),
        _ => {},
    }
}

fn push_credits(metadata: &mut Metadata, value: &str, role: Role) {
    metadata.credits.extend(split_list(value).map(|person| Credit::new(person, role)));
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty())
}

/// Lenient numeric parsing: ComicInfo writers use `-1` (or junk) for
/// "unknown", which is treated the same as an absent field.
fn number<T: FromStr>(field: &'static str, value: &str) -> Option<T> {
    let value = value.trim();
    if value.starts_with('-') {
        return None;
    }
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            tracing::debug!(field, value, "Ignoring unparsable ComicInfo field");
            None
        },
    }
}
