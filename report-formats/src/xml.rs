// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Helpers shared by the XML readers.

use crate::errors::ParseError;
use indexmap::IndexMap;
use quick_xml::{
    Reader,
    events::{BytesCData, BytesStart, BytesText},
};

pub(crate) fn reader(xml: &str) -> Reader<&[u8]> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    reader
}

pub(crate) fn element_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

/// Returns the unescaped value of the attribute `name`, if present.
pub(crate) fn attr(e: &BytesStart<'_>, name: &str) -> Result<Option<String>, ParseError> {
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.as_ref() == name.as_bytes() {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// Returns the attribute `name` parsed as a count. Blank values are treated as absent.
pub(crate) fn count_attr(
    e: &BytesStart<'_>,
    element: &'static str,
    name: &'static str,
) -> Result<Option<usize>, ParseError> {
    let Some(value) = attr(e, name)? else {
        return Ok(None);
    };
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse()
        .map(Some)
        .map_err(|_| ParseError::InvalidCount {
            element,
            attr: name,
            value,
        })
}

/// Collects every attribute not listed in `known`, in document order.
pub(crate) fn extra_attrs(
    e: &BytesStart<'_>,
    known: &[&str],
) -> Result<IndexMap<String, String>, ParseError> {
    let mut extra = IndexMap::new();
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attr.key.as_ref());
        if known.contains(&key.as_ref()) {
            continue;
        }
        extra.insert(key.into_owned(), attr.unescape_value()?.into_owned());
    }
    Ok(extra)
}

pub(crate) fn text(e: &BytesText<'_>) -> Result<String, ParseError> {
    Ok(e.unescape()?.into_owned())
}

pub(crate) fn cdata(e: BytesCData<'_>) -> String {
    String::from_utf8_lossy(&e.into_inner()).into_owned()
}

/// Appends a text fragment to an optional accumulator.
///
/// Text and CDATA sections can be interleaved within a single element, so fragments are
/// concatenated.
pub(crate) fn push_text(target: &mut Option<String>, fragment: &str) {
    match target {
        Some(existing) => existing.push_str(fragment),
        None => *target = Some(fragment.to_owned()),
    }
}
