//! `multipart/form-data` decoding over a fully buffered body.
//!
//! The body is split on the literal delimiter `--<boundary>`. Each resulting
//! chunk is `CRLF headers CRLF CRLF payload CRLF`; chunks that carry no
//! `Content-Disposition` header (preamble, closing `--`, epilogue) are skipped.
//! Header lines and Content-Disposition parameters are read with small
//! tokenizers rather than pattern matching over raw text.

use std::borrow::Cow;

use bytes::Bytes;
use memchr::memmem;
use thiserror::Error;

pub const DEFAULT_PART_CONTENT_TYPE: &str = "application/octet-stream";

const MULTIPART_FORM_DATA: &str = "multipart/form-data";
const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";
const CRLF: &[u8] = b"\r\n";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MultipartError {
    #[error("Content type is not multipart/form-data: {0}")]
    NotMultipart(String),

    #[error("Missing boundary parameter in content type")]
    MissingBoundary,

    #[error("Part has no name in its Content-Disposition header")]
    MissingFieldName,
}

/// One decoded part. With a filename it is a file attachment, otherwise a
/// scalar form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartPart {
    pub field_name: String,
    pub filename: Option<String>,
    pub content_type: String,
    /// Raw bytes for files; trimmed UTF-8 text for scalar fields.
    pub payload: Bytes,
}

impl MultipartPart {
    pub fn is_file(&self) -> bool {
        self.filename.is_some()
    }

    pub fn size(&self) -> usize {
        self.payload.len()
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }
}

/// Parts in wire order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartForm {
    parts: Vec<MultipartPart>,
}

impl MultipartForm {
    pub fn parts(&self) -> &[MultipartPart] {
        &self.parts
    }

    pub fn into_parts(self) -> Vec<MultipartPart> {
        self.parts
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn files(&self) -> impl Iterator<Item = &MultipartPart> {
        self.parts.iter().filter(|p| p.is_file())
    }

    pub fn fields(&self) -> impl Iterator<Item = &MultipartPart> {
        self.parts.iter().filter(|p| !p.is_file())
    }

    /// Value of the first scalar field called `name`.
    pub fn field(&self, name: &str) -> Option<Cow<'_, str>> {
        self.fields()
            .find(|p| p.field_name == name)
            .map(MultipartPart::text)
    }

    pub fn first_file(&self) -> Option<&MultipartPart> {
        self.files().next()
    }

    /// Take ownership of the first file part, dropping everything else.
    pub fn into_first_file(self) -> Option<MultipartPart> {
        self.parts.into_iter().find(MultipartPart::is_file)
    }
}

/// Extract the boundary from a `Content-Type` header value.
///
/// Fails with [`MultipartError::NotMultipart`] before looking at parameters if
/// the media type is anything other than `multipart/form-data`.
pub fn parse_boundary(content_type: &str) -> Result<String, MultipartError> {
    let mut segments = content_type.split(';');
    let media_type = segments.next().unwrap_or_default().trim();
    if !media_type.eq_ignore_ascii_case(MULTIPART_FORM_DATA) {
        return Err(MultipartError::NotMultipart(content_type.to_string()));
    }

    for param in segments {
        let Some((key, value)) = param.split_once('=') else {
            continue;
        };
        if key.trim().eq_ignore_ascii_case("boundary") {
            let boundary = unquote(value.trim());
            if boundary.is_empty() {
                return Err(MultipartError::MissingBoundary);
            }
            return Ok(boundary.into_owned());
        }
    }

    Err(MultipartError::MissingBoundary)
}

/// Splits buffered bodies on a fixed boundary.
pub struct MultipartDecoder {
    delimiter: Vec<u8>,
}

impl MultipartDecoder {
    pub fn new(boundary: &str) -> Self {
        Self {
            delimiter: format!("--{}", boundary).into_bytes(),
        }
    }

    /// Convenience: boundary from the content type, then decode.
    pub fn from_content_type(content_type: &str) -> Result<Self, MultipartError> {
        parse_boundary(content_type).map(|b| Self::new(&b))
    }

    pub fn decode(&self, body: &Bytes) -> Result<MultipartForm, MultipartError> {
        let finder = memmem::Finder::new(&self.delimiter);
        let mut parts = Vec::new();

        let mut start = 0;
        let mut chunks = Vec::new();
        for pos in finder.find_iter(body) {
            chunks.push(start..pos);
            start = pos + self.delimiter.len();
        }
        chunks.push(start..body.len());

        for range in chunks {
            if let Some(part) = decode_chunk(&body.slice(range))? {
                parts.push(part);
            }
        }

        tracing::debug!(
            parts = parts.len(),
            files = parts.iter().filter(|p| p.is_file()).count(),
            "Multipart body decoded"
        );

        Ok(MultipartForm { parts })
    }
}

/// Decode a body with the boundary declared in `content_type`.
pub fn decode(content_type: &str, body: &Bytes) -> Result<MultipartForm, MultipartError> {
    MultipartDecoder::from_content_type(content_type)?.decode(body)
}

fn decode_chunk(chunk: &Bytes) -> Result<Option<MultipartPart>, MultipartError> {
    let Some(header_end) = memmem::find(chunk, HEADER_TERMINATOR) else {
        return Ok(None);
    };

    let headers = PartHeaders::parse(&String::from_utf8_lossy(&chunk[..header_end]));
    let Some(disposition) = headers.disposition else {
        return Ok(None);
    };
    let field_name = disposition.name.ok_or(MultipartError::MissingFieldName)?;

    let payload_start = header_end + HEADER_TERMINATOR.len();
    let trailing = if chunk.ends_with(CRLF) { CRLF.len() } else { 0 };
    let payload_end = (chunk.len() - trailing).max(payload_start);
    let payload = chunk.slice(payload_start..payload_end);

    let content_type = headers
        .content_type
        .unwrap_or_else(|| DEFAULT_PART_CONTENT_TYPE.to_string());

    // An empty filename is what browsers send for an unselected file input.
    let part = match disposition.filename.filter(|f| !f.is_empty()) {
        Some(filename) => MultipartPart {
            field_name,
            filename: Some(filename),
            content_type,
            payload,
        },
        None => MultipartPart {
            field_name,
            filename: None,
            content_type,
            payload: Bytes::from(String::from_utf8_lossy(&payload).trim().to_string()),
        },
    };

    Ok(Some(part))
}

#[derive(Debug, Default)]
struct PartHeaders {
    disposition: Option<ContentDisposition>,
    content_type: Option<String>,
}

impl PartHeaders {
    fn parse(block: &str) -> Self {
        let mut headers = PartHeaders::default();
        for line in block.lines() {
            let Some((name, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            match name.trim().to_ascii_lowercase().as_str() {
                "content-disposition" => {
                    headers.disposition = Some(ContentDisposition::parse(value));
                }
                "content-type" if !value.is_empty() => {
                    headers.content_type = Some(value.to_string());
                }
                _ => {}
            }
        }
        headers
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
struct ContentDisposition {
    name: Option<String>,
    filename: Option<String>,
}

impl ContentDisposition {
    /// `form-data; name="bill"; filename="r.png"`. Parameter values may be
    /// quoted and may then contain `;` and backslash-escaped quotes.
    fn parse(value: &str) -> Self {
        let mut out = ContentDisposition::default();
        // First token is the disposition type.
        for param in split_params(value).into_iter().skip(1) {
            let Some((key, raw)) = param.split_once('=') else {
                continue;
            };
            let val = unquote(raw.trim()).into_owned();
            match key.trim().to_ascii_lowercase().as_str() {
                "name" => out.name = Some(val),
                "filename" => out.filename = Some(val),
                _ => {}
            }
        }
        out
    }
}

/// Split on `;` outside of double quotes.
fn split_params(value: &str) -> Vec<&str> {
    let mut params = Vec::new();
    let mut in_quotes = false;
    let mut escaped = false;
    let mut start = 0;

    for (i, c) in value.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                params.push(value[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    params.push(value[start..].trim());
    params
}

fn unquote(value: &str) -> Cow<'_, str> {
    let Some(inner) = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
    else {
        return Cow::Borrowed(value);
    };
    if !inner.contains('\\') {
        return Cow::Borrowed(inner);
    }

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    Cow::Owned(out)
}
