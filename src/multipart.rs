//! Minimal multipart/form-data parsing for create/update requests
//!
//! Handles the subset the dashboard forms produce: text fields plus at most
//! one uploaded file. Buffered bodies only; the route layer enforces the byte
//! ceiling before this parser runs.

use std::collections::HashMap;

/// Parsed form body
#[derive(Debug, Default)]
pub struct MultipartForm {
    pub fields: HashMap<String, String>,
    pub file: Option<FilePart>,
}

/// One uploaded file part
#[derive(Debug)]
pub struct FilePart {
    pub field_name: String,
    pub filename: String,
    pub data: Vec<u8>,
}

impl MultipartForm {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|s| s.as_str())
    }
}

/// Extract the boundary parameter from a Content-Type header value
pub fn boundary_from_content_type(content_type: &str) -> Option<String> {
    let (mime, params) = content_type.split_once(';')?;
    if !mime.trim().eq_ignore_ascii_case("multipart/form-data") {
        return None;
    }
    for param in params.split(';') {
        let param = param.trim();
        if let Some(value) = param.strip_prefix("boundary=") {
            let value = value.trim_matches('"');
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}

/// Parse a buffered multipart/form-data body
pub fn parse(content_type: &str, body: &[u8]) -> Result<MultipartForm, String> {
    let boundary = boundary_from_content_type(content_type)
        .ok_or_else(|| "Missing multipart boundary".to_string())?;

    let delimiter = format!("--{}", boundary).into_bytes();
    let mut form = MultipartForm::default();

    // Skip the preamble up to the first delimiter
    let mut pos = find(body, &delimiter, 0).ok_or_else(|| "Malformed multipart body".to_string())?
        + delimiter.len();

    loop {
        // A trailing "--" after the delimiter closes the body
        if body[pos..].starts_with(b"--") {
            break;
        }
        if body[pos..].starts_with(b"\r\n") {
            pos += 2;
        }

        // Part content runs until the next "\r\n--boundary"
        let mut closing = Vec::with_capacity(delimiter.len() + 2);
        closing.extend_from_slice(b"\r\n");
        closing.extend_from_slice(&delimiter);

        let end = find(body, &closing, pos).ok_or_else(|| "Unterminated multipart part".to_string())?;
        parse_part(&body[pos..end], &mut form)?;

        pos = end + closing.len();
        if pos >= body.len() {
            break;
        }
    }

    Ok(form)
}

fn parse_part(part: &[u8], form: &mut MultipartForm) -> Result<(), String> {
    let header_end =
        find(part, b"\r\n\r\n", 0).ok_or_else(|| "Malformed multipart part".to_string())?;
    let headers = String::from_utf8_lossy(&part[..header_end]);
    let data = &part[header_end + 4..];

    let mut name = None;
    let mut filename = None;
    for line in headers.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        if key.trim().eq_ignore_ascii_case("content-disposition") {
            name = quoted_param(value, "name");
            filename = quoted_param(value, "filename");
        }
    }

    let Some(name) = name else {
        return Err("Multipart part without a field name".to_string());
    };

    match filename {
        // Parts with an empty filename come from a file input left blank
        Some(filename) if !filename.is_empty() => {
            if form.file.is_none() {
                form.file = Some(FilePart {
                    field_name: name,
                    filename,
                    data: data.to_vec(),
                });
            }
        }
        Some(_) => {}
        None => {
            form.fields
                .insert(name, String::from_utf8_lossy(data).into_owned());
        }
    }

    Ok(())
}

/// Pull `key="value"` out of a header parameter list. Parameters that only
/// start with the key text (`filename` when looking for `name`) are skipped.
fn quoted_param(header: &str, key: &str) -> Option<String> {
    for param in header.split(';') {
        let param = param.trim();
        if let Some(value) = param.strip_prefix(key) {
            if let Some(value) = value.strip_prefix('=') {
                return Some(value.trim_matches('"').to_string());
            }
        }
    }
    None
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from > haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| i + from)
}
