//! Lenient object scanning and cross-reference reconstruction.
//!
//! Damaged files usually still contain intact `N G obj ... endobj` bodies
//! even when the table that points at them is gone or wrong. The scanner
//! collects those bodies from the raw bytes and [`rebuild`] writes them back
//! out behind a fresh header, cross-reference table and trailer.

use std::collections::BTreeMap;
use std::fmt::Write as _;

/// One object body recovered from raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedObject {
    /// Generation number from the object header.
    pub generation: u16,
    /// Bytes between `obj` and `endobj`.
    pub body: Vec<u8>,
}

/// Objects recovered from a damaged file, keyed by object number.
#[derive(Debug, Clone, Default)]
pub struct ScannedFile {
    /// PDF version from the header, when present.
    pub version: Option<String>,
    /// Last complete definition of each object number.
    pub objects: BTreeMap<u32, ScannedObject>,
    /// Reference to the Info dictionary named by any surviving trailer.
    pub info: Option<(u32, u16)>,
}

impl ScannedFile {
    /// Object id of the first body declaring `/Type /Catalog`.
    pub fn catalog(&self) -> Option<(u32, u16)> {
        self.objects
            .iter()
            .find(|(_, object)| declares_type(&object.body, b"Catalog"))
            .map(|(&number, object)| (number, object.generation))
    }
}

/// Scan `bytes` for object bodies.
///
/// A body is kept only when its `endobj` comes before the next object
/// header. When an object number appears more than once the last complete
/// definition wins, matching incremental-update semantics.
pub fn scan(bytes: &[u8]) -> ScannedFile {
    let headers = object_headers(bytes);
    let mut objects = BTreeMap::new();

    for (index, header) in headers.iter().enumerate() {
        let limit = headers
            .get(index + 1)
            .map_or(bytes.len(), |next| next.start);

        let Some(end) = find(&bytes[header.body_start..limit], b"endobj") else {
            continue;
        };

        objects.insert(
            header.number,
            ScannedObject {
                generation: header.generation,
                body: bytes[header.body_start..header.body_start + end].to_vec(),
            },
        );
    }

    let info = rfind(bytes, b"/Info")
        .and_then(|pos| parse_reference(&bytes[pos + 5..]))
        .filter(|(number, _)| objects.contains_key(number));

    ScannedFile {
        version: header_version(bytes),
        objects,
        info,
    }
}

/// Write a fresh file from the scanned objects.
///
/// Returns `None` when no catalog survived.
pub fn rebuild(scanned: &ScannedFile) -> Option<Vec<u8>> {
    let (root_number, root_generation) = scanned.catalog()?;
    let version = scanned.version.as_deref().unwrap_or("1.4");

    let mut out = Vec::new();
    out.extend_from_slice(format!("%PDF-{version}\n").as_bytes());
    out.extend_from_slice(b"%\xE2\xE3\xCF\xD3\n");

    let mut offsets = BTreeMap::new();
    for (&number, object) in &scanned.objects {
        offsets.insert(number, (out.len(), object.generation));
        out.extend_from_slice(format!("{number} {} obj", object.generation).as_bytes());
        out.extend_from_slice(&object.body);
        out.extend_from_slice(b"endobj\n");
    }

    let size = scanned.objects.keys().next_back().map_or(1, |last| last + 1);
    let xref_offset = out.len();

    let mut table = format!("xref\n0 {size}\n0000000000 65535 f \n");
    for number in 1..size {
        match offsets.get(&number) {
            Some((offset, generation)) => {
                let _ = write!(table, "{offset:010} {generation:05} n \n");
            }
            None => table.push_str("0000000000 00000 f \n"),
        }
    }

    let _ = write!(
        table,
        "trailer\n<< /Size {size} /Root {root_number} {root_generation} R"
    );
    if let Some((number, generation)) = scanned.info {
        let _ = write!(table, " /Info {number} {generation} R");
    }
    let _ = write!(table, " >>\nstartxref\n{xref_offset}\n%%EOF\n");

    out.extend_from_slice(table.as_bytes());
    Some(out)
}

#[derive(Debug)]
struct ObjectHeader {
    number: u32,
    generation: u16,
    start: usize,
    body_start: usize,
}

fn object_headers(bytes: &[u8]) -> Vec<ObjectHeader> {
    let mut headers = Vec::new();
    let mut from = 0;

    while let Some(found) = find(&bytes[from..], b"obj") {
        let pos = from + found;
        from = pos + 3;

        // Skip "endobj" and keywords that merely start with "obj".
        if bytes.get(pos + 3).is_some_and(|b| b.is_ascii_alphanumeric()) {
            continue;
        }
        if let Some((number, generation, start)) = parse_header_before(bytes, pos) {
            headers.push(ObjectHeader {
                number,
                generation,
                start,
                body_start: pos + 3,
            });
        }
    }

    headers
}

/// Parse `N G` immediately before the `obj` keyword at `pos`.
fn parse_header_before(bytes: &[u8], pos: usize) -> Option<(u32, u16, usize)> {
    let mut cursor = pos;

    let gap = skip_whitespace_back(bytes, cursor);
    if gap == cursor {
        return None;
    }
    cursor = gap;

    let (generation, digits_start) = digits_back(bytes, cursor)?;
    cursor = skip_whitespace_back(bytes, digits_start);
    if cursor == digits_start {
        return None;
    }

    let (number, start) = digits_back(bytes, cursor)?;
    if start > 0 && !is_delimiter(bytes[start - 1]) {
        return None;
    }

    Some((number.try_into().ok()?, generation.try_into().ok()?, start))
}

fn skip_whitespace_back(bytes: &[u8], mut cursor: usize) -> usize {
    while cursor > 0 && bytes[cursor - 1].is_ascii_whitespace() {
        cursor -= 1;
    }
    cursor
}

fn digits_back(bytes: &[u8], end: usize) -> Option<(u64, usize)> {
    let mut start = end;
    while start > 0 && bytes[start - 1].is_ascii_digit() && end - start < 10 {
        start -= 1;
    }
    if start == end {
        return None;
    }
    std::str::from_utf8(&bytes[start..end])
        .ok()?
        .parse()
        .ok()
        .map(|value| (value, start))
}

fn is_delimiter(byte: u8) -> bool {
    byte.is_ascii_whitespace() || b"()<>[]{}/%".contains(&byte)
}

/// Parse `N G R` at the start of `bytes`, after optional whitespace.
fn parse_reference(bytes: &[u8]) -> Option<(u32, u16)> {
    let text = String::from_utf8_lossy(&bytes[..bytes.len().min(32)]);
    let mut parts = text.split_ascii_whitespace();
    let number = parts.next()?.parse().ok()?;
    let generation = parts.next()?.parse().ok()?;
    parts.next()?.starts_with('R').then_some((number, generation))
}

fn header_version(bytes: &[u8]) -> Option<String> {
    let window = &bytes[..bytes.len().min(1024)];
    let pos = find(window, b"%PDF-")?;
    let version: String = window[pos + 5..]
        .iter()
        .take_while(|b| b.is_ascii_digit() || **b == b'.')
        .map(|&b| b as char)
        .collect();
    (!version.is_empty()).then_some(version)
}

/// Whether an object body contains `/Type /<name>`.
fn declares_type(body: &[u8], name: &[u8]) -> bool {
    let mut from = 0;
    while let Some(found) = find(&body[from..], b"/Type") {
        let mut cursor = from + found + 5;
        from = cursor;
        while body.get(cursor).is_some_and(|b| b.is_ascii_whitespace()) {
            cursor += 1;
        }
        let rest = &body[cursor..];
        if rest.first() == Some(&b'/')
            && rest[1..].starts_with(name)
            && rest.get(1 + name.len()).is_none_or(|b| is_delimiter(*b))
        {
            return true;
        }
    }
    false
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).rposition(|w| w == needle)
}
