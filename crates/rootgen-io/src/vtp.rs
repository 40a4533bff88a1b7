//! VTK XML PolyData (`.vtp`) reader and writer.
//!
//! The reader handles `ascii`, inline `binary` and `appended` data arrays
//! of any scalar type, in either byte order, behind `UInt32` or `UInt64`
//! block headers. Binary blocks may be zlib-compressed
//! (`vtkZLibDataCompressor`, the VTK writer default). The appended section
//! may be `base64` or `raw`; raw documents are not UTF-8, so they go
//! through [`read_vtp_bytes`].
//!
//! The writer emits inline binary arrays: `Float64` points and `Int64`
//! connectivity/offsets behind a `UInt64` header.

use std::borrow::Cow;
use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::debug;
use miniz_oxide::inflate::decompress_to_vec_zlib_with_limit;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use rootgen_math::Point3;
use rootgen_mesh::PolyMesh;

use crate::error::{IoError, Result};

const APPENDED_OPEN: &[u8] = b"<AppendedData";
const APPENDED_CLOSE: &[u8] = b"</AppendedData>";
const ZLIB_COMPRESSOR: &str = "vtkZLibDataCompressor";

#[derive(Debug, Clone, Copy, PartialEq)]
enum ByteOrder {
    Little,
    Big,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum HeaderType {
    UInt32,
    UInt64,
}

impl HeaderType {
    fn size(self) -> usize {
        match self {
            HeaderType::UInt32 => 4,
            HeaderType::UInt64 => 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ScalarType {
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float32,
    Float64,
}

impl ScalarType {
    fn parse(name: &str) -> Result<Self> {
        Ok(match name {
            "Int8" | "Char" => ScalarType::Int8,
            "UInt8" | "UnsignedChar" => ScalarType::UInt8,
            "Int16" => ScalarType::Int16,
            "UInt16" => ScalarType::UInt16,
            "Int32" => ScalarType::Int32,
            "UInt32" => ScalarType::UInt32,
            "Int64" | "IdType" => ScalarType::Int64,
            "UInt64" => ScalarType::UInt64,
            "Float32" => ScalarType::Float32,
            "Float64" => ScalarType::Float64,
            other => return Err(IoError::Unsupported(format!("data array type {other}"))),
        })
    }

    fn size(self) -> usize {
        match self {
            ScalarType::Int8 | ScalarType::UInt8 => 1,
            ScalarType::Int16 | ScalarType::UInt16 => 2,
            ScalarType::Int32 | ScalarType::UInt32 | ScalarType::Float32 => 4,
            ScalarType::Int64 | ScalarType::UInt64 | ScalarType::Float64 => 8,
        }
    }

    fn read(self, bytes: &[u8], order: ByteOrder) -> f64 {
        macro_rules! num {
            ($t:ty) => {{
                let raw = bytes.try_into().unwrap_or_default();
                match order {
                    ByteOrder::Little => <$t>::from_le_bytes(raw) as f64,
                    ByteOrder::Big => <$t>::from_be_bytes(raw) as f64,
                }
            }};
        }
        match self {
            ScalarType::Int8 => num!(i8),
            ScalarType::UInt8 => num!(u8),
            ScalarType::Int16 => num!(i16),
            ScalarType::UInt16 => num!(u16),
            ScalarType::Int32 => num!(i32),
            ScalarType::UInt32 => num!(u32),
            ScalarType::Int64 => num!(i64),
            ScalarType::UInt64 => num!(u64),
            ScalarType::Float32 => num!(f32),
            ScalarType::Float64 => num!(f64),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Format {
    Ascii,
    Binary,
    Appended { offset: usize },
}

/// Attributes of the `DataArray` currently being read.
#[derive(Debug, Clone)]
struct ArraySpec {
    scalar: ScalarType,
    name: Option<String>,
    components: usize,
    format: Format,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Encoding {
    Base64,
    Raw,
}

/// Contents of the `<AppendedData>` section after its `_` marker.
#[derive(Debug)]
struct Appended {
    encoding: Encoding,
    data: Vec<u8>,
}

/// How binary blocks are framed in one document.
#[derive(Debug, Clone, Copy)]
struct BlockLayout {
    header: HeaderType,
    order: ByteOrder,
    compressed: bool,
}

/// Encoded bytes a binary block is read from.
enum Source<'a> {
    /// Base64 text with whitespace removed.
    Base64(&'a [u8]),
    Raw(&'a [u8]),
}

#[derive(Debug, Default)]
struct CellArrays {
    connectivity: Option<Vec<f64>>,
    offsets: Option<Vec<f64>>,
}

#[derive(Debug, Default)]
struct Piece {
    points: Option<Vec<f64>>,
    lines: CellArrays,
    polys: CellArrays,
    strips: CellArrays,
}

struct Parser {
    layout: BlockLayout,
    appended: Option<Appended>,
    stack: Vec<String>,
    array: Option<ArraySpec>,
    text: String,
    piece: Option<Piece>,
    mesh: PolyMesh,
    saw_polydata: bool,
}

/// Decode a VTK XML PolyData document.
pub fn read_vtp(xml: &str) -> Result<PolyMesh> {
    read_vtp_bytes(xml.as_bytes())
}

/// Decode a VTK XML PolyData document given as bytes, which may carry a raw
/// binary appended section.
pub fn read_vtp_bytes(document: &[u8]) -> Result<PolyMesh> {
    let (markup, appended) = split_appended(document)?;
    let xml = std::str::from_utf8(&markup)
        .map_err(|e| IoError::InvalidData(format!("document markup is not UTF-8: {e}")))?;
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut parser = Parser {
        layout: BlockLayout {
            header: HeaderType::UInt32,
            order: ByteOrder::Little,
            compressed: false,
        },
        appended,
        stack: Vec::new(),
        array: None,
        text: String::new(),
        piece: None,
        mesh: PolyMesh::new(),
        saw_polydata: false,
    };

    loop {
        let event = reader.read_event().map_err(|e| {
            IoError::Xml(format!("at byte {}: {e}", reader.buffer_position()))
        })?;
        match event {
            Event::Start(e) => {
                let name = element_name(&e);
                parser.open(&name, &e)?;
                parser.stack.push(name);
            }
            Event::Empty(e) => {
                let name = element_name(&e);
                parser.open(&name, &e)?;
                parser.close(&name)?;
            }
            Event::End(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                parser.stack.pop();
                parser.close(&name)?;
            }
            Event::Text(t) => {
                if parser.array.is_some() {
                    let text = t.unescape().map_err(|e| IoError::Xml(e.to_string()))?;
                    parser.text.push_str(&text);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !parser.saw_polydata {
        return Err(IoError::InvalidData("document has no PolyData element".into()));
    }
    parser.mesh.validate()?;
    debug!(
        "read vtp: {} points, {} faces, {} lines",
        parser.mesh.num_points(),
        parser.mesh.num_faces(),
        parser.mesh.num_lines()
    );
    Ok(parser.mesh)
}

/// Decode a Base64-wrapped VTK XML PolyData document.
pub fn read_vtp_base64(encoded: &str) -> Result<PolyMesh> {
    read_vtp_bytes(&decode_base64(encoded.as_bytes())?)
}

/// Cut the `<AppendedData>` element out of `document`, returning the
/// remaining markup and the section payload.
fn split_appended(document: &[u8]) -> Result<(Cow<'_, [u8]>, Option<Appended>)> {
    let Some(start) = find(document, APPENDED_OPEN) else {
        return Ok((Cow::Borrowed(document), None));
    };
    let tag_end = document[start..]
        .iter()
        .position(|&b| b == b'>')
        .map(|i| start + i)
        .ok_or_else(|| IoError::Xml("unterminated AppendedData tag".into()))?;
    let tag = std::str::from_utf8(&document[start..=tag_end])
        .map_err(|e| IoError::Xml(format!("AppendedData tag: {e}")))?;
    let encoding = appended_encoding(tag)?;

    let mut markup = document[..start].to_vec();
    if tag.ends_with("/>") {
        markup.extend_from_slice(&document[tag_end + 1..]);
        let appended = Appended {
            encoding,
            data: Vec::new(),
        };
        return Ok((Cow::Owned(markup), Some(appended)));
    }

    // raw payloads may contain anything, so the section ends at the last close tag
    let end = rfind(document, APPENDED_CLOSE)
        .filter(|&end| end > tag_end)
        .ok_or_else(|| IoError::InvalidData("AppendedData is not closed".into()))?;
    let body = &document[tag_end + 1..end];
    let marker = body
        .iter()
        .position(|&b| !b.is_ascii_whitespace())
        .filter(|&i| body[i] == b'_')
        .ok_or_else(|| IoError::InvalidData("AppendedData does not start with '_'".into()))?;
    markup.extend_from_slice(&document[end + APPENDED_CLOSE.len()..]);

    let appended = Appended {
        encoding,
        data: body[marker + 1..].to_vec(),
    };
    debug!(
        "appended data: {:?}, {} bytes",
        appended.encoding,
        appended.data.len()
    );
    Ok((Cow::Owned(markup), Some(appended)))
}

fn appended_encoding(tag: &str) -> Result<Encoding> {
    let mut reader = Reader::from_str(tag);
    let attrs = match reader.read_event() {
        Ok(Event::Start(e)) | Ok(Event::Empty(e)) => attributes(&e)?,
        Ok(other) => return Err(IoError::Xml(format!("unexpected {other:?} in AppendedData"))),
        Err(e) => return Err(IoError::Xml(e.to_string())),
    };
    match attrs.get("encoding").map(String::as_str) {
        None | Some("base64") => Ok(Encoding::Base64),
        Some("raw") => Ok(Encoding::Raw),
        Some(other) => Err(IoError::Unsupported(format!("appended encoding {other}"))),
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).rposition(|w| w == needle)
}

impl Parser {
    fn open(&mut self, name: &str, e: &BytesStart) -> Result<()> {
        match name {
            "VTKFile" => {
                let attrs = attributes(e)?;
                if let Some(kind) = attrs.get("type") {
                    if kind != "PolyData" {
                        return Err(IoError::Unsupported(format!("VTK dataset type {kind}")));
                    }
                }
                self.layout.compressed = match attrs.get("compressor").map(String::as_str) {
                    None => false,
                    Some(ZLIB_COMPRESSOR) => true,
                    Some(other) => {
                        return Err(IoError::Unsupported(format!("compressor {other}")))
                    }
                };
                self.layout.order = match attrs.get("byte_order").map(String::as_str) {
                    None | Some("LittleEndian") => ByteOrder::Little,
                    Some("BigEndian") => ByteOrder::Big,
                    Some(other) => {
                        return Err(IoError::InvalidData(format!("byte_order {other}")))
                    }
                };
                self.layout.header = match attrs.get("header_type").map(String::as_str) {
                    None | Some("UInt32") => HeaderType::UInt32,
                    Some("UInt64") => HeaderType::UInt64,
                    Some(other) => {
                        return Err(IoError::InvalidData(format!("header_type {other}")))
                    }
                };
            }
            "PolyData" => self.saw_polydata = true,
            "Piece" => self.piece = Some(Piece::default()),
            "DataArray" => {
                let attrs = attributes(e)?;
                let scalar = ScalarType::parse(
                    attrs
                        .get("type")
                        .ok_or_else(|| IoError::InvalidData("DataArray without type".into()))?,
                )?;
                let format = match attrs.get("format").map(String::as_str) {
                    None | Some("ascii") => Format::Ascii,
                    Some("binary") => Format::Binary,
                    Some("appended") => {
                        let offset = attrs
                            .get("offset")
                            .and_then(|o| o.trim().parse().ok())
                            .ok_or_else(|| {
                                IoError::InvalidData("appended DataArray without offset".into())
                            })?;
                        Format::Appended { offset }
                    }
                    Some(other) => {
                        return Err(IoError::Unsupported(format!("{other} data arrays")))
                    }
                };
                let components = match attrs.get("NumberOfComponents") {
                    Some(n) => n.trim().parse().map_err(|_| {
                        IoError::InvalidData(format!("NumberOfComponents {n}"))
                    })?,
                    None => 1,
                };
                self.array = Some(ArraySpec {
                    scalar,
                    name: attrs.get("Name").cloned(),
                    components,
                    format,
                });
                self.text.clear();
            }
            _ => {}
        }
        Ok(())
    }

    fn close(&mut self, name: &str) -> Result<()> {
        match name {
            "DataArray" => {
                let Some(spec) = self.array.take() else {
                    return Ok(());
                };
                let values = self.decode_array(&spec)?;
                self.text.clear();
                self.store(&spec, values)
            }
            "Piece" => {
                if let Some(piece) = self.piece.take() {
                    let mesh = piece.into_mesh()?;
                    self.mesh = rootgen_mesh::append(&[&self.mesh, &mesh]);
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn decode_array(&self, spec: &ArraySpec) -> Result<Vec<f64>> {
        let data = match spec.format {
            Format::Ascii => {
                return self
                    .text
                    .split_whitespace()
                    .map(|tok| {
                        tok.parse::<f64>()
                            .map_err(|_| IoError::InvalidData(format!("bad ascii value {tok:?}")))
                    })
                    .collect();
            }
            Format::Binary => {
                let compact = strip_whitespace(self.text.as_bytes());
                if compact.is_empty() {
                    return Ok(Vec::new());
                }
                self.layout.read_block(&Source::Base64(&compact))?
            }
            Format::Appended { offset } => {
                let appended = self.appended.as_ref().ok_or_else(|| {
                    IoError::InvalidData("appended DataArray but no AppendedData section".into())
                })?;
                let tail = appended.data.get(offset..).ok_or_else(|| {
                    IoError::InvalidData(format!(
                        "offset {offset} past the {}-byte appended section",
                        appended.data.len()
                    ))
                })?;
                match appended.encoding {
                    Encoding::Raw => self.layout.read_block(&Source::Raw(tail))?,
                    Encoding::Base64 => {
                        self.layout.read_block(&Source::Base64(&strip_whitespace(tail)))?
                    }
                }
            }
        };

        let size = spec.scalar.size();
        if data.len() % size != 0 {
            return Err(IoError::InvalidData(format!(
                "binary block of {} bytes does not hold whole {:?} values",
                data.len(),
                spec.scalar
            )));
        }
        Ok(data
            .chunks_exact(size)
            .map(|chunk| spec.scalar.read(chunk, self.layout.order))
            .collect())
    }

    fn store(&mut self, spec: &ArraySpec, values: Vec<f64>) -> Result<()> {
        let Some(piece) = self.piece.as_mut() else {
            return Ok(());
        };
        // `stack` holds the ancestors of the array that just closed
        let section = self.stack.last().map(String::as_str).unwrap_or("");
        let cells = match section {
            "Points" => {
                if spec.components != 3 {
                    return Err(IoError::InvalidData(format!(
                        "points need 3 components, got {}",
                        spec.components
                    )));
                }
                piece.points = Some(values);
                return Ok(());
            }
            "Lines" => &mut piece.lines,
            "Polys" => &mut piece.polys,
            "Strips" => &mut piece.strips,
            _ => return Ok(()),
        };
        match spec.name.as_deref() {
            Some("connectivity") => cells.connectivity = Some(values),
            Some("offsets") => cells.offsets = Some(values),
            _ => {}
        }
        Ok(())
    }
}

impl BlockLayout {
    /// Read one data block, returning its uncompressed payload.
    ///
    /// Uncompressed blocks carry a single header value, the payload length.
    /// Compressed blocks carry `[blocks, block_size, last_size, sizes..]`
    /// followed by that many zlib streams; a `last_size` of zero means the
    /// final block is full.
    fn read_block(&self, source: &Source) -> Result<Vec<u8>> {
        let hsize = self.header.size();
        let (first, _) = source.take(hsize, 0)?;
        let first = self.header_value(&first, 0)?;
        if !self.compressed {
            return Ok(source.take(hsize, first)?.1);
        }

        let blocks = first;
        let head_len = blocks
            .checked_add(3)
            .and_then(|n| n.checked_mul(hsize))
            .ok_or_else(|| IoError::InvalidData(format!("{blocks} compressed blocks")))?;
        let (head, _) = source.take(head_len, 0)?;
        let block_size = self.header_value(&head, 1)?;
        let last_size = self.header_value(&head, 2)?;
        let sizes = (0..blocks)
            .map(|i| self.header_value(&head, 3 + i))
            .collect::<Result<Vec<usize>>>()?;
        let packed_len = sizes
            .iter()
            .try_fold(0usize, |acc, &s| acc.checked_add(s))
            .ok_or_else(|| IoError::InvalidData("compressed sizes overflow".into()))?;
        let (_, packed) = source.take(head_len, packed_len)?;

        let mut out = Vec::new();
        let mut start = 0;
        for (i, &size) in sizes.iter().enumerate() {
            let expected = if i + 1 == blocks && last_size != 0 {
                last_size
            } else {
                block_size
            };
            let chunk = &packed[start..start + size];
            // one spare byte, so an exact fit never reports the limit as hit
            let raw = decompress_to_vec_zlib_with_limit(chunk, expected.saturating_add(1))
                .map_err(|e| IoError::InvalidData(format!("zlib block {i}: {e:?}")))?;
            if raw.len() != expected {
                return Err(IoError::InvalidData(format!(
                    "zlib block {i} inflates to {} bytes, header says {expected}",
                    raw.len()
                )));
            }
            out.extend_from_slice(&raw);
            start += size;
        }
        Ok(out)
    }

    /// Header word `index` of `bytes`.
    fn header_value(&self, bytes: &[u8], index: usize) -> Result<usize> {
        let size = self.header.size();
        let raw = bytes
            .get(index * size..(index + 1) * size)
            .ok_or_else(|| IoError::InvalidData("binary block header is truncated".into()))?;
        let mut word = [0u8; 8];
        let value = match self.order {
            ByteOrder::Little => {
                word[..size].copy_from_slice(raw);
                u64::from_le_bytes(word)
            }
            ByteOrder::Big => {
                word[8 - size..].copy_from_slice(raw);
                u64::from_be_bytes(word)
            }
        };
        usize::try_from(value)
            .map_err(|_| IoError::InvalidData(format!("block header value {value}")))
    }
}

impl Source<'_> {
    /// Decode the `head` header bytes at the start of the block and the
    /// `body` bytes that follow them.
    fn take(&self, head: usize, body: usize) -> Result<(Vec<u8>, Vec<u8>)> {
        match *self {
            Source::Raw(bytes) => {
                let end = head
                    .checked_add(body)
                    .filter(|&end| end <= bytes.len())
                    .ok_or_else(truncated)?;
                Ok((bytes[..head].to_vec(), bytes[head..end].to_vec()))
            }
            Source::Base64(text) => split_base64(text, head, body),
        }
    }
}

/// Decode a header and a body that were Base64-encoded either as one
/// stream or as two separately padded runs.
fn split_base64(text: &[u8], head: usize, body: usize) -> Result<(Vec<u8>, Vec<u8>)> {
    let head_chars = encoded_len(head)?;
    let prefix = text.get(..head_chars).ok_or_else(truncated)?;
    let padding = prefix.iter().rev().take_while(|&&c| c == b'=').count();

    // a header encoded on its own ends in exactly this much padding
    if head % 3 != 0 && padding == head_chars / 4 * 3 - head {
        let end = head_chars
            .checked_add(encoded_len(body)?)
            .ok_or_else(truncated)?;
        let rest = text.get(head_chars..end).ok_or_else(truncated)?;
        let data = decode_base64(rest)?;
        if data.len() != body {
            return Err(truncated());
        }
        return Ok((decode_base64(prefix)?, data));
    }

    let total = head.checked_add(body).ok_or_else(truncated)?;
    let end = encoded_len(total)?.min(text.len());
    let mut joint = decode_base64(&text[..end])?;
    if joint.len() < total {
        return Err(truncated());
    }
    let mut data = joint.split_off(head);
    data.truncate(body);
    Ok((joint, data))
}

fn encoded_len(bytes: usize) -> Result<usize> {
    bytes.div_ceil(3).checked_mul(4).ok_or_else(truncated)
}

fn truncated() -> IoError {
    IoError::InvalidData("binary block is shorter than its header says".into())
}

fn strip_whitespace(bytes: &[u8]) -> Vec<u8> {
    bytes
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect()
}

impl Piece {
    fn into_mesh(self) -> Result<PolyMesh> {
        let coords = self.points.unwrap_or_default();
        if coords.len() % 3 != 0 {
            return Err(IoError::InvalidData(format!(
                "point array length {} is not a multiple of 3",
                coords.len()
            )));
        }
        let points = coords
            .chunks_exact(3)
            .map(|c| Point3::new(c[0], c[1], c[2]))
            .collect();

        let mut mesh = PolyMesh {
            points,
            faces: Vec::new(),
            lines: Vec::new(),
        };
        for cell in self.lines.into_cells("Lines")? {
            // a polyline with n points becomes n - 1 segments
            mesh.lines.extend(cell.windows(2).map(|w| [w[0], w[1]]));
        }
        for cell in self.polys.into_cells("Polys")? {
            mesh.faces.push(cell);
        }
        for cell in self.strips.into_cells("Strips")? {
            for (k, w) in cell.windows(3).enumerate() {
                if k % 2 == 0 {
                    mesh.faces.push(vec![w[0], w[1], w[2]]);
                } else {
                    mesh.faces.push(vec![w[1], w[0], w[2]]);
                }
            }
        }
        Ok(mesh)
    }
}

impl CellArrays {
    fn into_cells(self, section: &str) -> Result<Vec<Vec<u32>>> {
        let (connectivity, offsets) = match (self.connectivity, self.offsets) {
            (Some(c), Some(o)) => (to_indices(&c, section)?, to_indices(&o, section)?),
            (None, None) => return Ok(Vec::new()),
            _ => {
                return Err(IoError::InvalidData(format!(
                    "{section} needs both connectivity and offsets"
                )))
            }
        };
        let mut cells = Vec::with_capacity(offsets.len());
        let mut start = 0usize;
        for &end in &offsets {
            let end = end as usize;
            if end < start || end > connectivity.len() {
                return Err(IoError::InvalidData(format!(
                    "{section} offset {end} out of order or past connectivity length {}",
                    connectivity.len()
                )));
            }
            cells.push(connectivity[start..end].to_vec());
            start = end;
        }
        Ok(cells)
    }
}

fn element_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

fn attributes(e: &BytesStart) -> Result<HashMap<String, String>> {
    let mut out = HashMap::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| IoError::Xml(err.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| IoError::Xml(err.to_string()))?
            .into_owned();
        out.insert(key, value);
    }
    Ok(out)
}

fn to_indices(values: &[f64], section: &str) -> Result<Vec<u32>> {
    values
        .iter()
        .map(|&v| {
            if v >= 0.0 && v.fract() == 0.0 && v <= u32::MAX as f64 {
                Ok(v as u32)
            } else {
                Err(IoError::InvalidData(format!("{section} has invalid index {v}")))
            }
        })
        .collect()
}

fn decode_base64(encoded: &[u8]) -> Result<Vec<u8>> {
    let compact = strip_whitespace(encoded);
    STANDARD
        .decode(compact)
        .map_err(|e| IoError::Base64(e.to_string()))
}

fn encode_block(data: &[u8]) -> String {
    let mut block = Vec::with_capacity(8 + data.len());
    block.extend_from_slice(&(data.len() as u64).to_le_bytes());
    block.extend_from_slice(data);
    STANDARD.encode(block)
}

fn encode_f64(values: impl Iterator<Item = f64>) -> String {
    let bytes: Vec<u8> = values.flat_map(f64::to_le_bytes).collect();
    encode_block(&bytes)
}

fn encode_i64(values: impl Iterator<Item = i64>) -> String {
    let bytes: Vec<u8> = values.flat_map(i64::to_le_bytes).collect();
    encode_block(&bytes)
}

fn cell_arrays<'a>(cells: impl Iterator<Item = &'a [u32]>) -> (String, String) {
    let mut connectivity = Vec::new();
    let mut offsets = Vec::new();
    for cell in cells {
        connectivity.extend(cell.iter().map(|&i| i as i64));
        offsets.push(connectivity.len() as i64);
    }
    (
        encode_i64(connectivity.into_iter()),
        encode_i64(offsets.into_iter()),
    )
}

/// Encode a mesh as a VTK XML PolyData document.
pub fn write_vtp(mesh: &PolyMesh) -> String {
    let points = encode_f64(mesh.points.iter().flat_map(|p| [p.x, p.y, p.z]));
    let (line_conn, line_offsets) = cell_arrays(mesh.lines.iter().map(|l| l.as_slice()));
    let (poly_conn, poly_offsets) = cell_arrays(mesh.faces.iter().map(Vec::as_slice));

    format!(
        r#"<?xml version="1.0"?>
<VTKFile type="PolyData" version="1.0" byte_order="LittleEndian" header_type="UInt64">
  <PolyData>
    <Piece NumberOfPoints="{}" NumberOfVerts="0" NumberOfLines="{}" NumberOfStrips="0" NumberOfPolys="{}">
      <Points>
        <DataArray type="Float64" Name="Points" NumberOfComponents="3" format="binary">{points}</DataArray>
      </Points>
      <Lines>
        <DataArray type="Int64" Name="connectivity" format="binary">{line_conn}</DataArray>
        <DataArray type="Int64" Name="offsets" format="binary">{line_offsets}</DataArray>
      </Lines>
      <Polys>
        <DataArray type="Int64" Name="connectivity" format="binary">{poly_conn}</DataArray>
        <DataArray type="Int64" Name="offsets" format="binary">{poly_offsets}</DataArray>
      </Polys>
    </Piece>
  </PolyData>
</VTKFile>
"#,
        mesh.num_points(),
        mesh.num_lines(),
        mesh.num_faces(),
    )
}

/// Encode a mesh as a VTK XML PolyData document wrapped in Base64.
pub fn write_vtp_base64(mesh: &PolyMesh) -> String {
    STANDARD.encode(write_vtp(mesh))
}
