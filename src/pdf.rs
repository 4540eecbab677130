//! Streaming PDF writer.
//!
//! Objects are written in a single pass while byte offsets are recorded, so
//! the xref table can be emitted at the end without buffering the document.
//! Each output page carries exactly one image XObject; JPEG data passes
//! through untouched under `/DCTDecode`, anything else is embedded as raw
//! RGB rows. Binary streams are ASCII-hex armored to keep the file 7-bit
//! clean.

use crate::canvas::{Command, Document, Page};
use crate::metrics::{DocumentMetrics, PageMetrics};
use crate::types::{Pt, Size};
use base64::Engine;
use image::GenericImageView;
use std::collections::HashMap;
use std::io::{self, Write};

const PDF_CATALOG_ID: usize = 1;
const PDF_PAGES_ID: usize = 2;

/// Render `document` to an in-memory PDF.
pub fn document_to_pdf(document: &Document) -> io::Result<Vec<u8>> {
    document_to_pdf_with_metrics(document).map(|(bytes, _)| bytes)
}

/// Render `document` and report per-page byte accounting alongside.
pub fn document_to_pdf_with_metrics(
    document: &Document,
) -> io::Result<(Vec<u8>, DocumentMetrics)> {
    let mut out = Vec::new();
    let metrics = {
        let mut writer = PdfWriter::new(&mut out, document.page_size)?;
        for page in &document.pages {
            writer.add_page(page)?;
        }
        writer.finish()?
    };
    Ok((out, metrics))
}

struct PdfWriter<'a, W: Write> {
    writer: &'a mut W,
    offset: usize,
    offsets: Vec<usize>,
    next_id: usize,
    page_size: Size,
    page_ids: Vec<usize>,
    /// Image content hash -> already-written object id, so identical
    /// bitmaps are embedded once.
    image_content_map: HashMap<u64, (usize, usize)>,
    page_metrics: Vec<PageMetrics>,
}

impl<'a, W: Write> PdfWriter<'a, W> {
    fn new(writer: &'a mut W, page_size: Size) -> io::Result<Self> {
        let mut offset = 0usize;
        write_bytes(writer, b"%PDF-1.7\n", &mut offset)?;
        // Binary-content marker comment, as recommended for files carrying
        // encoded image streams.
        write_bytes(writer, b"%\xE2\xE3\xCF\xD3\n", &mut offset)?;
        Ok(Self {
            writer,
            offset,
            offsets: vec![0; PDF_PAGES_ID + 1],
            next_id: PDF_PAGES_ID + 1,
            page_size,
            page_ids: Vec::new(),
            image_content_map: HashMap::new(),
            page_metrics: Vec::new(),
        })
    }

    fn alloc_ids(&mut self, count: usize) -> usize {
        let start = self.next_id;
        self.next_id = self.next_id.saturating_add(count);
        if self.offsets.len() < self.next_id {
            self.offsets.resize(self.next_id, 0);
        }
        start
    }

    fn write_object(&mut self, obj_id: usize, body: &str) -> io::Result<()> {
        if let Some(slot) = self.offsets.get_mut(obj_id) {
            *slot = self.offset;
        }
        write_str(self.writer, &format!("{} 0 obj\n", obj_id), &mut self.offset)?;
        write_bytes(self.writer, body.as_bytes(), &mut self.offset)?;
        write_bytes(self.writer, b"\nendobj\n", &mut self.offset)?;
        Ok(())
    }

    fn add_page(&mut self, page: &Page) -> io::Result<()> {
        let page_number = self.page_ids.len() + 1;
        let mut content = String::new();
        let mut xobjects: Vec<(String, usize)> = Vec::new();
        let mut image_bytes = 0usize;

        for command in &page.commands {
            let Command::DrawImage {
                x,
                y,
                width,
                height,
                resource_id,
            } = command
            else {
                // Card-level drawing is rasterized upstream; a page reaching
                // the writer holds image placements only.
                continue;
            };
            let image = load_image_resource(resource_id)?;
            let hash = hash_bytes(&image.data);
            let (obj_id, encoded_len) = match self.image_content_map.get(&hash) {
                Some(entry) => *entry,
                None => {
                    let obj_id = self.alloc_ids(1);
                    let body = image_object(&image);
                    let encoded_len = image.data.len();
                    self.write_object(obj_id, &body)?;
                    self.image_content_map.insert(hash, (obj_id, encoded_len));
                    (obj_id, encoded_len)
                }
            };
            image_bytes += encoded_len;

            let name = format!("Im{}", xobjects.len() + 1);
            // Flip into PDF's bottom-left origin.
            let y_pdf = self.page_size.height - *y - *height;
            content.push_str(&format!(
                "q\n{} 0 0 {} {} {} cm\n/{} Do\nQ\n",
                fmt_pt(*width),
                fmt_pt(*height),
                fmt_pt(*x),
                fmt_pt(y_pdf),
                name
            ));
            xobjects.push((name, obj_id));
        }

        let start = self.alloc_ids(2);
        let content_id = start;
        let page_id = start + 1;

        self.page_metrics.push(PageMetrics {
            page_number,
            content_bytes: content.len(),
            image_bytes,
        });
        self.write_object(content_id, &stream_object(&content))?;

        let resources = if xobjects.is_empty() {
            "<< >>".to_string()
        } else {
            let entries: Vec<String> = xobjects
                .iter()
                .map(|(name, id)| format!("/{} {} 0 R", name, id))
                .collect();
            format!("<< /XObject << {} >> >>", entries.join(" "))
        };
        let page_obj = format!(
            "<< /Type /Page /Parent {} 0 R /MediaBox [0 0 {} {}] /Resources {} /Contents {} 0 R >>",
            PDF_PAGES_ID,
            fmt_pt(self.page_size.width),
            fmt_pt(self.page_size.height),
            resources,
            content_id
        );
        self.write_object(page_id, &page_obj)?;
        self.page_ids.push(page_id);
        Ok(())
    }

    fn finish(mut self) -> io::Result<DocumentMetrics> {
        let kids: Vec<String> = self.page_ids.iter().map(|id| format!("{} 0 R", id)).collect();
        let pages_obj = format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids.join(" "),
            self.page_ids.len()
        );
        self.write_object(PDF_PAGES_ID, &pages_obj)?;
        self.write_object(
            PDF_CATALOG_ID,
            &format!("<< /Type /Catalog /Pages {} 0 R >>", PDF_PAGES_ID),
        )?;

        let total_objects = self.next_id.saturating_sub(1);
        let xref_start = self.offset;
        write_str(
            self.writer,
            &format!("xref\n0 {}\n", total_objects + 1),
            &mut self.offset,
        )?;
        write_bytes(self.writer, b"0000000000 65535 f \n", &mut self.offset)?;
        for id in 1..=total_objects {
            let obj_offset = self.offsets.get(id).copied().unwrap_or(0);
            write_str(
                self.writer,
                &format!("{:010} 00000 n \n", obj_offset),
                &mut self.offset,
            )?;
        }
        write_str(
            self.writer,
            &format!(
                "trailer\n<< /Size {} /Root {} 0 R >>\nstartxref\n{}\n%%EOF",
                total_objects + 1,
                PDF_CATALOG_ID,
                xref_start
            ),
            &mut self.offset,
        )?;

        Ok(DocumentMetrics {
            pages: self.page_metrics,
            total_bytes: self.offset,
        })
    }
}

struct ImageData {
    width: u32,
    height: u32,
    color_space: &'static str,
    filter: &'static str,
    data: Vec<u8>,
}

fn load_image_resource(resource_id: &str) -> io::Result<ImageData> {
    // A data: prefix commits the resource to URI parsing; a payload that
    // fails to decode must not be retried as a file path.
    let (mime, data) = if resource_id.starts_with("data:") {
        parse_data_uri(resource_id).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("malformed data uri '{}'", truncate_id(resource_id)),
            )
        })?
    } else {
        (String::new(), std::fs::read(resource_id)?)
    };
    decode_image(&data, if mime.is_empty() { None } else { Some(&mime) }).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("unsupported image resource '{}'", truncate_id(resource_id)),
        )
    })
}

fn decode_image(data: &[u8], mime: Option<&str>) -> Option<ImageData> {
    let format = match mime {
        Some(mime) if mime.contains("jpeg") || mime.contains("jpg") => {
            Some(image::ImageFormat::Jpeg)
        }
        Some(mime) if mime.contains("png") => Some(image::ImageFormat::Png),
        Some(_) => None,
        None => image::guess_format(data).ok(),
    };

    let decoded = image::load_from_memory(data).ok()?;
    let (width, height) = decoded.dimensions();

    if matches!(format, Some(image::ImageFormat::Jpeg)) {
        let color_space = match decoded.color() {
            image::ColorType::L8 | image::ColorType::La8 => "/DeviceGray",
            _ => "/DeviceRGB",
        };
        return Some(ImageData {
            width,
            height,
            color_space,
            filter: "/DCTDecode",
            data: data.to_vec(),
        });
    }

    // Non-JPEG sources are flattened to raw RGB rows. Alpha is dropped;
    // card bitmaps are always opaque.
    let rgba = decoded.to_rgba8();
    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    for pixel in rgba.pixels() {
        let [r, g, b, _] = pixel.0;
        rgb.extend_from_slice(&[r, g, b]);
    }
    Some(ImageData {
        width,
        height,
        color_space: "/DeviceRGB",
        filter: "",
        data: rgb,
    })
}

fn parse_data_uri(uri: &str) -> Option<(String, Vec<u8>)> {
    if !uri.starts_with("data:") {
        return None;
    }
    let (header, data_part) = uri.split_once(',')?;
    let mime = header
        .trim_start_matches("data:")
        .split(';')
        .next()
        .unwrap_or("application/octet-stream")
        .to_string();
    let data = if header.contains("base64") {
        base64::engine::general_purpose::STANDARD
            .decode(data_part)
            .ok()?
    } else {
        data_part.as_bytes().to_vec()
    };
    Some((mime, data))
}

fn image_object(image: &ImageData) -> String {
    let stream_data = encode_stream_data(&image.data);
    let filters = match image.filter {
        "/DCTDecode" => "[/ASCIIHexDecode /DCTDecode]",
        _ => "/ASCIIHexDecode",
    };
    format!(
        "<< /Type /XObject /Subtype /Image /Width {} /Height {} /ColorSpace {} /BitsPerComponent 8 /Length {} /Filter {} >>
stream
{}
endstream",
        image.width,
        image.height,
        image.color_space,
        stream_data.as_bytes().len(),
        filters,
        stream_data
    )
}

fn encode_stream_data(data: &[u8]) -> String {
    let mut hex = ascii_hex_encode(data);
    hex.push('>');
    hex
}

fn ascii_hex_encode(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 2);
    for (index, byte) in data.iter().enumerate() {
        use std::fmt::Write;
        let _ = write!(&mut out, "{:02X}", byte);
        if index % 32 == 31 {
            out.push('\n');
        }
    }
    out
}

fn stream_object(content: &str) -> String {
    format!(
        "<< /Length {} >>\nstream\n{}\nendstream",
        content.as_bytes().len(),
        content
    )
}

fn hash_bytes(data: &[u8]) -> u64 {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    data.hash(&mut hasher);
    hasher.finish()
}

fn truncate_id(resource_id: &str) -> &str {
    // data: URIs can run to megabytes; keep error messages readable.
    let mut end = resource_id.len().min(64);
    while !resource_id.is_char_boundary(end) {
        end -= 1;
    }
    &resource_id[..end]
}

fn fmt_pt(value: Pt) -> String {
    let mut s = format!("{:.3}", value.to_f32());
    while s.ends_with('0') {
        s.pop();
    }
    if s.ends_with('.') {
        s.pop();
    }
    s
}

fn write_bytes<W: Write>(writer: &mut W, data: &[u8], offset: &mut usize) -> io::Result<()> {
    writer.write_all(data)?;
    *offset += data.len();
    Ok(())
}

fn write_str<W: Write>(writer: &mut W, data: &str, offset: &mut usize) -> io::Result<()> {
    write_bytes(writer, data.as_bytes(), offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Canvas;

    fn tiny_jpeg() -> Vec<u8> {
        let mut out = Vec::new();
        let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, 80);
        encoder
            .encode(&[200u8, 100, 50], 1, 1, image::ExtendedColorType::Rgb8)
            .unwrap();
        out
    }

    fn jpeg_data_uri() -> String {
        format!(
            "data:image/jpeg;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(tiny_jpeg())
        )
    }

    fn one_image_document(pages: usize) -> Document {
        let mut canvas = Canvas::new(Size::a4());
        for _ in 0..pages {
            canvas.draw_image(
                Pt::from_f32(36.0),
                Pt::from_f32(36.0),
                Pt::from_f32(100.0),
                Pt::from_f32(141.0),
                jpeg_data_uri(),
            );
            canvas.show_page();
        }
        canvas.finish()
    }

    #[test]
    fn pdf_has_header_trailer_and_eof() {
        let bytes = document_to_pdf(&one_image_document(1)).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.7\n"));
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("trailer"));
        assert!(text.trim_end().ends_with("%%EOF"));
    }

    #[test]
    fn jpeg_images_pass_through_as_dctdecode() {
        let bytes = document_to_pdf(&one_image_document(1)).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Subtype /Image"));
        assert!(text.contains("[/ASCIIHexDecode /DCTDecode]"));
    }

    #[test]
    fn page_count_matches_document_pages() {
        let bytes = document_to_pdf(&one_image_document(3)).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Count 3"));
    }

    #[test]
    fn identical_images_are_embedded_once() {
        let (bytes, metrics) = document_to_pdf_with_metrics(&one_image_document(2)).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        let embeds = text.matches("/Subtype /Image").count();
        assert_eq!(embeds, 1);
        // Metrics still charge each page for the image it displays.
        assert_eq!(metrics.pages.len(), 2);
        assert!(metrics.pages.iter().all(|p| p.image_bytes > 0));
        assert_eq!(metrics.total_bytes, bytes.len());
    }

    #[test]
    fn image_placement_is_flipped_into_pdf_space() {
        let bytes = document_to_pdf(&one_image_document(1)).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        // y_pdf = 841.89 - 36 - 141 = 664.89
        assert!(text.contains("100 0 0 141 36 664.89 cm"));
        assert!(text.contains("/Im1 Do"));
    }

    fn single_image_error(resource_id: &str) -> io::Error {
        let mut canvas = Canvas::new(Size::a4());
        canvas.draw_image(
            Pt::ZERO,
            Pt::ZERO,
            Pt::from_f32(10.0),
            Pt::from_f32(10.0),
            resource_id,
        );
        document_to_pdf(&canvas.finish()).unwrap_err()
    }

    #[test]
    fn unresolvable_resource_is_an_input_error() {
        // Undecodable base64 payload: must not fall back to a file lookup.
        let err = single_image_error("data:image/jpeg;base64,!!!notbase64!!!");
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);

        // Valid base64 that is not an image.
        let garbage = base64::engine::general_purpose::STANDARD.encode(b"not an image");
        let err = single_image_error(&format!("data:image/jpeg;base64,{}", garbage));
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn xref_offsets_point_at_objects() {
        let bytes = document_to_pdf(&one_image_document(1)).unwrap();

        // startxref in the trailer must point at the xref keyword.
        let tail = String::from_utf8_lossy(&bytes[bytes.len().saturating_sub(512)..]).to_string();
        let startxref: usize = tail
            .lines()
            .skip_while(|line| *line != "startxref")
            .nth(1)
            .expect("startxref value")
            .trim()
            .parse()
            .expect("numeric startxref");
        assert!(bytes[startxref..].starts_with(b"xref"));

        // Every in-use entry must point at an "N 0 obj" line. Offsets are
        // byte positions, so the check runs over the raw bytes.
        let xref_text = String::from_utf8_lossy(&bytes[startxref..]).to_string();
        let mut checked = 0usize;
        for line in xref_text.lines().skip(2) {
            let Some(kind) = line.get(17..18) else { break };
            if kind != "n" {
                continue;
            }
            let offset: usize = line[..10].parse().expect("entry offset");
            let line_end = bytes[offset..]
                .iter()
                .position(|b| *b == b'\n')
                .expect("object line end");
            let obj_line = &bytes[offset..offset + line_end];
            assert!(obj_line.ends_with(b" 0 obj"), "offset {} misses object", offset);
            checked += 1;
        }
        assert!(checked >= 5, "only {} xref entries verified", checked);
    }
}
