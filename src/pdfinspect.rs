//! Read-back verification of generated PDFs via an independent parser.
//! Used by tests and by the CLI to confirm the exported file really holds
//! one page per card before reporting success.

use crate::error::BingoError;
use lopdf::{Document as LoDocument, Object as LoObject};

#[derive(Debug, Clone, PartialEq)]
pub struct PdfInspectReport {
    pub pdf_version: String,
    pub page_count: usize,
    pub file_size_bytes: usize,
    pub pages: Vec<PageInfo>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageInfo {
    /// MediaBox width in points, when the page declares one.
    pub width: Option<f32>,
    pub height: Option<f32>,
    /// Image XObjects referenced by the page's resources.
    pub image_count: usize,
}

pub fn inspect_pdf_bytes(bytes: &[u8]) -> Result<PdfInspectReport, BingoError> {
    let pdf = LoDocument::load_mem(bytes)
        .map_err(|err| BingoError::Inspect(format!("pdf parse failed: {}", err)))?;

    let mut pages = Vec::new();
    for (_, page_id) in pdf.get_pages() {
        let media_box = resolve_media_box(&pdf, page_id);
        let (width, height) = match media_box {
            Some([x0, y0, x1, y1]) => (Some(x1 - x0), Some(y1 - y0)),
            None => (None, None),
        };
        pages.push(PageInfo {
            width,
            height,
            image_count: count_page_images(&pdf, page_id),
        });
    }

    Ok(PdfInspectReport {
        pdf_version: pdf.version.clone(),
        page_count: pages.len(),
        file_size_bytes: bytes.len(),
        pages,
    })
}

/// MediaBox lookup with inheritance: absent on the page itself, walk up
/// the /Parent chain (bounded, in case of malformed cycles).
fn resolve_media_box(pdf: &LoDocument, page_id: lopdf::ObjectId) -> Option<[f32; 4]> {
    let mut current = page_id;
    for _ in 0..8 {
        let dict = pdf.get_object(current).ok()?.as_dict().ok()?;
        if let Ok(obj) = dict.get(b"MediaBox") {
            let array = match obj {
                LoObject::Reference(id) => pdf.get_object(*id).ok()?.as_array().ok()?,
                other => other.as_array().ok()?,
            };
            if array.len() == 4 {
                let mut values = [0.0f32; 4];
                for (slot, item) in values.iter_mut().zip(array) {
                    *slot = object_to_f32(item)?;
                }
                return Some(values);
            }
            return None;
        }
        match dict.get(b"Parent") {
            Ok(LoObject::Reference(id)) => current = *id,
            _ => return None,
        }
    }
    None
}

fn count_page_images(pdf: &LoDocument, page_id: lopdf::ObjectId) -> usize {
    let Ok(dict) = pdf.get_object(page_id).and_then(|o| o.as_dict()) else {
        return 0;
    };
    let resources = match dict.get(b"Resources") {
        Ok(LoObject::Reference(id)) => match pdf.get_object(*id).and_then(|o| o.as_dict()) {
            Ok(d) => d,
            Err(_) => return 0,
        },
        Ok(LoObject::Dictionary(d)) => d,
        _ => return 0,
    };
    let xobjects = match resources.get(b"XObject") {
        Ok(LoObject::Reference(id)) => match pdf.get_object(*id).and_then(|o| o.as_dict()) {
            Ok(d) => d,
            Err(_) => return 0,
        },
        Ok(LoObject::Dictionary(d)) => d,
        _ => return 0,
    };
    xobjects
        .iter()
        .filter(|(_, obj)| {
            let LoObject::Reference(id) = obj else {
                return false;
            };
            pdf.get_object(*id)
                .ok()
                .and_then(|o| o.as_stream().ok())
                .map(|stream| {
                    stream
                        .dict
                        .get(b"Subtype")
                        .and_then(|s| s.as_name())
                        .map(|name| name == b"Image".as_slice())
                        .unwrap_or(false)
                })
                .unwrap_or(false)
        })
        .count()
}

fn object_to_f32(obj: &LoObject) -> Option<f32> {
    match obj {
        LoObject::Integer(v) => Some(*v as f32),
        LoObject::Real(v) => Some(*v),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{Stream as LoStream, dictionary};

    fn single_page_pdf(width: i64, height: i64) -> Vec<u8> {
        let mut doc = LoDocument::with_version("1.5");
        let pages_id = doc.new_object_id();
        let content_id = doc.add_object(LoStream::new(dictionary! {}, b"q Q".to_vec()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
        });
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        };
        doc.objects.insert(pages_id, LoObject::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn reports_page_count_and_media_box() {
        let bytes = single_page_pdf(612, 792);
        let report = inspect_pdf_bytes(&bytes).unwrap();
        assert_eq!(report.page_count, 1);
        assert_eq!(report.file_size_bytes, bytes.len());
        assert_eq!(report.pages[0].width, Some(612.0));
        assert_eq!(report.pages[0].height, Some(792.0));
    }

    #[test]
    fn garbage_input_fails_to_parse() {
        let err = inspect_pdf_bytes(b"not a pdf at all").unwrap_err();
        assert!(matches!(err, BingoError::Inspect(_)));
    }
}
