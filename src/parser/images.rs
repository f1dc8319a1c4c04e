//! Image enumeration and content hashing.

use std::collections::HashSet;

use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId, Stream};
use sha2::{Digest, Sha256};

use super::objects::{
    get_dict, get_resolved, inherited_attribute, name_string, resolve, resolve_dict, stream_content,
};
use crate::model::ImageAtom;

/// Filters whose output is an image codec payload rather than raw samples.
const IMAGE_CODECS: &[&str] = &["DCTDecode", "JPXDecode", "JBIG2Decode", "CCITTFaxDecode"];

/// Form XObjects nested deeper than this are not searched.
const MAX_FORM_DEPTH: usize = 8;

/// Calculate SHA-256 hash as hex string.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Payload of an image stream used for hashing.
///
/// Streams are decoded through their general-purpose filters; when the last
/// filter is an image codec the encoded codec bytes are the payload.
pub fn image_payload(stream: &Stream) -> Vec<u8> {
    let filters = stream_filters(stream);
    let ends_in_codec = filters
        .last()
        .map(|f| IMAGE_CODECS.contains(&f.as_str()))
        .unwrap_or(false);

    if !ends_in_codec {
        return stream_content(stream);
    }
    if filters.len() == 1 {
        return stream.content.clone();
    }

    // Codec wrapped in general filters: strip those and keep the codec bytes.
    let mut outer = stream.clone();
    let leading: Vec<Object> = filters[..filters.len() - 1]
        .iter()
        .map(|f| Object::Name(f.as_bytes().to_vec()))
        .collect();
    outer.dict.set("Filter", Object::Array(leading));
    stream_content(&outer)
}

fn stream_filters(stream: &Stream) -> Vec<String> {
    match stream.dict.get(b"Filter") {
        Ok(Object::Name(name)) => vec![String::from_utf8_lossy(name).into_owned()],
        Ok(Object::Array(items)) => items.iter().filter_map(name_string).collect(),
        _ => Vec::new(),
    }
}

/// Enumerate and hash the images a page can draw.
///
/// Walks the page's effective `/XObject` resources and the resources of
/// nested form XObjects. Images are de-duplicated by object number and
/// returned in first-seen order. Only indirect image streams are reported.
pub fn page_images(doc: &LopdfDocument, page_id: ObjectId) -> Vec<ImageAtom> {
    let mut collector = ImageCollector {
        doc,
        seen: HashSet::new(),
        visited_forms: HashSet::new(),
        images: Vec::new(),
    };

    if let Some(resources) =
        inherited_attribute(doc, page_id, b"Resources").and_then(|r| resolve_dict(doc, r))
    {
        collector.walk_resources(resources, 0);
    }
    collector.images
}

struct ImageCollector<'a> {
    doc: &'a LopdfDocument,
    seen: HashSet<ObjectId>,
    visited_forms: HashSet<ObjectId>,
    images: Vec<ImageAtom>,
}

impl<'a> ImageCollector<'a> {
    fn walk_resources(&mut self, resources: &'a Dictionary, depth: usize) {
        let Some(xobjects) = get_dict(self.doc, resources, b"XObject") else {
            return;
        };

        for (_, entry) in xobjects.iter() {
            let Object::Reference(id) = entry else {
                continue;
            };
            let Some(Object::Stream(stream)) = resolve(self.doc, entry) else {
                continue;
            };

            match get_resolved(self.doc, &stream.dict, b"Subtype")
                .and_then(name_string)
                .as_deref()
            {
                Some("Image") => {
                    if self.seen.insert(*id) {
                        self.images.push(ImageAtom {
                            xref: id.0,
                            sha: sha256_hex(&image_payload(stream)),
                        });
                    }
                }
                Some("Form") => {
                    if depth < MAX_FORM_DEPTH && self.visited_forms.insert(*id) {
                        if let Some(form_resources) = get_dict(self.doc, &stream.dict, b"Resources")
                        {
                            self.walk_resources(form_resources, depth + 1);
                        }
                    }
                }
                _ => {}
            }
        }
    }
}
