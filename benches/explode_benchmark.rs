//! Benchmarks for explode and export performance.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lopdf::{dictionary, Document, Object, Stream};

use pdf_atomizer::parser::NullObserver;
use pdf_atomizer::render::{self, JsonFormat, YamlOptions};
use pdf_atomizer::{Atomizer, ExplodeOptions};

/// Creates a synthetic PDF with the given number of text pages.
fn create_test_pdf(page_count: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids = Vec::with_capacity(page_count);
    for i in 0..page_count {
        let mut ops = String::new();
        for line in 0..40 {
            ops.push_str(&format!(
                "BT /F1 10 Tf 72 {} Td (Page {} line {} - Position {}) Tj ET\n",
                740 - line * 16,
                i + 1,
                line + 1,
                line * 16
            ));
        }
        let content_id = doc.add_object(Stream::new(dictionary! {}, ops.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
        });
        kids.push(Object::from(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

fn explode(data: &[u8]) -> pdf_atomizer::AtomDocument {
    let mut atomizer = Atomizer::from_bytes_with_options(data, ExplodeOptions::new())
        .unwrap()
        .with_observer(NullObserver);
    atomizer.explode().unwrap();
    atomizer.into_atoms()
}

/// Benchmark header detection.
fn bench_header_detection(c: &mut Criterion) {
    let pdf_data = create_test_pdf(1);
    let non_pdf_data = b"Not a PDF file at all, just random text content";

    c.bench_function("detect_valid_pdf", |b| {
        b.iter(|| pdf_atomizer::detect_header_from_bytes(black_box(&pdf_data)).unwrap());
    });

    c.bench_function("detect_non_pdf", |b| {
        b.iter(|| pdf_atomizer::detect_header_from_bytes(black_box(non_pdf_data)).is_err());
    });
}

/// Benchmark the full explode at various sizes.
fn bench_explode(c: &mut Criterion) {
    let mut group = c.benchmark_group("explode");

    for page_count in [1, 5, 20] {
        let data = create_test_pdf(page_count);
        group.bench_function(format!("{}_pages", page_count), |b| {
            b.iter(|| explode(black_box(&data)));
        });
    }

    group.finish();
}

/// Benchmark the JSON and YAML exports.
fn bench_exports(c: &mut Criterion) {
    let atoms = explode(&create_test_pdf(10));
    let yaml_options = YamlOptions::default();

    c.bench_function("to_json_pretty", |b| {
        b.iter(|| render::to_json(black_box(&atoms), JsonFormat::Pretty).unwrap());
    });

    c.bench_function("to_yaml", |b| {
        b.iter(|| render::to_yaml(black_box(&atoms), &yaml_options).unwrap());
    });
}

criterion_group!(benches, bench_header_detection, bench_explode, bench_exports);
criterion_main!(benches);
