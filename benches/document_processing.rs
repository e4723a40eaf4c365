//! Performance benchmarks for document processing
//!
//! Measures:
//! - Parsing and reference resolution of the sample document
//! - Resolution of a large synthetic document whose references all point forward
//! - Serialization
//! - Graph queries over a parsed model
//!
//! Run with: cargo bench

use criterion::{criterion_group, criterion_main, Criterion};
use ome_graph::{codec, codec::SCHEMAS, config::ModelConfig};
use std::{fmt::Write, hint::black_box, path::PathBuf};

fn sample_document() -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/documents/sample.ome.xml");
    std::fs::read_to_string(path).unwrap()
}

/// `images` images, each referencing an instrument and an annotation declared after it.
fn synthetic_document(images: usize) -> String {
    let mut xml = String::from("<OME>");
    for i in 0..images {
        write!(
            xml,
            r#"<Image ID="Image:{i}" Name="image {i}">
                 <InstrumentRef ID="Instrument:{}"/>
                 <Pixels ID="Pixels:{i}" DimensionOrder="XYZCT" Type="uint16" SizeX="512" SizeY="512" SizeZ="1" SizeC="1" SizeT="1" PhysicalSizeX="0.1"/>
                 <AnnotationRef ID="Annotation:{i}"/>
               </Image>"#,
            i % 8
        )
        .unwrap();
    }
    for i in 0..8 {
        write!(
            xml,
            r#"<Instrument ID="Instrument:{i}">
                 <LightSource ID="LightSource:{i}" Power="10"><Laser Wavelength="488"/></LightSource>
                 <Detector ID="Detector:{i}" Voltage="600"/>
               </Instrument>"#
        )
        .unwrap();
    }
    xml.push_str("<StructuredAnnotations>");
    for i in 0..images {
        write!(
            xml,
            r#"<CommentAnnotation ID="Annotation:{i}"><Value>note {i}</Value></CommentAnnotation>"#
        )
        .unwrap();
    }
    xml.push_str("</StructuredAnnotations></OME>");
    xml
}

fn bench_parse_sample(c: &mut Criterion) {
    let xml = sample_document();
    let config = ModelConfig::default();

    c.bench_function("parse_sample", |b| {
        b.iter(|| {
            let parsed = codec::parse_str(black_box(&xml), &SCHEMAS, &config).unwrap();
            parsed.model.len()
        });
    });
}

fn bench_forward_resolution(c: &mut Criterion) {
    let xml = synthetic_document(1000);
    let config = ModelConfig::default();

    c.bench_function("forward_resolution_1000_images", |b| {
        b.iter(|| {
            let parsed = codec::parse_str(black_box(&xml), &SCHEMAS, &config).unwrap();
            parsed.summary.linked
        });
    });
}

fn bench_serialize(c: &mut Criterion) {
    let config = ModelConfig::default();
    let parsed = codec::parse_str(&synthetic_document(1000), &SCHEMAS, &config).unwrap();

    c.bench_function("serialize_1000_images", |b| {
        b.iter(|| codec::to_string(black_box(&parsed.model), &config).unwrap().len());
    });
}

fn bench_graph_queries(c: &mut Criterion) {
    let config = ModelConfig::default();
    let parsed = codec::parse_str(&synthetic_document(1000), &SCHEMAS, &config).unwrap();
    let model = &parsed.model;

    c.bench_function("graph_queries", |b| {
        b.iter(|| {
            let cycles = model.reference_cycles().len();
            let problems = model.check_back_references().len();
            let snapshot = model.snapshot().len();
            cycles + problems + snapshot
        });
    });
}

// Benchmark group configuration
criterion_group! {
    name = benches;
    config = Criterion::default()
        .sample_size(50)
        .measurement_time(std::time::Duration::from_secs(10));
    targets =
        bench_parse_sample,
        bench_forward_resolution,
        bench_serialize,
        bench_graph_queries
}

criterion_main!(benches);
