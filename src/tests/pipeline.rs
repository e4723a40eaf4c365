use super::helpers::{ome, parse, SAMPLE_DOCUMENT};
use crate::{
    codec::{self, ledger::ResolutionSummary, ParseDiagnostic},
    config::ModelConfig,
    ome::{LightSourceKind, ShapeKind},
    units::{Quantity, Unit},
};
use test_log::test;

#[test]
fn test_sample_document_resolves_completely() {
    let parsed = parse(SAMPLE_DOCUMENT);
    assert!(parsed.diagnostics.is_empty(), "{:?}", parsed.diagnostics);
    assert!(parsed.is_complete());
    assert_eq!(
        parsed.summary,
        ResolutionSummary {
            linked: 17,
            unchanged: 0,
            unresolved: 0,
            rejected: 0,
        }
    );
    assert_eq!(parsed.model.len(), 32);
    assert!(parsed.model.check_back_references().is_empty());
}

#[test]
fn test_sample_back_reference_views() {
    let parsed = parse(SAMPLE_DOCUMENT);
    let model = &parsed.model;
    let find = |id: &str| model.find(id).unwrap();

    let comment = model.object(find("Annotation:0")).unwrap();
    assert_eq!(comment.back_references("Project"), &[find("Project:0")]);
    assert_eq!(comment.back_references("Image"), &[find("Image:0")]);
    assert_eq!(comment.back_references("Annotation"), &[find("Annotation:2")]);

    let instrument = model.object(find("Instrument:0")).unwrap();
    assert_eq!(
        instrument.back_references("Image"),
        &[find("Image:0"), find("Image:1")]
    );

    let image = model.object(find("Image:1")).unwrap();
    assert_eq!(image.back_references("Dataset"), &[find("Dataset:0")]);
    assert_eq!(image.back_references("WellSample"), &[find("WellSample:0")]);
}

#[test]
fn test_sample_variants_and_pump() {
    let parsed = parse(SAMPLE_DOCUMENT);
    let model = &parsed.model;
    let find = |id: &str| model.find(id).unwrap();

    let kinds: Vec<_> = model
        .find_all("LightSource")
        .filter_map(|h| LightSourceKind::of(model.object(h).unwrap()))
        .collect();
    assert_eq!(
        kinds,
        vec![
            LightSourceKind::Laser,
            LightSourceKind::Laser,
            LightSourceKind::Filament
        ]
    );

    let laser = model.object(find("LightSource:0")).unwrap();
    assert_eq!(laser.forward("Pump"), &[find("LightSource:1")]);
    // Pump keeps no record on the pumping source
    assert!(model
        .object(find("LightSource:1"))
        .unwrap()
        .back_views()
        .next()
        .is_none());

    let label = model.object(find("Shape:1")).unwrap();
    assert_eq!(ShapeKind::of(label), Some(ShapeKind::Label));
    assert_eq!(label.attribute("Text"), Some("prophase"));
    assert_eq!(label.attribute("X"), Some("210"));
    assert_eq!(label.quantity("FontSize"), Some(Quantity::new(12.0, Unit::Point)));
    assert_eq!(label.forward("AnnotationRef"), &[find("Annotation:2")]);

    // the union and both shapes hang off the ROI in document order
    let union = model.object(find("ROI:0")).unwrap().children()[0];
    let shapes: Vec<_> = model
        .object(union)
        .unwrap()
        .children()
        .iter()
        .map(|h| model.object(*h).unwrap().element())
        .collect();
    assert_eq!(shapes, vec!["Ellipse", "Label"]);
}

#[test]
fn test_sample_units() {
    let parsed = parse(SAMPLE_DOCUMENT);
    let model = &parsed.model;
    let quantity = |id: &str, name: &str| {
        model
            .object(model.find(id).unwrap())
            .unwrap()
            .quantity(name)
            .unwrap()
    };

    assert_eq!(quantity("Detector:0", "Voltage"), Quantity::new(650.0, Unit::Volt));
    assert_eq!(
        quantity("Objective:0", "WorkingDistance"),
        Quantity::new(0.19, Unit::Millimeter)
    );
    assert_eq!(
        quantity("LightSource:2", "Power"),
        Quantity::new(100.0, Unit::Milliwatt)
    );
    assert_eq!(quantity("LightSource:1", "Power"), Quantity::new(2.0, Unit::Watt));
    assert_eq!(
        quantity("Pixels:0", "TimeIncrement"),
        Quantity::new(30.0, Unit::Second)
    );
    assert_eq!(
        quantity("Pixels:0", "PhysicalSizeX"),
        Quantity::new(0.13, Unit::Micrometer)
    );
}

#[test]
fn test_sample_cycles() {
    let parsed = parse(SAMPLE_DOCUMENT);
    let model = &parsed.model;
    assert_eq!(
        model.reference_cycles(),
        vec![vec![model.find("Annotation:3").unwrap()]]
    );
    let text = model
        .object(model.find("Annotation:3").unwrap())
        .unwrap()
        .text("Value")
        .to_vec();
    assert_eq!(text, vec!["Self-annotated & cyclic".to_string()]);
}

#[test]
fn test_empty_variant_container_leaves_slot_empty() {
    let parsed = parse(&ome(
        r#"<Instrument ID="Instrument:0"><LightSource ID="LightSource:0" Power="5"/></Instrument>"#,
    ));
    let model = &parsed.model;
    let instrument = model.object(model.find("Instrument:0").unwrap()).unwrap();
    assert!(instrument.children().is_empty());
    assert!(model.find("LightSource:0").is_none());
    assert!(matches!(parsed.diagnostics[..], [ParseDiagnostic::Info(_)]));
    // nothing is missing from the graph itself
    assert!(parsed.is_complete());
}

#[test]
fn test_unrecognized_kind_on_undeclared_reference() {
    let parsed = parse(&ome(
        r#"<Instrument ID="Instrument:0">
             <Detector ID="Detector:0"><Pump ID="Instrument:0"/></Detector>
           </Instrument>"#,
    ));
    assert_eq!(parsed.summary.rejected, 1);
    assert!(!parsed.is_complete());
    assert!(matches!(
        &parsed.diagnostics[..],
        [ParseDiagnostic::UnrecognizedReferenceKind { kind, .. }] if kind == "Pump"
    ));
}

#[test]
fn test_shape_transform_survives_round_trip() {
    let parsed = parse(&ome(
        r#"<ROI ID="ROI:0"><Union>
             <Shape ID="Shape:0">
               <Point X="4" Y="2"/>
               <Transform A00="1" A10="0" A01="0" A11="1" A02="12.5" A12="-3"/>
             </Shape>
           </Union></ROI>"#,
    ));
    assert!(parsed.diagnostics.is_empty(), "{:?}", parsed.diagnostics);

    let model = &parsed.model;
    let point = model.object(model.find("Shape:0").unwrap()).unwrap();
    assert_eq!(ShapeKind::of(point), Some(ShapeKind::Point));
    let transform = model.object(point.children()[0]).unwrap();
    assert_eq!(transform.element(), "Transform");
    assert_eq!(transform.attribute("A02"), Some("12.5"));
    assert_eq!(transform.attribute("A12"), Some("-3"));

    let written = codec::to_string(model, &ModelConfig::default()).unwrap();
    assert!(written.contains(r#"<Transform A00="1""#), "{written}");
    assert_eq!(parse(&written).model.snapshot(), model.snapshot());
}
