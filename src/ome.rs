//! Built-in record schemas for OME microscopy metadata.
//!
//! This is a representative slice of the 2015-01 OME model: the acquisition hardware
//! (instrument, light sources, detectors, objectives), the image hierarchy (image, pixels,
//! channels, planes), the organisational containers (project, dataset, screen, plate, well),
//! regions of interest with their shapes, and structured annotations.
//!
//! Default units are schema constants. They are reproduced exactly as the OME schema declares
//! them and must not be computed.

use crate::{
    codec::{RecordSchema, SchemaRegistry},
    model::ModelObject,
    properties::{Cardinality::*, IdentifierPolicy::*},
    units::Unit,
};
use std::fmt;

/// Abstract role wrapping a concrete light source.
pub const LIGHT_SOURCE: &str = "LightSource";
/// Abstract role wrapping a concrete ROI shape.
pub const SHAPE: &str = "Shape";

/// Register every built-in OME type with `registry`.
pub fn register_builtin(registry: &SchemaRegistry) {
    for schema in core_schemas()
        .into_iter()
        .chain(instrument_schemas())
        .chain(image_schemas())
        .chain(screen_schemas())
        .chain(roi_schemas())
        .chain(annotation_schemas())
    {
        registry.register(schema);
    }
}

fn core_schemas() -> Vec<RecordSchema> {
    vec![
        RecordSchema::new("OME")
            .attributes(&["UUID", "Creator"])
            .child("Project", Many)
            .child("Dataset", Many)
            .child("Experimenter", Many)
            .child("Instrument", Many)
            .child("Image", Many)
            .child("Screen", Many)
            .child("Plate", Many)
            .child("ROI", Many)
            .child("StructuredAnnotations", Single),
        RecordSchema::new("Experimenter")
            .identifier(Required)
            .attributes(&[
                "FirstName",
                "MiddleName",
                "LastName",
                "Email",
                "Institution",
                "UserName",
            ])
            .reference("AnnotationRef", "Annotation", Many, Some("Experimenter")),
        RecordSchema::new("Project")
            .identifier(Required)
            .attributes(&["Name"])
            .text("Description", Single)
            .reference("ExperimenterRef", "Experimenter", Single, Some("Project"))
            .reference("DatasetRef", "Dataset", Many, Some("Project"))
            .reference("AnnotationRef", "Annotation", Many, Some("Project")),
        RecordSchema::new("Dataset")
            .identifier(Required)
            .attributes(&["Name"])
            .text("Description", Single)
            .reference("ExperimenterRef", "Experimenter", Single, Some("Dataset"))
            .reference("ImageRef", "Image", Many, Some("Dataset"))
            .reference("AnnotationRef", "Annotation", Many, Some("Dataset")),
    ]
}

fn instrument_schemas() -> Vec<RecordSchema> {
    vec![
        RecordSchema::new("Instrument")
            .identifier(Required)
            .child("Microscope", Single)
            .variant(LIGHT_SOURCE, Many)
            .child("Detector", Many)
            .child("Objective", Many)
            .reference("AnnotationRef", "Annotation", Many, Some("Instrument")),
        RecordSchema::new("Microscope").attributes(&[
            "Manufacturer",
            "Model",
            "SerialNumber",
            "LotNumber",
            "Type",
        ]),
        RecordSchema::new(LIGHT_SOURCE)
            .identifier(Required)
            .attributes(&["Manufacturer", "Model", "SerialNumber", "LotNumber"])
            .quantity("Power", Unit::Milliwatt)
            .reference("AnnotationRef", "Annotation", Many, Some("LightSource"))
            .variants(&LightSourceKind::ALL.map(|k| k.tag())),
        RecordSchema::new("Laser")
            .base(LIGHT_SOURCE)
            .attributes(&[
                "Type",
                "LaserMedium",
                "FrequencyMultiplication",
                "Tuneable",
                "Pulse",
                "PockelCell",
            ])
            .quantity("Wavelength", Unit::Nanometer)
            .quantity("RepetitionRate", Unit::Hertz)
            .reference("Pump", LIGHT_SOURCE, Single, None),
        RecordSchema::new("Arc").base(LIGHT_SOURCE).attributes(&["Type"]),
        RecordSchema::new("Filament")
            .base(LIGHT_SOURCE)
            .attributes(&["Type"]),
        RecordSchema::new("LightEmittingDiode").base(LIGHT_SOURCE),
        RecordSchema::new("GenericExcitationSource").base(LIGHT_SOURCE),
        RecordSchema::new("Detector")
            .identifier(Required)
            .attributes(&[
                "Manufacturer",
                "Model",
                "SerialNumber",
                "LotNumber",
                "Gain",
                "Offset",
                "Zoom",
                "AmplificationGain",
                "Type",
            ])
            .quantity("Voltage", Unit::Volt)
            .reference("AnnotationRef", "Annotation", Many, Some("Detector")),
        RecordSchema::new("Objective")
            .identifier(Required)
            .attributes(&[
                "Manufacturer",
                "Model",
                "SerialNumber",
                "LotNumber",
                "Correction",
                "Immersion",
                "LensNA",
                "NominalMagnification",
                "CalibratedMagnification",
                "Iris",
            ])
            .quantity("WorkingDistance", Unit::Micrometer)
            .reference("AnnotationRef", "Annotation", Many, Some("Objective")),
    ]
}

fn image_schemas() -> Vec<RecordSchema> {
    vec![
        RecordSchema::new("Image")
            .identifier(Required)
            .attributes(&["Name"])
            .text("AcquisitionDate", Single)
            .reference("ExperimenterRef", "Experimenter", Single, Some("Image"))
            .text("Description", Single)
            .reference("InstrumentRef", "Instrument", Single, Some("Image"))
            .child("ImagingEnvironment", Single)
            .child("StageLabel", Single)
            .child("Pixels", Single)
            .reference("ROIRef", "ROI", Many, Some("Image"))
            .reference("AnnotationRef", "Annotation", Many, Some("Image")),
        RecordSchema::new("ImagingEnvironment")
            .attributes(&["Humidity", "CO2Percent"])
            .quantity("Temperature", Unit::Celsius)
            .quantity("AirPressure", Unit::Millibar),
        RecordSchema::new("StageLabel")
            .attributes(&["Name"])
            .quantity("X", Unit::ReferenceFrame)
            .quantity("Y", Unit::ReferenceFrame)
            .quantity("Z", Unit::ReferenceFrame),
        RecordSchema::new("Pixels")
            .identifier(Required)
            .attributes(&[
                "DimensionOrder",
                "Type",
                "SignificantBits",
                "Interleaved",
                "BigEndian",
                "SizeX",
                "SizeY",
                "SizeZ",
                "SizeC",
                "SizeT",
            ])
            .quantity("PhysicalSizeX", Unit::Micrometer)
            .quantity("PhysicalSizeY", Unit::Micrometer)
            .quantity("PhysicalSizeZ", Unit::Micrometer)
            .quantity("TimeIncrement", Unit::Second)
            .child("Channel", Many)
            .child("Plane", Many),
        RecordSchema::new("Channel")
            .identifier(Required)
            .attributes(&[
                "Name",
                "SamplesPerPixel",
                "IlluminationType",
                "AcquisitionMode",
                "ContrastMethod",
                "Fluor",
                "NDFilter",
                "PockelCellSetting",
                "Color",
            ])
            .quantity("PinholeSize", Unit::Micrometer)
            .quantity("ExcitationWavelength", Unit::Nanometer)
            .quantity("EmissionWavelength", Unit::Nanometer)
            .reference("AnnotationRef", "Annotation", Many, Some("Channel")),
        RecordSchema::new("Plane")
            .attributes(&["TheZ", "TheT", "TheC"])
            .quantity("DeltaT", Unit::Second)
            .quantity("ExposureTime", Unit::Second)
            .quantity("PositionX", Unit::ReferenceFrame)
            .quantity("PositionY", Unit::ReferenceFrame)
            .quantity("PositionZ", Unit::ReferenceFrame)
            .text("HashSHA1", Single)
            .reference("AnnotationRef", "Annotation", Many, Some("Plane")),
    ]
}

fn screen_schemas() -> Vec<RecordSchema> {
    vec![
        RecordSchema::new("Screen")
            .identifier(Required)
            .attributes(&[
                "Name",
                "ProtocolIdentifier",
                "ProtocolDescription",
                "ReagentSetDescription",
                "ReagentSetIdentifier",
                "Type",
            ])
            .text("Description", Single)
            .reference("PlateRef", "Plate", Many, Some("Screen"))
            .reference("AnnotationRef", "Annotation", Many, Some("Screen")),
        RecordSchema::new("Plate")
            .identifier(Required)
            .attributes(&[
                "Name",
                "Status",
                "ExternalIdentifier",
                "ColumnNamingConvention",
                "RowNamingConvention",
                "FieldIndex",
                "Rows",
                "Columns",
            ])
            .quantity("WellOriginX", Unit::ReferenceFrame)
            .quantity("WellOriginY", Unit::ReferenceFrame)
            .text("Description", Single)
            .child("Well", Many)
            .reference("AnnotationRef", "Annotation", Many, Some("Plate")),
        RecordSchema::new("Well")
            .identifier(Required)
            .attributes(&[
                "Column",
                "Row",
                "ExternalDescription",
                "ExternalIdentifier",
                "Type",
                "Color",
            ])
            .child("WellSample", Many)
            .reference("AnnotationRef", "Annotation", Many, Some("Well")),
        RecordSchema::new("WellSample")
            .identifier(Required)
            .attributes(&["Timepoint", "Index"])
            .quantity("PositionX", Unit::ReferenceFrame)
            .quantity("PositionY", Unit::ReferenceFrame)
            .reference("ImageRef", "Image", Single, Some("WellSample")),
    ]
}

fn roi_schemas() -> Vec<RecordSchema> {
    vec![
        RecordSchema::new("ROI")
            .identifier(Required)
            .attributes(&["Name"])
            .child("Union", Single)
            .reference("AnnotationRef", "Annotation", Many, Some("ROI"))
            .text("Description", Single),
        RecordSchema::new("Union").variant(SHAPE, Many),
        RecordSchema::new(SHAPE)
            .identifier(Required)
            .attributes(&[
                "FillColor",
                "FillRule",
                "StrokeColor",
                "StrokeDashArray",
                "LineCap",
                "Locked",
                "FontFamily",
                "FontStyle",
                "Text",
                "TheZ",
                "TheT",
                "TheC",
            ])
            .quantity("StrokeWidth", Unit::Pixel)
            .quantity("FontSize", Unit::Point)
            .child("Transform", Single)
            .reference("AnnotationRef", "Annotation", Many, Some("Shape"))
            .variants(&ShapeKind::ALL.map(|k| k.tag())),
        // AffineTransform: the 2x3 matrix of a shape, row-major in the attribute names
        RecordSchema::new("Transform").attributes(&["A00", "A10", "A01", "A11", "A02", "A12"]),
        RecordSchema::new("Line")
            .base(SHAPE)
            .attributes(&["X1", "Y1", "X2", "Y2", "MarkerStart", "MarkerEnd"]),
        RecordSchema::new("Rectangle")
            .base(SHAPE)
            .attributes(&["X", "Y", "Width", "Height"]),
        RecordSchema::new("Mask")
            .base(SHAPE)
            .attributes(&["X", "Y", "Width", "Height"]),
        RecordSchema::new("Ellipse")
            .base(SHAPE)
            .attributes(&["X", "Y", "RadiusX", "RadiusY"]),
        RecordSchema::new("Point").base(SHAPE).attributes(&["X", "Y"]),
        RecordSchema::new("Polyline")
            .base(SHAPE)
            .attributes(&["Points", "MarkerStart", "MarkerEnd"]),
        RecordSchema::new("Polygon")
            .base(SHAPE)
            .attributes(&["Points"]),
        RecordSchema::new("Label").base(SHAPE).attributes(&["X", "Y"]),
    ]
}

fn annotation_schemas() -> Vec<RecordSchema> {
    let value = |element: &'static str, base: &'static str| {
        RecordSchema::new(element)
            .base(base)
            .text("Value", Single)
    };
    vec![
        RecordSchema::new("StructuredAnnotations")
            .child("CommentAnnotation", Many)
            .child("TagAnnotation", Many)
            .child("TermAnnotation", Many)
            .child("LongAnnotation", Many)
            .child("DoubleAnnotation", Many)
            .child("BooleanAnnotation", Many)
            .child("TimestampAnnotation", Many),
        // annotations may annotate each other, so cycles are legal here
        RecordSchema::new("Annotation")
            .identifier(Required)
            .attributes(&["Namespace", "Annotator"])
            .text("Description", Single)
            .reference("AnnotationRef", "Annotation", Many, Some("Annotation")),
        RecordSchema::new("TextAnnotation").base("Annotation"),
        RecordSchema::new("BasicAnnotation").base("Annotation"),
        RecordSchema::new("NumericAnnotation").base("BasicAnnotation"),
        value("CommentAnnotation", "TextAnnotation"),
        value("TagAnnotation", "TextAnnotation"),
        value("TermAnnotation", "TextAnnotation"),
        value("LongAnnotation", "NumericAnnotation"),
        value("DoubleAnnotation", "NumericAnnotation"),
        value("BooleanAnnotation", "BasicAnnotation"),
        value("TimestampAnnotation", "BasicAnnotation"),
    ]
}

/// The concrete shapes a light source can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightSourceKind {
    Laser,
    Arc,
    Filament,
    LightEmittingDiode,
    GenericExcitationSource,
}

impl LightSourceKind {
    pub const ALL: [LightSourceKind; 5] = [
        LightSourceKind::Laser,
        LightSourceKind::Arc,
        LightSourceKind::Filament,
        LightSourceKind::LightEmittingDiode,
        LightSourceKind::GenericExcitationSource,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            LightSourceKind::Laser => "Laser",
            LightSourceKind::Arc => "Arc",
            LightSourceKind::Filament => "Filament",
            LightSourceKind::LightEmittingDiode => "LightEmittingDiode",
            LightSourceKind::GenericExcitationSource => "GenericExcitationSource",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.tag() == tag)
    }

    /// The concrete kind of a constructed light source, `None` for any other object.
    pub fn of(object: &ModelObject) -> Option<Self> {
        Self::from_tag(object.element()).filter(|_| object.is_a(LIGHT_SOURCE))
    }
}

impl fmt::Display for LightSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// The concrete shapes an ROI member can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Line,
    Rectangle,
    Mask,
    Ellipse,
    Point,
    Polyline,
    Polygon,
    Label,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 8] = [
        ShapeKind::Line,
        ShapeKind::Rectangle,
        ShapeKind::Mask,
        ShapeKind::Ellipse,
        ShapeKind::Point,
        ShapeKind::Polyline,
        ShapeKind::Polygon,
        ShapeKind::Label,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            ShapeKind::Line => "Line",
            ShapeKind::Rectangle => "Rectangle",
            ShapeKind::Mask => "Mask",
            ShapeKind::Ellipse => "Ellipse",
            ShapeKind::Point => "Point",
            ShapeKind::Polyline => "Polyline",
            ShapeKind::Polygon => "Polygon",
            ShapeKind::Label => "Label",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.tag() == tag)
    }

    pub fn of(object: &ModelObject) -> Option<Self> {
        Self::from_tag(object.element()).filter(|_| object.is_a(SHAPE))
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{ContentField, SCHEMAS};

    #[test]
    fn test_builtin_schema_is_consistent() {
        assert_eq!(SCHEMAS.validate(), Vec::<String>::new());
    }

    #[test]
    fn test_default_unit_table() {
        let expect = [
            ("Detector", "Voltage", Unit::Volt),
            ("Laser", "Power", Unit::Milliwatt),
            ("Laser", "Wavelength", Unit::Nanometer),
            ("Laser", "RepetitionRate", Unit::Hertz),
            ("Channel", "PinholeSize", Unit::Micrometer),
            ("Channel", "EmissionWavelength", Unit::Nanometer),
            ("Pixels", "PhysicalSizeX", Unit::Micrometer),
            ("Pixels", "TimeIncrement", Unit::Second),
            ("Plane", "PositionZ", Unit::ReferenceFrame),
            ("Plane", "ExposureTime", Unit::Second),
            ("Rectangle", "StrokeWidth", Unit::Pixel),
            ("Label", "FontSize", Unit::Point),
            ("ImagingEnvironment", "Temperature", Unit::Celsius),
            ("ImagingEnvironment", "AirPressure", Unit::Millibar),
            ("Objective", "WorkingDistance", Unit::Micrometer),
            ("Plate", "WellOriginX", Unit::ReferenceFrame),
        ];
        for (element, property, unit) in expect {
            let record = SCHEMAS.record(element).unwrap();
            assert_eq!(
                record.quantity_field(property).map(|q| q.default_unit),
                Some(unit),
                "{element}.{property}"
            );
        }
    }

    #[test]
    fn test_variant_roles() {
        let role = SCHEMAS.get(LIGHT_SOURCE).unwrap();
        assert_eq!(role.variants.len(), LightSourceKind::ALL.len());
        for kind in LightSourceKind::ALL {
            let record = SCHEMAS.record(kind.tag()).unwrap();
            assert_eq!(record.role().map(|r| r.element), Some(LIGHT_SOURCE));
            assert_eq!(LightSourceKind::from_tag(kind.tag()), Some(kind));
        }
        for kind in ShapeKind::ALL {
            let record = SCHEMAS.record(kind.tag()).unwrap();
            assert_eq!(record.role().map(|r| r.element), Some(SHAPE));
        }
        assert_eq!(ShapeKind::from_tag("Laser"), None);
    }

    #[test]
    fn test_annotation_chain() {
        let comment = SCHEMAS.record("CommentAnnotation").unwrap();
        let chain: Vec<&str> = comment.chain().iter().map(|s| s.element).collect();
        assert_eq!(chain, vec!["Annotation", "TextAnnotation", "CommentAnnotation"]);
        assert!(comment.identifier_required());
        assert!(comment.role().is_none());
        assert!(matches!(
            comment.content_field("Value"),
            Some((2, ContentField::Text { .. }))
        ));
    }
}
