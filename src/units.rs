//! Physical quantities and the units they are expressed in.
//!
//! Quantity-valued properties appear in markup as an attribute pair: the numeric value under the
//! property name and the unit symbol under the same name suffixed with `Unit`
//! (`Voltage="1.5" VoltageUnit="mV"`). The unit half is optional on the wire; every property
//! declares a default unit in its schema and [`parse_quantity`] substitutes it. Once parsed, a
//! [`Quantity`] always carries its unit, so re-emitting a document writes the resolved unit even
//! when the source omitted it.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Suffix joining a quantity property name to its unit attribute.
pub const UNIT_ATTRIBUTE_SUFFIX: &str = "Unit";

/// Name of the unit attribute paired with a quantity property.
pub fn unit_attribute(property: &str) -> String {
    format!("{property}{UNIT_ATTRIBUTE_SUFFIX}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dimension {
    Length,
    Time,
    ElectricPotential,
    Frequency,
    Power,
    Pressure,
    Temperature,
    Angle,
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dimension::Length => "length",
            Dimension::Time => "time",
            Dimension::ElectricPotential => "electric potential",
            Dimension::Frequency => "frequency",
            Dimension::Power => "power",
            Dimension::Pressure => "pressure",
            Dimension::Temperature => "temperature",
            Dimension::Angle => "angle",
        };
        f.write_str(name)
    }
}

struct UnitInfo {
    unit: Unit,
    symbol: &'static str,
    dimension: Dimension,
    si_factor: Option<f64>,
}

/// Declares [`Unit`] and its symbol table in one pass, so that `UNITS[unit as usize]` is the
/// entry of `unit`.
macro_rules! units {
    ($($dimension:ident { $($unit:ident => $symbol:literal, $factor:expr;)* })*) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum Unit {
            $($($unit,)*)*
        }

        const UNITS: &[UnitInfo] = &[
            $($(UnitInfo {
                unit: Unit::$unit,
                symbol: $symbol,
                dimension: Dimension::$dimension,
                si_factor: $factor,
            },)*)*
        ];
    };
}

// The symbols are the enumeration values of the OME 2015-01 unit types and must be reproduced
// byte for byte when writing. Factors convert into the SI unit of the dimension; `None` marks
// units without a physical scale and the affine temperature scales.
units! {
    Length {
        Yottameter => "Ym", Some(1e24);
        Zettameter => "Zm", Some(1e21);
        Exameter => "Em", Some(1e18);
        Petameter => "Pm", Some(1e15);
        Terameter => "Tm", Some(1e12);
        Gigameter => "Gm", Some(1e9);
        Megameter => "Mm", Some(1e6);
        Kilometer => "km", Some(1e3);
        Hectometer => "hm", Some(1e2);
        Decameter => "dam", Some(1e1);
        Meter => "m", Some(1.0);
        Decimeter => "dm", Some(1e-1);
        Centimeter => "cm", Some(1e-2);
        Millimeter => "mm", Some(1e-3);
        Micrometer => "\u{b5}m", Some(1e-6);
        Nanometer => "nm", Some(1e-9);
        Picometer => "pm", Some(1e-12);
        Femtometer => "fm", Some(1e-15);
        Attometer => "am", Some(1e-18);
        Zeptometer => "zm", Some(1e-21);
        Yoctometer => "ym", Some(1e-24);
        Angstrom => "\u{c5}", Some(1e-10);
        Thou => "thou", Some(2.54e-5);
        Line => "li", Some(0.0254 / 12.0);
        Inch => "in", Some(0.0254);
        Foot => "ft", Some(0.3048);
        Yard => "yd", Some(0.9144);
        Mile => "mi", Some(1_609.344);
        AstronomicalUnit => "ua", Some(149_597_870_700.0);
        LightYear => "ly", Some(9.460_730_472_580_8e15);
        Parsec => "pc", Some(3.085_677_581_491_367e16);
        Point => "pt", Some(0.0254 / 72.0);
        Pixel => "pixel", None;
        ReferenceFrame => "reference frame", None;
    }
    Time {
        Yottasecond => "Ys", Some(1e24);
        Zettasecond => "Zs", Some(1e21);
        Exasecond => "Es", Some(1e18);
        Petasecond => "Ps", Some(1e15);
        Terasecond => "Ts", Some(1e12);
        Gigasecond => "Gs", Some(1e9);
        Megasecond => "Ms", Some(1e6);
        Kilosecond => "ks", Some(1e3);
        Hectosecond => "hs", Some(1e2);
        Decasecond => "das", Some(1e1);
        Second => "s", Some(1.0);
        Decisecond => "ds", Some(1e-1);
        Centisecond => "cs", Some(1e-2);
        Millisecond => "ms", Some(1e-3);
        Microsecond => "\u{b5}s", Some(1e-6);
        Nanosecond => "ns", Some(1e-9);
        Picosecond => "ps", Some(1e-12);
        Femtosecond => "fs", Some(1e-15);
        Attosecond => "as", Some(1e-18);
        Zeptosecond => "zs", Some(1e-21);
        Yoctosecond => "ys", Some(1e-24);
        Minute => "min", Some(60.0);
        Hour => "h", Some(3_600.0);
        Day => "d", Some(86_400.0);
    }
    ElectricPotential {
        Yottavolt => "YV", Some(1e24);
        Zettavolt => "ZV", Some(1e21);
        Exavolt => "EV", Some(1e18);
        Petavolt => "PV", Some(1e15);
        Teravolt => "TV", Some(1e12);
        Gigavolt => "GV", Some(1e9);
        Megavolt => "MV", Some(1e6);
        Kilovolt => "kV", Some(1e3);
        Hectovolt => "hV", Some(1e2);
        Decavolt => "daV", Some(1e1);
        Volt => "V", Some(1.0);
        Decivolt => "dV", Some(1e-1);
        Centivolt => "cV", Some(1e-2);
        Millivolt => "mV", Some(1e-3);
        Microvolt => "\u{b5}V", Some(1e-6);
        Nanovolt => "nV", Some(1e-9);
        Picovolt => "pV", Some(1e-12);
        Femtovolt => "fV", Some(1e-15);
        Attovolt => "aV", Some(1e-18);
        Zeptovolt => "zV", Some(1e-21);
        Yoctovolt => "yV", Some(1e-24);
    }
    Frequency {
        Yottahertz => "YHz", Some(1e24);
        Zettahertz => "ZHz", Some(1e21);
        Exahertz => "EHz", Some(1e18);
        Petahertz => "PHz", Some(1e15);
        Terahertz => "THz", Some(1e12);
        Gigahertz => "GHz", Some(1e9);
        Megahertz => "MHz", Some(1e6);
        Kilohertz => "kHz", Some(1e3);
        Hectohertz => "hHz", Some(1e2);
        Decahertz => "daHz", Some(1e1);
        Hertz => "Hz", Some(1.0);
        Decihertz => "dHz", Some(1e-1);
        Centihertz => "cHz", Some(1e-2);
        Millihertz => "mHz", Some(1e-3);
        Microhertz => "\u{b5}Hz", Some(1e-6);
        Nanohertz => "nHz", Some(1e-9);
        Picohertz => "pHz", Some(1e-12);
        Femtohertz => "fHz", Some(1e-15);
        Attohertz => "aHz", Some(1e-18);
        Zeptohertz => "zHz", Some(1e-21);
        Yoctohertz => "yHz", Some(1e-24);
    }
    Power {
        Yottawatt => "YW", Some(1e24);
        Zettawatt => "ZW", Some(1e21);
        Exawatt => "EW", Some(1e18);
        Petawatt => "PW", Some(1e15);
        Terawatt => "TW", Some(1e12);
        Gigawatt => "GW", Some(1e9);
        Megawatt => "MW", Some(1e6);
        Kilowatt => "kW", Some(1e3);
        Hectowatt => "hW", Some(1e2);
        Decawatt => "daW", Some(1e1);
        Watt => "W", Some(1.0);
        Deciwatt => "dW", Some(1e-1);
        Centiwatt => "cW", Some(1e-2);
        Milliwatt => "mW", Some(1e-3);
        Microwatt => "\u{b5}W", Some(1e-6);
        Nanowatt => "nW", Some(1e-9);
        Picowatt => "pW", Some(1e-12);
        Femtowatt => "fW", Some(1e-15);
        Attowatt => "aW", Some(1e-18);
        Zeptowatt => "zW", Some(1e-21);
        Yoctowatt => "yW", Some(1e-24);
    }
    Pressure {
        Yottapascal => "YPa", Some(1e24);
        Zettapascal => "ZPa", Some(1e21);
        Exapascal => "EPa", Some(1e18);
        Petapascal => "PPa", Some(1e15);
        Terapascal => "TPa", Some(1e12);
        Gigapascal => "GPa", Some(1e9);
        Megapascal => "MPa", Some(1e6);
        Kilopascal => "kPa", Some(1e3);
        Hectopascal => "hPa", Some(1e2);
        Decapascal => "daPa", Some(1e1);
        Pascal => "Pa", Some(1.0);
        Decipascal => "dPa", Some(1e-1);
        Centipascal => "cPa", Some(1e-2);
        Millipascal => "mPa", Some(1e-3);
        Micropascal => "\u{b5}Pa", Some(1e-6);
        Nanopascal => "nPa", Some(1e-9);
        Picopascal => "pPa", Some(1e-12);
        Femtopascal => "fPa", Some(1e-15);
        Attopascal => "aPa", Some(1e-18);
        Zeptopascal => "zPa", Some(1e-21);
        Yoctopascal => "yPa", Some(1e-24);
        Bar => "bar", Some(1e5);
        Megabar => "Mbar", Some(1e11);
        Kilobar => "kbar", Some(1e8);
        Decibar => "dbar", Some(1e4);
        Centibar => "cbar", Some(1e3);
        Millibar => "mbar", Some(1e2);
        Atmosphere => "atm", Some(101_325.0);
        Psi => "psi", Some(6_894.757_293_168);
        Torr => "Torr", Some(101_325.0 / 760.0);
        Millitorr => "mTorr", Some(101_325.0 / 760_000.0);
        MillimeterOfMercury => "mm Hg", Some(133.322_387_415);
    }
    Temperature {
        Celsius => "\u{b0}C", None;
        Fahrenheit => "\u{b0}F", None;
        Kelvin => "K", None;
        Rankine => "\u{b0}R", None;
    }
    Angle {
        Degree => "deg", Some(std::f64::consts::PI / 180.0);
        Radian => "rad", Some(1.0);
        Gradian => "gon", Some(std::f64::consts::PI / 200.0);
    }
}

impl Unit {
    fn info(&self) -> &'static UnitInfo {
        &UNITS[*self as usize]
    }

    /// Every unit, grouped by dimension.
    pub fn all() -> impl Iterator<Item = Unit> {
        UNITS.iter().map(|info| info.unit)
    }

    pub fn from_symbol(symbol: &str) -> Option<Unit> {
        UNITS
            .iter()
            .find(|info| info.symbol == symbol)
            .map(|info| info.unit)
    }

    pub fn symbol(&self) -> &'static str {
        self.info().symbol
    }

    pub fn dimension(&self) -> Dimension {
        self.info().dimension
    }

    fn si_factor(&self) -> Option<f64> {
        self.info().si_factor
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A numeric value paired with the unit it is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    value: f64,
    unit: Unit,
}

impl Quantity {
    pub fn new(value: f64, unit: Unit) -> Self {
        Quantity { value, unit }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    /// The value attribute as written to markup.
    pub fn value_string(&self) -> String {
        format!("{}", self.value)
    }

    /// Express this quantity in another unit of the same dimension.
    ///
    /// Returns `None` across dimensions and for units with no physical scale (`pixel`,
    /// `reference frame`).
    pub fn convert(&self, unit: Unit) -> Option<Quantity> {
        if unit == self.unit {
            return Some(*self);
        }
        if unit.dimension() != self.unit.dimension() {
            return None;
        }
        if self.unit.dimension() == Dimension::Temperature {
            let kelvin = match self.unit {
                Unit::Celsius => self.value + 273.15,
                Unit::Fahrenheit => (self.value - 32.0) * 5.0 / 9.0 + 273.15,
                Unit::Rankine => self.value * 5.0 / 9.0,
                _ => self.value,
            };
            let value = match unit {
                Unit::Celsius => kelvin - 273.15,
                Unit::Fahrenheit => (kelvin - 273.15) * 9.0 / 5.0 + 32.0,
                Unit::Rankine => kelvin * 9.0 / 5.0,
                _ => kelvin,
            };
            return Some(Quantity::new(value, unit));
        }
        let from = self.unit.si_factor()?;
        let to = unit.si_factor()?;
        Some(Quantity::new(self.value * from / to, unit))
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit.symbol())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuantityError {
    #[error("'{0}' is not a finite number")]
    InvalidNumber(String),
    #[error("'{0}' is not a known unit symbol")]
    UnknownUnit(String),
    #[error("unit '{unit}' measures {found}, expected {expected}")]
    DimensionMismatch {
        unit: String,
        found: Dimension,
        expected: Dimension,
    },
}

/// Build a quantity from its wire form.
///
/// An absent or empty `unit` resolves to `default_unit`. The numeric part is never defaulted:
/// an unparsable number or a symbol outside the unit enumeration is an error, as is a unit of
/// a different dimension than the property's default.
pub fn parse_quantity(
    raw_value: &str,
    unit: Option<&str>,
    default_unit: Unit,
) -> Result<Quantity, QuantityError> {
    let value = raw_value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| QuantityError::InvalidNumber(raw_value.to_string()))?;

    let unit = match unit.map(str::trim).filter(|u| !u.is_empty()) {
        None => default_unit,
        Some(symbol) => {
            let unit = Unit::from_symbol(symbol)
                .ok_or_else(|| QuantityError::UnknownUnit(symbol.to_string()))?;
            if unit.dimension() != default_unit.dimension() {
                return Err(QuantityError::DimensionMismatch {
                    unit: symbol.to_string(),
                    found: unit.dimension(),
                    expected: default_unit.dimension(),
                });
            }
            unit
        }
    };
    Ok(Quantity::new(value, unit))
}
