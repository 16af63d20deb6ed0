use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParamError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    AlphaIn,
    AlphaOut,
    Sma,
    E,
    Inclination,
    PositionAngle,
    XCenter,
    YCenter,
    G1,
    G2,
    Weight,
    Psf,
    Parang1,
    Parang2,
    Parang3,
    Parang4,
}

impl Field {
    pub const COUNT: usize = 16;

    pub const ALL: [Field; Field::COUNT] = [
        Field::AlphaIn,
        Field::AlphaOut,
        Field::Sma,
        Field::E,
        Field::Inclination,
        Field::PositionAngle,
        Field::XCenter,
        Field::YCenter,
        Field::G1,
        Field::G2,
        Field::Weight,
        Field::Psf,
        Field::Parang1,
        Field::Parang2,
        Field::Parang3,
        Field::Parang4,
    ];

    pub const DISK: [Field; 8] = [
        Field::AlphaIn,
        Field::AlphaOut,
        Field::Sma,
        Field::E,
        Field::Inclination,
        Field::PositionAngle,
        Field::XCenter,
        Field::YCenter,
    ];

    pub const SPF: [Field; 3] = [Field::G1, Field::G2, Field::Weight];

    pub const PARALLACTIC: [Field; 4] = [Field::Parang1, Field::Parang2, Field::Parang3, Field::Parang4];

    pub fn key(self) -> &'static str {
        match self {
            Field::AlphaIn => "alpha_in",
            Field::AlphaOut => "alpha_out",
            Field::Sma => "sma",
            Field::E => "e",
            Field::Inclination => "inclination",
            Field::PositionAngle => "position_angle",
            Field::XCenter => "x_center",
            Field::YCenter => "y_center",
            Field::G1 => "g1",
            Field::G2 => "g2",
            Field::Weight => "weight",
            Field::Psf => "psf",
            Field::Parang1 => "parang1",
            Field::Parang2 => "parang2",
            Field::Parang3 => "parang3",
            Field::Parang4 => "parang4",
        }
    }

    pub fn from_key(key: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|f| f.key() == key)
    }

    /// Text shown in the input box before the user touches it.
    pub fn default_text(self) -> &'static str {
        match self {
            Field::AlphaIn => "5",
            Field::AlphaOut => "-5",
            Field::Sma => "50",
            Field::E => "0",
            Field::Inclination => "0",
            Field::PositionAngle => "0",
            Field::XCenter => "250",
            Field::YCenter => "250",
            Field::G1 => "0.5",
            Field::G2 => "0.5",
            Field::Weight => "0.5",
            Field::Psf => "NONE",
            Field::Parang1 => "0",
            Field::Parang2 => "90",
            Field::Parang3 => "180",
            Field::Parang4 => "270",
        }
    }

    /// Label under which the field is shown: only the first underscore
    /// becomes a space.
    pub fn label(self) -> String {
        field_label(self.key())
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for Field {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::from_key(s).ok_or_else(|| ParamError::UnknownField(s.to_string()))
    }
}

pub fn field_label(name: &str) -> String {
    name.replacen('_', " ", 1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Psf {
    #[serde(rename = "NIRCAM 300FM")]
    Nircam300Fm,
    #[serde(rename = "NIRCAM 360FM")]
    Nircam360Fm,
    #[serde(rename = "NONE")]
    None,
}

impl Psf {
    pub const ALL: [Psf; 3] = [Psf::Nircam300Fm, Psf::Nircam360Fm, Psf::None];

    pub fn as_str(self) -> &'static str {
        match self {
            Psf::Nircam300Fm => "NIRCAM 300FM",
            Psf::Nircam360Fm => "NIRCAM 360FM",
            Psf::None => "NONE",
        }
    }
}

impl std::fmt::Display for Psf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Psf {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Psf::ALL
            .into_iter()
            .find(|p| p.as_str() == s.trim())
            .ok_or_else(|| ParamError::UnknownPsf {
                field: Field::Psf,
                value: s.to_string(),
            })
    }
}

/// Every field's current text, exactly as typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterRecord {
    values: [String; Field::COUNT],
}

impl Default for ParameterRecord {
    fn default() -> Self {
        ParameterRecord {
            values: Field::ALL.map(|f| f.default_text().to_string()),
        }
    }
}

impl ParameterRecord {
    pub fn get(&self, field: Field) -> &str {
        &self.values[field.index()]
    }

    pub fn with_field(&self, field: Field, raw: impl Into<String>) -> ParameterRecord {
        let mut next = self.clone();
        next.values[field.index()] = raw.into();
        next
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> + '_ {
        Field::ALL.into_iter().map(move |f| (f, self.get(f)))
    }

    /// Current PSF choice, if the text names one.
    pub fn psf(&self) -> Option<Psf> {
        self.get(Field::Psf).parse().ok()
    }

    pub fn to_payload(&self) -> Result<GeneratePayload, ParamError> {
        let num = |field: Field| parse_number(field, self.get(field));
        Ok(GeneratePayload {
            alpha_in: num(Field::AlphaIn)?,
            alpha_out: num(Field::AlphaOut)?,
            sma: num(Field::Sma)?,
            e: num(Field::E)?,
            inclination: num(Field::Inclination)?,
            position_angle: num(Field::PositionAngle)?,
            x_center: num(Field::XCenter)?,
            y_center: num(Field::YCenter)?,
            g1: num(Field::G1)?,
            g2: num(Field::G2)?,
            weight: num(Field::Weight)?,
            psf: self.get(Field::Psf).parse()?,
            parang1: num(Field::Parang1)?,
            parang2: num(Field::Parang2)?,
            parang3: num(Field::Parang3)?,
            parang4: num(Field::Parang4)?,
        })
    }
}

fn parse_number(field: Field, raw: &str) -> Result<f64, ParamError> {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(ParamError::NotANumber {
            field,
            value: raw.to_string(),
        }),
    }
}

/// JSON body of a generate request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratePayload {
    pub alpha_in: f64,
    pub alpha_out: f64,
    pub sma: f64,
    pub e: f64,
    pub inclination: f64,
    pub position_angle: f64,
    pub x_center: f64,
    pub y_center: f64,
    pub g1: f64,
    pub g2: f64,
    pub weight: f64,
    pub psf: Psf,
    pub parang1: f64,
    pub parang2: f64,
    pub parang3: f64,
    pub parang4: f64,
}
