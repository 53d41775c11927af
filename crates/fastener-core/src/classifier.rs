//! Query classification for fastener search
//!
//! Turns free text such as `"DIN 933 M8x30 A2"` into a [`QueryAnalysis`]:
//! which standard, thread, material and product type the user asked for, and
//! whether results must match the standard exactly.
//!
//! Every extractor is a pure function returning `Option<T>`, and
//! [`classify_query`] is total: any string, including an empty one, yields an
//! analysis.

use std::fmt;
use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};
use tracing::debug;

use crate::standards::{find_standard_codes, format_standard_for_display, StandardCode};

/// Query intent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    /// Names a standard code ("DIN 933 M8")
    ExactStandard,
    /// Names a metric thread but no standard ("M10x1.25 nut")
    ThreadSpec,
    /// Names only a material or property class ("A4", "10.9")
    Material,
    /// Anything else
    Descriptive,
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryType::ExactStandard => write!(f, "exact_standard"),
            QueryType::ThreadSpec => write!(f, "thread_spec"),
            QueryType::Material => write!(f, "material"),
            QueryType::Descriptive => write!(f, "descriptive"),
        }
    }
}

/// A standard code as written in the query and in normalized form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedStandard {
    /// Text as typed ("din933")
    pub raw: String,
    /// Normalized code
    pub code: StandardCode,
    /// Canonical display form ("DIN 933")
    pub display: String,
}

/// Metric thread descriptor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadSpec {
    /// Nominal diameter in mm
    pub diameter: f32,
    /// Thread pitch in mm, when given explicitly
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch: Option<f32>,
    /// Fastener length in mm
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<f32>,
    /// Fine pitch requested (explicit pitch or the word "fine")
    #[serde(default)]
    pub fine_pitch: bool,
}

impl ThreadSpec {
    /// Coarse thread with only a diameter
    pub fn new(diameter: f32) -> Self {
        Self {
            diameter,
            pitch: None,
            length: None,
            fine_pitch: false,
        }
    }

    /// Set the length
    pub fn with_length(mut self, length: f32) -> Self {
        self.length = Some(length);
        self
    }

    /// Set an explicit (fine) pitch
    pub fn with_pitch(mut self, pitch: f32) -> Self {
        self.pitch = Some(pitch);
        self.fine_pitch = true;
        self
    }

    /// Whether a product thread satisfies this query thread.
    ///
    /// Diameters must agree; length and pitch only conflict when both sides
    /// state them.
    pub fn matches(&self, other: &ThreadSpec) -> bool {
        fn agree(a: Option<f32>, b: Option<f32>) -> bool {
            match (a, b) {
                (Some(a), Some(b)) => (a - b).abs() < 0.01,
                _ => true,
            }
        }

        (self.diameter - other.diameter).abs() < 0.01
            && agree(self.length, other.length)
            && agree(self.pitch, other.pitch)
    }
}

impl fmt::Display for ThreadSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "M{}", self.diameter)?;
        if let Some(pitch) = self.pitch {
            write!(f, "x{}", pitch)?;
        }
        if let Some(length) = self.length {
            write!(f, "x{}", length)?;
        }
        Ok(())
    }
}

/// Recognized materials and property classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum Material {
    #[serde(rename = "A2")]
    A2,
    #[serde(rename = "A4")]
    A4,
    #[serde(rename = "304")]
    Aisi304,
    #[serde(rename = "316")]
    Aisi316,
    #[serde(rename = "8.8")]
    Class8_8,
    #[serde(rename = "10.9")]
    Class10_9,
    #[serde(rename = "12.9")]
    Class12_9,
    #[serde(rename = "stainless")]
    Stainless,
}

impl Material {
    /// Every material, in extraction-pattern order
    pub const ALL: [Material; 8] = [
        Material::A2,
        Material::A4,
        Material::Aisi304,
        Material::Aisi316,
        Material::Class8_8,
        Material::Class10_9,
        Material::Class12_9,
        Material::Stainless,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Material::A2 => "A2",
            Material::A4 => "A4",
            Material::Aisi304 => "304",
            Material::Aisi316 => "316",
            Material::Class8_8 => "8.8",
            Material::Class10_9 => "10.9",
            Material::Class12_9 => "12.9",
            Material::Stainless => "stainless",
        }
    }

    /// Stainless grades and the generic "stainless"
    pub fn is_stainless(&self) -> bool {
        matches!(
            self,
            Material::A2
                | Material::A4
                | Material::Aisi304
                | Material::Aisi316
                | Material::Stainless
        )
    }

    /// Whether a product material satisfies this query material.
    ///
    /// A2 and 304 are the same alloy family, as are A4 and 316; the generic
    /// "stainless" accepts any stainless grade.
    pub fn matches(&self, other: &Material) -> bool {
        use Material::*;

        if self == other {
            return true;
        }
        match (self, other) {
            (A2, Aisi304) | (Aisi304, A2) | (A4, Aisi316) | (Aisi316, A4) => true,
            (Stainless, m) | (m, Stainless) => m.is_stainless(),
            _ => false,
        }
    }

    /// Codes of every material this one accepts, itself first
    pub fn compatible_codes(&self) -> Vec<&'static str> {
        let mut codes = vec![self.as_str()];
        codes.extend(
            Material::ALL
                .iter()
                .filter(|other| *other != self && self.matches(other))
                .map(|other| other.as_str()),
        );
        codes
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Material {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Product families in the query vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductType {
    Bolt,
    Nut,
    Washer,
    Screw,
    Stud,
    Pin,
    Rod,
    Rivet,
    Anchor,
}

impl ProductType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductType::Bolt => "bolt",
            ProductType::Nut => "nut",
            ProductType::Washer => "washer",
            ProductType::Screw => "screw",
            ProductType::Stud => "stud",
            ProductType::Pin => "pin",
            ProductType::Rod => "rod",
            ProductType::Rivet => "rivet",
            ProductType::Anchor => "anchor",
        }
    }

    fn from_word(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "bolt" => Some(ProductType::Bolt),
            "nut" => Some(ProductType::Nut),
            "washer" => Some(ProductType::Washer),
            "screw" => Some(ProductType::Screw),
            "stud" => Some(ProductType::Stud),
            "pin" => Some(ProductType::Pin),
            "rod" => Some(ProductType::Rod),
            "rivet" => Some(ProductType::Rivet),
            "anchor" => Some(ProductType::Anchor),
            _ => None,
        }
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured reading of a search query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryAnalysis {
    /// Original query text
    pub query: String,
    pub query_type: QueryType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard: Option<ExtractedStandard>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread: Option<ThreadSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<Material>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_type: Option<ProductType>,
    /// Results should be restricted to the requested standard
    pub requires_exact_match: bool,
}

impl QueryAnalysis {
    /// The normalized standard code, if the query named one
    pub fn standard_code(&self) -> Option<&StandardCode> {
        self.standard.as_ref().map(|s| &s.code)
    }

    /// Whether the query has any text worth embedding
    pub fn has_text(&self) -> bool {
        !self.query.trim().is_empty()
    }
}

static THREAD_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\bM(\d{1,2}(?:[.,]\d{1,2})?)(?:\s*[x×*]\s*(\d{1,3}(?:[.,]\d{1,2})?))?(?:\s*[x×*]\s*(\d{1,3}(?:[.,]\d{1,2})?))?",
    )
    .expect("thread pattern compiles")
});

static FINE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bfine\b").expect("fine pattern compiles"));

static MATERIAL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:(A2|V2A)(?:-\d{2})?|(A4|V4A)(?:-\d{2})?|(?:AISI\s*|SS\s*)?(304)L?|(?:AISI\s*|SS\s*)?(316)L?|(8\.8)|(10\.9)|(12\.9)|(stainless(?:\s+steel)?|inox|rostfrei|edelstahl))\b",
    )
    .expect("material pattern compiles")
});

static PRODUCT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(bolt|nut|washer|screw|stud|pin|rod|rivet|anchor)s?\b")
        .expect("product pattern compiles")
});

fn parse_decimal(raw: &str) -> Option<f32> {
    raw.replace(',', ".").parse::<f32>().ok()
}

/// First standard code by position.
pub fn extract_standard(query: &str) -> Option<ExtractedStandard> {
    find_standard(query).map(|(standard, _)| standard)
}

fn find_standard(query: &str) -> Option<(ExtractedStandard, Range<usize>)> {
    let occurrence = find_standard_codes(query).into_iter().next()?;
    let standard = ExtractedStandard {
        raw: occurrence.raw(query).to_string(),
        code: occurrence.code,
        display: format_standard_for_display(&occurrence.code),
    };
    Some((standard, occurrence.start..occurrence.end))
}

/// First metric thread by position.
///
/// `M10x1.25x40` reads as pitch then length. A single trailing number is a
/// pitch when it is fractional or under half the diameter (`M8x1`), otherwise
/// a length (`M8x30`).
pub fn extract_thread(query: &str) -> Option<ThreadSpec> {
    find_thread(query).map(|(thread, _)| thread)
}

fn find_thread(query: &str) -> Option<(ThreadSpec, Range<usize>)> {
    let fine_requested = FINE_PATTERN.is_match(query);

    THREAD_PATTERN.captures_iter(query).find_map(|caps| {
        let whole = caps.get(0)?;
        if query[whole.end()..].starts_with(|c: char| c.is_ascii_digit()) {
            return None;
        }

        let diameter = parse_decimal(caps.get(1)?.as_str())?;
        if diameter <= 0.0 {
            return None;
        }

        let first = caps.get(2).and_then(|m| parse_decimal(m.as_str()));
        let second = caps.get(3).and_then(|m| parse_decimal(m.as_str()));

        let mut thread = ThreadSpec::new(diameter);
        match (first, second) {
            (Some(pitch), Some(length)) => {
                thread = thread.with_pitch(pitch).with_length(length);
            }
            (Some(value), None) => {
                let fractional = value.fract() != 0.0;
                if fractional || value < diameter / 2.0 {
                    thread = thread.with_pitch(value);
                } else {
                    thread = thread.with_length(value);
                }
            }
            _ => {}
        }
        thread.fine_pitch |= fine_requested;

        Some((thread, whole.start()..whole.end()))
    })
}

/// First material or property class by position.
pub fn extract_material(query: &str) -> Option<Material> {
    let caps = MATERIAL_PATTERN.captures(query)?;
    Material::ALL
        .iter()
        .enumerate()
        .find(|(i, _)| caps.get(i + 1).is_some())
        .map(|(_, material)| *material)
}

/// First material in text that may also carry standard codes and a thread.
///
/// Digits inside codes and the thread are blanked first, so `DIN 316 M8`
/// has no material and `ISO 4017 M8x30 8.8` is property class 8.8.
pub fn extract_material_outside_codes(text: &str) -> Option<Material> {
    let mut consumed: Vec<Range<usize>> = find_standard_codes(text)
        .into_iter()
        .map(|occ| occ.start..occ.end)
        .collect();
    consumed.extend(find_thread(text).map(|(_, span)| span));
    extract_material(&mask_spans(text, &consumed))
}

/// First product-type word by position (whole words, plural allowed).
pub fn extract_product_type(query: &str) -> Option<ProductType> {
    let caps = PRODUCT_PATTERN.captures(query)?;
    ProductType::from_word(caps.get(1)?.as_str())
}

/// Blank out spans so later extractors do not re-read them
fn mask_spans(text: &str, spans: &[Range<usize>]) -> String {
    let mut masked = text.to_string();
    for span in spans {
        masked.replace_range(span.clone(), &" ".repeat(span.len()));
    }
    masked
}

/// Classify a free-text query.
///
/// Standards win over threads for the query type; materials and product
/// types are always extracted. Material extraction skips the text already
/// consumed by the standard and thread, so `DIN 316` is not material 316.
pub fn classify_query(query: &str) -> QueryAnalysis {
    let text = query.trim();

    let standard = extract_standard(text);
    let thread = extract_thread(text);
    let material = extract_material_outside_codes(text);
    let product_type = extract_product_type(text);

    let query_type = if standard.is_some() {
        QueryType::ExactStandard
    } else if thread.is_some() {
        QueryType::ThreadSpec
    } else if material.is_some() && product_type.is_none() {
        QueryType::Material
    } else {
        QueryType::Descriptive
    };

    debug!(
        "Query '{}' classified as {} (standard={:?}, thread={:?}, material={:?}, product={:?})",
        text,
        query_type,
        standard.as_ref().map(|s| s.display.as_str()),
        thread.map(|t| t.to_string()),
        material,
        product_type
    );

    QueryAnalysis {
        query: query.to_string(),
        query_type,
        requires_exact_match: query_type == QueryType::ExactStandard,
        standard,
        thread,
        material,
        product_type,
    }
}
