//! Fastener standard codes and their cross-standard equivalents
//!
//! A standard code is an organization tag plus a number, with an optional
//! part suffix: `DIN 933`, `ISO 4017`, `ISO 898-1`. ANSI/ASME designations
//! add a series letter and dotted subdivisions: `ANSI B18.2.1`. Free text
//! writes these in many ways ("din933", "DIN-933", "DIN EN ISO 4017",
//! "GB/T 5783", "ASME B18.2.1"); all of them normalize to a single
//! [`StandardCode`].
//!
//! The [`StandardTable`] records which codes denote the same fastener across
//! standards bodies. It is built once, wrapped in an `Arc`, and shared
//! read-only by every request.
//!
//! # Example
//!
//! ```
//! use fastener_core::standards::{normalize_standard_code, StandardTable};
//!
//! let table = StandardTable::builtin();
//! let din = normalize_standard_code("din933").unwrap();
//! let iso = normalize_standard_code("ISO 4017").unwrap();
//!
//! assert_eq!(din.to_string(), "DIN 933");
//! assert!(table.get_equivalents_fast(&din).contains(&iso));
//! ```

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

use crate::error::{Result, TableError};

/// Standards bodies recognized in queries and metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Organization {
    /// Deutsches Institut für Normung
    Din,
    /// International Organization for Standardization
    Iso,
    /// European Norm
    En,
    /// British Standards
    Bs,
    /// Chinese national standard (GB and GB/T)
    Gb,
    /// Ente Nazionale Italiano di Unificazione
    Uni,
    /// American National Standards Institute (including ASME B18 adoptions)
    Ansi,
}

impl Organization {
    /// Canonical upper-case tag
    pub fn as_str(&self) -> &'static str {
        match self {
            Organization::Din => "DIN",
            Organization::Iso => "ISO",
            Organization::En => "EN",
            Organization::Bs => "BS",
            Organization::Gb => "GB",
            Organization::Uni => "UNI",
            Organization::Ansi => "ANSI",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_uppercase().as_str() {
            "DIN" => Some(Organization::Din),
            "ISO" => Some(Organization::Iso),
            "EN" => Some(Organization::En),
            "BS" => Some(Organization::Bs),
            "GB" | "GB/T" => Some(Organization::Gb),
            "UNI" => Some(Organization::Uni),
            "ANSI" | "ASME" | "ANSI/ASME" => Some(Organization::Ansi),
            _ => None,
        }
    }
}

impl fmt::Display for Organization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized standard reference
///
/// Ordering is (organization, series, number, part, subpart), which keeps
/// equivalence sets and display lists deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StandardCode {
    /// Issuing body
    pub org: Organization,
    /// Series letter of ANSI designations (`B18.2.1` → `Some('B')`)
    pub series: Option<char>,
    /// Numeric document identifier
    pub number: u32,
    /// Optional part number (`898-1` → `Some(1)`, `B18.2.1` → `Some(2)`)
    pub part: Option<u16>,
    /// Second dotted subdivision of ANSI designations (`B18.2.1` → `Some(1)`)
    pub subpart: Option<u16>,
}

impl StandardCode {
    /// Create a code without a part suffix
    pub const fn new(org: Organization, number: u32) -> Self {
        Self {
            org,
            series: None,
            number,
            part: None,
            subpart: None,
        }
    }

    /// Set the part suffix
    pub const fn with_part(mut self, part: u16) -> Self {
        self.part = Some(part);
        self
    }

    /// Set the series letter
    pub const fn with_series(mut self, series: char) -> Self {
        self.series = Some(series);
        self
    }

    /// Set the second subdivision
    pub const fn with_subpart(mut self, subpart: u16) -> Self {
        self.subpart = Some(subpart);
        self
    }
}

impl fmt::Display for StandardCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.org)?;
        if let Some(series) = self.series {
            write!(f, "{}", series)?;
        }
        write!(f, "{}", self.number)?;

        // ANSI subdivisions are dotted, everyone else uses a dash
        let separator = if self.org == Organization::Ansi { '.' } else { '-' };
        if let Some(part) = self.part {
            write!(f, "{}{}", separator, part)?;
            if let Some(subpart) = self.subpart {
                write!(f, "{}{}", separator, subpart)?;
            }
        }
        Ok(())
    }
}

impl Serialize for StandardCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for StandardCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        normalize_standard_code(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("not a standard code: '{}'", raw)))
    }
}

/// Standard code pattern
///
/// Adoption prefixes (`DIN EN`, `EN ISO`, `BS EN ISO`) are consumed so that the
/// last organization tag is the one that identifies the document.
static CODE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:(?:DIN|BS|UNI)[\s\-]*)?(?:EN[\s\-]+)?(DIN|ISO|EN|BS|GB(?:/T)?|UNI)[\s\-_.]*(\d{1,5})(?:-(\d{1,2}))?",
    )
    .expect("standard code pattern compiles")
});

/// ANSI/ASME designation pattern (`ANSI B18.2.1`, `ASME B18.6.3`, `ANSI 18`)
static ANSI_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(ANSI(?:/ASME)?|ASME)[\s\-_]*([A-Z])?(\d{1,3})(?:\.(\d{1,2}))?(?:\.(\d{1,2}))?",
    )
    .expect("ANSI pattern compiles")
});

/// A standard code found in free text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeOccurrence {
    /// Normalized code
    pub code: StandardCode,
    /// Byte offset of the first character of the match
    pub start: usize,
    /// Byte offset one past the last character of the match
    pub end: usize,
}

impl CodeOccurrence {
    /// The matched slice of the source text
    pub fn raw<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start..self.end]
    }
}

/// Find every standard code in `text`, in positional order.
///
/// Never fails: text without codes yields an empty vector.
pub fn find_standard_codes(text: &str) -> Vec<CodeOccurrence> {
    let mut found = find_numbered_codes(text);
    found.extend(find_ansi_codes(text));
    found.sort_by_key(|occ| occ.start);
    found
}

fn find_numbered_codes(text: &str) -> Vec<CodeOccurrence> {
    CODE_PATTERN
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let org = Organization::from_token(caps.get(1)?.as_str())?;
            let number_match = caps.get(2)?;
            let rest = &text[number_match.end()..];

            // "ISO 123456" is not a five-digit code followed by noise
            if caps.get(3).is_none() && rest.starts_with(|c: char| c.is_ascii_digit()) {
                return None;
            }

            let number = number_match.as_str().parse::<u32>().ok()?;
            let mut end = whole.end();
            let mut part = None;

            if let Some(part_match) = caps.get(3) {
                // "DIN 933-8.8" carries a property class, not a part number
                let after = &text[part_match.end()..];
                let is_decimal = after.starts_with('.')
                    && after[1..].starts_with(|c: char| c.is_ascii_digit());
                if is_decimal || after.starts_with(|c: char| c.is_ascii_digit()) {
                    end = number_match.end();
                } else {
                    part = part_match.as_str().parse::<u16>().ok();
                }
            }

            let mut code = StandardCode::new(org, number);
            code.part = part;
            Some(CodeOccurrence {
                code,
                start: whole.start(),
                end,
            })
        })
        .collect()
}

fn find_ansi_codes(text: &str) -> Vec<CodeOccurrence> {
    ANSI_PATTERN
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let org = Organization::from_token(caps.get(1)?.as_str())?;
            if text[whole.end()..].starts_with(|c: char| c.is_ascii_digit()) {
                return None;
            }

            let mut code = StandardCode::new(org, caps.get(3)?.as_str().parse().ok()?);
            code.series = caps
                .get(2)
                .and_then(|m| m.as_str().chars().next())
                .map(|c| c.to_ascii_uppercase());
            code.part = caps.get(4).and_then(|m| m.as_str().parse().ok());
            code.subpart = caps.get(5).and_then(|m| m.as_str().parse().ok());

            Some(CodeOccurrence {
                code,
                start: whole.start(),
                end: whole.end(),
            })
        })
        .collect()
}

/// Normalize a raw code such as `"din933"` or `"DIN-933"`.
///
/// The whole input (ignoring surrounding whitespace and punctuation) must be a
/// single code; anything else yields `None`.
pub fn normalize_standard_code(raw: &str) -> Option<StandardCode> {
    let trimmed = raw.trim_matches(|c: char| c.is_whitespace() || ".,;:()[]\"'".contains(c));
    if trimmed.is_empty() {
        return None;
    }

    find_standard_codes(trimmed)
        .into_iter()
        .next()
        .filter(|occ| occ.start == 0 && occ.end == trimmed.len())
        .map(|occ| occ.code)
}

/// Render a code in canonical form, e.g. `"DIN 933"`.
pub fn format_standard_for_display(code: &StandardCode) -> String {
    code.to_string()
}

/// Static metadata for a known code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardRecord {
    /// Fastener family (bolt, screw, nut, washer, pin, rod, stud, specification)
    pub category: String,
    /// Common name
    pub name: String,
}

/// A declared set of mutually equivalent codes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquivalenceGroup {
    pub category: String,
    pub name: String,
    pub codes: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GroupFile {
    #[serde(default, rename = "group")]
    groups: Vec<EquivalenceGroup>,
}

/// Parse `[[group]]` tables from a TOML document.
///
/// ```toml
/// [[group]]
/// category = "screw"
/// name = "Hex head screw, fully threaded"
/// codes = ["DIN 933", "ISO 4017"]
/// ```
pub fn parse_groups(toml_str: &str) -> Result<Vec<EquivalenceGroup>> {
    let file: GroupFile = toml::from_str(toml_str)?;
    Ok(file.groups)
}

static NO_EQUIVALENTS: BTreeSet<StandardCode> = BTreeSet::new();

/// Bidirectional equivalence table keyed by normalized code
#[derive(Debug, Clone, Default)]
pub struct StandardTable {
    records: HashMap<StandardCode, StandardRecord>,
    equivalents: HashMap<StandardCode, BTreeSet<StandardCode>>,
}

impl StandardTable {
    /// A table with no entries
    pub fn empty() -> Self {
        Self::default()
    }

    /// The curated table shipped with the crate
    pub fn builtin() -> Self {
        let mut table = Self::default();
        for (category, name, codes) in BUILTIN_GROUPS {
            table.insert_group(category, name, codes);
        }
        debug!("Built standard table with {} codes", table.len());
        table
    }

    /// Build a table from declared groups only
    pub fn from_groups(groups: impl IntoIterator<Item = EquivalenceGroup>) -> Result<Self> {
        Self::default().with_groups(groups)
    }

    /// Add groups to this table
    pub fn with_groups(
        mut self,
        groups: impl IntoIterator<Item = EquivalenceGroup>,
    ) -> Result<Self> {
        for group in groups {
            if group.codes.is_empty() {
                return Err(TableError::EmptyGroup(group.name));
            }
            let codes = group
                .codes
                .iter()
                .map(|raw| {
                    normalize_standard_code(raw)
                        .ok_or_else(|| TableError::invalid_code(&group.name, raw))
                })
                .collect::<Result<Vec<_>>>()?;
            self.insert_group(&group.category, &group.name, &codes);
        }
        Ok(self)
    }

    fn insert_group(&mut self, category: &str, name: &str, codes: &[StandardCode]) {
        for code in codes {
            self.records.entry(*code).or_insert_with(|| StandardRecord {
                category: category.to_string(),
                name: name.to_string(),
            });
            self.equivalents
                .entry(*code)
                .or_default()
                .extend(codes.iter().filter(|other| *other != code).copied());
        }
    }

    /// Look up static metadata for a code
    pub fn find_standard(&self, code: &StandardCode) -> Option<&StandardRecord> {
        self.records.get(code)
    }

    /// All codes declared equivalent to `code`, excluding `code` itself.
    ///
    /// Unknown codes return an empty set.
    pub fn get_equivalents_fast(&self, code: &StandardCode) -> &BTreeSet<StandardCode> {
        self.equivalents.get(code).unwrap_or(&NO_EQUIVALENTS)
    }

    /// Whether `a` and `b` are declared equivalent (a code is not its own equivalent)
    pub fn are_equivalent(&self, a: &StandardCode, b: &StandardCode) -> bool {
        self.get_equivalents_fast(a).contains(b)
    }

    /// Iterate over every known code
    pub fn codes(&self) -> impl Iterator<Item = &StandardCode> {
        self.records.keys()
    }

    /// Number of known codes
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table has no codes
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

const fn din(number: u32) -> StandardCode {
    StandardCode::new(Organization::Din, number)
}

const fn iso(number: u32) -> StandardCode {
    StandardCode::new(Organization::Iso, number)
}

const fn en(number: u32) -> StandardCode {
    StandardCode::new(Organization::En, number)
}

const fn gb(number: u32) -> StandardCode {
    StandardCode::new(Organization::Gb, number)
}

const fn uni(number: u32) -> StandardCode {
    StandardCode::new(Organization::Uni, number)
}

const fn ansi_b(number: u32, part: u16, subpart: u16) -> StandardCode {
    StandardCode::new(Organization::Ansi, number)
        .with_series('B')
        .with_part(part)
        .with_subpart(subpart)
}

type BuiltinGroup = (&'static str, &'static str, &'static [StandardCode]);

const BUILTIN_GROUPS: &[BuiltinGroup] = &[
    // Bolts
    (
        "bolt",
        "Hex head bolt, partially threaded",
        &[din(931), iso(4014), en(24014), gb(5782), uni(5737)],
    ),
    ("bolt", "Hex flange bolt", &[din(6921), en(1665), iso(4162)]),
    ("bolt", "High-strength structural bolt, HV system", &[din(6914), en(14399).with_part(4)]),
    ("bolt", "Cup head square neck bolt", &[din(603)]),
    // Screws
    (
        "screw",
        "Hex head screw, fully threaded",
        &[din(933), iso(4017), en(24017), gb(5783), uni(5739)],
    ),
    ("screw", "Hex socket head cap screw", &[din(912), iso(4762)]),
    ("screw", "Hex socket countersunk head screw", &[din(7991), iso(10642)]),
    ("screw", "Hex socket button head screw", &[iso(7380)]),
    ("screw", "Hex socket set screw, flat point", &[din(913), iso(4026)]),
    ("screw", "Hex socket set screw, cone point", &[din(914), iso(4027)]),
    ("screw", "Hex socket set screw, dog point", &[din(915), iso(4028)]),
    ("screw", "Hex socket set screw, cup point", &[din(916), iso(4029)]),
    ("screw", "Slotted cheese head screw", &[din(84), iso(1207)]),
    ("screw", "Slotted pan head screw", &[din(85), iso(1580)]),
    ("screw", "Slotted countersunk head screw", &[din(963), iso(2009)]),
    ("screw", "Cross recessed pan head screw", &[din(7985), iso(7045)]),
    ("screw", "Cross recessed countersunk head screw", &[din(965), iso(7046)]),
    ("screw", "Cross recessed raised countersunk head screw", &[din(966), iso(7047)]),
    ("screw", "Cross recessed pan head tapping screw", &[din(7981), iso(7049)]),
    ("screw", "Cross recessed countersunk head tapping screw", &[din(7982), iso(7050)]),
    // Nuts
    ("nut", "Hex nut", &[din(934), iso(4032), en(24032), gb(6170)]),
    ("nut", "Hex thin nut", &[din(439), iso(4035)]),
    ("nut", "Prevailing torque hex nut, nylon insert, thin", &[din(985), iso(10511)]),
    ("nut", "Prevailing torque hex nut, nylon insert", &[din(982), iso(7040)]),
    ("nut", "Hex flange nut", &[din(6923), iso(4161)]),
    ("nut", "Hex domed cap nut", &[din(1587)]),
    ("nut", "Wing nut", &[din(315)]),
    // Washers
    ("washer", "Plain washer", &[din(125), iso(7089), iso(7090)]),
    ("washer", "Plain washer, large series", &[din(9021), iso(7093)]),
    ("washer", "Spring lock washer", &[din(127)]),
    // Pins
    ("pin", "Parallel pin, unhardened", &[din(7), iso(2338)]),
    ("pin", "Parallel pin, hardened", &[din(6325), iso(8734)]),
    ("pin", "Spring pin, heavy duty", &[din(1481), iso(8752)]),
    ("pin", "Split pin", &[din(94), iso(1234)]),
    // Rods and studs
    ("rod", "Threaded rod", &[din(975)]),
    ("stud", "Stud bolt, fully threaded", &[din(976).with_part(1)]),
    ("stud", "Stud, metal end 1d", &[din(938)]),
    ("stud", "Stud, metal end 1.25d", &[din(939)]),
    // Inch series
    ("bolt", "Square and hex bolts and screws, inch series", &[ansi_b(18, 2, 1)]),
    ("nut", "Square and hex nuts, inch series", &[ansi_b(18, 2, 2)]),
    ("washer", "Plain washers, inch series", &[ansi_b(18, 22, 1)]),
    // Property specifications
    (
        "specification",
        "Mechanical properties of carbon steel bolts and screws",
        &[iso(898).with_part(1), en(20898).with_part(1)],
    ),
    (
        "specification",
        "Mechanical properties of stainless steel fasteners",
        &[iso(3506).with_part(1)],
    ),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_formatting_variants() {
        let expected = din(933);
        for raw in ["din933", "DIN-933", "DIN 933", "Din_933", " din.933 ", "DIN  933."] {
            assert_eq!(normalize_standard_code(raw), Some(expected), "input {:?}", raw);
        }
    }

    #[test]
    fn test_normalize_adoption_prefixes() {
        assert_eq!(normalize_standard_code("DIN EN ISO 4017"), Some(iso(4017)));
        assert_eq!(normalize_standard_code("EN ISO 4762"), Some(iso(4762)));
        assert_eq!(normalize_standard_code("BS EN 24014"), Some(en(24014)));
        assert_eq!(normalize_standard_code("GB/T 5783"), Some(gb(5783)));
    }

    #[test]
    fn test_normalize_part_suffix() {
        assert_eq!(
            normalize_standard_code("ISO 898-1"),
            Some(iso(898).with_part(1))
        );
        assert_eq!(
            normalize_standard_code("en 14399-4"),
            Some(en(14399).with_part(4))
        );
    }

    #[test]
    fn test_normalize_ansi_designations() {
        let b18_2_1 = ansi_b(18, 2, 1);
        for raw in [
            "ANSI B18.2.1",
            "ansi b18.2.1",
            "ASME B18.2.1",
            "ANSI/ASME B18.2.1",
            "ANSI-B18.2.1",
        ] {
            assert_eq!(normalize_standard_code(raw), Some(b18_2_1), "input {:?}", raw);
        }
        assert_eq!(
            normalize_standard_code("ANSI 18"),
            Some(StandardCode::new(Organization::Ansi, 18))
        );
        assert_eq!(
            normalize_standard_code("ASME B18.6"),
            Some(StandardCode::new(Organization::Ansi, 18).with_series('B').with_part(6))
        );
        assert_eq!(normalize_standard_code("ANSI 1234"), None);
    }

    #[test]
    fn test_find_ansi_codes_among_others() {
        let text = "Hex bolt ANSI B18.2.1, metric alternative ISO 4014";
        let found = find_standard_codes(text);
        let codes: Vec<_> = found.iter().map(|o| o.code).collect();
        assert_eq!(codes, vec![ansi_b(18, 2, 1), iso(4014)]);
        assert_eq!(found[0].raw(text), "ANSI B18.2.1");
    }

    #[test]
    fn test_normalize_rejects_non_codes() {
        assert_eq!(normalize_standard_code(""), None);
        assert_eq!(normalize_standard_code("   "), None);
        assert_eq!(normalize_standard_code("hex bolt"), None);
        assert_eq!(normalize_standard_code("DIN"), None);
        assert_eq!(normalize_standard_code("ANSI"), None);
        assert_eq!(normalize_standard_code("DIN 933 bolt"), None);
        assert_eq!(normalize_standard_code("ISO 123456"), None);
    }

    #[test]
    fn test_find_codes_property_class_is_not_a_part() {
        let text = "DIN 933-8.8 zinc plated";
        let found = find_standard_codes(text);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].code, din(933));
        assert_eq!(found[0].raw(text), "DIN 933");
    }

    #[test]
    fn test_find_codes_in_order() {
        let text = "Replaces DIN 931 / ISO 4014; see also iso4017";
        let codes: Vec<_> = find_standard_codes(text).into_iter().map(|o| o.code).collect();
        assert_eq!(codes, vec![din(931), iso(4014), iso(4017)]);
    }

    #[test]
    fn test_find_codes_ignores_words() {
        assert!(find_standard_codes("open end spanner, ISO-certified").is_empty());
        assert!(find_standard_codes("").is_empty());
    }

    #[test]
    fn test_display() {
        assert_eq!(format_standard_for_display(&din(933)), "DIN 933");
        assert_eq!(format_standard_for_display(&iso(898).with_part(1)), "ISO 898-1");
        assert_eq!(Organization::Gb.to_string(), "GB");
        assert_eq!(format_standard_for_display(&ansi_b(18, 22, 1)), "ANSI B18.22.1");
        assert_eq!(StandardCode::new(Organization::Ansi, 18).to_string(), "ANSI 18");
    }

    #[test]
    fn test_serde_as_display_string() {
        let json = serde_json::to_string(&iso(4017)).unwrap();
        assert_eq!(json, "\"ISO 4017\"");
        let parsed: StandardCode = serde_json::from_str("\"din-933\"").unwrap();
        assert_eq!(parsed, din(933));
        assert!(serde_json::from_str::<StandardCode>("\"bolt\"").is_err());
    }

    #[test]
    fn test_builtin_lookup() {
        let table = StandardTable::builtin();
        let record = table.find_standard(&din(933)).unwrap();
        assert_eq!(record.category, "screw");
        assert_eq!(record.name, "Hex head screw, fully threaded");
        assert!(table.find_standard(&StandardCode::new(Organization::Bs, 1234)).is_none());
    }

    #[test]
    fn test_equivalents_exclude_self() {
        let table = StandardTable::builtin();
        let eq = table.get_equivalents_fast(&din(933));
        assert!(eq.contains(&iso(4017)));
        assert!(eq.contains(&gb(5783)));
        assert!(!eq.contains(&din(933)));
    }

    #[test]
    fn test_equivalents_empty_for_unknown_and_singletons() {
        let table = StandardTable::builtin();
        assert!(table.get_equivalents_fast(&din(975)).is_empty());
        assert!(table
            .get_equivalents_fast(&StandardCode::new(Organization::Bs, 1234))
            .is_empty());
    }

    #[test]
    fn test_builtin_symmetry() {
        let table = StandardTable::builtin();
        for code in table.codes() {
            for other in table.get_equivalents_fast(code) {
                assert!(
                    table.are_equivalent(other, code),
                    "{} -> {} is not symmetric",
                    code,
                    other
                );
            }
        }
    }

    #[test]
    fn test_builtin_display_roundtrip() {
        let table = StandardTable::builtin();
        for code in table.codes() {
            let shown = format_standard_for_display(code);
            assert_eq!(normalize_standard_code(&shown), Some(*code));
        }
    }

    #[test]
    fn test_from_groups_merges_overlaps() {
        let table = StandardTable::from_groups([
            EquivalenceGroup {
                category: "washer".into(),
                name: "Plain washer".into(),
                codes: vec!["DIN 125".into(), "ISO 7089".into()],
            },
            EquivalenceGroup {
                category: "washer".into(),
                name: "Plain washer, chamfered".into(),
                codes: vec!["DIN 125".into(), "ISO 7090".into()],
            },
        ])
        .unwrap();

        let eq = table.get_equivalents_fast(&din(125));
        assert_eq!(eq.len(), 2);
        assert!(table.are_equivalent(&iso(7090), &din(125)));
        assert!(!table.are_equivalent(&iso(7090), &iso(7089)));
        assert_eq!(table.find_standard(&din(125)).unwrap().name, "Plain washer");
    }

    #[test]
    fn test_from_groups_rejects_bad_code() {
        let err = StandardTable::from_groups([EquivalenceGroup {
            category: "nut".into(),
            name: "Broken".into(),
            codes: vec!["DIN 934".into(), "hex nut".into()],
        }])
        .unwrap_err();
        assert!(matches!(err, TableError::InvalidCode { .. }));
        assert!(err.to_string().contains("hex nut"));
    }

    #[test]
    fn test_parse_groups_toml() {
        let groups = parse_groups(
            r#"
            [[group]]
            category = "nut"
            name = "Square nut"
            codes = ["DIN 557", "ISO 1234"]
            "#,
        )
        .unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].codes, vec!["DIN 557", "ISO 1234"]);

        assert!(parse_groups("[[group]]\ncategory = 1").is_err());
        assert!(parse_groups("").unwrap().is_empty());
    }
}
