//! Input validation utilities
//!
//! Registration numbers are checked against the institute's enrollment
//! records: a batch prefix plus a number that must fall inside that
//! batch's interval set.

use regex::Regex;
use std::sync::OnceLock;

/// Numbers enrolled under one batch prefix
enum NumberSet {
    /// One contiguous interval
    Range(u32, u32),
    /// Several disjoint intervals
    Ranges(&'static [(u32, u32)]),
    /// Explicit member list
    Members(&'static [u32]),
}

impl NumberSet {
    fn contains(&self, value: u32) -> bool {
        match self {
            Self::Range(start, end) => (*start..=*end).contains(&value),
            Self::Ranges(ranges) => ranges
                .iter()
                .any(|(start, end)| (*start..=*end).contains(&value)),
            Self::Members(members) => members.contains(&value),
        }
    }
}

/// Valid registration numbers per batch prefix, from the enrollment records
const VALID_RANGES: &[(&str, NumberSet)] = &[
    ("125", NumberSet::Range(1, 247)),
    ("225", NumberSet::Range(1, 220)),
    ("325", NumberSet::Range(1, 85)),
    ("425", NumberSet::Range(1, 244)),
    ("525", NumberSet::Range(1, 78)),
    ("124", NumberSet::Range(1, 211)),
    ("224", NumberSet::Range(1, 144)),
    ("324", NumberSet::Range(1, 69)),
    ("424", NumberSet::Range(1, 207)),
    ("524", NumberSet::Ranges(&[(1, 54), (501, 519)])),
    ("123", NumberSet::Range(1, 198)),
    ("223", NumberSet::Range(1, 138)),
    ("323", NumberSet::Range(1, 67)),
    ("423", NumberSet::Members(&[58, 136, 123, 106, 76])),
    ("523", NumberSet::Range(1, 22)),
    ("122", NumberSet::Range(1, 186)),
    ("222", NumberSet::Range(1, 147)),
    ("322", NumberSet::Range(1, 60)),
    ("522", NumberSet::Range(1, 26)),
    ("121", NumberSet::Range(1, 193)),
    (
        "221",
        NumberSet::Members(&[143, 112, 46, 119, 136, 70, 60, 139, 95, 97, 71, 146, 109, 150]),
    ),
    ("321", NumberSet::Members(&[64, 71, 65, 60])),
    ("521", NumberSet::Range(1, 50)),
    ("120", NumberSet::Range(1, 217)),
    ("220", NumberSet::Members(&[149, 58, 137])),
    ("520", NumberSet::Members(&[21, 8, 3, 6, 16, 19, 24, 15, 28])),
    ("119", NumberSet::Range(1, 220)),
];

fn lookup(prefix: &str) -> Option<&'static NumberSet> {
    VALID_RANGES
        .iter()
        .find(|(candidate, _)| *candidate == prefix)
        .map(|(_, set)| set)
}

/// Normalize a raw registration number to the standard `prefix/number`
/// form. Accepts `/`, `-` or space separators and strips leading zeros.
pub fn format(raw: &str) -> Option<String> {
    static SPLIT_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = SPLIT_REGEX.get_or_init(|| {
        Regex::new(r"^\s*(\d+)\s*[/ -]\s*(\d+)\s*$").expect("Failed to compile registration regex")
    });

    let caps = regex.captures(raw)?;
    let prefix = caps.get(1)?.as_str();
    let number: u32 = caps.get(2)?.as_str().parse().ok()?;
    if number < 1 {
        return None;
    }

    Some(format!("{prefix}/{number}"))
}

/// Check a formatted registration number against the enrollment records
pub fn is_valid(formatted: &str) -> bool {
    let Some((prefix, number)) = formatted.split_once('/') else {
        return false;
    };
    let Ok(value) = number.parse::<u32>() else {
        return false;
    };
    if value < 1 {
        return false;
    }

    lookup(prefix).is_some_and(|set| set.contains(value))
}

/// Batch prefixes with at least one enrolled number
pub fn valid_prefixes() -> Vec<&'static str> {
    VALID_RANGES.iter().map(|(prefix, _)| *prefix).collect()
}

/// Validate password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    if password.len() < 6 {
        return Err("Password must be at least 6 characters".to_string());
    }

    Ok(())
}

/// Validate the password-reset security code
pub fn validate_security_code(code: &str) -> Result<(), String> {
    if code.len() < 3 {
        return Err("Security code must be at least 3 characters".to_string());
    }

    Ok(())
}
