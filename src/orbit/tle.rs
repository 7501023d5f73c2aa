use sgp4::{Constants, Elements};

use crate::orbit::OrbitError;

/// A parsed satellite ready for propagation.
#[derive(Debug)]
pub struct TleEntry {
    pub name: String,
    pub norad_id: u32,
    pub source: String,
    pub elements: Elements,
    pub constants: Constants,
}

impl TleEntry {
    pub fn from_lines(
        name: Option<String>,
        line1: &str,
        line2: &str,
        source: &str,
    ) -> Result<Self, OrbitError> {
        let elements = Elements::from_tle(name, line1.as_bytes(), line2.as_bytes())?;
        let constants = Constants::from_elements(&elements)?;
        let norad_id = elements.norad_id as u32;
        let name = elements
            .object_name
            .clone()
            .unwrap_or_else(|| format!("NORAD {}", norad_id));

        Ok(Self {
            name,
            norad_id,
            source: source.to_string(),
            elements,
            constants,
        })
    }
}

/// Parse every element set in `content`, skipping the ones sgp4 rejects.
pub fn parse_tle_text(content: &str, source: &str) -> Vec<TleEntry> {
    let mut entries = Vec::new();
    for (name, line1, line2) in split_tle_sets(content) {
        match TleEntry::from_lines(name, &line1, &line2, source) {
            Ok(entry) => entries.push(entry),
            Err(e) => log::warn!("Skipping element set in {}: {}", source, e),
        }
    }
    entries
}

/// Split TLE text into (name, line1, line2) triplets. Accepts both 2-line and
/// 3-line sets in the same document.
fn split_tle_sets(content: &str) -> Vec<(Option<String>, String, String)> {
    let lines: Vec<&str> = content
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();

    let mut result = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        if lines[i].starts_with("1 ") && i + 1 < lines.len() && lines[i + 1].starts_with("2 ") {
            result.push((None, lines[i].to_string(), lines[i + 1].to_string()));
            i += 2;
        } else if i + 2 < lines.len()
            && lines[i + 1].starts_with("1 ")
            && lines[i + 2].starts_with("2 ")
        {
            result.push((
                Some(lines[i].to_string()),
                lines[i + 1].to_string(),
                lines[i + 2].to_string(),
            ));
            i += 3;
        } else {
            i += 1;
        }
    }

    result
}
