//! Observer points parsed from the vector export.

use std::collections::HashSet;

use crate::error::{Error, Result};

/// Field separator requested from the point export.
pub const POINT_SEPARATOR: char = ',';

#[derive(Debug, Clone, PartialEq)]
pub struct ObserverPoint {
    pub x: f64,
    pub y: f64,
    pub category: u32,
}

/// Parses `x,y[,z],cat` records, one per line. Blank lines are skipped;
/// the category is always the last field.
pub fn parse_point_records(records: &str, separator: char) -> Result<Vec<ObserverPoint>> {
    let mut points = Vec::new();

    for (index, line) in records.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        points.push(parse_point_record(line, index + 1, separator)?);
    }

    log::debug!("Parsed {} observer points", points.len());
    Ok(points)
}

fn parse_point_record(line: &str, line_number: usize, separator: char) -> Result<ObserverPoint> {
    let malformed = |reason: &str| Error::MalformedPointRecord {
        line: line_number,
        record: line.to_string(),
        reason: reason.to_string(),
    };

    let fields: Vec<&str> = line.split(separator).map(str::trim).collect();
    if fields.len() < 3 {
        return Err(malformed("expected at least x, y and category"));
    }

    let x = fields[0]
        .parse::<f64>()
        .map_err(|_| malformed("x is not a number"))?;
    let y = fields[1]
        .parse::<f64>()
        .map_err(|_| malformed("y is not a number"))?;
    if !x.is_finite() || !y.is_finite() {
        return Err(malformed("coordinates must be finite"));
    }
    let category = fields[fields.len() - 1]
        .parse::<u32>()
        .map_err(|_| malformed("category is not a non-negative integer"))?;

    Ok(ObserverPoint { x, y, category })
}

/// First category id shared by two or more points, in input order.
pub fn first_duplicate_category(points: &[ObserverPoint]) -> Option<u32> {
    let mut seen = HashSet::with_capacity(points.len());
    points
        .iter()
        .map(|p| p.category)
        .find(|category| !seen.insert(*category))
}
