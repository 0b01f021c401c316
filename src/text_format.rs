//! Human-readable `lat:lng` text format for geometry, in degrees.
//!
//! - points: `"1:2, 3:4"`
//! - polyline: `"0:0, 0:1, 1:1"`
//! - polygon: loops separated by `;`, e.g. `"0:0, 0:4, 2:4; 1:1"`. The
//!   keywords `empty` and `full` give the empty and full polygons.
//! - region: `"points # polylines # polygons"`, each section a `|`-separated
//!   list. All points form a single point shape; each polyline and polygon is
//!   its own shape.

use crate::region::{Dimension, Region, Shape};
use crate::types::{LatLng, Point};
use std::fmt::Write;

/// Errors produced while parsing text geometry.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid lat:lng pair {0:?}")]
    InvalidLatLng(String),

    #[error("expected 3 `#`-separated sections, found {0}")]
    WrongSectionCount(usize),
}

fn parse_latlng(s: &str) -> Result<Point, ParseError> {
    let bad = || ParseError::InvalidLatLng(s.to_string());
    let (lat, lng) = s.split_once(':').ok_or_else(bad)?;
    let lat: f64 = lat.trim().parse().map_err(|_| bad())?;
    let lng: f64 = lng.trim().parse().map_err(|_| bad())?;
    Ok(LatLng::from_degrees(lat, lng).to_point())
}

/// Parse a comma-separated list of `lat:lng` pairs.
pub fn parse_points(s: &str) -> Result<Vec<Point>, ParseError> {
    s.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(parse_latlng)
        .collect()
}

pub fn parse_point(s: &str) -> Result<Point, ParseError> {
    parse_latlng(s.trim())
}

pub fn parse_polyline(s: &str) -> Result<Shape, ParseError> {
    Ok(Shape::polyline(parse_points(s)?))
}

pub fn parse_polygon(s: &str) -> Result<Shape, ParseError> {
    let s = s.trim();
    if s == "empty" {
        return Ok(Shape::polygon(Vec::new()));
    }
    if s == "full" {
        return Ok(Shape::full_polygon());
    }
    let loops = s
        .split(';')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| if t == "full" { Ok(Vec::new()) } else { parse_points(t) })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Shape::polygon(loops))
}

/// Parse `"points # polylines # polygons"`.
pub fn parse_region(s: &str) -> Result<Region, ParseError> {
    let sections: Vec<&str> = s.split('#').collect();
    if sections.len() != 3 {
        return Err(ParseError::WrongSectionCount(sections.len()));
    }
    let items = |text: &str| -> Vec<String> {
        text.split('|')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    };
    let mut region = Region::new();
    let mut points = Vec::new();
    for item in items(sections[0]) {
        points.extend(parse_points(&item)?);
    }
    if !points.is_empty() {
        region.add(Shape::points(points));
    }
    for item in items(sections[1]) {
        region.add(parse_polyline(&item)?);
    }
    for item in items(sections[2]) {
        region.add(parse_polygon(&item)?);
    }
    Ok(region)
}

fn write_point(out: &mut String, p: Point) {
    let ll = LatLng::from_point(p);
    // Round away representation noise from the degree conversion.
    let fmt = |d: f64| {
        let r = (d * 1e13).round() / 1e13;
        if r == 0.0 {
            0.0
        } else {
            r
        }
    };
    let _ = write!(out, "{}:{}", fmt(ll.lat_degrees()), fmt(ll.lng_degrees()));
}

pub fn points_to_string(points: &[Point]) -> String {
    let mut out = String::new();
    for (i, &p) in points.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_point(&mut out, p);
    }
    out
}

/// Format a region in the same layout [`parse_region`] accepts.
pub fn region_to_string(region: &Region) -> String {
    let mut sections: [Vec<String>; 3] = Default::default();
    for shape in region.shapes() {
        match shape.dimension() {
            Dimension::Point => {
                for c in 0..shape.num_chains() {
                    sections[0].push(points_to_string(shape.chain_vertices(c)));
                }
            }
            Dimension::Polyline => {
                for c in 0..shape.num_chains() {
                    sections[1].push(points_to_string(shape.chain_vertices(c)));
                }
            }
            Dimension::Polygon => {
                let loops: Vec<String> = (0..shape.num_chains())
                    .map(|c| {
                        let v = shape.chain_vertices(c);
                        if v.is_empty() {
                            "full".to_string()
                        } else {
                            points_to_string(v)
                        }
                    })
                    .collect();
                sections[2].push(if loops.is_empty() {
                    "empty".to_string()
                } else {
                    loops.join("; ")
                });
            }
        }
    }
    sections.map(|s| s.join(" | ")).join(" # ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_region_sections() {
        let r = parse_region("0:0 | 1:0 # 0:0, 2:2 | 3:3, 4:4 # 0:0, 0:4, 2:4, 2:0; 1:1").unwrap();
        assert_eq!(r.num_shapes(), 4);
        assert_eq!(r.shape(0).dimension(), Dimension::Point);
        assert_eq!(r.shape(0).num_edges(), 2);
        assert_eq!(r.shape(1).num_edges(), 1);
        assert_eq!(r.shape(3).num_chains(), 2);
        assert_eq!(r.shape(3).num_edges(), 5);
    }

    #[test]
    fn test_parse_keywords_and_empty_sections() {
        let r = parse_region("# # full").unwrap();
        assert_eq!(r.num_shapes(), 1);
        assert!(r.shape(0).is_full());
        assert!(parse_region("# #").unwrap().is_empty());
        assert_eq!(parse_polygon("empty").unwrap().num_chains(), 0);
    }

    #[test]
    fn test_errors() {
        assert_eq!(parse_region("0:0"), Err(ParseError::WrongSectionCount(1)));
        assert!(matches!(parse_points("1:x"), Err(ParseError::InvalidLatLng(_))));
        assert!(matches!(parse_points("12"), Err(ParseError::InvalidLatLng(_))));
    }

    #[test]
    fn test_format_round_trips_text() {
        let text = "1:2 # 0:0, 1.5:-3 # 0:0, 0:4, 2:4; full";
        let r = parse_region(text).unwrap();
        assert_eq!(region_to_string(&r), text);
    }
}
