//! Geographic bounding box types and operations.

use serde::{Deserialize, Serialize};

/// A WGS-84 bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Parse a "west,south,east,north" string, as passed on the command line.
    pub fn from_csv(s: &str) -> Result<Self, BboxParseError> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(BboxParseError::InvalidFormat(s.to_string()));
        }

        let mut vals = [0.0_f64; 4];
        for (i, part) in parts.iter().enumerate() {
            vals[i] = part
                .parse()
                .map_err(|_| BboxParseError::InvalidNumber(part.to_string()))?;
        }

        let bbox = Self::new(vals[0], vals[1], vals[2], vals[3]);
        if bbox.west >= bbox.east || bbox.south >= bbox.north {
            return Err(BboxParseError::Degenerate(s.to_string()));
        }
        Ok(bbox)
    }

    /// Width of the bounding box in degrees.
    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    /// Height of the bounding box in degrees.
    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    /// Check if this bbox intersects another.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.west < other.east
            && self.east > other.west
            && self.south < other.north
            && self.north > other.south
    }

    /// Compute the intersection of two bounding boxes.
    pub fn intersection(&self, other: &BoundingBox) -> Option<BoundingBox> {
        if !self.intersects(other) {
            return None;
        }

        Some(BoundingBox {
            west: self.west.max(other.west),
            south: self.south.max(other.south),
            east: self.east.min(other.east),
            north: self.north.min(other.north),
        })
    }

    /// Check if a point is contained within this bbox.
    pub fn contains_point(&self, lon: f64, lat: f64) -> bool {
        lon >= self.west && lon <= self.east && lat >= self.south && lat <= self.north
    }

    /// Format as the "west,south,east,north" string catalog APIs expect.
    pub fn to_csv(&self) -> String {
        format!("{},{},{},{}", self.west, self.south, self.east, self.north)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BboxParseError {
    #[error("Invalid bbox format: {0}. Expected 'west,south,east,north'")]
    InvalidFormat(String),

    #[error("Invalid number in bbox: {0}")]
    InvalidNumber(String),

    #[error("Degenerate bbox (zero or negative extent): {0}")]
    Degenerate(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_csv_bbox() {
        let bbox = BoundingBox::from_csv("-41.65,-12.80,-40.95,-12.10").unwrap();
        assert_eq!(bbox.west, -41.65);
        assert_eq!(bbox.south, -12.80);
        assert_eq!(bbox.east, -40.95);
        assert_eq!(bbox.north, -12.10);
    }

    #[test]
    fn test_parse_rejects_degenerate() {
        assert!(BoundingBox::from_csv("-40.0,-12.0,-41.0,-11.0").is_err());
        assert!(BoundingBox::from_csv("1,2,3").is_err());
        assert!(BoundingBox::from_csv("a,b,c,d").is_err());
    }

    #[test]
    fn test_intersection() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(5.0, 5.0, 15.0, 15.0);
        let c = BoundingBox::new(20.0, 20.0, 30.0, 30.0);

        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));

        let intersection = a.intersection(&b).unwrap();
        assert_eq!(intersection.west, 5.0);
        assert_eq!(intersection.south, 5.0);
        assert_eq!(intersection.east, 10.0);
        assert_eq!(intersection.north, 10.0);
    }

    #[test]
    fn test_contains_point() {
        let bbox = BoundingBox::new(-41.65, -12.80, -40.95, -12.10);
        assert!(bbox.contains_point(-41.3, -12.5));
        assert!(!bbox.contains_point(-42.0, -12.5));
    }
}
