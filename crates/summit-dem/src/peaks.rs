//! Reference data for the fourteen eight-thousanders.

use crate::grid::GeoPoint;

/// A named summit with its surveyed height.
#[derive(Debug, Clone, PartialEq)]
pub struct Peak {
    /// Canonical name.
    pub name: String,
    /// Summit latitude in degrees.
    pub latitude: f64,
    /// Summit longitude in degrees.
    pub longitude: f64,
    /// Surveyed summit height in meters.
    pub reference_height: f64,
}

impl Peak {
    /// Create a peak descriptor.
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64, reference_height: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
            reference_height,
        }
    }

    /// Summit position.
    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// (name, latitude, longitude, height in meters)
const EIGHT_THOUSANDERS: [(&str, f64, f64, f64); 14] = [
    ("Everest", 27.9881, 86.9250, 8848.0),
    ("K2", 35.8814, 76.5133, 8611.0),
    ("Kangchenjunga", 27.7025, 88.1475, 8586.0),
    ("Lhotse", 27.9617, 86.9336, 8516.0),
    ("Makalu", 27.8897, 87.0886, 8485.0),
    ("Cho Oyu", 28.0944, 86.6608, 8188.0),
    ("Dhaulagiri", 28.6967, 83.4953, 8167.0),
    ("Manaslu", 28.5497, 84.5594, 8163.0),
    ("Nanga Parbat", 35.2375, 74.5892, 8126.0),
    ("Annapurna", 28.5956, 83.8203, 8091.0),
    ("Gasherbrum I", 35.7247, 76.6958, 8080.0),
    ("Broad Peak", 35.8106, 76.5681, 8051.0),
    ("Gasherbrum II", 35.7581, 76.6531, 8035.0),
    ("Shishapangma", 28.3531, 85.7786, 8027.0),
];

/// Alternate spellings, mapped to canonical names.
const ALIASES: [(&str, &str); 5] = [
    ("Kanchenjunga", "Kangchenjunga"),
    ("Kanchenjanga", "Kangchenjunga"),
    ("Shisha Pangma", "Shishapangma"),
    ("Gasherbrum 1", "Gasherbrum I"),
    ("Gasherbrum 2", "Gasherbrum II"),
];

/// All fourteen eight-thousanders, highest first.
pub fn eight_thousanders() -> Vec<Peak> {
    EIGHT_THOUSANDERS
        .iter()
        .map(|&(name, lat, lon, height)| Peak::new(name, lat, lon, height))
        .collect()
}

/// Canonical names of all catalogued peaks.
pub fn peak_names() -> Vec<&'static str> {
    EIGHT_THOUSANDERS.iter().map(|(name, ..)| *name).collect()
}

/// Look up a peak by name.
///
/// Matching ignores case and repeated whitespace, and accepts common alternate
/// spellings such as "Kanchenjunga" or "Gasherbrum 2".
pub fn find_peak(name: &str) -> Option<Peak> {
    let wanted = normalize(name);
    let canonical = ALIASES
        .iter()
        .find(|(alias, _)| normalize(alias) == wanted)
        .map(|(_, canonical)| normalize(canonical))
        .unwrap_or(wanted);

    EIGHT_THOUSANDERS
        .iter()
        .find(|(name, ..)| normalize(name) == canonical)
        .map(|&(name, lat, lon, height)| Peak::new(name, lat, lon, height))
}

fn normalize(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogue() {
        let peaks = eight_thousanders();
        assert_eq!(peaks.len(), 14);
        assert!(peaks.iter().all(|p| p.reference_height > 8000.0));
        assert_eq!(peak_names()[0], "Everest");
    }

    #[test]
    fn test_find_peak_ignores_case_and_spacing() {
        let everest = find_peak("everest").unwrap();
        assert_eq!(everest.name, "Everest");
        assert_eq!(everest.center(), GeoPoint::new(27.9881, 86.9250));
        assert_eq!(everest.reference_height, 8848.0);

        assert_eq!(find_peak("  cho   OYU ").unwrap().name, "Cho Oyu");
        assert_eq!(find_peak("k2").unwrap().name, "K2");
        assert_eq!(find_peak("gasherbrum ii").unwrap().name, "Gasherbrum II");
    }

    #[test]
    fn test_find_peak_aliases() {
        assert_eq!(find_peak("Kanchenjunga").unwrap().name, "Kangchenjunga");
        assert_eq!(find_peak("kanchenjanga").unwrap().name, "Kangchenjunga");
        assert_eq!(find_peak("Shisha Pangma").unwrap().name, "Shishapangma");
        assert_eq!(find_peak("gasherbrum 1").unwrap().name, "Gasherbrum I");
        assert_eq!(find_peak("Gasherbrum 2").unwrap().name, "Gasherbrum II");
    }

    #[test]
    fn test_find_peak_unknown() {
        assert!(find_peak("Mont Blanc").is_none());
        assert!(find_peak("").is_none());
    }
}
