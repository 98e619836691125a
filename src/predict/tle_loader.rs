use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use sgp4::Elements;

use crate::predict::error::PredictError;
use crate::predict::propagation::Sgp4Propagator;

pub struct TleEntry {
    pub name: Option<String>,
    pub norad_id: u32,
    pub line1: String,
    pub line2: String,
    pub source: String,
    pub propagator: Sgp4Propagator,
}

/// Element sets read from a TLE file or a directory of them, keyed by NORAD id.
pub struct TleLoader {
    tle_path: PathBuf,
    satellites: BTreeMap<u32, TleEntry>,
}

impl TleLoader {
    pub fn new(tle_path: PathBuf) -> Self {
        Self {
            tle_path,
            satellites: BTreeMap::new(),
        }
    }

    pub fn load_all(&mut self) -> Result<(), PredictError> {
        if !self.tle_path.exists() {
            return Err(PredictError::DirectoryNotFound(
                self.tle_path.display().to_string(),
            ));
        }

        self.satellites.clear();

        if self.tle_path.is_file() {
            let path = self.tle_path.clone();
            self.load_file(&path)?;
        } else {
            for entry in fs::read_dir(&self.tle_path)? {
                let path = entry?.path();
                let is_tle = path
                    .extension()
                    .map(|ext| ext == "tle" || ext == "txt")
                    .unwrap_or(false);
                if path.is_file() && is_tle {
                    if let Err(e) = self.load_file(&path) {
                        log::warn!("Failed to read TLE file {}: {}", path.display(), e);
                    }
                }
            }
        }

        log::info!(
            "Loaded {} element sets from {}",
            self.len(),
            self.tle_path.display()
        );
        Ok(())
    }

    fn load_file(&mut self, path: &Path) -> Result<(), PredictError> {
        let content = fs::read_to_string(path)?;
        let source = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();

        for result in parse_tle_text(&content, &source) {
            match result {
                Ok(entry) => {
                    self.satellites.insert(entry.norad_id, entry);
                }
                Err(e) => log::warn!("{}", e),
            }
        }
        Ok(())
    }

    /// Loaded element sets in NORAD id order.
    pub fn into_entries(self) -> Vec<TleEntry> {
        self.satellites.into_values().collect()
    }

    pub fn len(&self) -> usize {
        self.satellites.len()
    }
}

/// Parses two- and three-line element text. Each element set succeeds or fails
/// on its own.
pub fn parse_tle_text(content: &str, source: &str) -> Vec<Result<TleEntry, PredictError>> {
    split_tle_lines(content)
        .into_iter()
        .map(|(name, line1, line2)| build_entry(name, line1, line2, source))
        .collect()
}

fn build_entry(
    name: Option<String>,
    line1: String,
    line2: String,
    source: &str,
) -> Result<TleEntry, PredictError> {
    let invalid = |message: String| PredictError::InvalidTle {
        file: source.to_string(),
        message,
    };

    let elements = Elements::from_tle(name.clone(), line1.as_bytes(), line2.as_bytes())
        .map_err(|e| invalid(e.to_string()))?;
    let norad_id = u32::try_from(elements.norad_id)
        .map_err(|_| invalid(format!("NORAD id {} out of range", elements.norad_id)))?;
    let propagator =
        Sgp4Propagator::from_elements(elements).map_err(|e| invalid(e.to_string()))?;

    Ok(TleEntry {
        name,
        norad_id,
        line1,
        line2,
        source: source.to_string(),
        propagator,
    })
}

fn split_tle_lines(content: &str) -> Vec<(Option<String>, String, String)> {
    let lines: Vec<&str> = content
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();

    let mut result = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        if lines[i].starts_with("1 ")
            && i + 1 < lines.len()
            && lines[i + 1].starts_with("2 ")
        {
            result.push((None, lines[i].to_string(), lines[i + 1].to_string()));
            i += 2;
        } else if i + 2 < lines.len()
            && lines[i + 1].starts_with("1 ")
            && lines[i + 2].starts_with("2 ")
        {
            // Name line, as in "0 ISS (ZARYA)" or plain "ISS (ZARYA)"
            let name = lines[i].strip_prefix("0 ").unwrap_or(lines[i]).trim();
            result.push((
                Some(name.to_string()),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predict::propagation::tests::{ISS_LINE1, ISS_LINE2};

    #[test]
    fn splits_named_and_bare_sets() {
        let text = format!(
            "ISS (ZARYA)\n{ISS_LINE1}\n{ISS_LINE2}\n\n{ISS_LINE1}\n{ISS_LINE2}\n0 ZARYA\n{ISS_LINE1}\n{ISS_LINE2}\n"
        );
        let sets = split_tle_lines(&text);
        assert_eq!(sets.len(), 3);
        assert_eq!(sets[0].0.as_deref(), Some("ISS (ZARYA)"));
        assert_eq!(sets[1].0, None);
        assert_eq!(sets[2].0.as_deref(), Some("ZARYA"));
        assert_eq!(sets[1].1, ISS_LINE1);
        assert_eq!(sets[1].2, ISS_LINE2);
    }

    #[test]
    fn stray_lines_are_skipped() {
        let text = format!("garbage\n{ISS_LINE1}\n{ISS_LINE2}\ntrailing");
        let sets = split_tle_lines(&text);
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].0.as_deref(), Some("garbage"));
    }

    #[test]
    fn parses_valid_set() {
        let text = format!("ISS (ZARYA)\n{ISS_LINE1}\n{ISS_LINE2}\n");
        let entries = parse_tle_text(&text, "stations.tle");
        assert_eq!(entries.len(), 1);
        let entry = entries[0].as_ref().unwrap();
        assert_eq!(entry.norad_id, 25544);
        assert_eq!(entry.name.as_deref(), Some("ISS (ZARYA)"));
        assert_eq!(entry.source, "stations.tle");
    }

    #[test]
    fn corrupt_set_fails_alone() {
        let broken = ISS_LINE2.replace("51.6327", "5x.6327");
        let text = format!("BROKEN\n{ISS_LINE1}\n{broken}\nISS\n{ISS_LINE1}\n{ISS_LINE2}\n");
        let entries = parse_tle_text(&text, "mixed.tle");
        assert_eq!(entries.len(), 2);
        assert!(matches!(entries[0], Err(PredictError::InvalidTle { .. })));
        assert!(entries[1].is_ok());
    }

    #[test]
    fn missing_path_is_reported() {
        let mut loader = TleLoader::new(PathBuf::from("/nonexistent/satwatch/tles"));
        assert!(matches!(
            loader.load_all(),
            Err(PredictError::DirectoryNotFound(_))
        ));
    }

    #[test]
    fn loads_single_file() {
        let dir = std::env::temp_dir().join(format!("satwatch-tle-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("stations.tle");
        fs::write(&path, format!("ISS (ZARYA)\n{ISS_LINE1}\n{ISS_LINE2}\n")).unwrap();

        let mut loader = TleLoader::new(path);
        loader.load_all().unwrap();
        assert_eq!(loader.len(), 1);
        assert_eq!(loader.into_entries()[0].norad_id, 25544);

        fs::remove_dir_all(&dir).unwrap();
    }
}
