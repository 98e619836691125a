mod error;
mod search;

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::predict::{TleEntry, TleLoader};
use crate::regime::{OrbitalParameters, OrbitalRegime};

pub use error::CatalogError;
pub use search::{
    filter, find_visible, search, SearchCriteria, VisibilityCriteria, VisibleSatellite,
};

/// One SATCAT metadata record. Absent numbers default to zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SatcatRecord {
    pub norad_id: u32,
    pub intl_id: String,
    pub name: String,
    pub launch_date: String,
    pub decay_date: String,
    pub object_type: String,
    pub owner: String,
    pub launch_site: String,
    pub period: f64,
    pub inclination: f64,
    pub apogee: f64,
    pub perigee: f64,
    pub rcs_size: String,
}

impl SatcatRecord {
    pub fn orbital_parameters(&self) -> OrbitalParameters {
        OrbitalParameters {
            apogee_km: self.apogee,
            perigee_km: self.perigee,
            period_min: self.period,
            inclination_deg: self.inclination,
        }
    }
}

#[derive(Serialize)]
pub struct Satellite {
    pub norad_id: u32,
    pub name: String,
    pub regime: OrbitalRegime,
    pub metadata: Option<SatcatRecord>,
    #[serde(skip)]
    pub tle: TleEntry,
}

impl Satellite {
    pub fn object_type(&self) -> &str {
        self.metadata.as_ref().map(|m| m.object_type.as_str()).unwrap_or("")
    }

    pub fn owner(&self) -> &str {
        self.metadata.as_ref().map(|m| m.owner.as_str()).unwrap_or("")
    }
}

pub struct Catalog {
    pub satellites: Vec<Satellite>,
    pub loaded_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct CatalogStats {
    pub satellites: usize,
    pub with_metadata: usize,
    pub by_regime: BTreeMap<OrbitalRegime, usize>,
    pub loaded_at: DateTime<Utc>,
}

impl Catalog {
    pub fn load(tle_path: &Path, satcat_path: Option<&Path>) -> Result<Self, CatalogError> {
        let mut loader = TleLoader::new(tle_path.to_path_buf());
        loader.load_all()?;

        let records = match satcat_path {
            Some(path) => load_satcat(path)?,
            None => Vec::new(),
        };

        Ok(Self {
            satellites: merge(loader.into_entries(), records),
            loaded_at: Utc::now(),
        })
    }

    pub fn stats(&self) -> CatalogStats {
        let mut by_regime = BTreeMap::new();
        for sat in &self.satellites {
            *by_regime.entry(sat.regime).or_insert(0) += 1;
        }
        CatalogStats {
            satellites: self.satellites.len(),
            with_metadata: self
                .satellites
                .iter()
                .filter(|s| s.metadata.is_some())
                .count(),
            by_regime,
            loaded_at: self.loaded_at,
        }
    }
}

pub fn load_satcat(path: &Path) -> Result<Vec<SatcatRecord>, CatalogError> {
    let content = std::fs::read_to_string(path)?;
    let records: Vec<SatcatRecord> = serde_json::from_str(&content)?;
    log::info!("Loaded {} SATCAT records from {}", records.len(), path.display());
    Ok(records)
}

/// Joins element sets with SATCAT metadata on NORAD id.
///
/// Element sets drive the result; metadata without one is dropped. The
/// regime comes from the metadata, so an object without it is UNKNOWN.
pub fn merge(tles: Vec<TleEntry>, records: Vec<SatcatRecord>) -> Vec<Satellite> {
    let mut by_id: HashMap<u32, SatcatRecord> =
        records.into_iter().map(|r| (r.norad_id, r)).collect();

    let mut satellites: Vec<Satellite> = tles
        .into_iter()
        .filter(|tle| tle.norad_id > 0)
        .map(|tle| {
            let metadata = by_id.remove(&tle.norad_id);
            let (name, regime) = match &metadata {
                Some(record) => (record.name.clone(), record.orbital_parameters().regime()),
                None => (
                    tle.name.clone().unwrap_or_default(),
                    OrbitalParameters::default().regime(),
                ),
            };
            Satellite {
                norad_id: tle.norad_id,
                name,
                regime,
                metadata,
                tle,
            }
        })
        .collect();

    satellites.sort_by_key(|s| s.norad_id);
    satellites.dedup_by_key(|s| s.norad_id);
    satellites
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::predict::parse_tle_text;

    pub(crate) const ISS_TLE: &str = "ISS (ZARYA)
1 25544U 98067A   25278.49802050  .00011384  00000+0  20935-3 0  9990
2 25544  51.6327 120.3420 0000884 206.2421 153.8523 15.49697304532279";

    pub(crate) const HST_TLE: &str = "HST
1 20580U 90037B   25278.17349537  .00005924  00000+0  20512-3 0  9999
2 20580  28.4702 124.9137 0002352 179.3622 180.7347 15.28311843747643";

    pub(crate) fn tle(text: &str) -> TleEntry {
        parse_tle_text(text, "test.tle").pop().unwrap().unwrap()
    }

    pub(crate) fn iss_record() -> SatcatRecord {
        SatcatRecord {
            norad_id: 25544,
            intl_id: "1998-067A".into(),
            name: "ISS (ZARYA)".into(),
            object_type: "PAYLOAD".into(),
            owner: "ISS".into(),
            period: 92.9,
            inclination: 51.64,
            apogee: 422.0,
            perigee: 415.0,
            ..Default::default()
        }
    }

    #[test]
    fn satcat_json_uses_camel_case_and_defaults() {
        let json = r#"[
            {"noradId": 25544, "name": "ISS (ZARYA)", "intlId": "1998-067A",
             "objectType": "PAYLOAD", "owner": "ISS", "period": 92.9,
             "inclination": 51.64, "apogee": 422, "perigee": 415, "rcsSize": "LARGE"},
            {"noradId": 1, "name": "NO ORBIT"}
        ]"#;
        let records: Vec<SatcatRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(records[0].intl_id, "1998-067A");
        assert_eq!(records[0].rcs_size, "LARGE");
        assert_eq!(records[0].orbital_parameters().regime(), OrbitalRegime::Leo);
        assert_eq!(records[1].apogee, 0.0);
        assert_eq!(records[1].orbital_parameters().regime(), OrbitalRegime::Unknown);
    }

    #[test]
    fn merge_uses_tles_as_primary_key() {
        let orphan = SatcatRecord {
            norad_id: 42,
            name: "NO ELEMENTS".into(),
            ..Default::default()
        };
        let sats = merge(vec![tle(ISS_TLE), tle(HST_TLE)], vec![iss_record(), orphan]);

        assert_eq!(sats.len(), 2);
        assert_eq!(sats[0].norad_id, 20580);
        assert_eq!(sats[1].norad_id, 25544);

        // HST has elements but no metadata.
        assert_eq!(sats[0].name, "HST");
        assert_eq!(sats[0].regime, OrbitalRegime::Unknown);
        assert!(sats[0].metadata.is_none());

        assert_eq!(sats[1].regime, OrbitalRegime::Leo);
        assert_eq!(sats[1].owner(), "ISS");
    }

    #[test]
    fn stats_count_regimes() {
        let catalog = Catalog {
            satellites: merge(vec![tle(ISS_TLE), tle(HST_TLE)], vec![iss_record()]),
            loaded_at: Utc::now(),
        };
        let stats = catalog.stats();
        assert_eq!(stats.satellites, 2);
        assert_eq!(stats.with_metadata, 1);
        assert_eq!(stats.by_regime.get(&OrbitalRegime::Leo), Some(&1));
        assert_eq!(stats.by_regime.get(&OrbitalRegime::Unknown), Some(&1));
    }
}
