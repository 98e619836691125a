use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::catalog::Satellite;
use crate::geometry::{ObservationAngles, ObserverLocation};
use crate::predict::observe_at;
use crate::regime::OrbitalRegime;

/// Unset fields match everything. Name, owner and type are case-insensitive
/// substring matches; regime must match exactly.
#[derive(Debug, Clone, Default)]
pub struct SearchCriteria {
    pub name: Option<String>,
    pub owner: Option<String>,
    pub object_type: Option<String>,
    pub regime: Option<OrbitalRegime>,
}

impl SearchCriteria {
    pub fn matches(&self, sat: &Satellite) -> bool {
        contains(&sat.name, self.name.as_deref())
            && contains(sat.owner(), self.owner.as_deref())
            && contains(sat.object_type(), self.object_type.as_deref())
            && self.regime.map_or(true, |r| r == sat.regime)
    }
}

#[derive(Debug, Clone)]
pub struct VisibilityCriteria {
    pub search: SearchCriteria,
    pub min_elevation_deg: f64,
    pub max_elevation_deg: f64,
}

#[derive(Serialize)]
pub struct VisibleSatellite<'a> {
    pub satellite: &'a Satellite,
    pub angles: ObservationAngles,
}

fn contains(haystack: &str, needle: Option<&str>) -> bool {
    match needle {
        None | Some("") => true,
        Some(n) => haystack.to_lowercase().contains(&n.to_lowercase()),
    }
}

/// Exact NORAD id and/or exact case-insensitive name. No filter returns all.
pub fn filter<'a>(
    satellites: &'a [Satellite],
    norad_id: Option<u32>,
    name: Option<&str>,
) -> Vec<&'a Satellite> {
    satellites
        .iter()
        .filter(|s| norad_id.map_or(true, |id| s.norad_id == id))
        .filter(|s| name.map_or(true, |n| s.name.eq_ignore_ascii_case(n)))
        .collect()
}

/// Matching satellites in NORAD id order.
pub fn search<'a>(satellites: &'a [Satellite], criteria: &SearchCriteria) -> Vec<&'a Satellite> {
    let mut results: Vec<&Satellite> = satellites.iter().filter(|s| criteria.matches(s)).collect();
    results.sort_by_key(|s| s.norad_id);
    results
}

/// Satellites inside the elevation band at `at`, highest first. Objects that
/// fail to propagate are left out.
pub fn find_visible<'a>(
    satellites: &'a [Satellite],
    observer: &ObserverLocation,
    at: DateTime<Utc>,
    criteria: &VisibilityCriteria,
) -> Vec<VisibleSatellite<'a>> {
    let mut visible: Vec<VisibleSatellite> = search(satellites, &criteria.search)
        .into_iter()
        .filter_map(|satellite| {
            match observe_at(&satellite.tle.propagator, observer, at) {
                Ok(angles) => Some(VisibleSatellite { satellite, angles }),
                Err(e) => {
                    log::debug!("Skipping NORAD {}: {}", satellite.norad_id, e);
                    None
                }
            }
        })
        .filter(|v| {
            v.angles.elevation_deg >= criteria.min_elevation_deg
                && v.angles.elevation_deg <= criteria.max_elevation_deg
        })
        .collect();

    visible.sort_by(|a, b| b.angles.elevation_deg.total_cmp(&a.angles.elevation_deg));
    visible
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::merge;
    use crate::catalog::tests::{iss_record, tle, HST_TLE, ISS_TLE};
    use chrono::TimeZone;

    fn catalog() -> Vec<Satellite> {
        merge(vec![tle(ISS_TLE), tle(HST_TLE)], vec![iss_record()])
    }

    #[test]
    fn filter_by_id_and_name() {
        let sats = catalog();
        assert_eq!(filter(&sats, None, None).len(), 2);
        assert_eq!(filter(&sats, Some(25544), None)[0].name, "ISS (ZARYA)");
        assert_eq!(filter(&sats, None, Some("iss (zarya)")).len(), 1);
        assert!(filter(&sats, None, Some("ISS")).is_empty());
        assert!(filter(&sats, Some(20580), Some("ISS (ZARYA)")).is_empty());
    }

    #[test]
    fn search_is_partial_and_case_insensitive() {
        let sats = catalog();
        let by_name = search(
            &sats,
            &SearchCriteria {
                name: Some("zar".into()),
                ..Default::default()
            },
        );
        assert_eq!(by_name.len(), 1);

        let by_type = search(
            &sats,
            &SearchCriteria {
                object_type: Some("pay".into()),
                ..Default::default()
            },
        );
        assert_eq!(by_type[0].norad_id, 25544);

        let by_regime = search(
            &sats,
            &SearchCriteria {
                regime: Some(OrbitalRegime::Unknown),
                ..Default::default()
            },
        );
        assert_eq!(by_regime.len(), 1);
        assert_eq!(by_regime[0].norad_id, 20580);

        let everything = search(&sats, &SearchCriteria::default());
        assert_eq!(everything.len(), 2);
        assert!(everything[0].norad_id < everything[1].norad_id);
    }

    #[test]
    fn visible_results_respect_band_and_order() {
        let sats = catalog();
        let observer = ObserverLocation::new(48.8566, 2.3522, 35.0);
        let criteria = VisibilityCriteria {
            search: SearchCriteria::default(),
            min_elevation_deg: -90.0,
            max_elevation_deg: 90.0,
        };
        let at = Utc.with_ymd_and_hms(2025, 10, 5, 12, 0, 0).unwrap();

        let all = find_visible(&sats, &observer, at, &criteria);
        assert_eq!(all.len(), 2);
        assert!(all[0].angles.elevation_deg >= all[1].angles.elevation_deg);

        let narrow = VisibilityCriteria {
            min_elevation_deg: all[1].angles.elevation_deg + 1e-6,
            ..criteria
        };
        let top = find_visible(&sats, &observer, at, &narrow);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].satellite.norad_id, all[0].satellite.norad_id);
    }
}
