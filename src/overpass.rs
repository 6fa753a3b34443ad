use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;
use url::Url;

/// Client for the public Overpass (OpenStreetMap) interpreter used to find
/// mental-health practitioners near a coordinate.
#[derive(Debug, Clone)]
pub struct OverpassClient {
    http: reqwest::Client,
    endpoint: Url,
}

/// A practitioner point of interest extracted from an Overpass element.
#[derive(Debug, Clone, PartialEq)]
pub struct Psychologist {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub address: String,
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
    #[serde(default)]
    center: Option<OverpassCenter>,
    #[serde(default)]
    tags: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct OverpassCenter {
    lat: f64,
    lon: f64,
}

/// Search radius in meters, widening as the map zooms out.
pub fn radius_for_zoom(zoom: u8) -> u32 {
    if zoom < 11 {
        25_000
    } else if zoom < 13 {
        15_000
    } else {
        7_000
    }
}

impl OverpassClient {
    pub fn new(endpoint: &str) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .with_context(|| format!("invalid Overpass endpoint: {endpoint}"))?;
        let http = reqwest::Client::builder()
            .user_agent("mindwell/0.1")
            .build()
            .context("building HTTP client")?;
        Ok(Self { http, endpoint })
    }

    /// Find nearby practitioners around a coordinate at a given map zoom.
    pub async fn find_nearby(&self, lat: f64, lon: f64, zoom: u8) -> Result<Vec<Psychologist>> {
        let radius = radius_for_zoom(zoom);
        let query = build_query(lat, lon, radius);
        debug!(lat, lon, radius, "overpass lookup");

        let resp = self
            .http
            .post(self.endpoint.clone())
            .form(&[("data", query.as_str())])
            .send()
            .await
            .context("Overpass request failed")?;
        let status = resp.status();
        anyhow::ensure!(status.is_success(), "Overpass returned {status}");
        let data: OverpassResponse = resp.json().await.context("decoding Overpass response")?;

        let results = data
            .elements
            .into_iter()
            .filter(|el| is_relevant(&el.tags))
            .filter_map(element_to_poi)
            .collect();
        Ok(results)
    }
}

fn build_query(lat: f64, lon: f64, radius: u32) -> String {
    let around = format!("(around:{radius},{lat},{lon})");
    format!(
        "[out:json][timeout:25];\n(\n\
         node[\"healthcare\"=\"psychologist\"]{around};\n\
         node[\"healthcare\"=\"psychotherapist\"]{around};\n\
         node[\"office\"=\"psychologist\"]{around};\n\
         node[\"healthcare\"=\"mental_health\"]{around};\n\
         node[\"healthcare\"=\"psychiatrist\"]{around};\n\
         node[\"amenity\"=\"clinic\"]{around};\n\
         node[\"amenity\"=\"doctors\"]{around};\n\
         way[\"healthcare\"=\"psychologist\"]{around};\n\
         way[\"healthcare\"=\"psychotherapist\"]{around};\n\
         way[\"office\"=\"psychologist\"]{around};\n\
         );\nout tags center;"
    )
}

/// Drop obviously unrelated practices that match the broad clinic/doctors
/// selectors.
fn is_relevant(tags: &HashMap<String, String>) -> bool {
    let name = tags.get("name").map(|n| n.to_lowercase()).unwrap_or_default();
    !name.contains("veter") && !name.contains("ophthal") && !name.contains("dentist")
}

fn element_to_poi(el: OverpassElement) -> Option<Psychologist> {
    // Nodes carry coordinates directly; ways only via their center.
    let (lat, lon) = match (el.lat, el.lon, el.center) {
        (Some(lat), Some(lon), _) => (lat, lon),
        (_, _, Some(center)) => (center.lat, center.lon),
        _ => return None,
    };
    let name = el
        .tags
        .get("name")
        .cloned()
        .unwrap_or_else(|| "Psychologist".to_string());
    Some(Psychologist { name, lat, lon, address: format_address(&el.tags) })
}

/// One-line postal address from `addr:*` tags; missing parts are skipped.
pub fn format_address(tags: &HashMap<String, String>) -> String {
    let part = |key: &str| tags.get(key).map(String::as_str).unwrap_or("");
    let street_line = format!("{} {}", part("addr:housenumber"), part("addr:street"));
    let city_line = format!("{} {}", part("addr:postcode"), part("addr:city"));
    [street_line.trim(), city_line.trim()]
        .iter()
        .filter(|s| !s.is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn radius_widens_when_zoomed_out() {
        assert_eq!(radius_for_zoom(9), 25_000);
        assert_eq!(radius_for_zoom(11), 15_000);
        assert_eq!(radius_for_zoom(14), 7_000);
    }

    #[test]
    fn irrelevant_practices_are_filtered() {
        assert!(!is_relevant(&tags(&[("name", "Veterinary Clinic")])));
        assert!(!is_relevant(&tags(&[("name", "Dr. Smile Dentist")])));
        assert!(is_relevant(&tags(&[("name", "Cabinet de Psychologie")])));
        // No name at all is kept; the selectors already narrowed the set
        assert!(is_relevant(&tags(&[])));
    }

    #[test]
    fn way_elements_use_their_center() {
        let el = OverpassElement {
            lat: None,
            lon: None,
            center: Some(OverpassCenter { lat: 48.85, lon: 2.35 }),
            tags: tags(&[("name", "Centre Psy")]),
        };
        let poi = element_to_poi(el).unwrap();
        assert_eq!(poi.name, "Centre Psy");
        assert_eq!(poi.lat, 48.85);
    }

    #[test]
    fn elements_without_coordinates_are_skipped() {
        let el = OverpassElement { lat: None, lon: None, center: None, tags: HashMap::new() };
        assert!(element_to_poi(el).is_none());
    }

    #[test]
    fn address_skips_missing_parts() {
        let full = tags(&[
            ("addr:housenumber", "12"),
            ("addr:street", "Rue de la Paix"),
            ("addr:postcode", "75002"),
            ("addr:city", "Paris"),
        ]);
        assert_eq!(format_address(&full), "12 Rue de la Paix, 75002 Paris");
        assert_eq!(format_address(&tags(&[("addr:city", "Paris")])), "Paris");
        assert_eq!(format_address(&HashMap::new()), "");
    }

    #[test]
    fn query_embeds_radius_and_coordinates() {
        let q = build_query(48.8566, 2.3522, 7000);
        assert!(q.contains("around:7000,48.8566,2.3522"));
        assert!(q.contains("healthcare\"=\"psychologist"));
        assert!(q.ends_with("out tags center;"));
    }
}
