//! Geocoding through the public OpenStreetMap Nominatim search API.
//!
//! The Nominatim usage policy asks for an identifying User-Agent and at most one
//! request per second, so every client carries a [`RateLimiter`].

use crate::geocoding::error::GeocodeError;
use crate::geocoding::rate_limiter::RateLimiter;
use crate::geocoding::Geocoder;
use crate::LatLon;
use log::debug;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const SEARCH_URL: &str = "https://nominatim.openstreetmap.org/search";

#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: Option<String>,
}

pub struct NominatimClient {
    client: Client,
    limiter: RateLimiter,
}

impl NominatimClient {
    pub fn new(user_agent: &str, min_delay: Duration) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(GeocodeError::ClientBuild)?;
        Ok(Self {
            client,
            limiter: RateLimiter::new(min_delay),
        })
    }

    async fn search(&self, query: &str) -> Result<String, GeocodeError> {
        let response = self
            .client
            .get(SEARCH_URL)
            .query(&[("q", query), ("format", "json"), ("limit", "1")])
            .send()
            .await
            .map_err(|e| GeocodeError::NetworkRequest(query.to_string(), e))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                return Err(match e.status() {
                    Some(status) => GeocodeError::HttpStatus {
                        query: query.to_string(),
                        status,
                        source: e,
                    },
                    None => GeocodeError::NetworkRequest(query.to_string(), e),
                });
            }
        };

        response
            .text()
            .await
            .map_err(|e| GeocodeError::NetworkRequest(query.to_string(), e))
    }
}

impl Geocoder for NominatimClient {
    async fn geocode(&self, query: &str) -> Result<Option<LatLon>, GeocodeError> {
        self.limiter.wait().await;
        debug!("Geocoding '{}'", query);
        let body = self.search(query).await?;
        parse_first_hit(query, &body)
    }
}

/// Extracts the coordinate of the first hit of a Nominatim JSON search response.
fn parse_first_hit(query: &str, body: &str) -> Result<Option<LatLon>, GeocodeError> {
    let hits: Vec<SearchHit> =
        serde_json::from_str(body).map_err(|e| GeocodeError::JsonParse(query.to_string(), e))?;
    let Some(hit) = hits.into_iter().next() else {
        return Ok(None);
    };

    let parse = |value: &str| {
        value
            .trim()
            .parse::<f64>()
            .map_err(|_| GeocodeError::InvalidCoordinate {
                query: query.to_string(),
                value: value.to_string(),
            })
    };
    let location = LatLon(parse(&hit.lat)?, parse(&hit.lon)?);
    debug!(
        "'{}' resolved to {} ({:.4}, {:.4})",
        query,
        hit.display_name.as_deref().unwrap_or("?"),
        location.0,
        location.1
    );
    Ok(Some(location))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_first_hit() {
        let body = r#"[
            {"place_id": 1, "lat": "38.7077507", "lon": "-9.1365919", "display_name": "Lisboa, Portugal"},
            {"place_id": 2, "lat": "0.0", "lon": "0.0", "display_name": "Elsewhere"}
        ]"#;
        let location = parse_first_hit("Lisbon, Portugal", body).unwrap();
        assert_eq!(location, Some(LatLon(38.7077507, -9.1365919)));
    }

    #[test]
    fn test_parse_no_hits() {
        assert_eq!(parse_first_hit("Springfield, Nowhereland", "[]").unwrap(), None);
    }

    #[test]
    fn test_parse_invalid_coordinate() {
        let body = r#"[{"lat": "north", "lon": "1.0"}]"#;
        assert!(matches!(
            parse_first_hit("x", body),
            Err(GeocodeError::InvalidCoordinate { .. })
        ));
    }

    #[test]
    fn test_parse_malformed_body() {
        assert!(matches!(
            parse_first_hit("x", "<html>rate limited</html>"),
            Err(GeocodeError::JsonParse(..))
        ));
    }

    #[tokio::test]
    #[ignore = "requires network access to nominatim.openstreetmap.org"]
    async fn test_geocode_live() -> Result<(), GeocodeError> {
        let client = NominatimClient::new("nomad-comfort-map", Duration::from_secs(1))?;
        let location = client.geocode("Lisbon, Portugal").await?;
        let LatLon(lat, lon) = location.expect("Lisbon should resolve");
        assert!((lat - 38.7).abs() < 0.5);
        assert!((lon + 9.1).abs() < 0.5);
        Ok(())
    }
}
