//! OpenStreetMap Nominatim 地理编码

use async_trait::async_trait;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

use super::{GeoPoint, Geocoder};
use crate::config::MapConfig;
use crate::error::{PlannerError, PlannerResult};

const SERVICE: &str = "geocoder/nominatim";

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

/// Nominatim地理编码服务，请求之间保持最小间隔
pub struct NominatimGeocoder {
    base_url: String,
    min_interval: Duration,
    http_client: reqwest::Client,
    last_request: Mutex<Option<Instant>>,
}

impl NominatimGeocoder {
    pub fn new(config: &MapConfig) -> PlannerResult<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| PlannerError::Configuration(format!("无法创建HTTP客户端: {}", e)))?;

        Ok(Self {
            base_url: config.geocoder_url.trim_end_matches('/').to_string(),
            min_interval: Duration::from_millis(config.min_interval_ms),
            http_client,
            last_request: Mutex::new(None),
        })
    }

    async fn wait_for_slot(&self) {
        let mut last_request = self.last_request.lock().await;
        if let Some(last) = *last_request {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last_request = Some(Instant::now());
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, place: &str) -> PlannerResult<Option<GeoPoint>> {
        self.wait_for_slot().await;
        debug!(target: "map", place = %place, "geocoding");

        let response = self
            .http_client
            .get(format!("{}/search", self.base_url))
            .query(&[("q", place), ("format", "json"), ("limit", "1")])
            .send()
            .await
            .map_err(|e| PlannerError::upstream(SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PlannerError::upstream(SERVICE, format!("status {}", status)));
        }

        let places: Vec<NominatimPlace> = response
            .json()
            .await
            .map_err(|e| PlannerError::upstream(SERVICE, format!("无法解析地理编码结果: {}", e)))?;

        let Some(first) = places.into_iter().next() else {
            return Ok(None);
        };
        match (first.lat.parse::<f64>(), first.lon.parse::<f64>()) {
            (Ok(latitude), Ok(longitude)) => Ok(Some(GeoPoint {
                latitude,
                longitude,
            })),
            _ => Err(PlannerError::upstream(
                SERVICE,
                format!("无效的坐标: {}, {}", first.lat, first.lon),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> MapConfig {
        MapConfig {
            geocoder_url: server.uri(),
            min_interval_ms: 0,
            ..MapConfig::default()
        }
    }

    #[tokio::test]
    async fn test_geocode_first_result() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "Kinkaku-ji, Kyoto"))
            .and(query_param("format", "json"))
            .and(header("user-agent", MapConfig::default().user_agent.as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "lat": "35.0394", "lon": "135.7292", "display_name": "Kinkaku-ji" },
                { "lat": "0", "lon": "0", "display_name": "elsewhere" }
            ])))
            .mount(&server)
            .await;

        let geocoder = NominatimGeocoder::new(&config_for(&server)).unwrap();
        let point = geocoder.geocode("Kinkaku-ji, Kyoto").await.unwrap().unwrap();
        assert!((point.latitude - 35.0394).abs() < 1e-9);
        assert!((point.longitude - 135.7292).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_unknown_place_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let geocoder = NominatimGeocoder::new(&config_for(&server)).unwrap();
        assert!(geocoder.geocode("Nowhere Land").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_server_error_is_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let geocoder = NominatimGeocoder::new(&config_for(&server)).unwrap();
        let err = geocoder.geocode("Kyoto").await.unwrap_err();
        assert!(matches!(err, PlannerError::UpstreamService { .. }));
    }
}
