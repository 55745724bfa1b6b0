//! 关键地点地图渲染

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use crate::config::MapConfig;
use crate::error::PlannerResult;

mod locations;
mod nominatim;

pub use locations::{KEY_LOCATIONS_HEADING, extract_key_locations, key_locations_line};
pub use nominatim::NominatimGeocoder;

/// 经纬度坐标
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// 地理编码服务，无法解析的地点返回None
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, place: &str) -> PlannerResult<Option<GeoPoint>>;
}

/// 地图上的一个标注
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapMarker {
    pub name: String,
    pub point: GeoPoint,
}

/// 地图渲染结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapArtifact {
    pub markers: Vec<MapMarker>,
    /// 无法解析的地点
    pub skipped: Vec<String>,
    pub zoom: u8,
}

impl MapArtifact {
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// 生成以第一个标注为中心的Leaflet页面
    pub fn to_html(&self) -> String {
        let (center, zoom) = match self.markers.first() {
            Some(marker) => (marker.point, self.zoom),
            None => (
                GeoPoint {
                    latitude: 0.0,
                    longitude: 0.0,
                },
                2,
            ),
        };

        let mut markers_js = String::new();
        for marker in &self.markers {
            markers_js.push_str(&format!(
                "    L.marker([{}, {}]).addTo(map).bindPopup({});\n",
                marker.point.latitude,
                marker.point.longitude,
                js_string(&marker.name)
            ));
        }

        format!(
            r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8" />
  <title>Key Locations</title>
  <link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css" />
  <script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
  <style>html, body, #map {{ height: 100%; margin: 0; }}</style>
</head>
<body>
  <div id="map"></div>
  <script>
    var map = L.map('map').setView([{}, {}], {});
    L.tileLayer('https://{{s}}.tile.openstreetmap.org/{{z}}/{{x}}/{{y}}.png', {{
      attribution: '&copy; OpenStreetMap contributors'
    }}).addTo(map);
{}  </script>
</body>
</html>
"#,
            center.latitude, center.longitude, zoom, markers_js
        )
    }
}

/// 以JSON字符串字面量嵌入脚本
fn js_string(value: &str) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| "\"\"".to_string())
        .replace("</", "<\\/")
}

/// 地图渲染器，逐个地理编码地点名称，失败的地点被跳过
pub struct MapRenderer {
    geocoder: Arc<dyn Geocoder>,
    zoom: u8,
}

impl MapRenderer {
    pub fn new(geocoder: Arc<dyn Geocoder>, config: &MapConfig) -> Self {
        Self {
            geocoder,
            zoom: config.zoom,
        }
    }

    /// 使用Nominatim地理编码服务创建渲染器
    pub fn nominatim(config: &MapConfig) -> PlannerResult<Self> {
        Ok(Self::new(Arc::new(NominatimGeocoder::new(config)?), config))
    }

    pub async fn render(&self, place_names: &[String]) -> MapArtifact {
        let mut markers = Vec::new();
        let mut skipped = Vec::new();

        for name in place_names {
            match self.geocoder.geocode(name).await {
                Ok(Some(point)) => markers.push(MapMarker {
                    name: name.clone(),
                    point,
                }),
                Ok(None) => {
                    warn!(target: "map", place = %name, "location not found, skipping");
                    skipped.push(name.clone());
                }
                Err(e) => {
                    warn!(target: "map", place = %name, error = %e, "geocoding failed, skipping");
                    skipped.push(name.clone());
                }
            }
        }

        MapArtifact {
            markers,
            skipped,
            zoom: self.zoom,
        }
    }
}
