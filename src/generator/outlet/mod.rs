use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::config::{Config, ExportConfig};
use crate::export::{DocumentExporter, PdfExporter, render_html};
use crate::generator::crew::CrewOutput;
use crate::map::MapArtifact;

pub const MARKDOWN_FILE: &str = "itinerary.md";
pub const JSON_FILE: &str = "itinerary.json";
pub const HTML_FILE: &str = "itinerary.html";
pub const MAP_FILE: &str = "map.html";

pub trait Outlet {
    async fn save(&self, output: &CrewOutput, map: Option<&MapArtifact>) -> Result<Vec<PathBuf>>;
}

/// PDF文件名，例如 `itinerary_kyoto_3_days.pdf`
pub fn pdf_file_name(destination: &str, days: usize) -> String {
    let mut slug = String::new();
    for c in destination.trim().chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.ends_with('_') {
            slug.push('_');
        }
    }
    let slug = slug.trim_matches('_');
    let slug = if slug.is_empty() { "trip" } else { slug };
    format!("itinerary_{}_{}_days.pdf", slug, days)
}

pub struct DiskOutlet {
    output_dir: PathBuf,
    export: ExportConfig,
    exporter: Box<dyn DocumentExporter>,
}

impl DiskOutlet {
    pub fn new(config: &Config) -> Self {
        Self::with_exporter(config, Box::new(PdfExporter::new()))
    }

    pub fn with_exporter(config: &Config, exporter: Box<dyn DocumentExporter>) -> Self {
        Self {
            output_dir: config.output_path.clone(),
            export: config.export.clone(),
            exporter,
        }
    }

    fn write(&self, relative_path: &str, contents: impl AsRef<[u8]>) -> Result<PathBuf> {
        let path = self.output_dir.join(relative_path);
        fs::write(&path, contents).with_context(|| format!("无法写入 {}", path.display()))?;
        println!("💾 已保存: {}", path.display());
        Ok(path)
    }
}

impl Outlet for DiskOutlet {
    async fn save(&self, output: &CrewOutput, map: Option<&MapArtifact>) -> Result<Vec<PathBuf>> {
        println!("\n🖊️ 行程存储中...");
        fs::create_dir_all(&self.output_dir)
            .with_context(|| format!("无法创建输出目录 {}", self.output_dir.display()))?;

        let itinerary = &output.itinerary;
        let mut saved = Vec::new();

        saved.push(self.write(MARKDOWN_FILE, &itinerary.document)?);

        if self.export.json {
            saved.push(self.write(JSON_FILE, serde_json::to_string_pretty(output)?)?);
        }

        if self.export.html {
            let title = format!("{} - {} days", itinerary.destination, itinerary.total_days());
            saved.push(self.write(HTML_FILE, render_html(&title, &itinerary.document)?)?);
        }

        if self.export.pdf {
            let pdf = self.exporter.export(&itinerary.document)?;
            let file_name = pdf_file_name(&itinerary.destination, itinerary.total_days());
            saved.push(self.write(&file_name, pdf)?);
        }

        match map {
            Some(map) if !map.is_empty() => saved.push(self.write(MAP_FILE, map.to_html())?),
            Some(_) => eprintln!("⚠️ 未能定位任何关键地点，跳过地图输出"),
            None => {}
        }

        println!("💾 行程保存完成，输出目录: {}", self.output_dir.display());
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::types::{AgentRole, AgentTask};
    use crate::map::{GeoPoint, MapMarker};
    use crate::types::{Activity, CostEstimate, CostRange, DayPlan, Itinerary};
    use tempfile::TempDir;
    use uuid::Uuid;

    fn sample_output() -> CrewOutput {
        let document = "# Kyoto\n\n## Day 1\n- [history] Kinkaku-ji\n\nKey Locations for Map:\n- Kinkaku-ji, Kyoto\n";
        CrewOutput {
            run_id: Uuid::new_v4(),
            itinerary: Itinerary {
                destination: "Kyoto".to_string(),
                currency: "INR".to_string(),
                day_plans: vec![DayPlan {
                    day_index: 1,
                    title: None,
                    activities: vec![Activity::new("Kinkaku-ji", vec!["history".to_string()])],
                    cultural_tips: vec![],
                    estimated_cost: 4000.0,
                    emergency_contacts: vec![],
                }],
                total_estimated_cost: Some(4000.0),
                key_locations: vec!["Kinkaku-ji, Kyoto".to_string()],
                document: document.to_string(),
            },
            cost_estimate: CostEstimate {
                currency: "INR".to_string(),
                daily: Some(CostRange::single(4000.0)),
                total: None,
            },
            tasks: vec![AgentTask {
                role: AgentRole::Synthesizer,
                input_context: vec![],
                output: document.to_string(),
            }],
        }
    }

    fn config_in(dir: &TempDir) -> Config {
        Config {
            output_path: dir.path().join("out"),
            ..Config::default()
        }
    }

    #[test]
    fn test_pdf_file_name() {
        assert_eq!(pdf_file_name("Kyoto", 3), "itinerary_kyoto_3_days.pdf");
        assert_eq!(
            pdf_file_name("  New York, USA ", 5),
            "itinerary_new_york_usa_5_days.pdf"
        );
        assert_eq!(pdf_file_name("!!!", 1), "itinerary_trip_1_days.pdf");
    }

    #[tokio::test]
    async fn test_save_writes_all_artifacts() {
        let dir = TempDir::new().unwrap();
        let outlet = DiskOutlet::new(&config_in(&dir));
        let map = MapArtifact {
            markers: vec![MapMarker {
                name: "Kinkaku-ji, Kyoto".to_string(),
                point: GeoPoint {
                    latitude: 35.0394,
                    longitude: 135.7292,
                },
            }],
            skipped: vec![],
            zoom: 12,
        };

        let output = sample_output();
        let saved = outlet.save(&output, Some(&map)).await.unwrap();
        let out = dir.path().join("out");

        assert_eq!(saved.len(), 5);
        assert_eq!(
            fs::read_to_string(out.join(MARKDOWN_FILE)).unwrap(),
            output.itinerary.document
        );
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out.join(JSON_FILE)).unwrap()).unwrap();
        assert_eq!(json["itinerary"]["destination"], "Kyoto");
        assert!(fs::read_to_string(out.join(HTML_FILE)).unwrap().contains("<h1>Kyoto</h1>"));
        assert!(
            fs::read(out.join("itinerary_kyoto_1_days.pdf"))
                .unwrap()
                .starts_with(b"%PDF")
        );
        assert!(fs::read_to_string(out.join(MAP_FILE)).unwrap().contains("Kinkaku-ji, Kyoto"));
    }

    #[tokio::test]
    async fn test_disabled_exports_are_skipped() {
        let dir = TempDir::new().unwrap();
        let mut config = config_in(&dir);
        config.export = ExportConfig {
            pdf: false,
            html: false,
            json: false,
        };
        let empty_map = MapArtifact {
            markers: vec![],
            skipped: vec!["Atlantis".to_string()],
            zoom: 10,
        };

        let saved = DiskOutlet::new(&config)
            .save(&sample_output(), Some(&empty_map))
            .await
            .unwrap();

        assert_eq!(saved, vec![dir.path().join("out").join(MARKDOWN_FILE)]);
        assert!(!dir.path().join("out").join(MAP_FILE).exists());
    }
}
