use anyhow::Result;
use std::path::PathBuf;

use crate::config::Config;
use crate::generator::context::CrewContext;
use crate::generator::crew::{CrewOutput, TravelCrew};
use crate::generator::outlet::{DiskOutlet, Outlet};
use crate::generator::pipeline::PipelineRun;
use crate::map::MapRenderer;
use crate::types::TripRequest;

/// 一次完整工作流的结果
#[derive(Debug)]
pub struct LaunchReport {
    pub output: CrewOutput,
    pub saved_files: Vec<PathBuf>,
}

/// 启动行程规划工作流
pub async fn launch(config: &Config, request: &TripRequest) -> Result<LaunchReport> {
    let context = CrewContext::new(config.clone())?;
    // 启动时检查模型连接
    if !config.skip_connection_check {
        context.llm.check_connection().await?;
    }

    let map_renderer = if config.map.enabled {
        Some(MapRenderer::nominatim(&config.map)?)
    } else {
        None
    };

    execute(&context, request, map_renderer.as_ref()).await
}

/// 在给定的上下文中执行：规划 → 地图 → 存储
pub async fn execute(
    context: &CrewContext,
    request: &TripRequest,
    map_renderer: Option<&MapRenderer>,
) -> Result<LaunchReport> {
    let mut run = PipelineRun::new();
    let output = TravelCrew::new().execute(context, request, &mut run).await?;

    let itinerary = &output.itinerary;
    println!(
        "\n🗺️ {} 行程共 {} 天，预估总花费: {}",
        itinerary.destination,
        itinerary.total_days(),
        itinerary
            .total_estimated_cost
            .map(|cost| format!("{:.0} {}", cost, itinerary.currency))
            .unwrap_or_else(|| "未知".to_string())
    );

    // 地图为尽力而为，失败的地点只会减少标注
    let map = match map_renderer {
        Some(renderer) if !itinerary.key_locations.is_empty() => {
            println!("📍 正在定位 {} 个关键地点...", itinerary.key_locations.len());
            let map = renderer.render(&itinerary.key_locations).await;
            if !map.skipped.is_empty() {
                eprintln!("⚠️ 以下地点无法定位: {}", map.skipped.join(", "));
            }
            Some(map)
        }
        Some(_) => {
            eprintln!("⚠️ 行程中没有可供标注的关键地点");
            None
        }
        None => None,
    };

    let outlet = DiskOutlet::new(&context.config);
    let saved_files = outlet.save(&output, map.as_ref()).await?;

    println!("\n{}", run.timing().generate_timing_report());

    Ok(LaunchReport {
        output,
        saved_files,
    })
}
