use regex::Regex;
use std::sync::LazyLock;

/// 地图地点段落的标题
pub const KEY_LOCATIONS_HEADING: &str = "Key Locations for Map:";

/// 整行只有标题本身时才视为地点段落的开始，正文中提到该短语不算
static HEADING_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:#{1,6}\s*)?(?:\*\*|__)?\s*key\s+locations\s+for\s+map\s*:?\s*(?:\*\*|__)?\s*:?\s*$")
        .unwrap()
});
static BULLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:[-*•+]|\d+[.)])?\s*").unwrap());

/// 未找到标题时回退扫描的末尾行数
const FALLBACK_LINES: usize = 10;

/// 地点段落标题所在的行号，多次出现时取最后一次
pub fn key_locations_line(text: &str) -> Option<usize> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| HEADING_LINE.is_match(line))
        .map(|(index, _)| index)
        .last()
}

/// 从行程文本中提取用于地图标注的地点名称
///
/// 优先读取 "Key Locations for Map:" 标题行之后的列表，找不到时退回扫描最后几行。
/// 去除列表符号，保留长度大于3的名称并去重，最多返回 `max` 个。
pub fn extract_key_locations(text: &str, max: usize) -> Vec<String> {
    let all: Vec<&str> = text.lines().collect();
    let lines: &[&str] = match key_locations_line(text) {
        Some(index) => &all[index + 1..],
        None => &all[all.len().saturating_sub(FALLBACK_LINES)..],
    };

    let mut locations: Vec<String> = Vec::new();
    for line in lines {
        if line.trim_start().starts_with('#') {
            continue;
        }
        let name = BULLET
            .replace(line, "")
            .replace("**", "")
            .trim()
            .trim_end_matches('.')
            .trim()
            .to_string();
        if name.chars().count() <= 3 || locations.contains(&name) {
            continue;
        }
        locations.push(name);
        if locations.len() >= max {
            break;
        }
    }
    locations
}
