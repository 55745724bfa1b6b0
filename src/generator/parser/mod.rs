//! 将智能体的文本产出解析为结构化数据

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

use crate::error::{PlannerError, PlannerResult};
use crate::generator::types::AgentRole;
use crate::map::{extract_key_locations, key_locations_line};
use crate::types::{Activity, CostEstimate, CostRange, DayPlan, Itinerary, TripRequest};

static MARKED_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(₹|\$|€|£|¥|\brs\.?|\binr\b|\busd\b|\beur\b|\bgbp\b|\bjpy\b)\s*(\d[\d,]*(?:\.\d+)?)(\s*k\b)?",
    )
    .unwrap()
});
static PLAIN_AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d[\d,]*(?:\.\d+)?)(\s*[kK]\b)?(\s*[A-Za-z%]+)?").unwrap());
static BULLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:[-*•+]|\d+[.)])\s+").unwrap());
static DAY_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(#{1,6})?\s*(?:\*\*|__)?\s*day\s+(\d{1,3})\b\s*(?:\*\*|__)?\s*[:.\-–—]?\s*(.*)$")
        .unwrap()
});
static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(#{1,6})\s+(.+?)\s*#*\s*$").unwrap());
static BOLD_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:\*\*|__)([^*_]+?)(?:\*\*|__)\s*:?\s*$").unwrap());
static LABELED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\*\*|__)?([A-Za-z][A-Za-z &/]{1,40}?)\s*(?::\s*(?:\*\*|__)|(?:\*\*|__)?\s*:)\s*(.*)$")
        .unwrap()
});
static TAGS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\[([^\]]+)\]\s*(.*)$").unwrap());

/// 金额后出现这些单位时不视为金额
const NON_MONEY_UNITS: [&str; 10] = [
    "day", "night", "person", "people", "pax", "hour", "hr", "min", "km", "%",
];

/// 粗粒度的兴趣同义词表：(词干前缀, 同义词)
const INTEREST_SYNONYMS: &[(&[&str], &[&str])] = &[
    (
        &["histor", "heritag"],
        &["temple", "shrine", "castle", "palace", "museum", "heritage", "ancient", "monument", "ruins"],
    ),
    (
        &["food", "cuisin", "culin", "gastro", "eat"],
        &["restaurant", "market", "street food", "cuisine", "dining", "tasting", "lunch", "dinner", "breakfast", "cafe"],
    ),
    (&["art"], &["gallery", "museum", "exhibit", "craft"]),
    (&["museum"], &["museum", "gallery", "exhibit"]),
    (
        &["natur", "hik", "outdoor"],
        &["park", "garden", "hike", "trail", "mountain", "forest", "lake", "bamboo", "river"],
    ),
    (&["night"], &["bar", "club", "pub", "izakaya", "night"]),
    (&["shop"], &["market", "mall", "boutique", "shopping", "souvenir"]),
    (&["relax", "wellness"], &["spa", "onsen", "beach", "garden", "massage"]),
    (&["adventur", "sport"], &["hike", "kayak", "raft", "zipline", "dive", "climb"]),
    (
        &["cultur", "tradition"],
        &["temple", "shrine", "tea ceremony", "festival", "tradition", "geisha"],
    ),
];

const TIMES_OF_DAY: [&str; 7] = [
    "morning",
    "afternoon",
    "evening",
    "night",
    "breakfast",
    "lunch",
    "dinner",
];

/// 行程文本中的段落类型
#[derive(Debug, Clone, PartialEq)]
enum Section {
    Activities { prefix: Option<String> },
    Tips,
    Contacts,
    Cost,
    Other,
}

/// 按标题文本判断段落类型，无法识别时返回None
fn classify_label(label: &str) -> Option<Section> {
    let lower = label.trim().trim_end_matches(':').to_ascii_lowercase();
    if lower.contains("emergency") || lower.contains("contact") {
        Some(Section::Contacts)
    } else if lower.contains("tip")
        || lower.contains("etiquette")
        || lower.contains("cultur")
        || lower.contains("phrase")
    {
        Some(Section::Tips)
    } else if lower.contains("cost")
        || lower.contains("budget")
        || lower.contains("spend")
        || lower.contains("expense")
    {
        Some(Section::Cost)
    } else if TIMES_OF_DAY.contains(&lower.as_str()) {
        Some(Section::Activities {
            prefix: Some(capitalize(&lower)),
        })
    } else if lower.contains("activit")
        || lower.contains("itinerary")
        || lower.contains("schedule")
        || lower.contains("sights")
    {
        Some(Section::Activities { prefix: None })
    } else {
        None
    }
}

/// 段落标题的完整写法；活动条目的标签只有与之完全一致时才切换段落
fn section_title(label: &str) -> Option<Section> {
    let lower = clean_inline(label).trim_end_matches(':').trim().to_ascii_lowercase();
    match lower.as_str() {
        "tip" | "tips" | "cultural tip" | "cultural tips" | "cultural note" | "cultural notes"
        | "etiquette" | "local etiquette" | "etiquette tips" => Some(Section::Tips),
        "contact" | "contacts" | "emergency" | "emergency contact" | "emergency contacts"
        | "emergency numbers" | "important contacts" => Some(Section::Contacts),
        "cost" | "costs" | "estimated cost" | "estimated costs" | "daily cost"
        | "estimated daily cost" | "cost estimate" | "total cost" | "budget" => Some(Section::Cost),
        _ => None,
    }
}

/// 全局段落的标题，出现时结束当前的一天
fn is_global_section(label: &str) -> bool {
    let lower = label.to_ascii_lowercase();
    [
        "important contacts",
        "useful phrases",
        "budget & cost",
        "budget and cost",
        "cost estimates",
        "overview",
        "summary",
    ]
    .iter()
    .any(|name| lower.contains(name))
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// 去除Markdown强调符号
fn clean_inline(text: &str) -> String {
    text.replace("**", "")
        .replace("__", "")
        .replace('`', "")
        .trim()
        .to_string()
}

fn to_amount(number: &str, thousands: bool) -> Option<f64> {
    let value: f64 = number.replace(',', "").parse().ok()?;
    Some(if thousands { value * 1000.0 } else { value })
}

/// 货币符号或代码对应的ISO代码
fn currency_code(marker: &str) -> String {
    let lower = marker.trim().trim_end_matches('.').to_ascii_lowercase();
    match lower.as_str() {
        "₹" | "rs" | "inr" => "INR".to_string(),
        "$" | "usd" => "USD".to_string(),
        "€" | "eur" => "EUR".to_string(),
        "£" | "gbp" => "GBP".to_string(),
        "¥" | "jpy" => "JPY".to_string(),
        _ => lower.to_ascii_uppercase(),
    }
}

/// 提取一行中的金额及其位置；有货币符号的金额优先
///
/// 一行中出现多种货币时，只保留配置的币种；配置的币种未出现时保留第一种。
fn amounts_in(line: &str, currency: &str) -> Vec<(usize, f64)> {
    let marked: Vec<(usize, f64, String)> = MARKED_AMOUNT
        .captures_iter(line)
        .filter_map(|caps| {
            let number = caps.get(2)?;
            let value = to_amount(number.as_str(), caps.get(3).is_some())?;
            Some((number.start(), value, currency_code(&caps[1])))
        })
        .collect();
    if let Some((_, _, first_code)) = marked.first() {
        let wanted = currency.trim().to_ascii_uppercase();
        let code = if marked.iter().any(|(_, _, code)| *code == wanted) {
            wanted
        } else {
            first_code.clone()
        };
        return marked
            .into_iter()
            .filter(|(_, _, marker)| *marker == code)
            .map(|(position, value, _)| (position, value))
            .collect();
    }

    let lower = line.to_ascii_lowercase();
    PLAIN_AMOUNT
        .captures_iter(line)
        .filter_map(|caps| {
            let number = caps.get(1)?;
            let unit = caps
                .get(3)
                .map(|m| m.as_str().trim().to_ascii_lowercase())
                .unwrap_or_default();
            if NON_MONEY_UNITS.iter().any(|u| unit.starts_with(u)) {
                return None;
            }
            if lower[..number.start()].trim_end().ends_with("day") {
                return None;
            }
            to_amount(number.as_str(), caps.get(2).is_some()).map(|v| (number.start(), v))
        })
        .collect()
}

fn range_of(amounts: &[f64]) -> Option<CostRange> {
    match amounts {
        [] => None,
        [single] => Some(CostRange::single(*single)),
        [low, high, ..] => Some(CostRange::new(*low, *high)),
    }
}

#[derive(Clone, Copy, PartialEq)]
enum CostLabel {
    Daily,
    Total,
    Unlabeled,
}

fn label_positions(lower: &str) -> Vec<(usize, CostLabel)> {
    let mut positions: Vec<(usize, CostLabel)> = Vec::new();
    for keyword in ["daily", "per day", "a day"] {
        positions.extend(lower.match_indices(keyword).map(|(i, _)| (i, CostLabel::Daily)));
    }
    positions.extend(lower.match_indices("total").map(|(i, _)| (i, CostLabel::Total)));
    positions.sort_by_key(|(i, _)| *i);
    positions
}

/// 解析花费估算智能体的输出
///
/// 金额归属于其前方最近的 daily / total 标签；一个标签下的前两个金额组成区间。
/// 没有任何标签时，第一组金额视为单日花费。找不到金额时返回 `EmptyResult`。
pub fn parse_cost_estimate(text: &str, currency: &str) -> PlannerResult<CostEstimate> {
    let mut daily: Vec<f64> = Vec::new();
    let mut total: Vec<f64> = Vec::new();
    let mut unlabeled: Vec<f64> = Vec::new();

    for raw_line in text.lines() {
        let line = BULLET.replace(raw_line, "");
        let amounts = amounts_in(&line, currency);
        if amounts.is_empty() {
            continue;
        }
        let labels = label_positions(&line.to_ascii_lowercase());

        for (position, amount) in amounts {
            let label = labels
                .iter()
                .rev()
                .find(|(label_pos, _)| *label_pos < position)
                .map(|(_, label)| *label)
                .unwrap_or(CostLabel::Unlabeled);
            let bucket = match label {
                CostLabel::Daily => &mut daily,
                CostLabel::Total => &mut total,
                CostLabel::Unlabeled => &mut unlabeled,
            };
            bucket.push(amount);
        }
    }

    let mut daily = range_of(&daily);
    let total = range_of(&total);
    if daily.is_none() && total.is_none() {
        daily = range_of(&unlabeled);
    }
    if daily.is_none() && total.is_none() {
        return Err(PlannerError::empty(AgentRole::CostEstimator.to_string()));
    }

    Ok(CostEstimate {
        currency: currency.to_string(),
        daily,
        total,
    })
}

/// 兴趣对应的匹配关键词
fn interest_keywords(interest: &str) -> Vec<String> {
    let mut keywords = vec![interest.to_lowercase()];
    for word in interest
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| word.chars().count() >= 3)
    {
        let length = word.chars().count();
        let stem: String = if length > 5 {
            word.chars().take(length - 2).collect()
        } else {
            word.to_string()
        };
        for (prefixes, synonyms) in INTEREST_SYNONYMS {
            if prefixes.iter().any(|prefix| word.starts_with(prefix)) {
                keywords.extend(synonyms.iter().map(|s| s.to_string()));
            }
        }
        keywords.push(stem);
    }
    keywords.sort();
    keywords.dedup();
    keywords
}

/// 根据描述文本推断活动服务的兴趣
fn infer_tags(description: &str, interests: &BTreeSet<String>) -> Vec<String> {
    let lower = description.to_lowercase();
    interests
        .iter()
        .filter(|interest| {
            interest_keywords(interest)
                .iter()
                .any(|keyword| lower.contains(keyword.as_str()))
        })
        .cloned()
        .collect()
}

/// 解析单条活动，`[tag, tag] text` 形式的显式标签优先
fn parse_activity(text: &str, prefix: Option<&str>, interests: &BTreeSet<String>) -> Activity {
    let text = clean_inline(text);
    let (tags, body) = match TAGS.captures(&text) {
        Some(caps) => {
            let tags: Vec<String> = caps[1]
                .split(',')
                .map(|tag| tag.trim().to_lowercase())
                .filter(|tag| !tag.is_empty())
                .collect();
            (Some(tags), caps[2].trim().to_string())
        }
        None => (None, text.clone()),
    };

    let description = match prefix {
        Some(prefix) => format!("{}: {}", prefix, body),
        None => body,
    };
    let tags = tags.unwrap_or_else(|| infer_tags(&description, interests));
    Activity::new(description, tags)
}

/// 花费段落中的一行
struct CostLine {
    is_total: bool,
    amount: f64,
}

#[derive(Default)]
struct DayDraft {
    day_index: u32,
    title: Option<String>,
    activities: Vec<Activity>,
    cultural_tips: Vec<String>,
    contacts: Vec<String>,
    costs: Vec<CostLine>,
}

impl DayDraft {
    /// 有合计行时取合计，否则将分项相加
    fn cost(&self) -> Option<f64> {
        if let Some(total) = self.costs.iter().find(|line| line.is_total) {
            return Some(total.amount);
        }
        (!self.costs.is_empty()).then(|| self.costs.iter().map(|line| line.amount).sum())
    }
}

#[derive(Default)]
struct GlobalSections {
    cultural_tips: Vec<String>,
    contacts: Vec<String>,
}

/// 逐行解析行程文本的状态
struct ItineraryScanner<'a> {
    interests: &'a BTreeSet<String>,
    currency: &'a str,
    days: Vec<DayDraft>,
    current: Option<DayDraft>,
    /// 当前日标题的Markdown层级；粗体或普通行形式的日标题为None
    day_level: Option<usize>,
    section: Section,
    global: GlobalSections,
}

impl<'a> ItineraryScanner<'a> {
    fn new(interests: &'a BTreeSet<String>, currency: &'a str) -> Self {
        Self {
            interests,
            currency,
            days: Vec::new(),
            current: None,
            day_level: None,
            section: Section::Other,
            global: GlobalSections::default(),
        }
    }

    fn close_day(&mut self) {
        if let Some(day) = self.current.take() {
            self.days.push(day);
        }
    }

    fn scan_line(&mut self, line: &str) {
        if let Some(caps) = DAY_HEADING.captures(line) {
            self.close_day();
            let title = clean_inline(caps[3].trim_matches(|c: char| c == '*' || c == '_'));
            self.current = Some(DayDraft {
                day_index: caps[2].parse().unwrap_or(0),
                title: (!title.is_empty()).then_some(title),
                ..DayDraft::default()
            });
            self.day_level = caps.get(1).map(|m| m.as_str().len());
            self.section = Section::Activities { prefix: None };
            return;
        }

        if let Some(caps) = HEADING.captures(line) {
            let level = caps[1].len();
            let label = clean_inline(&caps[2]);
            let section = classify_label(&label);
            let within_day = match (&self.current, self.day_level) {
                (None, _) => false,
                (Some(_), Some(day_level)) => level > day_level,
                (Some(_), None) => level > 1 && !is_global_section(&label),
            };
            if within_day {
                self.section = section.unwrap_or(Section::Activities { prefix: None });
            } else {
                self.close_day();
                self.section = section.unwrap_or(Section::Other);
            }
            return;
        }

        if let Some(caps) = BOLD_LINE.captures(line) {
            if let Some(section) = classify_label(&caps[1]) {
                self.section = section;
                return;
            }
        }

        let item = BULLET.replace(line, "");
        let item = item.trim();
        if item.is_empty() {
            return;
        }

        // 单独的标签行切换段落，带内容的标签行只记录该条目
        if let Some(caps) = LABELED.captures(item) {
            if let Some(section) = classify_label(&caps[1]) {
                let rest = caps[2].trim();
                if rest.is_empty() {
                    self.section = section;
                    return;
                }
                match section {
                    Section::Activities { .. } => {
                        self.push(&section, rest);
                        return;
                    }
                    // 活动段落中的 "Cultural experience: ..." 仍是活动
                    _ if matches!(self.section, Section::Activities { .. })
                        && section_title(&caps[1]).is_none() => {}
                    _ => {
                        self.push(&section, item);
                        return;
                    }
                }
            }
        }

        let section = self.section.clone();
        self.push(&section, item);
    }

    fn push(&mut self, section: &Section, text: &str) {
        match section {
            Section::Activities { prefix } => self.push_activity(text, prefix.as_deref()),
            Section::Cost => self.push_cost(text),
            Section::Tips | Section::Contacts => self.push_item(section, &clean_inline(text)),
            Section::Other => {}
        }
    }

    fn push_activity(&mut self, text: &str, prefix: Option<&str>) {
        if let Some(day) = self.current.as_mut() {
            day.activities
                .push(parse_activity(text, prefix, self.interests));
        }
    }

    fn push_cost(&mut self, text: &str) {
        let Some(day) = self.current.as_mut() else {
            return;
        };
        let amounts: Vec<f64> = amounts_in(text, self.currency)
            .into_iter()
            .map(|(_, v)| v)
            .collect();
        if let Some(range) = range_of(&amounts) {
            day.costs.push(CostLine {
                is_total: text.to_ascii_lowercase().contains("total"),
                amount: range.midpoint(),
            });
        }
    }

    fn push_item(&mut self, section: &Section, text: &str) {
        if text.is_empty() {
            return;
        }
        let (tips, contacts) = match self.current.as_mut() {
            Some(day) => (&mut day.cultural_tips, &mut day.contacts),
            None => (&mut self.global.cultural_tips, &mut self.global.contacts),
        };
        match section {
            Section::Tips => tips.push(text.to_string()),
            Section::Contacts => contacts.push(text.to_string()),
            _ => {}
        }
    }

    fn finish(mut self) -> (Vec<DayDraft>, GlobalSections) {
        self.close_day();
        (self.days, self.global)
    }
}

/// 解析行程合成智能体输出的Markdown
///
/// 天数少于请求的天数时返回 `EmptyResult`，多出的天被丢弃。
pub fn parse_itinerary(
    text: &str,
    request: &TripRequest,
    cost: &CostEstimate,
    max_locations: usize,
) -> PlannerResult<Itinerary> {
    let synthesizer = AgentRole::Synthesizer.to_string();
    let expected_days = request.duration_days();

    let mut scanner = ItineraryScanner::new(request.interests(), &cost.currency);
    let body_lines = key_locations_line(text).unwrap_or(usize::MAX);
    for line in text.lines().take(body_lines) {
        scanner.scan_line(line);
    }
    let (mut drafts, global) = scanner.finish();

    // 同一天出现多次时保留第一次
    drafts.sort_by_key(|draft| draft.day_index);
    drafts.dedup_by_key(|draft| draft.day_index);
    drafts.retain(|draft| draft.day_index > 0);

    if drafts.len() < expected_days as usize {
        return Err(PlannerError::empty(format!(
            "{} (期望{}天，解析到{}天)",
            synthesizer,
            expected_days,
            drafts.len()
        )));
    }
    drafts.truncate(expected_days as usize);

    let daily_reference = cost.daily_reference(expected_days);
    let mut day_plans = Vec::with_capacity(drafts.len());
    for (position, draft) in drafts.into_iter().enumerate() {
        if draft.activities.is_empty() {
            return Err(PlannerError::empty(format!(
                "{} (第{}天没有活动)",
                synthesizer, draft.day_index
            )));
        }
        let estimated_cost = draft
            .cost()
            .or(daily_reference)
            .ok_or_else(|| PlannerError::empty(AgentRole::CostEstimator.to_string()))?;

        day_plans.push(DayPlan {
            day_index: position as u32 + 1,
            title: draft.title,
            activities: draft.activities,
            cultural_tips: if draft.cultural_tips.is_empty() {
                global.cultural_tips.clone()
            } else {
                draft.cultural_tips
            },
            estimated_cost,
            emergency_contacts: if draft.contacts.is_empty() {
                global.contacts.clone()
            } else {
                draft.contacts
            },
        });
    }

    let mut itinerary = Itinerary {
        destination: request.destination().to_string(),
        currency: cost.currency.clone(),
        day_plans,
        total_estimated_cost: cost.total.map(|range| range.midpoint()),
        key_locations: extract_key_locations(text, max_locations),
        document: text.to_string(),
    };
    if itinerary.total_estimated_cost.is_none() {
        itinerary.total_estimated_cost = Some(itinerary.sum_of_daily_costs());
    }
    Ok(itinerary)
}
