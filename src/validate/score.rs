//! Visual quality rubric (100 points).

use super::structure::{Element, ElementPresence};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VisualStatus {
    Pass,
    Fail,
    Warn,
}

/// One rubric line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisualCheckItem {
    pub name: String,
    pub status: VisualStatus,
    pub points: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreBreakdown {
    pub items: Vec<VisualCheckItem>,
    pub score: u32,
    pub score_percent: u32,
    /// Unique, in rubric order
    pub improvements: Vec<String>,
}

pub const MAX_SCORE: u32 = 100;

const LAYOUT_ITEMS: &[(Element, &str, u32)] = &[
    (Element::LeftIconNav, "Left icon navigation", 10),
    (Element::RightTilesPanel, "Right tiles panel", 10),
    (Element::TopNavbar, "Top navigation bar", 10),
    (Element::DarkModeToggle, "Dark/light mode toggle", 10),
];

const CHART_KINDS: &[Element] = &[Element::HasLineChart, Element::HasBarChart, Element::HasAreaChart];

/// (element, item name, points, improvement when missing)
const CONTENT_ITEMS: &[(Element, &str, u32, &str)] = &[
    (Element::HasChartTitles, "Chart titles", 5, "Add chart titles"),
    (Element::HasTooltips, "Chart tooltips", 5, "Add chart tooltips"),
    (Element::HasMetrics, "KPI metrics", 10, "Add st.metric() for KPIs"),
    (
        Element::HasRealLabels,
        "Meaningful labels",
        10,
        "Replace placeholder text with meaningful labels",
    ),
];

#[derive(Default)]
struct Tally {
    items: Vec<VisualCheckItem>,
    score: u32,
    improvements: Vec<String>,
}

impl Tally {
    fn item(&mut self, name: impl Into<String>, status: VisualStatus, points: u32) {
        self.score += points;
        self.items.push(VisualCheckItem {
            name: name.into(),
            status,
            points,
        });
    }

    fn improve(&mut self, improvement: impl Into<String>) {
        let improvement = improvement.into();
        if !self.improvements.contains(&improvement) {
            self.improvements.push(improvement);
        }
    }
}

/// Score element presence and alignment issues against the rubric
pub fn calculate_score(elements: &ElementPresence, alignment_issues: &[String]) -> ScoreBreakdown {
    let mut tally = Tally::default();

    for (element, name, points) in LAYOUT_ITEMS {
        if elements.has(*element) {
            tally.item(*name, VisualStatus::Pass, *points);
        } else {
            tally.item(*name, VisualStatus::Fail, 0);
            tally.improve(format!("Add {}", name));
        }
    }

    let has_charts = elements.has(Element::HasAltairCharts);
    if has_charts {
        tally.item("Altair charts", VisualStatus::Pass, 10);
    } else {
        tally.item("Altair charts", VisualStatus::Fail, 0);
        tally.improve("Use Altair for charts");
    }

    let kinds = CHART_KINDS.iter().filter(|k| elements.has(**k)).count() as u32;
    let status = if kinds >= 2 { VisualStatus::Pass } else { VisualStatus::Warn };
    tally.item(format!("Chart variety ({} types)", kinds), status, (kinds * 5).min(10));
    if has_charts && kinds < 2 {
        tally.improve("Add more chart types (line, bar, area)");
    }

    for (element, name, points, improvement) in CONTENT_ITEMS {
        if elements.has(*element) {
            tally.item(*name, VisualStatus::Pass, *points);
        } else {
            tally.item(*name, VisualStatus::Fail, 0);
            tally.improve(*improvement);
        }
    }

    if alignment_issues.is_empty() {
        tally.item("Alignment", VisualStatus::Pass, 10);
    } else {
        tally.item("Alignment", VisualStatus::Warn, 5);
        for issue in alignment_issues {
            tally.improve(issue.as_str());
        }
    }

    let score = tally.score.min(MAX_SCORE);
    ScoreBreakdown {
        items: tally.items,
        score,
        score_percent: score * 100 / MAX_SCORE,
        improvements: tally.improvements,
    }
}

/// Early exit needs a threshold, a score at or above it, and iteration ≥ 2
pub fn should_exit_early(iteration: u32, score_percent: u32, threshold: Option<u32>) -> bool {
    match threshold {
        Some(threshold) => iteration >= 2 && score_percent >= threshold,
        None => false,
    }
}
