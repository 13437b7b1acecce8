//! Element presence and alignment analysis of the app source.

use crate::assess::probe::{Probe, SourceText, compiled};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Visual element the rubric looks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Element {
    LeftIconNav,
    RightTilesPanel,
    TopNavbar,
    DarkModeToggle,
    HasAltairCharts,
    HasLineChart,
    HasBarChart,
    HasAreaChart,
    HasChartTitles,
    HasAxisLabels,
    HasTooltips,
    HasMetrics,
    HasRealLabels,
    ThemeSessionStateInit,
    ThemeOnChangeCallback,
    ThemeCssVariables,
}

const ELEMENT_PROBES: &[(Element, Probe)] = &[
    (
        Element::LeftIconNav,
        Probe::AllOf(&[Probe::Contains("icon-nav"), Probe::Contains("icon-nav-item")]),
    ),
    (Element::RightTilesPanel, Probe::Contains("tiles-panel")),
    (Element::TopNavbar, Probe::Contains("top-navbar")),
    (
        Element::DarkModeToggle,
        Probe::AllOf(&[Probe::Contains("st.toggle"), Probe::Matches("(?i)dark")]),
    ),
    (
        Element::HasAltairCharts,
        Probe::AnyOf(&[Probe::Contains("alt.Chart"), Probe::Contains("st.altair_chart")]),
    ),
    (Element::HasLineChart, Probe::Contains("mark_line")),
    (Element::HasBarChart, Probe::Contains("mark_bar")),
    (Element::HasAreaChart, Probe::Contains("mark_area")),
    (
        Element::HasChartTitles,
        Probe::AnyOf(&[Probe::Contains(".properties(title="), Probe::Contains("title=\"")]),
    ),
    (Element::HasAxisLabels, Probe::Contains("axis=alt.Axis")),
    (Element::HasTooltips, Probe::Contains("tooltip=")),
    (Element::HasMetrics, Probe::Contains("st.metric")),
    (
        Element::HasRealLabels,
        Probe::AnyOf(&[
            Probe::Contains("Revenue"),
            Probe::Contains("Users"),
            Probe::Contains("Sales"),
            Probe::Contains("Growth"),
        ]),
    ),
    (
        Element::ThemeSessionStateInit,
        Probe::Contains(r#"if "dark_mode" not in st.session_state"#),
    ),
    (
        Element::ThemeOnChangeCallback,
        Probe::AnyOf(&[Probe::Contains("on_change="), Probe::Contains(r#"key="dark_mode""#)]),
    ),
    (
        Element::ThemeCssVariables,
        Probe::AnyOf(&[Probe::Contains("--bg-primary"), Probe::Contains("--text-primary")]),
    ),
];

/// Which elements are present in the app source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ElementPresence(BTreeMap<Element, bool>);

impl ElementPresence {
    /// Nothing present
    pub fn empty() -> Self {
        Self(ELEMENT_PROBES.iter().map(|(e, _)| (*e, false)).collect())
    }

    pub fn analyze(source: &str) -> Self {
        let source = SourceText::new(source);
        Self(
            ELEMENT_PROBES
                .iter()
                .map(|(element, probe)| (*element, probe.holds(&source)))
                .collect(),
        )
    }

    pub fn has(&self, element: Element) -> bool {
        self.0.get(&element).copied().unwrap_or(false)
    }

    pub fn set(&mut self, element: Element, present: bool) {
        self.0.insert(element, present);
    }
}

const COLUMN_WEIGHTS: &str = r"st\.columns\(\s*\[([^\]]*)\]";
const PADDING_VALUE: &str = r"padding:\s*(\d+)";

/// Ratio at which column weights count as unbalanced
const UNBALANCED_RATIO: f64 = 8.0;

/// More distinct padding values than this is inconsistent
const MAX_PADDING_VALUES: usize = 4;

/// Layout alignment problems detectable from source
pub fn alignment_issues(source: &str) -> Vec<String> {
    let mut issues = Vec::new();

    if let Some(re) = compiled(COLUMN_WEIGHTS) {
        let unbalanced = re.captures_iter(source).any(|caps| {
            let weights: Vec<f64> = caps[1]
                .split(',')
                .filter_map(|w| w.trim().parse::<f64>().ok())
                .filter(|w| *w > 0.0)
                .collect();
            let max = weights.iter().copied().fold(f64::MIN, f64::max);
            let min = weights.iter().copied().fold(f64::MAX, f64::min);
            weights.len() >= 2 && max / min >= UNBALANCED_RATIO
        });
        if unbalanced {
            issues.push("Unbalanced column widths detected".to_string());
        }
    }

    if let Some(re) = compiled(PADDING_VALUE) {
        let values: BTreeSet<&str> = re
            .captures_iter(source)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
            .collect();
        if values.len() > MAX_PADDING_VALUES {
            issues.push("Inconsistent padding values".to_string());
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_elements() {
        let src = r#"
st.markdown('<div class="icon-nav"><div class="icon-nav-item"></div></div>', unsafe_allow_html=True)
dark = st.toggle("Dark mode", key="dark_mode")
chart = alt.Chart(df).mark_line().encode(tooltip=["month"])
st.metric("Revenue", "$1.2M")
"#;
        let found = ElementPresence::analyze(src);
        assert!(found.has(Element::LeftIconNav));
        assert!(found.has(Element::DarkModeToggle));
        assert!(found.has(Element::HasLineChart));
        assert!(found.has(Element::HasTooltips));
        assert!(found.has(Element::HasRealLabels));
        assert!(found.has(Element::ThemeOnChangeCallback));
        assert!(!found.has(Element::HasBarChart));
        assert!(!found.has(Element::TopNavbar));
    }

    #[test]
    fn test_empty_presence() {
        let none = ElementPresence::empty();
        assert!(!none.has(Element::HasMetrics));
        let json = serde_json::to_value(&none).unwrap();
        assert_eq!(json["left_icon_nav"], false);
    }

    #[test]
    fn test_unbalanced_columns() {
        assert_eq!(
            alignment_issues("a, b = st.columns([1, 8])\n"),
            vec!["Unbalanced column widths detected".to_string()]
        );
        assert!(alignment_issues("a, b, c = st.columns([1, 2, 1])\n").is_empty());
        assert!(alignment_issues("cols = st.columns(5)\n").is_empty());
    }

    #[test]
    fn test_inconsistent_padding() {
        let css = "padding: 4px; padding: 8px; padding: 12px; padding: 16px;";
        assert!(alignment_issues(css).is_empty());
        let css = format!("{} padding: 20px;", css);
        assert_eq!(alignment_issues(&css), vec!["Inconsistent padding values".to_string()]);
    }
}
