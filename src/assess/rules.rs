//! The standard dashboard check table, in presentation order.

use super::probe::Probe;
use super::registry::{CheckDescriptor, Finding, Rule, Scope, Severity, TallyItem};
use super::tooling::ToolKind;

const APP: &str = "streamlit_app.py";
const PYPROJECT: &str = "pyproject.toml";
const ENVIRONMENT: &str = "environment.yml";
const REQUIREMENTS: &str = "requirements.txt";
const SNOWFLAKE: &str = "snowflake.yml";
const DOCKERFILE: &str = "spcs/Dockerfile";
const SPEC_YAML: &str = "spcs/spec.yaml";
const SPCS_REQUIREMENTS: &str = "spcs/requirements-spcs.txt";

pub(crate) const CHART_CALLS: Probe = Probe::AnyOf(&[
    Probe::Contains("alt.Chart"),
    Probe::Contains("mark_bar"),
    Probe::Contains("mark_line"),
]);

pub(crate) const ALTAIR_IMPORT: Probe = Probe::AnyOf(&[Probe::Contains("import altair"), Probe::Contains("from altair")]);

pub(crate) const COLUMN_CONFIG_USAGE: Probe = Probe::AnyOf(&[
    Probe::CodeMatches(r"\bst\.column_config\b"),
    Probe::CodeMatches(r"\bcolumn_config\s*=\s*(\{|dict\b)"),
]);

const SIMPLE_CHARTS: &[Finding] = &[
    Finding { when: Probe::CodeMatches(r"st\.bar_chart\s*\("), message: "st.bar_chart" },
    Finding { when: Probe::CodeMatches(r"st\.line_chart\s*\("), message: "st.line_chart" },
    Finding { when: Probe::CodeMatches(r"st\.area_chart\s*\("), message: "st.area_chart" },
    Finding { when: Probe::CodeMatches(r"st\.scatter_chart\s*\("), message: "st.scatter_chart" },
];

/// Markdown headers: "**Title**" or "### Title" inside st.markdown("...")
const TITLE_HEADER: &str = r#"st\.markdown\(["'].*(?:\*\*|#{1,3}\s).*["']\)"#;

const CONTENT_ISSUES: &[Finding] = &[
    Finding {
        when: Probe::Matches(r#"(?i)["']Predictive Item["']"#),
        message: "Generic 'Predictive Item' text found - use specific names like 'Revenue Forecast'",
    },
    Finding {
        when: Probe::OccursMoreThan("───", 3),
        message: "Too many placeholder lines (───) - replace with real content",
    },
    Finding {
        when: Probe::Outnumbers(r"alt\.Chart\(", TITLE_HEADER),
        message: "Found {subject} charts but only {reference} title headers - add st.markdown('**Title**') before each chart",
    },
    Finding {
        when: Probe::Not(&Probe::Contains("st.metric(")),
        message: "No st.metric() found - dashboard should have KPI metrics with real values",
    },
    Finding {
        when: Probe::Not(&Probe::AnyOf(&[Probe::Matches(r"\$[\d,]+"), Probe::Matches(r"\d+\.?\d*%")])),
        message: "No realistic metrics ($ or %) found - add real-looking values",
    },
    Finding {
        when: Probe::Not(&Probe::AtLeast(
            2,
            &[
                Probe::Matches(r"(?i)View Details"),
                Probe::Matches(r"(?i)Review"),
                Probe::Matches(r"(?i)Export"),
                Probe::Matches(r"(?i)Optimize"),
                Probe::Matches(r"(?i)Investigate"),
            ],
        )),
        message: "Few action buttons found - add interactive elements like 'View Details', 'Export', etc.",
    },
    Finding {
        when: Probe::Not(&Probe::AtLeast(
            2,
            &[
                Probe::Matches(r"(?i)TODAY'S|VISITORS|PENDING|TASKS"),
                Probe::Matches(r"(?i)AI SUGGESTIONS|Enter Prompt"),
                Probe::Matches(r"(?i)Recent Activity|Activity feed"),
            ],
        )),
        message: "Right panel content may be missing - add metrics, suggestions, prompt input",
    },
];

const CHART_LABEL_ISSUES: &[Finding] = &[
    Finding {
        when: Probe::Not(&Probe::Matches(r"alt\.X\([^)]*title\s*=")),
        message: "X-axis labels missing - add title= to alt.X()",
    },
    Finding {
        when: Probe::Not(&Probe::Matches(r"alt\.Y\([^)]*title\s*=")),
        message: "Y-axis labels missing - add title= to alt.Y()",
    },
    Finding {
        when: Probe::Not(&Probe::Matches(r"tooltip\s*=\s*\[")),
        message: "Chart tooltips missing - add tooltip=[...] to encode()",
    },
];

const LAYOUT_ISSUES: &[Finding] = &[
    Finding {
        when: Probe::Not(&Probe::AnyOf(&[Probe::Contains(r#"class="icon-nav""#), Probe::Contains("icon-nav-item")])),
        message: "Left icon navigation (icon-nav) missing - add vertical nav with circles",
    },
    Finding {
        when: Probe::Not(&Probe::AnyOf(&[
            Probe::Contains(r#"class="tiles-panel""#),
            Probe::Contains("tiles-tab-label"),
        ])),
        message: "Right tiles panel missing - add collapsible tiles bar",
    },
    Finding {
        when: Probe::Not(&Probe::AnyOf(&[Probe::Contains(r#"class="top-navbar""#), Probe::Matches("nav-logo|nav-company")])),
        message: "Top navigation bar missing - add header with logo, search, profile",
    },
];

const INTERACTIVE_ITEMS: &[TallyItem] = &[
    TallyItem {
        probe: Probe::MatchesAtLeast(r"st\.button\(", 3),
        label: "buttons",
        counted: Some(r"st\.button\("),
    },
    TallyItem { probe: Probe::Contains("st.session_state"), label: "session_state", counted: None },
    TallyItem { probe: Probe::Contains(".interactive()"), label: "interactive charts", counted: None },
    TallyItem {
        probe: Probe::MatchesAtLeast(r"st\.expander\(", 2),
        label: "expanders",
        counted: Some(r"st\.expander\("),
    },
    TallyItem { probe: Probe::Contains("st.tabs("), label: "tabs", counted: None },
];

const CHART_KINDS: &[TallyItem] = &[
    TallyItem { probe: Probe::Contains("mark_bar"), label: "bar", counted: None },
    TallyItem { probe: Probe::Contains("mark_line"), label: "line", counted: None },
    TallyItem { probe: Probe::Contains("mark_area"), label: "area", counted: None },
    TallyItem { probe: Probe::Contains("mark_arc"), label: "pie/donut", counted: None },
    TallyItem {
        probe: Probe::AnyOf(&[Probe::Contains("mark_point"), Probe::Contains("mark_circle")]),
        label: "scatter",
        counted: None,
    },
];

const STREAMLIT_PIN: &str = r"(?i)streamlit[><=]*1\.5[1-9]";

fn file(id: &'static str, name: &'static str, target: &'static str, severity: Severity, scope: Scope) -> CheckDescriptor {
    CheckDescriptor {
        id,
        name,
        target,
        precondition: None,
        rule: Rule::Exists,
        severity,
        scope,
        suggestion: None,
    }
}

fn app_check(id: &'static str, name: &'static str, rule: Rule, severity: Severity) -> CheckDescriptor {
    on(id, name, APP, rule, severity)
}

fn on(id: &'static str, name: &'static str, target: &'static str, rule: Rule, severity: Severity) -> CheckDescriptor {
    CheckDescriptor {
        id,
        name,
        target,
        precondition: None,
        rule,
        severity,
        scope: Scope::Always,
        suggestion: None,
    }
}

fn import(id: &'static str, name: &'static str, import: &'static [Probe], pass: &'static str, fail: &'static str, severity: Severity) -> CheckDescriptor {
    app_check(id, name, Rule::Holds { probe: Probe::AnyOf(import), pass, fail }, severity)
}

fn streamlit_pin(id: &'static str, name: &'static str, target: &'static str, pass: &'static str, fail: &'static str) -> CheckDescriptor {
    on(
        id,
        name,
        target,
        Rule::Holds { probe: Probe::Matches(STREAMLIT_PIN), pass, fail },
        Severity::Warning,
    )
}

/// All standard checks
pub fn default_checks() -> Vec<CheckDescriptor> {
    use Severity::{Critical, Warning};

    vec![
        // Structure
        file("file-app", "File: streamlit_app.py", APP, Critical, Scope::Always),
        file("file-pyproject", "File: pyproject.toml", PYPROJECT, Critical, Scope::Always),
        file("file-environment", "File: environment.yml", ENVIRONMENT, Critical, Scope::Deployment),
        file("file-requirements", "File: requirements.txt", REQUIREMENTS, Warning, Scope::Deployment),
        file("file-snowflake", "File: snowflake.yml", SNOWFLAKE, Critical, Scope::Deployment),
        file("file-dockerfile", "File: spcs/Dockerfile", DOCKERFILE, Critical, Scope::Deployment),
        file("file-spec-yaml", "File: spcs/spec.yaml", SPEC_YAML, Critical, Scope::Deployment),
        file(
            "file-spcs-requirements",
            "File: spcs/requirements-spcs.txt",
            SPCS_REQUIREMENTS,
            Critical,
            Scope::Deployment,
        ),
        // Code quality
        app_check(
            "no-column-config",
            "No st.column_config",
            Rule::Forbidden {
                probe: COLUMN_CONFIG_USAGE,
                pass: "No st.column_config usage (good)",
                fail: "st.column_config USAGE found - MUST REMOVE (breaks SiS Container)",
            },
            Critical,
        ),
        CheckDescriptor {
            precondition: Some(Probe::Not(&CHART_CALLS)),
            ..app_check(
                "altair-charts",
                "Altair charts",
                Rule::Fixed {
                    passed: true,
                    message: "No Altair charts detected (OK if using other methods)",
                },
                Warning,
            )
        },
        CheckDescriptor {
            precondition: Some(Probe::AllOf(&[CHART_CALLS, Probe::Not(&ALTAIR_IMPORT)])),
            ..app_check(
                "altair-import",
                "Altair import",
                Rule::Fixed {
                    passed: false,
                    message: "Using Altair methods without importing altair",
                },
                Critical,
            )
        },
        CheckDescriptor {
            precondition: Some(Probe::AllOf(&[CHART_CALLS, ALTAIR_IMPORT])),
            ..app_check(
                "explicit-colors",
                "Explicit chart colors",
                Rule::Holds {
                    probe: Probe::AnyOf(&[
                        Probe::Matches(r#"color\s*=\s*["']#[0-9A-Fa-f]{6}"#),
                        Probe::AllOf(&[Probe::Contains("alt.Scale"), Probe::Contains("range=")]),
                    ]),
                    pass: "Charts use explicit colors (good)",
                    fail: "Charts may use default colors - ADD explicit color='#XXXXXX' for consistency",
                },
                Warning,
            )
        },
        app_check(
            "no-simple-charts",
            "No simple charts",
            Rule::Findings {
                findings: SIMPLE_CHARTS,
                limit: SIMPLE_CHARTS.len(),
                separator: ", ",
                pass: "No simple st.*_chart() usage (good)",
                fail: "Found {issues} - REPLACE with Altair for color consistency",
            },
            Warning,
        ),
        app_check("syntax", "Python syntax", Rule::Syntax, Critical),
        import(
            "import-streamlit",
            "Import: streamlit",
            &[Probe::Contains("import streamlit"), Probe::Contains("from streamlit")],
            "streamlit imported",
            "Missing import: streamlit",
            Critical,
        ),
        import(
            "import-pandas",
            "Import: pandas",
            &[Probe::Contains("import pandas"), Probe::Contains("from pandas")],
            "pandas imported",
            "Missing import: pandas",
            Warning,
        ),
        import(
            "import-altair",
            "Import: altair",
            &[Probe::Contains("import altair"), Probe::Contains("from altair")],
            "altair imported",
            "Missing import: altair",
            Warning,
        ),
        app_check("app-size", "App size", Rule::MinLines { min: 50 }, Warning),
        // Content quality
        app_check(
            "content-quality",
            "Content quality",
            Rule::Findings {
                findings: CONTENT_ISSUES,
                limit: 3,
                separator: "; ",
                pass: "Content appears to have real data, titles, and rich elements",
                fail: "{issues}",
            },
            Warning,
        ),
        CheckDescriptor {
            precondition: Some(Probe::Contains("alt.Chart(")),
            ..app_check(
                "chart-labels",
                "Chart titles/labels",
                Rule::Findings {
                    findings: CHART_LABEL_ISSUES,
                    limit: CHART_LABEL_ISSUES.len(),
                    separator: "; ",
                    pass: "Charts have axis labels and tooltips",
                    fail: "{issues}",
                },
                Warning,
            )
        },
        // Layout and interactivity
        app_check(
            "layout",
            "Layout elements",
            Rule::Findings {
                findings: LAYOUT_ISSUES,
                limit: 2,
                separator: "; ",
                pass: "Has icon-nav, tiles-panel, and navbar",
                fail: "{issues}",
            },
            Warning,
        ),
        app_check(
            "interactivity",
            "Interactivity",
            Rule::Tally {
                items: INTERACTIVE_ITEMS,
                threshold: 3,
                pass: "Interactive elements: {found}",
                fail: "Limited interactivity (score: {score}/{total}) - add more buttons, expanders, interactive charts",
                empty: None,
            },
            Warning,
        ),
        app_check(
            "chart-variety",
            "Chart variety",
            Rule::Tally {
                items: CHART_KINDS,
                threshold: 3,
                pass: "Chart types: {found}",
                fail: "Chart types: {found}",
                empty: Some("No Altair charts found"),
            },
            Warning,
        ),
        app_check(
            "dark-mode",
            "Dark/Light mode",
            Rule::Holds {
                probe: Probe::AnyOf(&[
                    Probe::Matches(r"st\.toggle\(.*[Dd]ark|[Tt]heme"),
                    Probe::Matches(r"(?i)--bg-primary|dark.*mode|theme.*toggle"),
                ]),
                pass: "Theme toggle present",
                fail: "Consider adding dark/light mode toggle",
            },
            Warning,
        ),
        // Config files
        on(
            "environment-channel",
            "Snowflake channel in environment.yml",
            ENVIRONMENT,
            Rule::Holds {
                probe: Probe::AnyOf(&[
                    Probe::Contains("- snowflake"),
                    Probe::Matches(r"(?s)channels:.*snowflake.*dependencies:"),
                ]),
                pass: "Uses snowflake channel (good)",
                fail: "MUST use 'snowflake' channel, not 'conda-forge'",
            },
            Critical,
        ),
        CheckDescriptor {
            suggestion: Some("Build with: docker build --platform linux/amd64"),
            ..on(
                "dockerfile-base",
                "Dockerfile base image",
                DOCKERFILE,
                Rule::Holds {
                    probe: Probe::Contains("FROM python:"),
                    pass: "Uses Python base image",
                    fail: "Dockerfile should use python:3.11-slim or python:3.12-slim base",
                },
                Warning,
            )
        },
        on(
            "spec-public-endpoint",
            "SPCS public endpoint",
            SPEC_YAML,
            Rule::Holds {
                probe: Probe::Matches(r"(?i)public: true"),
                pass: "Endpoint is public (good)",
                fail: "Add 'public: true' to endpoint",
            },
            Warning,
        ),
        on(
            "ruff-config",
            "Ruff configuration",
            PYPROJECT,
            Rule::Holds {
                probe: Probe::Contains("[tool.ruff]"),
                pass: "pyproject.toml has ruff config",
                fail: "Add [tool.ruff] section to pyproject.toml",
            },
            Warning,
        ),
        on(
            "python-version",
            "Python 3.13+",
            PYPROJECT,
            Rule::Holds {
                probe: Probe::Matches(r#"requires-python\s*=\s*["']>=3\.1[3-9]"#),
                pass: "Python >=3.13 specified",
                fail: "Update requires-python to >=3.13",
            },
            Warning,
        ),
        streamlit_pin(
            "streamlit-pyproject",
            "Streamlit 1.51+ in pyproject.toml",
            PYPROJECT,
            "Streamlit >=1.51 in pyproject.toml",
            "Update Streamlit to >=1.51 in pyproject.toml",
        ),
        streamlit_pin(
            "streamlit-requirements",
            "Streamlit 1.51+ in requirements.txt",
            REQUIREMENTS,
            "Streamlit >=1.51 in requirements.txt",
            "Update Streamlit to >=1.51 in requirements.txt",
        ),
        streamlit_pin(
            "streamlit-spcs-requirements",
            "Streamlit 1.51+ in spcs/requirements-spcs.txt",
            SPCS_REQUIREMENTS,
            "Streamlit >=1.51 in spcs/requirements-spcs.txt",
            "Update Streamlit to >=1.51 in spcs/requirements-spcs.txt",
        ),
        // Tooling
        app_check("ruff-lint", "Ruff linting", Rule::Tool(ToolKind::RuffLint), Warning),
        app_check("ruff-format", "Ruff formatting", Rule::Tool(ToolKind::RuffFormat), Warning),
        app_check("ty", "Type checking (ty)", Rule::Tool(ToolKind::Ty), Warning),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assess::probe::{SourceText, compiled};
    use std::collections::HashSet;

    fn check(id: &str) -> CheckDescriptor {
        default_checks()
            .into_iter()
            .find(|d| d.id == id)
            .unwrap_or_else(|| panic!("no check {}", id))
    }

    fn eval(id: &str, src: &str) -> Option<(bool, String)> {
        check(id)
            .evaluate(&SourceText::new(src))
            .map(|v| (v.passed, v.message))
    }

    fn all_probes(descriptor: &CheckDescriptor) -> Vec<Probe> {
        let mut probes: Vec<Probe> = descriptor.precondition.into_iter().collect();
        match descriptor.rule {
            Rule::Holds { probe, .. } | Rule::Forbidden { probe, .. } => probes.push(probe),
            Rule::Findings { findings, .. } => probes.extend(findings.iter().map(|f| f.when)),
            Rule::Tally { items, .. } => probes.extend(items.iter().map(|i| i.probe)),
            _ => {}
        }
        probes
    }

    #[test]
    fn test_ids_unique_and_patterns_compile() {
        let checks = default_checks();
        let ids: HashSet<_> = checks.iter().map(|d| d.id).collect();
        assert_eq!(ids.len(), checks.len());

        for descriptor in &checks {
            for probe in all_probes(descriptor) {
                for pattern in probe.patterns() {
                    assert!(compiled(pattern).is_some(), "{}: bad pattern {}", descriptor.id, pattern);
                }
            }
        }
    }

    #[test]
    fn test_column_config_usage_is_critical() {
        let d = check("no-column-config");
        assert_eq!(d.severity, Severity::Critical);

        let (passed, msg) = eval("no-column-config", "st.dataframe(df, column_config={\"a\": 1})\n").unwrap();
        assert!(!passed);
        assert!(msg.contains("MUST REMOVE"));

        let (passed, _) = eval("no-column-config", "x = st.column_config.NumberColumn('a')\n").unwrap();
        assert!(!passed);
    }

    #[test]
    fn test_column_config_prose_passes() {
        let src = "# Never use st.column_config here\nst.markdown(\"column_config={} breaks SiS\")\n";
        let (passed, _) = eval("no-column-config", src).unwrap();
        assert!(passed);
    }

    #[test]
    fn test_altair_branches() {
        assert_eq!(
            eval("altair-charts", "import streamlit as st\n").map(|v| v.0),
            Some(true)
        );
        assert!(eval("altair-charts", "alt.Chart(df)").is_none());

        let (passed, _) = eval("altair-import", "c = alt.Chart(df).mark_bar()\n").unwrap();
        assert!(!passed);
        assert!(eval("altair-import", "import altair as alt\nalt.Chart(df)\n").is_none());

        let (passed, _) = eval(
            "explicit-colors",
            "import altair as alt\nalt.Chart(df).mark_bar(color=\"#1F77B4\")\n",
        )
        .unwrap();
        assert!(passed);
    }

    #[test]
    fn test_simple_charts_listed() {
        let (passed, msg) = eval("no-simple-charts", "st.bar_chart(df)\nst.line_chart(df)\n").unwrap();
        assert!(!passed);
        assert_eq!(msg, "Found st.bar_chart, st.line_chart - REPLACE with Altair for color consistency");
    }

    #[test]
    fn test_content_quality_limits_to_three() {
        let (passed, msg) = eval("content-quality", "import streamlit as st\n").unwrap();
        assert!(!passed);
        assert_eq!(msg.split("; ").count(), 3);
        assert!(msg.starts_with("No st.metric()"));
    }

    #[test]
    fn test_content_quality_placeholder_threshold() {
        let src = "st.metric('Revenue', '$1,200')\nView Details Export\nTODAY'S\nRecent Activity\n───\n───\n───\n";
        assert_eq!(eval("content-quality", src).map(|v| v.0), Some(true));

        let src = format!("{}───\n", src);
        let (passed, msg) = eval("content-quality", &src).unwrap();
        assert!(!passed);
        assert!(msg.contains("placeholder"));
    }

    #[test]
    fn test_content_quality_reports_chart_and_title_counts() {
        let src = "st.markdown(\"**Revenue**\")\na = alt.Chart(df)\nb = alt.Chart(df)\nc = alt.Chart(df)\n";
        let (passed, msg) = eval("content-quality", src).unwrap();
        assert!(!passed);
        assert!(
            msg.starts_with("Found 3 charts but only 1 title headers - add st.markdown('**Title**')"),
            "{}",
            msg
        );
    }

    #[test]
    fn test_chart_labels_skipped_without_charts() {
        assert!(eval("chart-labels", "st.metric('a', 1)").is_none());
        let src = "alt.Chart(df).encode(x=alt.X('m', title='Month'), y=alt.Y('v', title='Value'), tooltip=['m'])";
        assert_eq!(eval("chart-labels", src).map(|v| v.0), Some(true));
    }

    #[test]
    fn test_layout_reports_first_two() {
        let (passed, msg) = eval("layout", "").unwrap();
        assert!(!passed);
        assert_eq!(msg.split("; ").count(), 2);
    }

    #[test]
    fn test_interactivity_tally() {
        let src = "st.button('a')\nst.button('b')\nst.button('c')\nst.session_state.x = 1\nst.tabs(['a'])\n";
        let (passed, msg) = eval("interactivity", src).unwrap();
        assert!(passed);
        assert_eq!(msg, "Interactive elements: 3 buttons, session_state, tabs");

        let (passed, msg) = eval("interactivity", "st.tabs(['a'])").unwrap();
        assert!(!passed);
        assert!(msg.contains("score: 1/5"));
    }

    #[test]
    fn test_app_size() {
        let short = "import streamlit as st\n".repeat(10);
        let (passed, msg) = eval("app-size", &short).unwrap();
        assert!(!passed);
        assert_eq!(msg, "App only has 10 lines - may be incomplete");
    }

    #[test]
    fn test_config_files() {
        assert_eq!(
            eval("environment-channel", "channels:\n  - snowflake\ndependencies:\n  - python\n").map(|v| v.0),
            Some(true)
        );
        assert_eq!(
            eval("environment-channel", "channels:\n  - conda-forge\n").map(|v| v.0),
            Some(false)
        );
        assert_eq!(
            eval("python-version", "requires-python = \">=3.13\"\n").map(|v| v.0),
            Some(true)
        );
        assert_eq!(
            eval("streamlit-pyproject", "dependencies = [\"streamlit>=1.51.0\"]\n").map(|v| v.0),
            Some(true)
        );
        assert_eq!(
            eval("streamlit-pyproject", "dependencies = [\"streamlit>=1.40\"]\n").map(|v| v.0),
            Some(false)
        );
    }

    #[test]
    fn test_deployment_scopes() {
        for id in ["file-environment", "file-snowflake", "file-dockerfile", "file-spec-yaml"] {
            let d = check(id);
            assert_eq!(d.effective_severity(false), Severity::Critical);
            assert_eq!(d.effective_severity(true), Severity::Warning);
        }
        assert_eq!(check("file-app").effective_severity(true), Severity::Critical);
        assert_eq!(check("file-requirements").effective_severity(false), Severity::Warning);
    }
}
