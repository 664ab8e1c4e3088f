use serde::Serialize;

use crate::data::aggregate::{
    count_by, cross_tab, flow_tally, impact_by_year_country, mean_by, most_common, overview,
    severity_breakdown, subset, sum_by, top_by_pair, Category, CountRow, CrossTab, FlowTally,
    MeanRow, Measure, Overview, PairTopRow, SumRow, YearCountryImpact,
};
use crate::data::model::Incident;
use crate::state::{Scope, SessionState};

// ---------------------------------------------------------------------------
// Report assembly
// ---------------------------------------------------------------------------

/// Focus values for the sections the dashboard drives with a select box.
/// Unset values default to the most common value in the current view.
#[derive(Debug, Clone, Default)]
pub struct Focus {
    pub attack_type: Option<String>,
    pub industry: Option<String>,
    pub source: Option<String>,
    pub year: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct FocusedCounts {
    pub focus: Option<String>,
    pub rows: Vec<CountRow>,
}

#[derive(Debug, Serialize)]
pub struct FocusedTop {
    pub focus: Option<String>,
    pub top: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct YearlyCrossTab {
    pub year: Option<i32>,
    pub tab: CrossTab,
}

/// Every chart input of the dashboard, already aggregated.
///
/// Sections marked "full set" are computed against the unfiltered enriched
/// dataset, exactly as the dashboard does; the rest use the filtered view.
#[derive(Debug, Serialize)]
pub struct DashboardReport {
    pub overview: Overview,
    pub incidents_by_year: Vec<CountRow>,
    pub defense_by_attack: FocusedCounts,
    pub severity_by_attack: FocusedCounts,
    pub avg_users_by_attack: Vec<MeanRow>,
    pub attacks_by_industry: FocusedCounts,
    pub attacks_by_source: FocusedCounts,
    pub loss_by_industry: Vec<SumRow>,
    pub incidents_by_vulnerability: Vec<CountRow>,
    pub complexity_breakdown: Vec<CountRow>,
    pub vector_breakdown: Vec<CountRow>,
    pub avg_resolution_by_defense: Vec<MeanRow>,
    pub top_attack_by_country_industry: Vec<PairTopRow>,
    pub impact_by_year_country: Vec<YearCountryImpact>,
    pub attack_flow: FlowTally,
    pub top_attack_for_source: FocusedTop,
    /// Full set.
    pub critical_by_attack: Vec<CountRow>,
    /// Full set.
    pub defense_effectiveness: Vec<CountRow>,
    /// Full set.
    pub severity_by_attack_type: CrossTab,
    /// Full set, one year.
    pub defense_vs_effectiveness: YearlyCrossTab,
    /// Full set, one year.
    pub defense_vs_severity: YearlyCrossTab,
}

/// How many middle-stage values the attack-flow tally keeps.
const FLOW_KEEP_TOP: usize = 5;

/// Assemble the full report for the session's current selection.
pub fn build(state: &SessionState, focus: &Focus) -> DashboardReport {
    let filtered = state.records(Scope::Filtered);
    let full = state.records(Scope::Full);

    let focus_attack = focus
        .attack_type
        .clone()
        .or_else(|| most_common(filtered.iter().copied(), Category::AttackType).ok());
    let focus_industry = focus
        .industry
        .clone()
        .or_else(|| most_common(filtered.iter().copied(), Category::TargetIndustry).ok());
    let focus_source = focus
        .source
        .clone()
        .or_else(|| most_common(filtered.iter().copied(), Category::AttackSource).ok());
    let focus_year = focus.year.or_else(|| {
        state
            .dataset
            .as_ref()
            .and_then(|ds| ds.year_span)
            .map(|(lo, _)| lo)
    });

    let severity_by_attack = FocusedCounts {
        focus: focus_attack.clone(),
        rows: match focus_attack.as_deref() {
            Some(attack) => severity_breakdown(subset(
                filtered.iter().copied(),
                Category::AttackType,
                attack,
            ))
            .iter()
            .map(|(sev, count)| CountRow {
                key: sev.as_str().to_string(),
                count: *count,
            })
            .collect(),
            None => Vec::new(),
        },
    };

    let top_attack_for_source = FocusedTop {
        focus: focus_source.clone(),
        top: focus_source.as_deref().and_then(|source| {
            most_common(
                subset(filtered.iter().copied(), Category::AttackSource, source),
                Category::AttackType,
            )
            .ok()
        }),
    };

    DashboardReport {
        overview: overview(filtered.iter().copied()),
        incidents_by_year: count_by(filtered.iter().copied(), Category::Year),
        defense_by_attack: focused_counts(
            &filtered,
            focus_attack.as_deref(),
            Category::AttackType,
            Category::DefenseMechanism,
        ),
        severity_by_attack,
        avg_users_by_attack: mean_by(
            filtered.iter().copied(),
            Category::AttackType,
            Measure::AffectedUsers,
        ),
        attacks_by_industry: focused_counts(
            &filtered,
            focus_industry.as_deref(),
            Category::TargetIndustry,
            Category::AttackType,
        ),
        attacks_by_source: focused_counts(
            &filtered,
            focus_source.as_deref(),
            Category::AttackSource,
            Category::AttackType,
        ),
        loss_by_industry: sum_by(
            filtered.iter().copied(),
            Category::TargetIndustry,
            Measure::FinancialLoss,
        ),
        incidents_by_vulnerability: count_by(
            filtered.iter().copied(),
            Category::VulnerabilityType,
        ),
        complexity_breakdown: count_by(filtered.iter().copied(), Category::AttackComplexity),
        vector_breakdown: count_by(filtered.iter().copied(), Category::AttackVectorType),
        avg_resolution_by_defense: mean_by(
            filtered.iter().copied(),
            Category::DefenseMechanism,
            Measure::ResolutionHours,
        ),
        top_attack_by_country_industry: top_by_pair(
            filtered.iter().copied(),
            Category::Country,
            Category::TargetIndustry,
            Category::AttackType,
        ),
        impact_by_year_country: impact_by_year_country(filtered.iter().copied()),
        attack_flow: flow_tally(
            filtered.iter().copied(),
            Category::AttackSource,
            Category::AttackType,
            Category::TargetIndustry,
            FLOW_KEEP_TOP,
        ),
        top_attack_for_source,
        critical_by_attack: count_by(
            full.iter().copied().filter(|inc| inc.critical),
            Category::AttackType,
        ),
        defense_effectiveness: count_by(full.iter().copied(), Category::DefenseEffectiveness),
        severity_by_attack_type: cross_tab(
            full.iter().copied(),
            Category::AttackType,
            Category::Severity,
        ),
        defense_vs_effectiveness: yearly_cross_tab(
            &full,
            focus_year,
            Category::DefenseMechanism,
            Category::DefenseEffectiveness,
        ),
        defense_vs_severity: yearly_cross_tab(
            &full,
            focus_year,
            Category::DefenseMechanism,
            Category::Severity,
        ),
    }
}

fn focused_counts(
    records: &[&Incident],
    focus: Option<&str>,
    by: Category,
    count: Category,
) -> FocusedCounts {
    let rows = match focus {
        Some(value) => count_by(subset(records.iter().copied(), by, value), count),
        None => Vec::new(),
    };
    FocusedCounts {
        focus: focus.map(str::to_owned),
        rows,
    }
}

fn yearly_cross_tab(
    records: &[&Incident],
    year: Option<i32>,
    row_cat: Category,
    col_cat: Category,
) -> YearlyCrossTab {
    let tab = match year {
        Some(y) => cross_tab(
            records.iter().copied().filter(|inc| inc.year == y),
            row_cat,
            col_cat,
        ),
        None => cross_tab(std::iter::empty(), row_cat, col_cat),
    };
    YearlyCrossTab { year, tab }
}

// ---------------------------------------------------------------------------
// Text rendering
// ---------------------------------------------------------------------------

/// Render the report as aligned plain-text tables.
pub fn render_text(report: &DashboardReport) -> String {
    let mut out = String::new();
    out.push_str("Cybersecurity Analytics Dashboard\n");
    out.push_str("=================================\n");

    section(&mut out, "Overview");
    let ov = &report.overview;
    two_col(
        &mut out,
        &[
            ("Total incidents".to_string(), ov.total_incidents.to_string()),
            (
                "Total financial loss".to_string(),
                format!("${:.1}M", ov.total_loss_musd),
            ),
            (
                "Avg affected users".to_string(),
                ov.mean_affected_users
                    .map(|m| format!("{m:.0}"))
                    .unwrap_or_else(|| "-".to_string()),
            ),
            (
                "Countries affected".to_string(),
                ov.countries_affected.to_string(),
            ),
        ],
    );

    section(&mut out, "Incidents by Year");
    counts_block(&mut out, &report.incidents_by_year);

    focused_section(
        &mut out,
        "Defense Mechanisms by Attack Type",
        &report.defense_by_attack,
    );
    focused_section(&mut out, "Severity Distribution", &report.severity_by_attack);

    section(&mut out, "Average Affected Users by Attack Type");
    two_col(
        &mut out,
        &report
            .avg_users_by_attack
            .iter()
            .map(|r| (r.key.clone(), format!("{:.0}", r.mean)))
            .collect::<Vec<_>>(),
    );

    focused_section(&mut out, "Attack Types by Industry", &report.attacks_by_industry);
    focused_section(&mut out, "Attack Types by Source", &report.attacks_by_source);

    section(&mut out, "Total Financial Loss by Industry");
    two_col(
        &mut out,
        &report
            .loss_by_industry
            .iter()
            .map(|r| (r.key.clone(), format!("${:.1}M", r.total)))
            .collect::<Vec<_>>(),
    );

    section(&mut out, "Incidents by Vulnerability Type");
    counts_block(&mut out, &report.incidents_by_vulnerability);

    section(&mut out, "Attack Complexity");
    counts_block(&mut out, &report.complexity_breakdown);

    section(&mut out, "Attack Vector Type");
    counts_block(&mut out, &report.vector_breakdown);

    section(&mut out, "Avg Resolution Time by Defense Mechanism");
    two_col(
        &mut out,
        &report
            .avg_resolution_by_defense
            .iter()
            .map(|r| (r.key.clone(), format!("{:.1} h", r.mean)))
            .collect::<Vec<_>>(),
    );

    section(&mut out, "Top Attack Type per Country & Industry");
    two_col(
        &mut out,
        &report
            .top_attack_by_country_industry
            .iter()
            .map(|r| {
                (
                    format!("{} / {}", r.a, r.b),
                    format!("{} ({})", r.top, r.count),
                )
            })
            .collect::<Vec<_>>(),
    );

    section(&mut out, "Most Common Attack Type by Country Over Time");
    two_col(
        &mut out,
        &report
            .impact_by_year_country
            .iter()
            .map(|r| {
                (
                    format!("{} / {}", r.year, r.country),
                    format!(
                        "{} (${:.1}M, {} users)",
                        r.top_attack, r.total_loss_musd, r.total_affected_users
                    ),
                )
            })
            .collect::<Vec<_>>(),
    );

    section(&mut out, "Attack Flow: Source -> Type -> Industry");
    flow_block(&mut out, &report.attack_flow);

    section(&mut out, "Most Common Attack Type by Source");
    match (&report.top_attack_for_source.focus, &report.top_attack_for_source.top) {
        (Some(source), Some(top)) => {
            out.push_str(&format!("  Most common attack from '{source}': {top}\n"))
        }
        _ => out.push_str("  (no data for selection)\n"),
    }

    section(&mut out, "Critical Incidents by Attack Type [full dataset]");
    counts_block(&mut out, &report.critical_by_attack);

    section(&mut out, "Defense Effectiveness [full dataset]");
    counts_block(&mut out, &report.defense_effectiveness);

    section(&mut out, "Attack Type vs Severity [full dataset]");
    cross_tab_block(&mut out, &report.severity_by_attack_type);

    let eff = &report.defense_vs_effectiveness;
    section(
        &mut out,
        &yearly_title("Defense Mechanism vs Effectiveness", eff.year),
    );
    cross_tab_block(&mut out, &eff.tab);

    let sev = &report.defense_vs_severity;
    section(
        &mut out,
        &yearly_title("Defense Mechanism vs Severity", sev.year),
    );
    cross_tab_block(&mut out, &sev.tab);

    out
}

fn yearly_title(base: &str, year: Option<i32>) -> String {
    match year {
        Some(y) => format!("{base} in {y} [full dataset]"),
        None => format!("{base} [full dataset]"),
    }
}

fn section(out: &mut String, title: &str) {
    out.push('\n');
    out.push_str(title);
    out.push('\n');
    for _ in 0..title.len() {
        out.push('-');
    }
    out.push('\n');
}

fn focused_section(out: &mut String, title: &str, counts: &FocusedCounts) {
    match &counts.focus {
        Some(focus) => section(out, &format!("{title} ({focus})")),
        None => section(out, title),
    }
    counts_block(out, &counts.rows);
}

fn counts_block(out: &mut String, rows: &[CountRow]) {
    two_col(
        out,
        &rows
            .iter()
            .map(|r| (r.key.clone(), r.count.to_string()))
            .collect::<Vec<_>>(),
    );
}

fn two_col(out: &mut String, rows: &[(String, String)]) {
    if rows.is_empty() {
        out.push_str("  (no data for selection)\n");
        return;
    }
    let width = rows.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    for (key, value) in rows {
        out.push_str(&format!("  {key:<width$}  {value}\n"));
    }
}

fn flow_block(out: &mut String, flow: &FlowTally) {
    if flow.first_stage.is_empty() && flow.second_stage.is_empty() {
        out.push_str("  (no data for selection)\n");
        return;
    }
    out.push_str(&format!("  Top attack types: {}\n", flow.kept.join(", ")));
    for edge in flow.first_stage.iter().chain(&flow.second_stage) {
        out.push_str(&format!("  {} -> {}  {}\n", edge.from, edge.to, edge.weight));
    }
}

fn cross_tab_block(out: &mut String, tab: &CrossTab) {
    if tab.rows.is_empty() {
        out.push_str("  (no data for selection)\n");
        return;
    }
    let row_totals = tab.row_totals();
    let col_totals = tab.col_totals();
    let row_width = tab
        .rows
        .iter()
        .map(String::len)
        .max()
        .unwrap_or(0)
        .max("Total".len());
    let col_widths: Vec<usize> = tab
        .cols
        .iter()
        .enumerate()
        .map(|(j, col)| {
            tab.counts
                .iter()
                .map(|row| row[j].to_string().len())
                .max()
                .unwrap_or(0)
                .max(col.len())
                .max(col_totals[j].to_string().len())
        })
        .collect();
    let total_width = "Total".len().max(
        row_totals
            .iter()
            .map(|t| t.to_string().len())
            .max()
            .unwrap_or(0),
    );

    out.push_str(&format!("  {:<row_width$}", ""));
    for (col, &w) in tab.cols.iter().zip(&col_widths) {
        out.push_str(&format!("  {col:>w$}"));
    }
    out.push_str(&format!("  {:>total_width$}\n", "Total"));

    for ((label, row), total) in tab.rows.iter().zip(&tab.counts).zip(&row_totals) {
        out.push_str(&format!("  {label:<row_width$}"));
        for (value, &w) in row.iter().zip(&col_widths) {
            out.push_str(&format!("  {value:>w$}"));
        }
        out.push_str(&format!("  {total:>total_width$}\n"));
    }

    out.push_str(&format!("  {:<row_width$}", "Total"));
    for (total, &w) in col_totals.iter().zip(&col_widths) {
        out.push_str(&format!("  {total:>w$}"));
    }
    let grand: u64 = row_totals.iter().sum();
    out.push_str(&format!("  {grand:>total_width$}\n"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::enrich::enrich;
    use crate::data::model::{IncidentDataset, RawIncident};

    fn raw(
        country: &str,
        year: i32,
        attack: &str,
        users: u64,
        hours: f64,
    ) -> RawIncident {
        RawIncident {
            country: country.to_string(),
            year,
            attack_type: attack.to_string(),
            vulnerability_type: "Zero-day".to_string(),
            defense_mechanism: "Firewall".to_string(),
            attack_source: "Hacker Group".to_string(),
            target_industry: "Banking".to_string(),
            financial_loss_musd: 20.0,
            affected_users: users,
            resolution_hours: hours,
        }
    }

    fn session() -> SessionState {
        let mut state = SessionState::default();
        state.set_dataset(IncidentDataset::from_incidents(enrich(vec![
            raw("US", 2020, "Phishing", 600_000, 60.0),
            raw("US", 2021, "Malware", 100, 10.0),
            raw("UK", 2020, "Phishing", 200, 20.0),
        ])));
        state
    }

    #[test]
    fn full_set_sections_ignore_the_selection() {
        let mut state = session();
        state.set_country(Some("UK".to_string()));
        let report = build(&state, &Focus::default());

        // The UK view has no critical incidents, but the full set does.
        assert_eq!(report.overview.total_incidents, 1);
        assert_eq!(report.critical_by_attack.len(), 1);
        assert_eq!(report.critical_by_attack[0].key, "Phishing");

        let eff_total: u64 = report.defense_effectiveness.iter().map(|r| r.count).sum();
        assert_eq!(eff_total, 3);
    }

    #[test]
    fn focus_defaults_to_most_common_in_view() {
        let state = session();
        let report = build(&state, &Focus::default());
        assert_eq!(report.defense_by_attack.focus.as_deref(), Some("Phishing"));
        assert_eq!(report.top_attack_for_source.top.as_deref(), Some("Phishing"));
    }

    #[test]
    fn vacuous_selection_yields_empty_tables_not_errors() {
        let mut state = session();
        state.set_country(Some("France".to_string()));
        let report = build(&state, &Focus::default());

        assert_eq!(report.overview.total_incidents, 0);
        assert_eq!(report.defense_by_attack.focus, None);
        assert!(report.defense_by_attack.rows.is_empty());
        assert!(report.avg_users_by_attack.is_empty());

        let text = render_text(&report);
        assert!(text.contains("(no data for selection)"));
    }

    #[test]
    fn text_report_lists_every_section() {
        let state = session();
        let report = build(&state, &Focus::default());
        let text = render_text(&report);

        for title in [
            "Overview",
            "Incidents by Year",
            "Defense Mechanisms by Attack Type",
            "Severity Distribution",
            "Average Affected Users by Attack Type",
            "Attack Types by Industry",
            "Attack Types by Source",
            "Total Financial Loss by Industry",
            "Incidents by Vulnerability Type",
            "Attack Complexity",
            "Attack Vector Type",
            "Avg Resolution Time by Defense Mechanism",
            "Top Attack Type per Country & Industry",
            "Most Common Attack Type by Country Over Time",
            "Attack Flow: Source -> Type -> Industry",
            "Critical Incidents by Attack Type",
            "Defense Effectiveness",
            "Attack Type vs Severity",
            "Defense Mechanism vs Effectiveness",
            "Defense Mechanism vs Severity",
        ] {
            assert!(text.contains(title), "missing section: {title}");
        }
    }

    #[test]
    fn report_serializes_to_json() {
        let state = session();
        let report = build(&state, &Focus::default());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["overview"]["total_incidents"], 3);
        assert!(json["severity_by_attack_type"]["rows"].is_array());
    }
}
