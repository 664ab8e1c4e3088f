use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::error::DataError;
use super::model::{Incident, Severity};

// ---------------------------------------------------------------------------
// Group keys and measures
// ---------------------------------------------------------------------------

/// Categorical fields an aggregation can group by.  Covers the six raw
/// categoricals, the year (as its decimal string), and the four string-valued
/// derived fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Country,
    Year,
    AttackType,
    VulnerabilityType,
    DefenseMechanism,
    AttackSource,
    TargetIndustry,
    Severity,
    AttackComplexity,
    DefenseEffectiveness,
    AttackVectorType,
}

impl Category {
    /// Column heading used in reports and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Category::Country => "Country",
            Category::Year => "Year",
            Category::AttackType => "Attack Type",
            Category::VulnerabilityType => "Security Vulnerability Type",
            Category::DefenseMechanism => "Defense Mechanism Used",
            Category::AttackSource => "Attack Source",
            Category::TargetIndustry => "Target Industry",
            Category::Severity => "Severity",
            Category::AttackComplexity => "Attack Complexity",
            Category::DefenseEffectiveness => "Defense Effectiveness",
            Category::AttackVectorType => "Attack Vector Type",
        }
    }

    /// The grouping key of one incident for this category.
    pub fn value_of(&self, inc: &Incident) -> String {
        match self {
            Category::Country => inc.country.clone(),
            Category::Year => inc.year.to_string(),
            Category::AttackType => inc.attack_type.clone(),
            Category::VulnerabilityType => inc.vulnerability_type.clone(),
            Category::DefenseMechanism => inc.defense_mechanism.clone(),
            Category::AttackSource => inc.attack_source.clone(),
            Category::TargetIndustry => inc.target_industry.clone(),
            Category::Severity => inc.severity.as_str().to_string(),
            Category::AttackComplexity => inc.attack_complexity.as_str().to_string(),
            Category::DefenseEffectiveness => inc.defense_effectiveness.as_str().to_string(),
            Category::AttackVectorType => inc.attack_vector_type.as_str().to_string(),
        }
    }
}

/// Numeric fields an aggregation can sum or average.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    FinancialLoss,
    AffectedUsers,
    ResolutionHours,
}

impl Measure {
    pub fn value_of(&self, inc: &Incident) -> f64 {
        match self {
            Measure::FinancialLoss => inc.financial_loss_musd,
            Measure::AffectedUsers => inc.affected_users as f64,
            Measure::ResolutionHours => inc.resolution_hours,
        }
    }
}

// ---------------------------------------------------------------------------
// Result tables
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountRow {
    pub key: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeanRow {
    pub key: String,
    pub mean: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SumRow {
    pub key: String,
    pub total: f64,
}

/// The metric-card numbers for one record set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub total_incidents: u64,
    pub total_loss_musd: f64,
    /// `None` when the record set is empty.
    pub mean_affected_users: Option<f64>,
    pub countries_affected: u64,
}

/// Zero-filled count matrix over two categories.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossTab {
    pub rows: Vec<String>,
    pub cols: Vec<String>,
    /// `counts[i][j]` is the number of records with row value `rows[i]` and
    /// column value `cols[j]`.
    pub counts: Vec<Vec<u64>>,
}

impl CrossTab {
    pub fn row_totals(&self) -> Vec<u64> {
        self.counts.iter().map(|r| r.iter().sum()).collect()
    }

    pub fn col_totals(&self) -> Vec<u64> {
        let mut totals = vec![0u64; self.cols.len()];
        for row in &self.counts {
            for (j, v) in row.iter().enumerate() {
                totals[j] += v;
            }
        }
        totals
    }
}

/// Winner of a top-1-per-group-pair query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairTopRow {
    pub a: String,
    pub b: String,
    pub top: String,
    pub count: u64,
}

/// One `(year, country)` cell of the impact table: dominant attack type plus
/// summed losses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearCountryImpact {
    pub year: i32,
    pub country: String,
    pub top_attack: String,
    pub total_loss_musd: f64,
    pub total_affected_users: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowEdge {
    pub from: String,
    pub to: String,
    pub weight: u64,
}

/// Three-stage flow tally, restricted to the most frequent middle-stage
/// values.  Records whose middle value was not kept appear in neither list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowTally {
    /// Kept middle-stage values, most frequent first.
    pub kept: Vec<String>,
    /// Weighted `first stage → middle stage` edges, sorted by endpoints.
    pub first_stage: Vec<FlowEdge>,
    /// Weighted `middle stage → last stage` edges, sorted by endpoints.
    pub second_stage: Vec<FlowEdge>,
}

// ---------------------------------------------------------------------------
// Aggregation queries
// ---------------------------------------------------------------------------
//
// Every query is a pure function over whatever record set the caller hands
// it – the filtered view or the full enriched set is a per-query choice.
// Records with an empty value for a grouping key are skipped, mirroring how
// the source dataset treats missing categoricals.  Ordered outputs break
// ties on equal counts/means/sums by key, ascending.

/// Narrow a record set to the records with the given value for a category.
pub fn subset<'a, I>(records: I, category: Category, value: &str) -> Vec<&'a Incident>
where
    I: IntoIterator<Item = &'a Incident>,
{
    records
        .into_iter()
        .filter(|inc| category.value_of(inc) == value)
        .collect()
}

/// Count records per category value, descending by count.
pub fn count_by<'a, I>(records: I, category: Category) -> Vec<CountRow>
where
    I: IntoIterator<Item = &'a Incident>,
{
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for inc in records {
        let key = category.value_of(inc);
        if key.is_empty() {
            continue;
        }
        *counts.entry(key).or_insert(0) += 1;
    }

    let mut rows: Vec<CountRow> = counts
        .into_iter()
        .map(|(key, count)| CountRow { key, count })
        .collect();
    // Stable sort keeps the BTreeMap's key order within equal counts.
    rows.sort_by(|a, b| b.count.cmp(&a.count));
    rows
}

/// Average a measure per category value, descending by mean.
pub fn mean_by<'a, I>(records: I, category: Category, measure: Measure) -> Vec<MeanRow>
where
    I: IntoIterator<Item = &'a Incident>,
{
    let mut acc: BTreeMap<String, (f64, u64)> = BTreeMap::new();
    for inc in records {
        let key = category.value_of(inc);
        if key.is_empty() {
            continue;
        }
        let entry = acc.entry(key).or_insert((0.0, 0));
        entry.0 += measure.value_of(inc);
        entry.1 += 1;
    }

    let mut rows: Vec<MeanRow> = acc
        .into_iter()
        .map(|(key, (sum, n))| MeanRow {
            key,
            mean: sum / n as f64,
        })
        .collect();
    rows.sort_by(|a, b| b.mean.total_cmp(&a.mean));
    rows
}

/// Sum a measure per category value, descending by total.
pub fn sum_by<'a, I>(records: I, category: Category, measure: Measure) -> Vec<SumRow>
where
    I: IntoIterator<Item = &'a Incident>,
{
    let mut acc: BTreeMap<String, f64> = BTreeMap::new();
    for inc in records {
        let key = category.value_of(inc);
        if key.is_empty() {
            continue;
        }
        *acc.entry(key).or_insert(0.0) += measure.value_of(inc);
    }

    let mut rows: Vec<SumRow> = acc
        .into_iter()
        .map(|(key, total)| SumRow { key, total })
        .collect();
    rows.sort_by(|a, b| b.total.total_cmp(&a.total));
    rows
}

/// The metric-card numbers: incident count, total loss, mean affected users,
/// distinct countries.
pub fn overview<'a, I>(records: I) -> Overview
where
    I: IntoIterator<Item = &'a Incident>,
{
    let mut total_incidents = 0u64;
    let mut total_loss_musd = 0.0f64;
    let mut users_sum = 0u64;
    let mut countries: BTreeSet<&str> = BTreeSet::new();

    for inc in records {
        total_incidents += 1;
        total_loss_musd += inc.financial_loss_musd;
        users_sum += inc.affected_users;
        if !inc.country.is_empty() {
            countries.insert(&inc.country);
        }
    }

    Overview {
        total_incidents,
        total_loss_musd,
        mean_affected_users: (total_incidents > 0)
            .then(|| users_sum as f64 / total_incidents as f64),
        countries_affected: countries.len() as u64,
    }
}

/// Severity counts in fixed High, Medium, Low order, zero-filled.
pub fn severity_breakdown<'a, I>(records: I) -> [(Severity, u64); 3]
where
    I: IntoIterator<Item = &'a Incident>,
{
    let mut out = [
        (Severity::High, 0),
        (Severity::Medium, 0),
        (Severity::Low, 0),
    ];
    for inc in records {
        match inc.severity {
            Severity::High => out[0].1 += 1,
            Severity::Medium => out[1].1 += 1,
            Severity::Low => out[2].1 += 1,
        }
    }
    out
}

/// Count matrix over two categories, missing combinations filled with 0.
/// Row and column labels are sorted; marginals match the independent one-way
/// counts on the same record set.
pub fn cross_tab<'a, I>(records: I, row_cat: Category, col_cat: Category) -> CrossTab
where
    I: IntoIterator<Item = &'a Incident>,
{
    let mut cells: BTreeMap<(String, String), u64> = BTreeMap::new();
    let mut row_keys: BTreeSet<String> = BTreeSet::new();
    let mut col_keys: BTreeSet<String> = BTreeSet::new();

    for inc in records {
        let r = row_cat.value_of(inc);
        let c = col_cat.value_of(inc);
        if r.is_empty() || c.is_empty() {
            continue;
        }
        row_keys.insert(r.clone());
        col_keys.insert(c.clone());
        *cells.entry((r, c)).or_insert(0) += 1;
    }

    let rows: Vec<String> = row_keys.into_iter().collect();
    let cols: Vec<String> = col_keys.into_iter().collect();
    let counts = rows
        .iter()
        .map(|r| {
            cols.iter()
                .map(|c| {
                    cells
                        .get(&(r.clone(), c.clone()))
                        .copied()
                        .unwrap_or(0)
                })
                .collect()
        })
        .collect();

    CrossTab { rows, cols, counts }
}

/// For each `(a, b)` pair, the most frequent `target` value.  Ties break
/// toward the lexicographically smallest target; output rows are sorted by
/// `(a, b)`.
pub fn top_by_pair<'a, I>(
    records: I,
    cat_a: Category,
    cat_b: Category,
    target: Category,
) -> Vec<PairTopRow>
where
    I: IntoIterator<Item = &'a Incident>,
{
    let mut groups: BTreeMap<(String, String), BTreeMap<String, u64>> = BTreeMap::new();
    for inc in records {
        let a = cat_a.value_of(inc);
        let b = cat_b.value_of(inc);
        let t = target.value_of(inc);
        if a.is_empty() || b.is_empty() || t.is_empty() {
            continue;
        }
        *groups.entry((a, b)).or_default().entry(t).or_insert(0) += 1;
    }

    groups
        .into_iter()
        .map(|((a, b), counts)| {
            let (top, count) = winner(&counts);
            PairTopRow { a, b, top, count }
        })
        .collect()
}

/// Dominant attack type and summed impact per `(year, country)` – the merged
/// table behind the animated map view.
pub fn impact_by_year_country<'a, I>(records: I) -> Vec<YearCountryImpact>
where
    I: IntoIterator<Item = &'a Incident>,
{
    struct Group {
        attacks: BTreeMap<String, u64>,
        loss: f64,
        users: u64,
    }

    let mut groups: BTreeMap<(i32, String), Group> = BTreeMap::new();
    for inc in records {
        if inc.country.is_empty() {
            continue;
        }
        let group = groups
            .entry((inc.year, inc.country.clone()))
            .or_insert_with(|| Group {
                attacks: BTreeMap::new(),
                loss: 0.0,
                users: 0,
            });
        group.loss += inc.financial_loss_musd;
        group.users += inc.affected_users;
        if !inc.attack_type.is_empty() {
            *group.attacks.entry(inc.attack_type.clone()).or_insert(0) += 1;
        }
    }

    groups
        .into_iter()
        .filter(|(_, g)| !g.attacks.is_empty())
        .map(|((year, country), g)| {
            let (top_attack, _) = winner(&g.attacks);
            YearCountryImpact {
                year,
                country,
                top_attack,
                total_loss_musd: g.loss,
                total_affected_users: g.users,
            }
        })
        .collect()
}

/// Tally a three-stage flow `a → b → c`, keeping only the `keep_top` most
/// frequent `b` values (frequency descending, ties lexicographic).  Records
/// with an empty value at any stage are skipped before the ranking.
pub fn flow_tally<'a, I>(
    records: I,
    cat_a: Category,
    cat_b: Category,
    cat_c: Category,
    keep_top: usize,
) -> FlowTally
where
    I: IntoIterator<Item = &'a Incident>,
{
    let staged: Vec<(String, String, String)> = records
        .into_iter()
        .map(|inc| {
            (
                cat_a.value_of(inc),
                cat_b.value_of(inc),
                cat_c.value_of(inc),
            )
        })
        .filter(|(a, b, c)| !a.is_empty() && !b.is_empty() && !c.is_empty())
        .collect();

    let mut b_counts: BTreeMap<&str, u64> = BTreeMap::new();
    for (_, b, _) in &staged {
        *b_counts.entry(b).or_insert(0) += 1;
    }
    let mut ranked: Vec<(&str, u64)> = b_counts.into_iter().collect();
    ranked.sort_by(|x, y| y.1.cmp(&x.1));
    let kept: Vec<String> = ranked
        .into_iter()
        .take(keep_top)
        .map(|(b, _)| b.to_string())
        .collect();
    let kept_set: BTreeSet<&str> = kept.iter().map(String::as_str).collect();

    let mut first: BTreeMap<(String, String), u64> = BTreeMap::new();
    let mut second: BTreeMap<(String, String), u64> = BTreeMap::new();
    for (a, b, c) in &staged {
        if !kept_set.contains(b.as_str()) {
            continue;
        }
        *first.entry((a.clone(), b.clone())).or_insert(0) += 1;
        *second.entry((b.clone(), c.clone())).or_insert(0) += 1;
    }

    let to_edges = |map: BTreeMap<(String, String), u64>| {
        map.into_iter()
            .map(|((from, to), weight)| FlowEdge { from, to, weight })
            .collect()
    };

    FlowTally {
        kept,
        first_stage: to_edges(first),
        second_stage: to_edges(second),
    }
}

/// The single most frequent value of a category (idxmax).  Empty input is a
/// caller-visible [`DataError::EmptyGroup`], never a panic.
pub fn most_common<'a, I>(records: I, category: Category) -> Result<String, DataError>
where
    I: IntoIterator<Item = &'a Incident>,
{
    count_by(records, category)
        .into_iter()
        .next()
        .map(|row| row.key)
        .ok_or(DataError::EmptyGroup(category.name()))
}

/// Most frequent entry of a count map; ties break toward the smaller key.
fn winner(counts: &BTreeMap<String, u64>) -> (String, u64) {
    let mut best: Option<(&str, u64)> = None;
    for (key, &count) in counts {
        // Strictly greater, so the first (smallest) key wins ties.
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((key, count));
        }
    }
    let (key, count) = best.expect("winner called on a non-empty map");
    (key.to_string(), count)
}
