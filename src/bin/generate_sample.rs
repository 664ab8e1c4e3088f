use std::sync::Arc;

use arrow::array::{Float64Array, Int32Array, StringArray, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn in_range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + self.next_f64() * (hi - lo)
    }

    /// Pick from a weighted list; weights need not sum to anything.
    fn pick<'a>(&mut self, items: &[(&'a str, u32)]) -> &'a str {
        let total: u32 = items.iter().map(|(_, w)| w).sum();
        let mut roll = (self.next_u64() % total as u64) as u32;
        for (item, weight) in items {
            if roll < *weight {
                return item;
            }
            roll -= weight;
        }
        items[items.len() - 1].0
    }
}

struct Row {
    country: String,
    year: i32,
    attack_type: String,
    vulnerability_type: String,
    defense_mechanism: String,
    attack_source: String,
    target_industry: String,
    loss_musd: f64,
    affected_users: u64,
    resolution_hours: f64,
}

const HEADERS: [&str; 10] = [
    "Country",
    "Year",
    "Attack Type",
    "Security Vulnerability Type",
    "Defense Mechanism Used",
    "Attack Source",
    "Target Industry",
    "Financial Loss (in Million $)",
    "Number of Affected Users",
    "Incident Resolution Time (in Hours)",
];

fn main() {
    let mut rng = SimpleRng::new(42);

    let countries = ["USA", "UK", "Germany", "India", "Brazil", "Japan", "Australia", "France"];
    let attack_types: [(&str, u32); 6] = [
        ("Phishing", 6),
        ("Ransomware", 5),
        ("DDoS", 4),
        ("Malware", 4),
        ("SQL Injection", 2),
        ("Man-in-the-Middle", 1),
    ];
    let vulnerabilities: [(&str, u32); 4] = [
        ("Weak Passwords", 4),
        ("Social Engineering", 3),
        ("Unpatched Software", 3),
        ("Zero-day", 2),
    ];
    let defenses: [(&str, u32); 5] = [
        ("Firewall", 4),
        ("Antivirus", 4),
        ("VPN", 3),
        ("Encryption", 3),
        ("AI-based Detection", 2),
    ];
    let sources: [(&str, u32); 4] = [
        ("Hacker Group", 5),
        ("Nation-state", 3),
        ("Insider", 2),
        ("Unknown", 2),
    ];
    let industries: [(&str, u32); 7] = [
        ("IT", 4),
        ("Banking", 4),
        ("Healthcare", 3),
        ("Retail", 3),
        ("Government", 3),
        ("Education", 2),
        ("Telecommunications", 2),
    ];

    let mut rows = Vec::new();
    for year in 2015..=2024 {
        for country in &countries {
            let incidents = 3 + (rng.next_u64() % 4) as usize;
            for _ in 0..incidents {
                // Skewed so small incidents dominate but the critical and
                // high-severity tails stay populated.
                let loss_musd = rng.in_range(0.5, 120.0) * rng.next_f64();
                let affected_users = (rng.next_f64().powi(2) * 1_500_000.0) as u64;
                let resolution_hours = rng.in_range(1.0, 96.0);

                rows.push(Row {
                    country: country.to_string(),
                    year,
                    attack_type: rng.pick(&attack_types).to_string(),
                    vulnerability_type: rng.pick(&vulnerabilities).to_string(),
                    defense_mechanism: rng.pick(&defenses).to_string(),
                    attack_source: rng.pick(&sources).to_string(),
                    target_industry: rng.pick(&industries).to_string(),
                    loss_musd,
                    affected_users,
                    resolution_hours,
                });
            }
        }
    }

    write_csv(&rows, "sample_incidents.csv");
    write_parquet(&rows, "sample_incidents.parquet");
    println!("Wrote {} incidents to sample_incidents.{{csv,parquet}}", rows.len());
}

fn write_csv(rows: &[Row], path: &str) {
    let mut writer = csv::Writer::from_path(path).expect("Failed to create CSV file");
    writer.write_record(HEADERS).expect("Failed to write CSV header");
    for row in rows {
        let year = row.year.to_string();
        let loss = format!("{:.2}", row.loss_musd);
        let users = row.affected_users.to_string();
        let hours = format!("{:.1}", row.resolution_hours);
        writer
            .write_record([
                row.country.as_str(),
                year.as_str(),
                row.attack_type.as_str(),
                row.vulnerability_type.as_str(),
                row.defense_mechanism.as_str(),
                row.attack_source.as_str(),
                row.target_industry.as_str(),
                loss.as_str(),
                users.as_str(),
                hours.as_str(),
            ])
            .expect("Failed to write CSV row");
    }
    writer.flush().expect("Failed to flush CSV");
}

fn write_parquet(rows: &[Row], path: &str) {
    let schema = Arc::new(Schema::new(vec![
        Field::new(HEADERS[0], DataType::Utf8, false),
        Field::new(HEADERS[1], DataType::Int32, false),
        Field::new(HEADERS[2], DataType::Utf8, false),
        Field::new(HEADERS[3], DataType::Utf8, false),
        Field::new(HEADERS[4], DataType::Utf8, false),
        Field::new(HEADERS[5], DataType::Utf8, false),
        Field::new(HEADERS[6], DataType::Utf8, false),
        Field::new(HEADERS[7], DataType::Float64, false),
        Field::new(HEADERS[8], DataType::UInt64, false),
        Field::new(HEADERS[9], DataType::Float64, false),
    ]));

    let strings = |f: fn(&Row) -> &str| -> StringArray {
        rows.iter().map(f).collect::<Vec<_>>().into()
    };

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(strings(|r| &r.country)),
            Arc::new(Int32Array::from_iter_values(rows.iter().map(|r| r.year))),
            Arc::new(strings(|r| &r.attack_type)),
            Arc::new(strings(|r| &r.vulnerability_type)),
            Arc::new(strings(|r| &r.defense_mechanism)),
            Arc::new(strings(|r| &r.attack_source)),
            Arc::new(strings(|r| &r.target_industry)),
            Arc::new(Float64Array::from_iter_values(
                rows.iter().map(|r| r.loss_musd),
            )),
            Arc::new(UInt64Array::from_iter_values(
                rows.iter().map(|r| r.affected_users),
            )),
            Arc::new(Float64Array::from_iter_values(
                rows.iter().map(|r| r.resolution_hours),
            )),
        ],
    )
    .expect("Failed to create RecordBatch");

    let file = std::fs::File::create(path).expect("Failed to create output file");
    let mut writer = ArrowWriter::try_new(file, schema, None).expect("Failed to create writer");
    writer.write(&batch).expect("Failed to write batch");
    writer.close().expect("Failed to close writer");
}
