use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime};

const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M";

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

    /// Uniform integer in `0..n`.
    fn below(&mut self, n: u64) -> u64 {
        self.next_u64() % n.max(1)
    }

    /// True with probability `p`.
    fn chance(&mut self, p: f64) -> bool {
        ((self.next_u64() >> 11) as f64 / (1u64 << 53) as f64) < p
    }

    /// Pick from weighted choices.
    fn weighted<'a>(&mut self, choices: &[(&'a str, u64)]) -> &'a str {
        let total: u64 = choices.iter().map(|(_, w)| w).sum();
        let mut roll = self.below(total);
        for (choice, weight) in choices {
            if roll < *weight {
                return *choice;
            }
            roll -= weight;
        }
        choices.last().map_or("", |(c, _)| *c)
    }
}

const HEADER: [&str; 14] = [
    "number",
    "incident_state",
    "active",
    "reassignment_count",
    "made_sla",
    "caller_id",
    "opened_at",
    "sys_created_at",
    "sys_updated_at",
    "category",
    "priority",
    "assignment_group",
    "resolved_at",
    "closed_at",
];

const PRIORITIES: [(&str, u64); 4] = [
    ("1 - Critical", 3),
    ("2 - High", 6),
    ("3 - Moderate", 85),
    ("4 - Low", 6),
];

fn fmt(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let output_path = "incident_event_log.csv";
    let mut writer = csv::Writer::from_path(output_path)
        .with_context(|| format!("creating {output_path}"))?;
    writer.write_record(HEADER)?;

    let start = NaiveDate::from_ymd_opt(2016, 2, 29)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .context("sample start date")?;

    // Category weights skewed so the top-10 chart has a visible tail.
    let categories: Vec<(String, u64)> = (1..=25)
        .map(|i| (format!("Category {}", i * 2 + 1), 60 / i as u64 + 1))
        .collect();
    let category_choices: Vec<(&str, u64)> =
        categories.iter().map(|(c, w)| (c.as_str(), *w)).collect();
    let groups: Vec<String> = (1..=12).map(|i| format!("Group {}", i * 7)).collect();

    let n_incidents = 600;
    let mut rows = 0usize;

    for n in 0..n_incidents {
        let number = format!("INC{:07}", n + 1);
        let opened = start
            + Duration::days(rng.below(90) as i64)
            + Duration::minutes(rng.below(24 * 60) as i64);
        let category = rng.weighted(&category_choices).to_string();
        let priority = rng.weighted(&PRIORITIES).to_string();
        let group = &groups[rng.below(groups.len() as u64) as usize];
        let caller = format!("Caller {}", rng.below(5000));

        // Lifecycle; unfinished incidents stop early and stay active.
        let mut lifecycle = vec!["New", "Active"];
        if rng.chance(0.25) {
            lifecycle.push("Awaiting User Info");
            lifecycle.push("Active");
        }
        let finished = rng.chance(0.85);
        if finished {
            lifecycle.push("Resolved");
            lifecycle.push("Closed");
        }

        let mut updated = opened;
        let mut resolved_at: Option<NaiveDateTime> = None;
        let mut reassignments = 0;
        for (step, state) in lifecycle.iter().enumerate() {
            updated += Duration::minutes(5 + rng.below(60 * 24) as i64);
            if *state == "Resolved" {
                resolved_at = Some(updated);
            }
            if step > 0 && rng.chance(0.1) {
                reassignments += 1;
            }
            let active = !matches!(*state, "Resolved" | "Closed");
            let closed_at = if *state == "Closed" {
                fmt(updated)
            } else {
                "?".to_string()
            };
            // A few malformed cells to exercise missing-value handling.
            let created_at = if rng.chance(0.02) {
                "?".to_string()
            } else {
                fmt(opened)
            };

            let reassignment_count = reassignments.to_string();
            let opened_at = fmt(opened);
            let updated_at = fmt(updated);
            let resolved = resolved_at.map_or_else(|| "?".to_string(), fmt);
            writer.write_record([
                number.as_str(),
                *state,
                if active { "true" } else { "false" },
                reassignment_count.as_str(),
                if rng.chance(0.9) { "true" } else { "false" },
                caller.as_str(),
                opened_at.as_str(),
                created_at.as_str(),
                updated_at.as_str(),
                category.as_str(),
                priority.as_str(),
                group.as_str(),
                resolved.as_str(),
                closed_at.as_str(),
            ])?;
            rows += 1;
        }
    }

    writer.flush()?;
    println!("Wrote {rows} event rows for {n_incidents} incidents to {output_path}");
    Ok(())
}
