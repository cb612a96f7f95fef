//! Writes small synthetic versions of the four dashboard CSV files.
//!
//! Usage: `generate_sample [OUTPUT_DIR]` (default `sample_data`).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Days, NaiveDate};

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
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
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

    fn below(&mut self, n: u64) -> u64 {
        self.next_u64() % n.max(1)
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[self.below(items.len() as u64) as usize]
    }

    /// Heavy-tailed positive value with the given median.
    fn skewed(&mut self, median: f64) -> f64 {
        median * (-(1.0 - self.next_f64()).max(1e-12).ln()) / std::f64::consts::LN_2
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn writer(dir: &Path, file: &str) -> Result<csv::Writer<std::fs::File>> {
    let path = dir.join(file);
    csv::Writer::from_path(&path).with_context(|| format!("failed to create {}", path.display()))
}

fn video_game_sales(dir: &Path, rng: &mut SimpleRng) -> Result<usize> {
    const PLATFORMS: &[&str] = &["Wii", "PS2", "PS3", "X360", "DS", "GBA", "PC", "PS4"];
    const GENRES: &[&str] = &[
        "Action", "Sports", "Shooter", "Role-Playing", "Platform", "Racing", "Puzzle",
        "Misc", "Simulation", "Fighting", "Adventure", "Strategy",
    ];
    const PUBLISHERS: &[&str] = &[
        "Nintendo", "Electronic Arts", "Activision", "Sony Computer Entertainment",
        "Ubisoft", "Take-Two Interactive", "THQ", "Konami Digital Entertainment",
        "Sega", "Namco Bandai Games", "Microsoft Game Studios", "Capcom", "Atari",
        "Square Enix", "Warner Bros. Interactive",
    ];

    let mut w = writer(dir, "vgsales.csv")?;
    w.write_record([
        "Rank", "Name", "Platform", "Year", "Genre", "Publisher", "NA_Sales", "EU_Sales",
        "JP_Sales", "Other_Sales", "Global_Sales",
    ])?;

    let rows = 400;
    for rank in 1..=rows {
        let na = round2(rng.skewed(0.3));
        let eu = round2(rng.skewed(0.15));
        let jp = round2(rng.skewed(0.05));
        let other = round2(rng.skewed(0.05));
        let year = if rng.below(40) == 0 {
            "N/A".to_string()
        } else {
            (1990 + rng.below(27)).to_string()
        };
        w.write_record([
            rank.to_string(),
            format!("Game {rank}"),
            rng.pick(PLATFORMS).to_string(),
            year,
            rng.pick(GENRES).to_string(),
            rng.pick(PUBLISHERS).to_string(),
            na.to_string(),
            eu.to_string(),
            jp.to_string(),
            other.to_string(),
            round2(na + eu + jp + other).to_string(),
        ])?;
    }
    w.flush()?;
    Ok(rows)
}

fn microenterprise_taxpayers(dir: &Path, rng: &mut SimpleRng) -> Result<usize> {
    let first = NaiveDate::from_ymd_opt(2010, 9, 1).context("invalid start date")?;
    let last = NaiveDate::from_ymd_opt(2024, 12, 31).context("invalid end date")?;
    let span = (last - first).num_days() as u64;

    let mut w = writer(dir, "pdb_munmaksataji_odata.csv")?;
    w.write_record(["Regcode", "Name", "Registrets", "Izslegts", "Aktivs"])?;

    let rows = 500;
    for i in 0..rows {
        let registered = first + Days::new(rng.below(span));
        let remaining = (last - registered).num_days().max(1) as u64;
        let deregistered = (rng.below(5) < 2)
            .then(|| registered + Days::new(1 + rng.below(remaining)))
            .filter(|d| *d <= last);
        w.write_record([
            format!("4000{:07}", i + 1),
            format!("SIA Uzņēmums {}", i + 1),
            registered.format("%d.%m.%Y").to_string(),
            deregistered
                .map(|d| d.format("%d.%m.%Y").to_string())
                .unwrap_or_default(),
            if deregistered.is_some() { "nav" } else { "ir" }.to_string(),
        ])?;
    }
    w.flush()?;
    Ok(rows)
}

fn couples_survey(dir: &Path, rng: &mut SimpleRng) -> Result<usize> {
    const MET: &[&str] = &["met offline", "met online"];
    const QUALITY: &[&str] = &["excellent", "good", "fair", "poor", "very poor"];

    let mut w = writer(dir, "HCMST_ver_3.04.csv")?;
    w.write_record([
        "caseid_new",
        "q24_met_online",
        "relationship_quality",
        "how_long_relationship",
        "age_difference",
    ])?;

    let rows = 300;
    for i in 0..rows {
        let online = rng.below(5) == 0;
        let duration = if online {
            rng.next_f64() * 12.0
        } else {
            rng.next_f64() * 45.0
        };
        let duration = if rng.below(50) == 0 {
            String::new()
        } else {
            format!("{:.2}", duration)
        };
        // Better relationships are more common.
        let quality = QUALITY[(rng.below(3) * rng.below(3)).min(4) as usize];
        w.write_record([
            (i + 1).to_string(),
            MET[usize::from(online)].to_string(),
            quality.to_string(),
            duration,
            rng.skewed(3.0).round().to_string(),
        ])?;
    }
    w.flush()?;
    Ok(rows)
}

fn ev_row(
    w: &mut csv::Writer<std::fs::File>,
    region: &str,
    parameter: &str,
    powertrain: &str,
    year: i32,
    unit: &str,
    value: &str,
) -> Result<()> {
    let year = year.to_string();
    w.write_record([region, "Historical", parameter, "Cars", powertrain, year.as_str(), unit, value])?;
    Ok(())
}

fn ev_sales(dir: &Path, rng: &mut SimpleRng) -> Result<usize> {
    const REGIONS: &[(&str, f64)] = &[
        ("World", 1.0),
        ("China", 0.55),
        ("Europe", 0.25),
        ("USA", 0.1),
        ("Norway", 0.01),
        ("Germany", 0.06),
        ("France", 0.03),
        ("Japan", 0.01),
    ];

    let mut w = writer(dir, "IEA-EV-dataEV salesHistoricalCars.csv")?;
    w.write_record(["region", "category", "parameter", "mode", "powertrain", "year", "unit", "value"])?;

    let mut rows = 0;
    for &(region, scale) in REGIONS {
        let mut stock = [0.0f64; 2];
        for year in 2012..=2023 {
            let growth = 1.45f64.powi(year - 2012);
            let mut year_sales = 0.0;
            for (k, powertrain) in ["BEV", "PHEV"].into_iter().enumerate() {
                let share = if k == 0 { 0.65 } else { 0.35 };
                let sales =
                    (60_000.0 * growth * scale * share * (0.8 + 0.4 * rng.next_f64())).round();
                stock[k] += sales;
                year_sales += sales;
                ev_row(&mut w, region, "EV sales", powertrain, year, "Vehicles", &sales.to_string())?;
                ev_row(&mut w, region, "EV stock", powertrain, year, "Vehicles", &stock[k].to_string())?;
                rows += 2;
            }
            let market = 70_000_000.0 * scale;
            let sales_share = (year_sales / market * 100.0).min(95.0);
            let stock_share = (stock.iter().sum::<f64>() / (market * 12.0) * 100.0).min(60.0);
            ev_row(&mut w, region, "EV sales share", "EV", year, "percent", &format!("{sales_share:.2}"))?;
            ev_row(&mut w, region, "EV stock share", "EV", year, "percent", &format!("{stock_share:.2}"))?;
            rows += 2;
        }
    }
    w.flush()?;
    Ok(rows)
}

fn main() -> Result<()> {
    let dir = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from("sample_data"), PathBuf::from);
    std::fs::create_dir_all(&dir).with_context(|| format!("failed to create {}", dir.display()))?;

    let mut rng = SimpleRng::new(42);
    let written = [
        ("vgsales.csv", video_game_sales(&dir, &mut rng)?),
        ("pdb_munmaksataji_odata.csv", microenterprise_taxpayers(&dir, &mut rng)?),
        ("HCMST_ver_3.04.csv", couples_survey(&dir, &mut rng)?),
        ("IEA-EV-dataEV salesHistoricalCars.csv", ev_sales(&dir, &mut rng)?),
    ];
    for (file, rows) in written {
        println!("Wrote {rows} rows to {}", dir.join(file).display());
    }
    Ok(())
}
