use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::PathBuf;

use chrono::{Datelike, NaiveDate};

use super::model::{Column, ColumnKind, Table, Value};
use super::registry::{DatasetDef, Derivation};
use crate::error::DashboardError;

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// Where dataset files come from.
pub trait TableSource {
    /// Human-readable location of the dataset's file, used in errors.
    fn location(&self, def: &DatasetDef) -> String;

    /// Open the dataset's file for reading.
    fn open(&self, def: &DatasetDef) -> io::Result<Box<dyn Read + '_>>;
}

/// Reads dataset files from a directory on disk.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, def: &DatasetDef) -> PathBuf {
        self.root.join(def.file)
    }
}

impl TableSource for DirectorySource {
    fn location(&self, def: &DatasetDef) -> String {
        self.path_for(def).display().to_string()
    }

    fn open(&self, def: &DatasetDef) -> io::Result<Box<dyn Read + '_>> {
        let file = File::open(self.path_for(def))?;
        Ok(Box::new(BufReader::new(file)))
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Read and coerce a dataset from `source`.
pub fn load(def: &DatasetDef, source: &dyn TableSource) -> Result<Table, DashboardError> {
    let reader = source
        .open(def)
        .map_err(|err| unavailable(def, source, err))?;
    read_table(def, reader).map_err(|err| match err {
        ReadError::Io(err) => unavailable(def, source, err),
        ReadError::Schema(e) => e,
    })
}

fn unavailable(def: &DatasetDef, source: &dyn TableSource, err: io::Error) -> DashboardError {
    DashboardError::DataUnavailable {
        dataset: def.id,
        location: source.location(def),
        source: err,
    }
}

enum ReadError {
    Io(io::Error),
    Schema(DashboardError),
}

/// CSV layout: one header row, then one record per row. Only the columns the
/// dataset declares are kept; derived columns are appended after them.
fn read_table<R: Read>(def: &DatasetDef, reader: R) -> Result<Table, ReadError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .byte_headers()
        .map_err(|e| ReadError::Io(e.into()))?
        .iter()
        .map(|h| def.headers.normalize(&String::from_utf8_lossy(h)))
        .collect();

    let positions: Vec<Option<usize>> = def
        .columns
        .iter()
        .map(|c| headers.iter().position(|h| h == c.name))
        .collect();

    let missing: Vec<String> = def
        .columns
        .iter()
        .zip(&positions)
        .filter(|(c, pos)| c.required && pos.is_none())
        .map(|(c, _)| c.name.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ReadError::Schema(DashboardError::SchemaMismatch {
            dataset: def.id,
            missing,
        }));
    }

    let mut rows = Vec::new();
    let mut skipped = 0usize;

    for (row_no, result) in reader.byte_records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) if e.is_io_error() => return Err(ReadError::Io(e.into())),
            Err(e) => {
                log::warn!("{}: skipping CSV row {row_no}: {e}", def.id);
                skipped += 1;
                continue;
            }
        };

        let cells: Vec<Value> = def
            .columns
            .iter()
            .zip(&positions)
            .map(|(c, pos)| {
                pos.and_then(|p| record.get(p))
                    .map(|raw| coerce(&String::from_utf8_lossy(raw), c.kind))
                    .unwrap_or(Value::Missing)
            })
            .collect();

        if cells.iter().all(Value::is_missing) {
            skipped += 1;
            continue;
        }
        rows.push(cells);
    }

    if skipped > 0 {
        log::warn!("{}: dropped {skipped} invalid row(s)", def.id);
    }

    let mut columns: Vec<Column> = def
        .columns
        .iter()
        .map(|c| Column {
            name: c.name.to_string(),
            kind: c.kind,
        })
        .collect();

    for derivation in def.derived {
        derive(derivation, &columns, &mut rows);
        columns.push(Column {
            name: derivation.target().to_string(),
            kind: derivation.kind(),
        });
    }

    Ok(Table::new(columns, rows))
}

// ---------------------------------------------------------------------------
// Coercion
// ---------------------------------------------------------------------------

/// Turn a raw CSV cell into a typed value. Never fails: anything that does
/// not parse as the column's kind becomes `Missing`.
pub fn coerce(raw: &str, kind: ColumnKind) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::Missing;
    }
    match kind {
        ColumnKind::Categorical | ColumnKind::Text => Value::text(trimmed),
        ColumnKind::Numeric => parse_number(trimmed).unwrap_or(Value::Missing),
        ColumnKind::Date(format) => parse_date(trimmed, format)
            .map(Value::Date)
            .unwrap_or(Value::Missing),
    }
}

/// Lenient number parsing: thousands separators, currency symbols and inner
/// spaces are ignored. Non-finite results are rejected.
fn parse_number(s: &str) -> Option<Value> {
    let cleaned: String = s
        .chars()
        .filter(|c| !matches!(c, ',' | '_' | ' ' | '\u{a0}' | '$' | '€' | '£' | '¥'))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    if let Ok(i) = cleaned.parse::<i64>() {
        return Some(Value::Integer(i));
    }
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(Value::Float)
}

fn parse_date(s: &str, format: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, format)
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .ok()
}

// ---------------------------------------------------------------------------
// Derived columns
// ---------------------------------------------------------------------------

/// Append the derived cell to every row. Source columns that are not present
/// yield `Missing` throughout.
fn derive(derivation: &Derivation, columns: &[Column], rows: &mut [Vec<Value>]) {
    let index = |name: &str| columns.iter().position(|c| c.name == name);

    match *derivation {
        Derivation::YearOf { source, .. } => {
            let src = index(source);
            for row in rows.iter_mut() {
                let year = src
                    .and_then(|i| row[i].as_date())
                    .map(|d| Value::Integer(i64::from(d.year())))
                    .unwrap_or(Value::Missing);
                row.push(year);
            }
        }
        Derivation::YearsBetween { start, end, .. } => {
            let (s, e) = (index(start), index(end));
            for row in rows.iter_mut() {
                let years = s
                    .and_then(|i| row[i].as_date())
                    .zip(e.and_then(|i| row[i].as_date()))
                    .map(|(from, to)| Value::Float((to - from).num_days() as f64 / 365.25))
                    .unwrap_or(Value::Missing);
                row.push(years);
            }
        }
        Derivation::TopOrOther {
            source,
            weight,
            n,
            other,
            ..
        } => {
            let (src, w) = (index(source), index(weight));
            let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
            if let (Some(src), Some(w)) = (src, w) {
                for row in rows.iter() {
                    if let (Some(key), Some(v)) = (row[src].as_str(), row[w].as_f64()) {
                        *totals.entry(key).or_default() += v;
                    }
                }
            }
            let mut ranked: Vec<(&str, f64)> = totals.into_iter().collect();
            ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(b.0)));
            let top: BTreeSet<String> = ranked
                .into_iter()
                .take(n)
                .map(|(k, _)| k.to_string())
                .collect();

            for row in rows.iter_mut() {
                let label = src
                    .and_then(|i| row[i].as_str())
                    .filter(|k| top.contains(*k))
                    .unwrap_or(other)
                    .to_string();
                row.push(Value::Text(label));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::{self, MemorySource};
    use crate::data::registry::DatasetId;

    fn load_fixture(id: DatasetId) -> Table {
        load(id.def(), &MemorySource::with_fixtures()).unwrap()
    }

    #[test]
    fn numbers_are_parsed_leniently() {
        assert_eq!(coerce(" 2006 ", ColumnKind::Numeric), Value::Integer(2006));
        assert_eq!(coerce("1,234.5", ColumnKind::Numeric), Value::Float(1234.5));
        assert_eq!(coerce("$1,250", ColumnKind::Numeric), Value::Integer(1250));
        assert_eq!(coerce("€ 3.75", ColumnKind::Numeric), Value::Float(3.75));
        assert_eq!(coerce("-0.5", ColumnKind::Numeric), Value::Float(-0.5));
    }

    #[test]
    fn unparseable_numbers_are_missing_not_zero() {
        for raw in ["N/A", "", "  ", "nan", "inf", "twelve", "$"] {
            assert_eq!(coerce(raw, ColumnKind::Numeric), Value::Missing, "{raw:?}");
        }
    }

    #[test]
    fn dates_use_declared_format_then_iso() {
        let fmt = ColumnKind::Date("%d.%m.%Y");
        let expected = Value::Date(NaiveDate::from_ymd_opt(2011, 3, 15).unwrap());
        assert_eq!(coerce(" 15.03.2011 ", fmt), expected);
        assert_eq!(coerce("2011-03-15", fmt), expected);
        assert_eq!(coerce("31.02.2011", fmt), Value::Missing);
        assert_eq!(coerce("not a date", fmt), Value::Missing);
    }

    #[test]
    fn categorical_cells_are_trimmed() {
        assert_eq!(coerce("  Sports ", ColumnKind::Categorical), Value::text("Sports"));
        assert_eq!(coerce("", ColumnKind::Categorical), Value::Missing);
    }

    #[test]
    fn loads_declared_and_derived_columns() {
        let table = load_fixture(DatasetId::VideoGameSales);
        let names: Vec<&str> = table.columns().iter().map(|c| c.name.as_str()).collect();
        let expected: Vec<&str> = DatasetId::VideoGameSales.def().column_names().collect();
        assert_eq!(names, expected);
        assert_eq!(table.len(), fixtures::VGSALES_ROWS);
    }

    #[test]
    fn wholly_empty_rows_are_dropped_but_partial_rows_kept() {
        let table = load_fixture(DatasetId::VideoGameSales);
        let year = table.column_index("year").unwrap();
        let name = table.column_index("name").unwrap();
        let madden = table
            .rows()
            .find(|r| r[name] == Value::text("Madden NFL 2004"))
            .unwrap();
        assert_eq!(madden[year], Value::Missing);
        assert_eq!(table.profile("year").unwrap().missing, 1);
    }

    #[test]
    fn quoted_fields_keep_commas() {
        let table = load_fixture(DatasetId::VideoGameSales);
        let name = table.column_index("name").unwrap();
        assert!(table
            .rows()
            .any(|r| r[name] == Value::text("Tony Hawk's Pro Skater, Remix")));
    }

    #[test]
    fn top_publishers_are_kept_and_the_rest_grouped() {
        let table = load_fixture(DatasetId::VideoGameSales);
        let groups = &table.profile("publisher_group").unwrap().distinct;
        assert!(groups.contains(&Value::text("Nintendo")));
        assert!(groups.contains(&Value::text("Others")));
        assert!(groups.len() <= 11);

        let publisher = table.column_index("publisher").unwrap();
        let group = table.column_index("publisher_group").unwrap();
        for row in table.rows() {
            if row[publisher].is_missing() {
                assert_eq!(row[group], Value::text("Others"));
            }
        }
    }

    #[test]
    fn top_or_other_keeps_only_n_largest() {
        let csv = "\
Rank,Name,Platform,Year,Genre,Publisher,NA_Sales,EU_Sales,JP_Sales,Other_Sales,Global_Sales
1,A,Wii,2006,Sports,P1,0,0,0,0,5
2,B,Wii,2006,Sports,P2,0,0,0,0,4
3,C,Wii,2006,Sports,P3,0,0,0,0,3
4,D,Wii,2006,Sports,P4,0,0,0,0,2
5,E,Wii,2006,Sports,P5,0,0,0,0,1
6,F,Wii,2006,Sports,P6,0,0,0,0,1
7,G,Wii,2006,Sports,P7,0,0,0,0,1
8,H,Wii,2006,Sports,P8,0,0,0,0,1
9,I,Wii,2006,Sports,P9,0,0,0,0,1
10,J,Wii,2006,Sports,P10,0,0,0,0,1
11,K,Wii,2006,Sports,P11,0,0,0,0,0.5
12,L,Wii,2006,Sports,P12,0,0,0,0,0.25
";
        let source = MemorySource::new().with_file("vgsales.csv", csv);
        let table = load(DatasetId::VideoGameSales.def(), &source).unwrap();
        let groups = &table.profile("publisher_group").unwrap().distinct;
        assert_eq!(groups.len(), 11);
        assert!(!groups.contains(&Value::text("P11")));
        assert!(!groups.contains(&Value::text("P12")));
    }

    #[test]
    fn taxpayer_dates_and_derived_years() {
        let table = load_fixture(DatasetId::MicroenterpriseTaxpayers);
        assert_eq!(table.len(), 5);

        let reg_year = table.column_index("registration_year").unwrap();
        let dereg_year = table.column_index("deregistration_year").unwrap();
        let duration = table.column_index("activity_years").unwrap();

        let beta = table.row(1);
        assert_eq!(beta[reg_year], Value::Integer(2011));
        assert_eq!(beta[dereg_year], Value::Integer(2015));
        let years = beta[duration].as_f64().unwrap();
        assert!((years - 4.8).abs() < 0.01, "{years}");

        // Active taxpayer: no deregistration, so no duration either.
        let alfa = table.row(0);
        assert_eq!(alfa[reg_year], Value::Integer(2010));
        assert_eq!(alfa[dereg_year], Value::Missing);
        assert_eq!(alfa[duration], Value::Missing);

        // Unparseable registration date is kept as missing.
        let epsilon = table.row(4);
        assert_eq!(epsilon[reg_year], Value::Missing);
        assert_eq!(epsilon[0], Value::text("ir"));
    }

    #[test]
    fn headers_tolerate_bom_case_and_spaces() {
        let csv = "\u{feff} Region ,Category,Parameter,Mode,Powertrain,Year,Unit,Value\n\
                   World,Historical,EV sales,Cars,BEV,2020,Vehicles,\"2,000,000\"\n";
        let source = MemorySource::new().with_file(DatasetId::EvSales.def().file, csv);
        let table = load(DatasetId::EvSales.def(), &source).unwrap();
        assert_eq!(table.len(), 1);
        let value = table.column_index("value").unwrap();
        assert_eq!(table.row(0)[value], Value::Integer(2_000_000));
    }

    #[test]
    fn invalid_utf8_is_decoded_lossily() {
        let mut bytes = b"q24_met_online,relationship_quality,how_long_relationship,age_difference\n".to_vec();
        bytes.extend_from_slice(b"met \xffonline,good,2,1\n");
        let source = MemorySource::new().with_bytes(DatasetId::CouplesSurvey.def().file, bytes);
        let table = load(DatasetId::CouplesSurvey.def(), &source).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.row(0)[0], Value::text("met \u{fffd}online"));
    }

    #[test]
    fn optional_columns_may_be_absent() {
        let csv = "region,parameter,powertrain,year,unit,value\n\
                   World,EV sales,BEV,2020,Vehicles,10\n";
        let source = MemorySource::new().with_file(DatasetId::EvSales.def().file, csv);
        let table = load(DatasetId::EvSales.def(), &source).unwrap();
        let mode = table.column_index("mode").unwrap();
        assert_eq!(table.row(0)[mode], Value::Missing);
    }

    #[test]
    fn missing_required_columns_is_a_schema_mismatch() {
        let csv = "region,parameter,year,value\nWorld,EV sales,2020,10\n";
        let source = MemorySource::new().with_file(DatasetId::EvSales.def().file, csv);
        match load(DatasetId::EvSales.def(), &source) {
            Err(DashboardError::SchemaMismatch { dataset, missing }) => {
                assert_eq!(dataset, DatasetId::EvSales);
                assert_eq!(missing, ["powertrain", "unit"]);
            }
            other => panic!("expected schema mismatch, got {other:?}"),
        }
    }

    #[test]
    fn empty_file_is_a_schema_mismatch() {
        let source = MemorySource::new().with_file(DatasetId::CouplesSurvey.def().file, "");
        assert!(matches!(
            load(DatasetId::CouplesSurvey.def(), &source),
            Err(DashboardError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn missing_file_is_data_unavailable() {
        let source = DirectorySource::new("/definitely/not/a/data/dir");
        match load(DatasetId::VideoGameSales.def(), &source) {
            Err(DashboardError::DataUnavailable {
                dataset, location, ..
            }) => {
                assert_eq!(dataset, DatasetId::VideoGameSales);
                assert!(location.ends_with("vgsales.csv"), "{location}");
            }
            other => panic!("expected data unavailable, got {other:?}"),
        }
    }
}
