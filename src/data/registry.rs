//! Static description of the four datasets.
//!
//! Everything dataset-specific lives here: where the file is, which columns
//! it must have, which columns are derived at load, and which filters,
//! metrics and charts the dashboard shows. The loader, filter engine, metrics
//! engine and chart builder only interpret these tables.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::model::ColumnKind;

// ---------------------------------------------------------------------------
// Dataset identifiers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetId {
    VideoGameSales,
    MicroenterpriseTaxpayers,
    CouplesSurvey,
    EvSales,
}

impl DatasetId {
    pub const ALL: [DatasetId; 4] = [
        DatasetId::VideoGameSales,
        DatasetId::MicroenterpriseTaxpayers,
        DatasetId::CouplesSurvey,
        DatasetId::EvSales,
    ];

    pub fn def(self) -> &'static DatasetDef {
        match self {
            DatasetId::VideoGameSales => &VIDEO_GAME_SALES,
            DatasetId::MicroenterpriseTaxpayers => &MICROENTERPRISE_TAXPAYERS,
            DatasetId::CouplesSurvey => &COUPLES_SURVEY,
            DatasetId::EvSales => &EV_SALES,
        }
    }

    pub fn name(self) -> &'static str {
        self.def().name
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Schema and derived columns
// ---------------------------------------------------------------------------

/// How raw CSV headers are turned into column names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderStyle {
    /// Surrounding whitespace removed, otherwise verbatim.
    Trim,
    /// Trimmed, lowercased, spaces replaced by underscores.
    SnakeCase,
}

impl HeaderStyle {
    pub fn normalize(self, raw: &str) -> String {
        let trimmed = raw.trim_start_matches('\u{feff}').trim();
        match self {
            HeaderStyle::Trim => trimmed.to_string(),
            HeaderStyle::SnakeCase => trimmed.to_lowercase().replace(' ', "_"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnDef {
    pub name: &'static str,
    pub kind: ColumnKind,
    /// A missing required column fails the load with `SchemaMismatch`;
    /// a missing optional one is filled with `Missing`.
    pub required: bool,
}

const fn required(name: &'static str, kind: ColumnKind) -> ColumnDef {
    ColumnDef {
        name,
        kind,
        required: true,
    }
}

const fn optional(name: &'static str, kind: ColumnKind) -> ColumnDef {
    ColumnDef {
        name,
        kind,
        required: false,
    }
}

/// A column computed from other columns once the file has been read.
#[derive(Debug, Clone, Copy)]
pub enum Derivation {
    /// Calendar year of a date column.
    YearOf {
        source: &'static str,
        target: &'static str,
    },
    /// Years elapsed between two date columns (days / 365.25).
    YearsBetween {
        start: &'static str,
        end: &'static str,
        target: &'static str,
    },
    /// Keeps the `n` categories with the largest total `weight` and relabels
    /// everything else (missing included) as `other`. Ranked on the full table.
    TopOrOther {
        source: &'static str,
        weight: &'static str,
        n: usize,
        other: &'static str,
        target: &'static str,
    },
}

impl Derivation {
    pub fn target(&self) -> &'static str {
        match self {
            Derivation::YearOf { target, .. }
            | Derivation::YearsBetween { target, .. }
            | Derivation::TopOrOther { target, .. } => *target,
        }
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            Derivation::YearOf { .. } | Derivation::YearsBetween { .. } => ColumnKind::Numeric,
            Derivation::TopOrOther { .. } => ColumnKind::Categorical,
        }
    }
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    SingleSelect,
    MultiSelect,
    NumericRange,
    DateRange,
}

#[derive(Debug, Clone, Copy)]
pub struct FilterDef {
    pub name: &'static str,
    pub label: &'static str,
    pub column: &'static str,
    pub kind: FilterKind,
    /// Rows the filter restricts. Rows failing any of these conditions pass
    /// the filter untouched. Empty means every row.
    pub applies_to: &'static [Condition],
}

const fn filter(
    name: &'static str,
    label: &'static str,
    column: &'static str,
    kind: FilterKind,
) -> FilterDef {
    FilterDef {
        name,
        label,
        column,
        kind,
        applies_to: &[],
    }
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// Row restriction used by metrics and scoped filters: the categorical
/// `column` equals `equals`.
#[derive(Debug, Clone, Copy)]
pub struct Condition {
    pub column: &'static str,
    pub equals: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Count,
    Sum(&'static str),
    Mean(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryOrder {
    /// Largest first, at most `top_n` entries, no catch-all bucket.
    ValueDesc { top_n: usize },
    /// Natural order of the key, for time axes.
    KeyAsc,
}

/// How a scalar metric is shown on its card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ValueFormat {
    pub decimals: u8,
    pub grouped: bool,
}

impl ValueFormat {
    pub const COUNT: ValueFormat = ValueFormat {
        decimals: 0,
        grouped: true,
    };
    pub const fn fixed(decimals: u8) -> ValueFormat {
        ValueFormat {
            decimals,
            grouped: false,
        }
    }
    pub const fn grouped(decimals: u8) -> ValueFormat {
        ValueFormat {
            decimals,
            grouped: true,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum MetricKind {
    /// Rows in the view.
    Count,
    CountWhere(&'static [Condition]),
    Sum {
        column: &'static str,
        filter: &'static [Condition],
    },
    Mean {
        column: &'static str,
        filter: &'static [Condition],
    },
    GroupBy {
        key: &'static str,
        aggregate: Aggregate,
        order: CategoryOrder,
        filter: &'static [Condition],
    },
    /// Sum of each listed column, in the listed order: `(column, label)`.
    ColumnTotals(&'static [(&'static str, &'static str)]),
    /// Two-way table: one category per `rows` key, one series per `series` key.
    Crosstab {
        rows: &'static str,
        series: &'static str,
        aggregate: Aggregate,
        percent_of_row: bool,
        filter: &'static [Condition],
    },
    Histogram {
        column: &'static str,
        bins: usize,
        split_by: Option<&'static str>,
        filter: &'static [Condition],
    },
}

impl MetricKind {
    /// Scalar metrics are shown as cards, the rest feed charts.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            MetricKind::Count
                | MetricKind::CountWhere(_)
                | MetricKind::Sum { .. }
                | MetricKind::Mean { .. }
        )
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MetricDef {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: MetricKind,
    pub format: ValueFormat,
}

// ---------------------------------------------------------------------------
// Charts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Bar,
    Line,
    Pie,
    Histogram,
    StackedBar,
}

impl ChartKind {
    /// Charts that plot a trend over an ordered axis.
    pub fn is_trend(self) -> bool {
        matches!(self, ChartKind::Line | ChartKind::StackedBar)
    }
}

/// A field role on a chart: the column feeding it and its axis title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Axis {
    pub field: &'static str,
    pub label: &'static str,
}

const fn axis(field: &'static str, label: &'static str) -> Axis {
    Axis { field, label }
}

#[derive(Debug, Clone, Copy)]
pub struct ChartDef {
    pub title: &'static str,
    pub kind: ChartKind,
    /// Name of the metric that feeds the chart.
    pub metric: &'static str,
    /// Category (domain) axis, drawn vertically when `horizontal`.
    pub x: Axis,
    /// Value axis.
    pub y: Axis,
    /// Grouping role for multi-series charts.
    pub series: Option<Axis>,
    pub horizontal: bool,
}

// ---------------------------------------------------------------------------
// Dataset definition
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct DatasetDef {
    pub id: DatasetId,
    /// Name shown in the dataset selector.
    pub name: &'static str,
    /// Dashboard heading.
    pub title: &'static str,
    /// File name relative to the data directory.
    pub file: &'static str,
    pub headers: HeaderStyle,
    pub columns: &'static [ColumnDef],
    pub derived: &'static [Derivation],
    pub filters: &'static [FilterDef],
    pub metrics: &'static [MetricDef],
    pub charts: &'static [ChartDef],
}

impl DatasetDef {
    pub fn filter(&self, name: &str) -> Option<&'static FilterDef> {
        self.filters.iter().find(|f| f.name == name)
    }

    pub fn metric(&self, name: &str) -> Option<&'static MetricDef> {
        self.metrics.iter().find(|m| m.name == name)
    }

    /// Names of every column a loaded table has, declared then derived.
    pub fn column_names(&self) -> impl Iterator<Item = &'static str> {
        self.columns
            .iter()
            .map(|c| c.name)
            .chain(self.derived.iter().map(Derivation::target))
    }
}

// ---------------------------------------------------------------------------
// Global Video Game Sales
// ---------------------------------------------------------------------------

pub static VIDEO_GAME_SALES: DatasetDef = DatasetDef {
    id: DatasetId::VideoGameSales,
    name: "Global Video Game Sales",
    title: "Video Game Sales Dashboard",
    file: "vgsales.csv",
    headers: HeaderStyle::SnakeCase,
    columns: &[
        optional("rank", ColumnKind::Numeric),
        optional("name", ColumnKind::Text),
        required("platform", ColumnKind::Categorical),
        required("year", ColumnKind::Numeric),
        required("genre", ColumnKind::Categorical),
        required("publisher", ColumnKind::Categorical),
        required("na_sales", ColumnKind::Numeric),
        required("eu_sales", ColumnKind::Numeric),
        required("jp_sales", ColumnKind::Numeric),
        required("other_sales", ColumnKind::Numeric),
        required("global_sales", ColumnKind::Numeric),
    ],
    derived: &[Derivation::TopOrOther {
        source: "publisher",
        weight: "global_sales",
        n: 10,
        other: "Others",
        target: "publisher_group",
    }],
    filters: &[
        filter("year", "Year", "year", FilterKind::NumericRange),
        filter("genre", "Genre(s)", "genre", FilterKind::MultiSelect),
        filter(
            "publisher",
            "Publisher(s)",
            "publisher_group",
            FilterKind::MultiSelect,
        ),
        filter("platform", "Platform", "platform", FilterKind::SingleSelect),
    ],
    metrics: &[
        MetricDef {
            name: "total_sales",
            label: "Total Global Sales (M)",
            kind: MetricKind::Sum {
                column: "global_sales",
                filter: &[],
            },
            format: ValueFormat::grouped(2),
        },
        MetricDef {
            name: "mean_sales",
            label: "Avg. Sales per Game (M)",
            kind: MetricKind::Mean {
                column: "global_sales",
                filter: &[],
            },
            format: ValueFormat::fixed(2),
        },
        MetricDef {
            name: "games",
            label: "Total Games",
            kind: MetricKind::Count,
            format: ValueFormat::COUNT,
        },
        MetricDef {
            name: "sales_by_genre",
            label: "Sales by Genre",
            kind: MetricKind::GroupBy {
                key: "genre",
                aggregate: Aggregate::Sum("global_sales"),
                order: CategoryOrder::ValueDesc { top_n: 12 },
                filter: &[],
            },
            format: ValueFormat::grouped(2),
        },
        MetricDef {
            name: "sales_by_region",
            label: "Sales by Region",
            kind: MetricKind::ColumnTotals(&[
                ("na_sales", "NA"),
                ("eu_sales", "EU"),
                ("jp_sales", "JP"),
                ("other_sales", "Other"),
            ]),
            format: ValueFormat::grouped(2),
        },
        MetricDef {
            name: "games_per_year",
            label: "Games Released",
            kind: MetricKind::GroupBy {
                key: "year",
                aggregate: Aggregate::Count,
                order: CategoryOrder::KeyAsc,
                filter: &[],
            },
            format: ValueFormat::COUNT,
        },
        MetricDef {
            name: "sales_by_publisher",
            label: "Sales by Publisher",
            kind: MetricKind::GroupBy {
                key: "publisher_group",
                aggregate: Aggregate::Sum("global_sales"),
                order: CategoryOrder::ValueDesc { top_n: 11 },
                filter: &[],
            },
            format: ValueFormat::grouped(2),
        },
    ],
    charts: &[
        ChartDef {
            title: "Top Genres by Sales",
            kind: ChartKind::Bar,
            metric: "sales_by_genre",
            x: axis("genre", "Genre"),
            y: axis("global_sales", "Total Global Sales (Million $)"),
            series: None,
            horizontal: true,
        },
        ChartDef {
            title: "Sales by Region",
            kind: ChartKind::Bar,
            metric: "sales_by_region",
            x: axis("region", "Region"),
            y: axis("sales", "Total Sales (Million $)"),
            series: None,
            horizontal: true,
        },
        ChartDef {
            title: "Games Released Over Time",
            kind: ChartKind::Line,
            metric: "games_per_year",
            x: axis("year", "Year"),
            y: axis("count", "Number of Games Released"),
            series: None,
            horizontal: false,
        },
        ChartDef {
            title: "Top Publishers by Sales",
            kind: ChartKind::Bar,
            metric: "sales_by_publisher",
            x: axis("publisher_group", "Publisher"),
            y: axis("global_sales", "Total Global Sales (Million $)"),
            series: None,
            horizontal: true,
        },
    ],
};

// ---------------------------------------------------------------------------
// Mikrouzņēmumu nodokļa maksātāji (micro-enterprise tax payers)
// ---------------------------------------------------------------------------

const INACTIVE: &[Condition] = &[Condition {
    column: "aktivs",
    equals: "nav",
}];

pub static MICROENTERPRISE_TAXPAYERS: DatasetDef = DatasetDef {
    id: DatasetId::MicroenterpriseTaxpayers,
    name: "Mikrouzņēmumu nodokļa maksātāji",
    title: "Mikrouzņēmumu Nodokļa Maksātāju Dashboard",
    file: "pdb_munmaksataji_odata.csv",
    headers: HeaderStyle::SnakeCase,
    columns: &[
        required("aktivs", ColumnKind::Categorical),
        required("registrets", ColumnKind::Date("%d.%m.%Y")),
        required("izslegts", ColumnKind::Date("%d.%m.%Y")),
    ],
    derived: &[
        Derivation::YearOf {
            source: "registrets",
            target: "registration_year",
        },
        Derivation::YearOf {
            source: "izslegts",
            target: "deregistration_year",
        },
        Derivation::YearsBetween {
            start: "registrets",
            end: "izslegts",
            target: "activity_years",
        },
    ],
    filters: &[
        filter("status", "Status", "aktivs", FilterKind::MultiSelect),
        filter(
            "registered",
            "Registration Date",
            "registrets",
            FilterKind::DateRange,
        ),
        FilterDef {
            name: "deregistration_year",
            label: "Deregistration Year(s)",
            column: "deregistration_year",
            kind: FilterKind::MultiSelect,
            applies_to: INACTIVE,
        },
    ],
    metrics: &[
        MetricDef {
            name: "taxpayers",
            label: "Total Taxpayers",
            kind: MetricKind::Count,
            format: ValueFormat::COUNT,
        },
        MetricDef {
            name: "active",
            label: "Active Taxpayers",
            kind: MetricKind::CountWhere(&[Condition {
                column: "aktivs",
                equals: "ir",
            }]),
            format: ValueFormat::COUNT,
        },
        MetricDef {
            name: "inactive",
            label: "Inactive Taxpayers",
            kind: MetricKind::CountWhere(INACTIVE),
            format: ValueFormat::COUNT,
        },
        MetricDef {
            name: "status_counts",
            label: "Taxpayers by Status",
            kind: MetricKind::GroupBy {
                key: "aktivs",
                aggregate: Aggregate::Count,
                order: CategoryOrder::ValueDesc { top_n: 10 },
                filter: &[],
            },
            format: ValueFormat::COUNT,
        },
        MetricDef {
            name: "registrations_per_year",
            label: "Registrations",
            kind: MetricKind::GroupBy {
                key: "registration_year",
                aggregate: Aggregate::Count,
                order: CategoryOrder::KeyAsc,
                filter: &[],
            },
            format: ValueFormat::COUNT,
        },
        MetricDef {
            name: "deregistrations_per_year",
            label: "Deregistrations",
            kind: MetricKind::GroupBy {
                key: "deregistration_year",
                aggregate: Aggregate::Count,
                order: CategoryOrder::KeyAsc,
                filter: INACTIVE,
            },
            format: ValueFormat::COUNT,
        },
        MetricDef {
            name: "activity_duration",
            label: "Duration of Activity",
            kind: MetricKind::Histogram {
                column: "activity_years",
                bins: 15,
                split_by: None,
                filter: INACTIVE,
            },
            format: ValueFormat::COUNT,
        },
    ],
    charts: &[
        ChartDef {
            title: "Distribution of Active vs Inactive Taxpayers",
            kind: ChartKind::Pie,
            metric: "status_counts",
            x: axis("aktivs", "Status"),
            y: axis("count", "Taxpayers"),
            series: None,
            horizontal: false,
        },
        ChartDef {
            title: "Registrations Over Time",
            kind: ChartKind::Line,
            metric: "registrations_per_year",
            x: axis("registration_year", "Registration Year"),
            y: axis("count", "Number of Registrations"),
            series: None,
            horizontal: false,
        },
        ChartDef {
            title: "Deregistrations Over Time",
            kind: ChartKind::Line,
            metric: "deregistrations_per_year",
            x: axis("deregistration_year", "Deregistration Year"),
            y: axis("count", "Number of Deregistrations"),
            series: None,
            horizontal: false,
        },
        ChartDef {
            title: "Duration of Activity (Inactive Taxpayers)",
            kind: ChartKind::Histogram,
            metric: "activity_duration",
            x: axis("activity_years", "Duration of Activity (Years)"),
            y: axis("count", "Frequency"),
            series: None,
            horizontal: false,
        },
    ],
};

// ---------------------------------------------------------------------------
// How Couples Meet and Stay Together
// ---------------------------------------------------------------------------

pub static COUPLES_SURVEY: DatasetDef = DatasetDef {
    id: DatasetId::CouplesSurvey,
    name: "How Couples Meet and Stay Together",
    title: "How Couples Meet and Stay Together Dashboard",
    file: "HCMST_ver_3.04.csv",
    headers: HeaderStyle::Trim,
    columns: &[
        required("q24_met_online", ColumnKind::Categorical),
        required("relationship_quality", ColumnKind::Categorical),
        required("how_long_relationship", ColumnKind::Numeric),
        required("age_difference", ColumnKind::Numeric),
    ],
    derived: &[],
    filters: &[
        filter(
            "meeting_method",
            "Meeting Method(s)",
            "q24_met_online",
            FilterKind::MultiSelect,
        ),
        filter(
            "quality",
            "Relationship Quality",
            "relationship_quality",
            FilterKind::MultiSelect,
        ),
    ],
    metrics: &[
        MetricDef {
            name: "couples",
            label: "Total Couples",
            kind: MetricKind::Count,
            format: ValueFormat::COUNT,
        },
        MetricDef {
            name: "mean_duration",
            label: "Avg. Relationship Duration (Years)",
            kind: MetricKind::Mean {
                column: "how_long_relationship",
                filter: &[],
            },
            format: ValueFormat::fixed(1),
        },
        MetricDef {
            name: "meeting_methods",
            label: "Couples by Meeting Method",
            kind: MetricKind::GroupBy {
                key: "q24_met_online",
                aggregate: Aggregate::Count,
                order: CategoryOrder::ValueDesc { top_n: 10 },
                filter: &[],
            },
            format: ValueFormat::COUNT,
        },
        MetricDef {
            name: "quality_by_method",
            label: "Relationship Quality (%)",
            kind: MetricKind::Crosstab {
                rows: "q24_met_online",
                series: "relationship_quality",
                aggregate: Aggregate::Count,
                percent_of_row: true,
                filter: &[],
            },
            format: ValueFormat::fixed(1),
        },
        MetricDef {
            name: "age_difference",
            label: "Age Difference",
            kind: MetricKind::Histogram {
                column: "age_difference",
                bins: 20,
                split_by: Some("q24_met_online"),
                filter: &[],
            },
            format: ValueFormat::COUNT,
        },
    ],
    charts: &[
        ChartDef {
            title: "Distribution of Meeting Methods",
            kind: ChartKind::Bar,
            metric: "meeting_methods",
            x: axis("q24_met_online", "Meeting Method"),
            y: axis("count", "Count"),
            series: None,
            horizontal: false,
        },
        ChartDef {
            title: "Relationship Quality by Meeting Method",
            kind: ChartKind::Bar,
            metric: "quality_by_method",
            x: axis("q24_met_online", "Meeting Method"),
            y: axis("percentage", "Percentage (%)"),
            series: Some(axis("relationship_quality", "Relationship Quality")),
            horizontal: false,
        },
        ChartDef {
            title: "Age Difference Distribution by Meeting Method",
            kind: ChartKind::Histogram,
            metric: "age_difference",
            x: axis("age_difference", "Age Difference (Years)"),
            y: axis("count", "Frequency"),
            series: Some(axis("q24_met_online", "Meeting Method")),
            horizontal: false,
        },
    ],
};

// ---------------------------------------------------------------------------
// Global EV Data Explorer
// ---------------------------------------------------------------------------

const EV_SALES_VEHICLES: &[Condition] = &[
    Condition {
        column: "parameter",
        equals: "EV sales",
    },
    Condition {
        column: "unit",
        equals: "Vehicles",
    },
];

const EV_SALES_SHARE: &[Condition] = &[
    Condition {
        column: "parameter",
        equals: "EV sales share",
    },
    Condition {
        column: "unit",
        equals: "percent",
    },
];

const EV_STOCK_SHARE: &[Condition] = &[
    Condition {
        column: "parameter",
        equals: "EV stock share",
    },
    Condition {
        column: "unit",
        equals: "percent",
    },
];

const EV_STOCK_VEHICLES: &[Condition] = &[
    Condition {
        column: "parameter",
        equals: "EV stock",
    },
    Condition {
        column: "unit",
        equals: "Vehicles",
    },
];

pub static EV_SALES: DatasetDef = DatasetDef {
    id: DatasetId::EvSales,
    name: "Global EV Data Explorer",
    title: "Global EV Data Explorer Dashboard",
    file: "IEA-EV-dataEV salesHistoricalCars.csv",
    headers: HeaderStyle::SnakeCase,
    columns: &[
        required("region", ColumnKind::Categorical),
        optional("category", ColumnKind::Categorical),
        required("parameter", ColumnKind::Categorical),
        optional("mode", ColumnKind::Categorical),
        required("powertrain", ColumnKind::Categorical),
        required("year", ColumnKind::Numeric),
        required("unit", ColumnKind::Categorical),
        required("value", ColumnKind::Numeric),
    ],
    derived: &[],
    filters: &[
        filter("region", "Region(s)", "region", FilterKind::MultiSelect),
        filter("year", "Year", "year", FilterKind::NumericRange),
        filter(
            "powertrain",
            "Powertrain(s)",
            "powertrain",
            FilterKind::MultiSelect,
        ),
        filter(
            "parameter",
            "Parameter(s)",
            "parameter",
            FilterKind::MultiSelect,
        ),
    ],
    metrics: &[
        MetricDef {
            name: "records",
            label: "Records",
            kind: MetricKind::Count,
            format: ValueFormat::COUNT,
        },
        MetricDef {
            name: "total_sales",
            label: "Total EV Sales (Vehicles)",
            kind: MetricKind::Sum {
                column: "value",
                filter: EV_SALES_VEHICLES,
            },
            format: ValueFormat::grouped(0),
        },
        MetricDef {
            name: "mean_sales_share",
            label: "Avg. EV Sales Share (%)",
            kind: MetricKind::Mean {
                column: "value",
                filter: EV_SALES_SHARE,
            },
            format: ValueFormat::fixed(2),
        },
        MetricDef {
            name: "mean_stock_share",
            label: "Avg. EV Stock Share (%)",
            kind: MetricKind::Mean {
                column: "value",
                filter: EV_STOCK_SHARE,
            },
            format: ValueFormat::fixed(2),
        },
        MetricDef {
            name: "sales_by_powertrain",
            label: "EV Sales",
            kind: MetricKind::Crosstab {
                rows: "year",
                series: "powertrain",
                aggregate: Aggregate::Mean("value"),
                percent_of_row: false,
                filter: EV_SALES_VEHICLES,
            },
            format: ValueFormat::grouped(0),
        },
        MetricDef {
            name: "sales_share_by_region",
            label: "EV Sales Share by Region",
            kind: MetricKind::GroupBy {
                key: "region",
                aggregate: Aggregate::Mean("value"),
                order: CategoryOrder::ValueDesc { top_n: 15 },
                filter: EV_SALES_SHARE,
            },
            format: ValueFormat::fixed(2),
        },
        MetricDef {
            name: "stock_share_distribution",
            label: "EV Stock Share",
            kind: MetricKind::Histogram {
                column: "value",
                bins: 20,
                split_by: None,
                filter: EV_STOCK_SHARE,
            },
            format: ValueFormat::COUNT,
        },
        MetricDef {
            name: "stock_by_powertrain",
            label: "EV Stock",
            kind: MetricKind::Crosstab {
                rows: "year",
                series: "powertrain",
                aggregate: Aggregate::Sum("value"),
                percent_of_row: false,
                filter: EV_STOCK_VEHICLES,
            },
            format: ValueFormat::grouped(0),
        },
    ],
    charts: &[
        ChartDef {
            title: "EV Sales Over Time by Powertrain",
            kind: ChartKind::Line,
            metric: "sales_by_powertrain",
            x: axis("year", "Year"),
            y: axis("value", "EV Sales (Vehicles)"),
            series: Some(axis("powertrain", "Powertrain")),
            horizontal: false,
        },
        ChartDef {
            title: "EV Sales Share by Region",
            kind: ChartKind::Bar,
            metric: "sales_share_by_region",
            x: axis("region", "Region"),
            y: axis("value", "Average EV Sales Share (%)"),
            series: None,
            horizontal: true,
        },
        ChartDef {
            title: "EV Stock Share Distribution",
            kind: ChartKind::Histogram,
            metric: "stock_share_distribution",
            x: axis("value", "EV Stock Share (%)"),
            y: axis("count", "Frequency"),
            series: None,
            horizontal: false,
        },
        ChartDef {
            title: "EV Stock by Powertrain",
            kind: ChartKind::StackedBar,
            metric: "stock_by_powertrain",
            x: axis("year", "Year"),
            y: axis("value", "EV Stock (Vehicles)"),
            series: Some(axis("powertrain", "Powertrain")),
            horizontal: false,
        },
    ],
};
