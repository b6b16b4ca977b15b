pub mod bands;
pub mod dataset_analyzer;
pub mod day_comparison;
pub mod explorer;
pub mod fixed_date;
pub mod historical;

pub use bands::TemperatureBand;
pub use dataset_analyzer::{DatasetAnalyzer, DatasetStatistics};
pub use day_comparison::{DayComparison, FieldComparison};
pub use explorer::{ExplorationReport, Explorer, MonthlyAggregate, TrendLine, YearlyAggregate};
pub use fixed_date::{
    coldest_entries, warmest_entries, FixedDateAnnotator, FixedDateEntry, FixedDateReport,
    FixedDateSummary,
};
pub use historical::{DayRank, FieldStats, HistoricalComparator, HistoricalStats};
