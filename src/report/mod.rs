// src/report/mod.rs
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;
use tracing::debug;

use crate::{
    chart::{ChartDescriptor, ChartKind},
    data::{SalesRecord, SalesTable},
    stats::{group_by, Aggregate, MonthKey},
};

/// Report type chosen in the statistics selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportKind {
    #[serde(rename = "Yearly Statistics")]
    Yearly,
    #[serde(rename = "Recession Period Statistics")]
    RecessionPeriod,
}

impl ReportKind {
    pub const ALL: [ReportKind; 2] = [ReportKind::Yearly, ReportKind::RecessionPeriod];

    pub fn label(&self) -> &'static str {
        match self {
            ReportKind::Yearly => "Yearly Statistics",
            ReportKind::RecessionPeriod => "Recession Period Statistics",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ReportKind {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        ReportKind::ALL
            .into_iter()
            .find(|k| k.label() == s)
            .ok_or_else(|| ReportError::UnknownStatistics(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportError {
    #[error("no report type selected")]
    StatisticsRequired,

    #[error("unknown report type {0:?}")]
    UnknownStatistics(String),

    #[error("a year must be selected for {}", ReportKind::Yearly)]
    YearRequired,
}

/// Four charts laid out as two rows of two.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub statistics: ReportKind,
    /// Selected year; `None` for recession reports, which ignore it.
    pub year: Option<i32>,
    pub rows: [[ChartDescriptor; 2]; 2],
}

impl Report {
    pub fn charts(&self) -> impl Iterator<Item = &ChartDescriptor> {
        self.rows.iter().flatten()
    }
}

/// Parse raw selector values and build the report.
pub fn report_from_inputs(
    table: &SalesTable,
    statistics: Option<&str>,
    year: Option<i32>,
) -> Result<Report, ReportError> {
    let kind = match statistics.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => s.parse::<ReportKind>()?,
        None => return Err(ReportError::StatisticsRequired),
    };
    build_report(table, kind, year)
}

/// Recompute the four aggregates for `kind` over `table`.
pub fn build_report(
    table: &SalesTable,
    kind: ReportKind,
    year: Option<i32>,
) -> Result<Report, ReportError> {
    let report = match kind {
        ReportKind::RecessionPeriod => recession_report(table),
        ReportKind::Yearly => {
            let year = year.ok_or(ReportError::YearRequired)?;
            yearly_report(table, year)
        }
    };
    debug!(statistics = %kind, year = ?report.year, "built report");
    Ok(report)
}

fn by_vehicle(r: &SalesRecord) -> String {
    r.vehicle_type.clone()
}

fn recession_report(table: &SalesTable) -> Report {
    let rows = table.recession_rows();

    let sales_by_year = group_by(
        rows.iter().copied(),
        |r: &SalesRecord| r.year,
        |r: &SalesRecord| r.automobile_sales,
        Aggregate::Mean,
    );
    let sales_by_vehicle = group_by(
        rows.iter().copied(),
        by_vehicle,
        |r: &SalesRecord| r.automobile_sales,
        Aggregate::Mean,
    );
    let spend_by_vehicle = group_by(
        rows.iter().copied(),
        by_vehicle,
        |r: &SalesRecord| r.advertising_expenditure,
        Aggregate::Sum,
    );
    let unemployment_by_vehicle = group_by(
        rows.iter().copied(),
        by_vehicle,
        |r: &SalesRecord| r.unemployment_rate,
        Aggregate::Mean,
    );

    Report {
        statistics: ReportKind::RecessionPeriod,
        year: None,
        rows: [
            [
                ChartDescriptor::from_groups(
                    ChartKind::Line,
                    "Average Automobile Sales Fluctuation over Recession Period",
                    "Year",
                    "Automobile_Sales",
                    &sales_by_year,
                ),
                ChartDescriptor::from_groups(
                    ChartKind::Bar,
                    "Average Vehicles Sold by Vehicle Type during Recession",
                    "Vehicle_Type",
                    "Automobile_Sales",
                    &sales_by_vehicle,
                ),
            ],
            [
                ChartDescriptor::from_groups(
                    ChartKind::Pie,
                    "Total Advertisement Expenditure Share by Vehicle Type during Recession",
                    "Vehicle_Type",
                    "Advertising_Expenditure",
                    &spend_by_vehicle,
                ),
                ChartDescriptor::from_groups(
                    ChartKind::Bar,
                    "Effect of Unemployment Rate on Vehicle Type and Sales during Recession",
                    "Vehicle_Type",
                    "unemployment_rate",
                    &unemployment_by_vehicle,
                ),
            ],
        ],
    }
}

fn yearly_report(table: &SalesTable, year: i32) -> Report {
    let subset = table.year_rows(year);

    let sales_by_year = group_by(
        table.records(),
        |r: &SalesRecord| r.year,
        |r: &SalesRecord| r.automobile_sales,
        Aggregate::Mean,
    );
    let sales_by_month = group_by(
        subset.iter().copied(),
        |r: &SalesRecord| MonthKey::new(&r.month),
        |r: &SalesRecord| r.automobile_sales,
        Aggregate::Sum,
    );
    let sales_by_vehicle = group_by(
        subset.iter().copied(),
        by_vehicle,
        |r: &SalesRecord| r.automobile_sales,
        Aggregate::Mean,
    );
    let spend_by_vehicle = group_by(
        subset.iter().copied(),
        by_vehicle,
        |r: &SalesRecord| r.advertising_expenditure,
        Aggregate::Sum,
    );

    Report {
        statistics: ReportKind::Yearly,
        year: Some(year),
        rows: [
            [
                ChartDescriptor::from_groups(
                    ChartKind::Line,
                    "Yearly Automobile Sales Over the Whole Period",
                    "Year",
                    "Automobile_Sales",
                    &sales_by_year,
                ),
                ChartDescriptor::from_groups(
                    ChartKind::Line,
                    "Total Monthly Automobile Sales",
                    "Month",
                    "Automobile_Sales",
                    &sales_by_month,
                ),
            ],
            [
                ChartDescriptor::from_groups(
                    ChartKind::Bar,
                    format!("Average Vehicles Sold by Vehicle Type in {}", year),
                    "Vehicle_Type",
                    "Automobile_Sales",
                    &sales_by_vehicle,
                ),
                ChartDescriptor::from_groups(
                    ChartKind::Pie,
                    format!("Total Advertisement Expenditure for Each Vehicle Type in {}", year),
                    "Vehicle_Type",
                    "Advertising_Expenditure",
                    &spend_by_vehicle,
                ),
            ],
        ],
    }
}
