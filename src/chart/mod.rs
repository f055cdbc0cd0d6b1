// src/chart/mod.rs
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt::Display;

use crate::stats::Group;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
    Bar,
    Pie,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub label: String,
    pub value: f64,
}

/// Declarative chart: kind, title, axis names and the series to draw.
/// For pie charts `x_label` names the slices and `y_label` their values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDescriptor {
    pub kind: ChartKind,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub points: Vec<DataPoint>,
}

impl ChartDescriptor {
    pub fn new(
        kind: ChartKind,
        title: impl Into<String>,
        x_label: impl Into<String>,
        y_label: impl Into<String>,
        points: Vec<DataPoint>,
    ) -> Self {
        Self {
            kind,
            title: title.into(),
            x_label: x_label.into(),
            y_label: y_label.into(),
            points,
        }
    }

    /// Series from group-by output, keys rendered with `Display`.
    pub fn from_groups<K: Display>(
        kind: ChartKind,
        title: impl Into<String>,
        x_label: impl Into<String>,
        y_label: impl Into<String>,
        groups: &[Group<K>],
    ) -> Self {
        let points = groups
            .iter()
            .map(|g| DataPoint {
                label: g.key.to_string(),
                value: g.value,
            })
            .collect();
        Self::new(kind, title, x_label, y_label, points)
    }

    pub fn labels(&self) -> Vec<&str> {
        self.points.iter().map(|p| p.label.as_str()).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn value_of(&self, label: &str) -> Option<f64> {
        self.points.iter().find(|p| p.label == label).map(|p| p.value)
    }

    /// Plotly figure (`data` + `layout`) for plotly.js.
    pub fn to_plotly(&self) -> Value {
        let labels = self.labels();
        let values = self.values();

        let trace = match self.kind {
            ChartKind::Line => json!({
                "type": "scatter",
                "mode": "lines",
                "x": labels,
                "y": values,
            }),
            ChartKind::Bar => json!({
                "type": "bar",
                "x": labels,
                "y": values,
            }),
            ChartKind::Pie => json!({
                "type": "pie",
                "labels": labels,
                "values": values,
            }),
        };

        let layout = match self.kind {
            ChartKind::Pie => json!({ "title": { "text": self.title } }),
            ChartKind::Line | ChartKind::Bar => json!({
                "title": { "text": self.title },
                "xaxis": { "title": { "text": self.x_label }, "type": "category" },
                "yaxis": { "title": { "text": self.y_label } },
            }),
        };

        json!({ "data": [trace], "layout": layout })
    }
}
