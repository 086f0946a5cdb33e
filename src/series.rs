//! Series specifications: which columns feed one output line and how they are reduced.

use itertools::Itertools;
use polars::prelude::PlSmallStr;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumCount, EnumIter, EnumString, IntoStaticStr};

use crate::{agg::Aggregation, time::offset::CalendarOffset};

/// One output line of a panel.
///
/// A series without an offset is an *anchor*: the panel's window is placed relative to the data
/// the anchors see. Offset series (e.g. year-over-year comparisons) are shifted forward before
/// bucketing so they line up with the anchors.
#[derive(Debug, Clone)]
pub struct SeriesSpec {
    columns: Vec<PlSmallStr>,
    label: PlSmallStr,
    aggregation: Aggregation,
    offset: Option<CalendarOffset>,
    style: SeriesStyle,
    annotations: Option<AnnotationStyle>,
}

impl SeriesSpec {
    /// Builds a series over `columns`; duplicates are removed while keeping the first occurrence.
    pub fn new<I>(columns: I, label: impl Into<PlSmallStr>, aggregation: Aggregation) -> Self
    where
        I: IntoIterator,
        I::Item: Into<PlSmallStr>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).unique().collect(),
            label: label.into(),
            aggregation,
            offset: None,
            style: SeriesStyle::default(),
            annotations: None,
        }
    }

    /// Shifts every timestamp forward by `offset` before bucketing.
    ///
    /// A zero offset is kept as "no offset", so the series stays an anchor.
    pub fn with_offset(self, offset: CalendarOffset) -> Self {
        Self {
            offset: (!offset.is_zero()).then_some(offset),
            ..self
        }
    }

    pub fn with_style(self, style: SeriesStyle) -> Self {
        Self { style, ..self }
    }

    pub fn with_annotations(self, annotations: AnnotationStyle) -> Self {
        Self {
            annotations: Some(annotations),
            ..self
        }
    }

    pub fn columns(&self) -> &[PlSmallStr] {
        &self.columns
    }

    pub fn label(&self) -> &PlSmallStr {
        &self.label
    }

    pub fn aggregation(&self) -> &Aggregation {
        &self.aggregation
    }

    pub fn offset(&self) -> Option<CalendarOffset> {
        self.offset
    }

    pub fn is_anchor(&self) -> bool {
        self.offset.is_none()
    }

    pub fn style(&self) -> &SeriesStyle {
        &self.style
    }

    pub fn annotations(&self) -> Option<&AnnotationStyle> {
        self.annotations.as_ref()
    }
}

/// Line dash patterns available to a chart, in the order auto-selection hands them out.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    EnumCount,
    IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    DashDot,
    Dotted,
}

impl LineStyle {
    /// Matplotlib-style dash pattern.
    pub fn pattern(&self) -> &'static str {
        match self {
            Self::Solid => "-",
            Self::Dashed => "--",
            Self::DashDot => "-.",
            Self::Dotted => ":",
        }
    }
}

/// Display hints carried through to the renderer; the engine never interprets them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeriesStyle {
    pub color: String,
    pub alpha: f64,
    pub line_style: LineStyle,
    pub marker: String,
    pub marker_size: u32,
}

impl Default for SeriesStyle {
    fn default() -> Self {
        Self {
            color: "black".to_string(),
            alpha: 1.0,
            line_style: LineStyle::Solid,
            marker: "o".to_string(),
            marker_size: 0,
        }
    }
}

impl SeriesStyle {
    pub fn with_color(self, color: impl Into<String>) -> Self {
        Self {
            color: color.into(),
            ..self
        }
    }

    pub fn with_alpha(self, alpha: f64) -> Self {
        Self { alpha, ..self }
    }

    pub fn with_line_style(self, line_style: LineStyle) -> Self {
        Self { line_style, ..self }
    }

    pub fn with_marker(self, marker: impl Into<String>, marker_size: u32) -> Self {
        Self {
            marker: marker.into(),
            marker_size,
            ..self
        }
    }
}

/// Placement of per-point value annotations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationStyle {
    pub text_coords: String,
    pub offset: (i32, i32),
    pub align: String,
    pub font_size: u32,
}

impl Default for AnnotationStyle {
    fn default() -> Self {
        Self {
            text_coords: "offset points".to_string(),
            offset: (0, 10),
            align: "center".to_string(),
            font_size: 8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agg::builtins::{ratio, sum};
    use strum::IntoEnumIterator;

    #[test]
    fn columns_are_an_ordered_set() {
        let series = SeriesSpec::new(["b", "a", "b"], "s", sum());
        assert_eq!(
            series.columns(),
            &[PlSmallStr::from("b"), PlSmallStr::from("a")]
        );
        assert!(series.is_anchor());
    }

    #[test]
    fn zero_offset_keeps_the_anchor() {
        let series = SeriesSpec::new(["ok", "total"], "rate", ratio("ok", "total"))
            .with_offset(CalendarOffset::default());
        assert!(series.is_anchor());

        let series = series.with_offset(CalendarOffset::years(1));
        assert!(!series.is_anchor());
        assert_eq!(series.offset(), Some(CalendarOffset::months(12)));
    }

    #[test]
    fn four_line_styles_in_order() {
        assert_eq!(LineStyle::COUNT, 4);
        let patterns = LineStyle::iter().map(|s| s.pattern()).collect::<Vec<_>>();
        assert_eq!(patterns, vec!["-", "--", "-.", ":"]);
    }

    #[test]
    fn style_deserializes_with_defaults() {
        let style: SeriesStyle =
            serde_json::from_str(r#"{"color": "tab:blue", "line_style": "dash_dot"}"#).unwrap();
        assert_eq!(style.color, "tab:blue");
        assert_eq!(style.line_style, LineStyle::DashDot);
        assert_eq!(style.alpha, 1.0);
        assert_eq!(style.marker, "o");
    }
}
