//! Charts: several panels evaluated over the same raw table.

pub mod auto;

use std::borrow::Cow;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    error::{ConfigError, PanelwiseResult},
    format::NumberFormat,
    panel::{Panel, table::PanelTable},
    table::TimeTable,
};

/// Presentation settings shared by every panel of a chart.
///
/// Apart from validation, the engine carries these through to the renderer untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub title: Option<String>,
    pub formatter: NumberFormat,
    /// Shared y-axis range as `(low, high)`.
    pub y_limits: Option<(f64, f64)>,
    /// Figure height in inches.
    pub height: f64,
    /// Figure width per bucket in inches.
    pub width_increment: f64,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            title: None,
            formatter: NumberFormat::default(),
            y_limits: None,
            height: 5.0,
            width_increment: 0.7,
        }
    }
}

impl ChartConfig {
    /// # Errors
    /// * [`ConfigError::InvalidFormat`] if the formatter pattern cannot be parsed.
    /// * [`ConfigError::InvalidYLimits`] unless both limits are finite and `low < high`.
    pub fn validate(&self) -> PanelwiseResult<()> {
        self.formatter.validate()?;
        match self.y_limits {
            Some((low, high)) if !(low.is_finite() && high.is_finite() && low < high) => {
                Err(ConfigError::InvalidYLimits { low, high }.into())
            }
            _ => Ok(()),
        }
    }
}

/// A set of panels sharing one raw table and one y-axis.
///
/// Without explicit panels the chart picks a layout from the table itself, see [`auto`].
#[derive(Debug, Clone, Default)]
pub struct Chart {
    config: ChartConfig,
    panels: Option<Vec<Panel>>,
}

impl Chart {
    pub fn builder() -> ChartBuilder {
        ChartBuilder::default()
    }

    /// A chart that derives its panels from the data.
    pub fn auto() -> Self {
        Self::default()
    }
}

// ================================================================================================
// Accessor Methods
// ================================================================================================

impl Chart {
    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    pub fn title(&self) -> Option<&str> {
        self.config.title.as_deref()
    }

    pub fn formatter(&self) -> &NumberFormat {
        &self.config.formatter
    }

    pub fn y_limits(&self) -> Option<(f64, f64)> {
        self.config.y_limits
    }

    /// Panels given at construction, if any.
    pub fn explicit_panels(&self) -> Option<&[Panel]> {
        self.panels.as_deref()
    }
}

// ================================================================================================
// Evaluation
// ================================================================================================

impl Chart {
    /// The panels this chart renders for `table`: the explicit ones, or an automatic layout.
    pub fn panels<'a>(&'a self, table: &TimeTable) -> PanelwiseResult<Cow<'a, [Panel]>> {
        match &self.panels {
            Some(panels) => Ok(Cow::Borrowed(panels)),
            None => auto::auto_panels(table).map(Cow::Owned),
        }
    }

    /// One panel table per panel, in panel order.
    ///
    /// Panels are independent and are evaluated in parallel. The first failing panel fails the
    /// whole chart.
    #[tracing::instrument(name = "chart_data", skip_all, fields(panels = tracing::field::Empty))]
    pub fn data(&self, table: &TimeTable) -> PanelwiseResult<Vec<PanelTable>> {
        let panels = self.panels(table)?;
        let span = tracing::Span::current();
        span.record("panels", panels.len());

        // Rayon workers do not inherit the caller's span.
        panels
            .par_iter()
            .map(|panel| span.in_scope(|| panel.data(table)))
            .collect::<PanelwiseResult<Vec<_>>>()
    }

    /// Relative panel widths: each panel is as wide as its window.
    pub fn width_ratios(panels: &[Panel]) -> Vec<u32> {
        panels.iter().map(Panel::window_size).collect()
    }

    /// Figure `(width, height)` in inches for the given panels.
    pub fn figure_size(&self, panels: &[Panel]) -> (f64, f64) {
        let buckets = panels.iter().map(|p| f64::from(p.window_size())).sum::<f64>();
        (buckets * self.config.width_increment, self.config.height)
    }
}

/// Builder for [`Chart`].
#[derive(Debug, Clone, Default)]
pub struct ChartBuilder {
    config: ChartConfig,
    panels: Option<Vec<Panel>>,
}

impl ChartBuilder {
    pub fn with_config(self, config: ChartConfig) -> Self {
        Self { config, ..self }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.config.title = Some(title.into());
        self
    }

    pub fn with_formatter(mut self, formatter: NumberFormat) -> Self {
        self.config.formatter = formatter;
        self
    }

    pub fn with_y_limits(mut self, low: f64, high: f64) -> Self {
        self.config.y_limits = Some((low, high));
        self
    }

    pub fn with_height(mut self, height: f64) -> Self {
        self.config.height = height;
        self
    }

    pub fn with_width_increment(mut self, width_increment: f64) -> Self {
        self.config.width_increment = width_increment;
        self
    }

    /// Appends a panel.
    pub fn with_panel(mut self, panel: Panel) -> Self {
        self.panels.get_or_insert_with(Vec::new).push(panel);
        self
    }

    /// Replaces the panel list. An empty list is rejected by [`ChartBuilder::build`].
    pub fn with_panels(self, panels: impl IntoIterator<Item = Panel>) -> Self {
        Self {
            panels: Some(panels.into_iter().collect()),
            ..self
        }
    }

    /// # Errors
    /// * [`ConfigError::NoPanels`] if an explicit panel list was given but is empty.
    /// * Any error from [`ChartConfig::validate`].
    pub fn build(self) -> PanelwiseResult<Chart> {
        if self.panels.as_ref().is_some_and(Vec::is_empty) {
            return Err(ConfigError::NoPanels.into());
        }
        self.config.validate()?;

        Ok(Chart {
            config: self.config,
            panels: self.panels,
        })
    }
}
