use crate::cli::OutputFormat;
use crate::prelude::*;

use super::projection::ComputedReportItem;

/// Something ready to print.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ItemReport {
    /// Projected items, with the report total when shares should be shown.
    Items {
        items: Vec<ComputedReportItem>,
        #[serde(skip_serializing_if = "Option::is_none")]
        total: Option<f64>,
        #[serde(skip)]
        fraction_digits: usize,
    },
    /// One value per line, tag options or a query string.
    Lines(Vec<String>),
    /// Already rendered JSON, for the raw command.
    Raw(String),
    /// Titled reports, one after another.
    Sections(Vec<(String, ItemReport)>),
}

impl ItemReport {
    pub fn items(items: Vec<ComputedReportItem>) -> Self {
        ItemReport::Items {
            items,
            total: None,
            fraction_digits: 2,
        }
    }

    /// Renders the report for the requested format.
    /// - Text items become two headerless csv columns, a display string and the bare number.
    /// - Csv items get a header and every field, for exporting.
    /// - Json is the serialized report, compact when unformatted.
    pub fn render(&self, format: OutputFormat, no_format: bool) -> AppResult<String> {
        match (self, format) {
            (ItemReport::Raw(json), _) => Ok(json.clone()),

            (ItemReport::Lines(lines), OutputFormat::Text | OutputFormat::Csv) => {
                Ok(lines.join("\n"))
            }

            (_, OutputFormat::Json) => {
                let json = match no_format {
                    true => serde_json::to_string(self),
                    false => serde_json::to_string_pretty(self),
                };

                json.into_diagnostic()
                    .wrap_err("Failed to serialize the report to JSON")
            }

            (
                ItemReport::Items {
                    items,
                    total,
                    fraction_digits,
                },
                OutputFormat::Text,
            ) => Self::format_text(items, *total, *fraction_digits, no_format),

            (ItemReport::Items { items, .. }, OutputFormat::Csv) => Self::format_csv(items),

            (ItemReport::Sections(sections), _) => {
                let rendered = sections
                    .iter()
                    .map(|(title, report)| {
                        report
                            .render(format, no_format)
                            .map(|body| format!("# {}\n{}", title, body))
                    })
                    .collect::<AppResult<Vec<_>>>()?;

                Ok(rendered.join("\n\n"))
            }
        }
    }

    /// Headerless, so it pipes into plotting tools.
    ///
    /// The left cell reads like "web ($1.23, +5.00%)", the right one is the bare
    /// number so it still sorts numerically.
    fn format_text(
        items: &[ComputedReportItem],
        total: Option<f64>,
        fraction_digits: usize,
        no_format: bool,
    ) -> AppResult<String> {
        #[derive(Serialize)]
        struct TextRow {
            display_name: String,
            content: String,
        }

        // The share is only worth printing when there is a total to divide by. Reports
        // without meta (or with a zero total) just get value and delta.
        let rows = items.iter().map(|item| {
            let value = render_value(item.value, item.units.as_deref(), fraction_digits, no_format);

            let display_name = match no_format {
                true => item.label.clone(),
                false => {
                    let share = total
                        .filter(|total| *total != 0.0)
                        .map(|total| format!(", {:.2}% of total", item.value / total * 100.0))
                        .unwrap_or_default();

                    format!(
                        "{} ({}, {}{})",
                        item.label,
                        value,
                        render_delta(item.delta_percent),
                        share
                    )
                }
            };

            TextRow {
                display_name,
                content: item.value.to_string(),
            }
        });

        write_csv(rows, false)
    }

    /// Every field with a header, the way an export is read back.
    fn format_csv(items: &[ComputedReportItem]) -> AppResult<String> {
        #[derive(Serialize)]
        struct ExportRow<'a> {
            id: &'a str,
            label: &'a str,
            value: f64,
            units: &'a str,
            delta_value: f64,
            delta_percent: f64,
        }

        // Raw numbers only. Anything formatted here would have to be parsed back
        // by whoever opens the file in a spreadsheet.
        let rows = items.iter().map(|item| ExportRow {
            id: &item.id,
            label: &item.label,
            value: item.value,
            units: item.units.as_deref().unwrap_or_default(),
            delta_value: item.delta_value,
            delta_percent: item.delta_percent,
        });

        write_csv(rows, true)
    }
}

fn write_csv<T: Serialize>(rows: impl Iterator<Item = T>, has_headers: bool) -> AppResult<String> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(has_headers)
        .from_writer(vec![]);

    for row in rows {
        writer
            .serialize(row)
            .into_diagnostic()
            .wrap_err("Failed to serialize an item row to CSV format")?;
    }

    let data = writer
        .into_inner()
        .into_diagnostic()
        .wrap_err("Failed to get writer data.")?;

    let csv_string = String::from_utf8(data)
        .into_diagnostic()
        .wrap_err("Invalid utf-8")?;

    Ok(csv_string.trim_end().to_owned())
}

/// Money in dollars gets a symbol, other units trail the number.
pub fn render_value(value: f64, units: Option<&str>, fraction_digits: usize, no_format: bool) -> String {
    if no_format {
        // example: 1.23456
        return value.to_string();
    }

    match units {
        Some("USD") => format!("${:.*}", fraction_digits, value),
        Some(units) => format!("{:.*} {}", fraction_digits, value, units),
        None => format!("{:.*}", fraction_digits, value),
    }
}

fn render_delta(delta_percent: f64) -> String {
    format!("{:+.2}%", delta_percent)
}
