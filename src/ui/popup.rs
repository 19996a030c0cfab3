use crate::{
    core::constants::MISSING_VALUE,
    data::feature::{display_value, present, Feature},
};
use serde_json::Value;

/// One labelled line of a station popup
#[derive(Debug, Clone, PartialEq)]
pub struct PopupRow {
    /// Plain-text label for non-HTML surfaces
    pub label: &'static str,
    label_html: &'static str,
    /// Display value, unit included
    pub value: String,
}

/// Station details shown when a marker is clicked
#[derive(Debug, Clone, PartialEq)]
pub struct PopupContent {
    pub heading: String,
    pub rows: Vec<PopupRow>,
}

impl PopupContent {
    pub fn from_feature(feature: &Feature) -> Self {
        let props = &feature.properties;
        Self {
            heading: heading_text(props.index.as_ref()),
            rows: vec![
                row("Network/Station Code", "Network/Station Code", props.net_sta.as_ref(), None),
                row("Station Name", "Station Name", props.name.as_ref(), None),
                row("Method", "Method", props.method.as_ref(), None),
                row(
                    "Vs30",
                    "<i>V</i><sub><i>S</i>30</sub>",
                    props.vs30.as_ref(),
                    Some("m/s"),
                ),
                row(
                    "Max. Depth of Profile",
                    "Max. Depth of Profile",
                    props.d_max.as_ref(),
                    Some("m"),
                ),
            ],
        }
    }

    /// Value of the row with the given plain-text label
    pub fn value(&self, label: &str) -> Option<&str> {
        self.rows
            .iter()
            .find(|row| row.label == label)
            .map(|row| row.value.as_str())
    }

    pub fn to_html(&self) -> String {
        let mut html = format!("<div class=\"popup\"><h1>{}</h1><table>", escape_html(&self.heading));
        for row in &self.rows {
            html.push_str(&format!(
                "<tr><th>{}</th><td>{}</td></tr>",
                row.label_html,
                escape_html(&row.value)
            ));
        }
        html.push_str("</table></div>");
        html
    }
}

fn row(
    label: &'static str,
    label_html: &'static str,
    value: Option<&Value>,
    unit: Option<&str>,
) -> PopupRow {
    let text = text_or_missing(value);
    PopupRow {
        label,
        label_html,
        value: match unit {
            Some(unit) => format!("{text} {unit}"),
            None => text,
        },
    }
}

/// The index is printed as-is; only a missing or null index is absent
fn heading_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => MISSING_VALUE.to_string(),
        Some(value) => display_value(value),
    }
}

fn text_or_missing(value: Option<&Value>) -> String {
    present(value)
        .map(display_value)
        .unwrap_or_else(|| MISSING_VALUE.to_string())
}

/// Escapes text for inclusion in HTML element content or attribute values
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
