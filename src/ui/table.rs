//! Sortable table bound to an observable collection.
//!
//! The table keeps its own copy of the rows, refreshed whenever the collection
//! it is subscribed to resets. Sorting is stable: rows with equal keys keep
//! their collection order.

use crate::{
    data::feature::{display_value, Feature},
    ui::popup::escape_html,
    MapError, Result,
};
use serde_json::Value;
use std::cmp::Ordering;

/// Comparable value extracted from a row for sorting.
///
/// Missing keys sort first, then numbers numerically, then text lexically.
/// Null and the empty string count as missing.
#[derive(Debug, Clone)]
pub enum SortKey {
    Missing,
    Number(f64),
    Text(String),
}

impl SortKey {
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => SortKey::Missing,
            Some(Value::String(s)) if s.is_empty() => SortKey::Missing,
            Some(Value::Number(n)) => n.as_f64().map_or(SortKey::Missing, SortKey::Number),
            Some(Value::String(s)) => SortKey::Text(s.clone()),
            Some(Value::Bool(b)) => SortKey::Number(if *b { 1.0 } else { 0.0 }),
            Some(other) => SortKey::Text(other.to_string()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            SortKey::Missing => 0,
            SortKey::Number(_) => 1,
            SortKey::Text(_) => 2,
        }
    }
}

impl PartialEq for SortKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SortKey {}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortKey::Number(a), SortKey::Number(b)) => a.total_cmp(b),
            (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

pub struct Column<T> {
    pub class_name: String,
    pub title: String,
    format: Box<dyn Fn(&T) -> String + Send + Sync>,
}

impl<T> Column<T> {
    pub fn new<F>(class_name: impl Into<String>, title: impl Into<String>, format: F) -> Self
    where
        F: Fn(&T) -> String + Send + Sync + 'static,
    {
        Self {
            class_name: class_name.into(),
            title: title.into(),
            format: Box::new(format),
        }
    }

    pub fn format(&self, row: &T) -> String {
        (self.format)(row)
    }
}

pub struct Sort<T> {
    pub id: String,
    pub title: String,
    sort_by: Box<dyn Fn(&T) -> SortKey + Send + Sync>,
}

impl<T> Sort<T> {
    pub fn new<F>(id: impl Into<String>, title: impl Into<String>, sort_by: F) -> Self
    where
        F: Fn(&T) -> SortKey + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            title: title.into(),
            sort_by: Box::new(sort_by),
        }
    }

    pub fn key(&self, row: &T) -> SortKey {
        (self.sort_by)(row)
    }
}

pub struct DataTable<T> {
    columns: Vec<Column<T>>,
    sorts: Vec<Sort<T>>,
    items: Vec<T>,
    selected: Option<usize>,
    descending: bool,
}

impl<T: Clone> DataTable<T> {
    pub fn new(columns: Vec<Column<T>>, sorts: Vec<Sort<T>>) -> Self {
        Self {
            columns,
            sorts,
            items: Vec::new(),
            selected: None,
            descending: false,
        }
    }

    /// Replaces the rows; called from the collection's reset notification
    pub fn render(&mut self, items: &[T]) {
        self.items = items.to_vec();
        log::debug!("table rendered with {} row(s)", self.items.len());
    }

    /// Selects a sort by id. Selecting the current sort again flips direction.
    pub fn select_sort(&mut self, id: &str) -> Result<()> {
        let index = self
            .sorts
            .iter()
            .position(|sort| sort.id == id)
            .ok_or_else(|| MapError::Config(format!("unknown sort {id:?}")))?;

        if self.selected == Some(index) {
            self.descending = !self.descending;
        } else {
            self.selected = Some(index);
            self.descending = false;
        }
        Ok(())
    }

    pub fn selected_sort(&self) -> Option<&Sort<T>> {
        self.selected.and_then(|index| self.sorts.get(index))
    }

    pub fn is_descending(&self) -> bool {
        self.descending
    }

    pub fn headers(&self) -> Vec<&str> {
        self.columns.iter().map(|column| column.title.as_str()).collect()
    }

    pub fn sorts(&self) -> &[Sort<T>] {
        &self.sorts
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Rows in display order
    pub fn sorted_items(&self) -> Vec<&T> {
        let mut rows: Vec<&T> = self.items.iter().collect();
        if let Some(sort) = self.selected_sort() {
            let mut keyed: Vec<(SortKey, &T)> = rows.into_iter().map(|row| (sort.key(row), row)).collect();
            if self.descending {
                keyed.sort_by(|a, b| b.0.cmp(&a.0));
            } else {
                keyed.sort_by(|a, b| a.0.cmp(&b.0));
            }
            rows = keyed.into_iter().map(|(_, row)| row).collect();
        }
        rows
    }

    /// Formatted cells in display order
    pub fn rows(&self) -> Vec<Vec<String>> {
        self.sorted_items()
            .into_iter()
            .map(|row| self.columns.iter().map(|column| column.format(row)).collect())
            .collect()
    }

    pub fn to_html(&self) -> String {
        let mut html = String::from("<table class=\"datatable\"><thead><tr>");
        for column in &self.columns {
            html.push_str(&format!(
                "<th class=\"{}\">{}</th>",
                escape_html(&column.class_name),
                escape_html(&column.title)
            ));
        }
        html.push_str("</tr></thead><tbody>");
        for row in self.sorted_items() {
            html.push_str("<tr>");
            for column in &self.columns {
                html.push_str(&format!(
                    "<td class=\"{}\">{}</td>",
                    escape_html(&column.class_name),
                    escape_html(&column.format(row))
                ));
            }
            html.push_str("</tr>");
        }
        html.push_str("</tbody></table>");
        html
    }
}

impl<T> std::fmt::Debug for DataTable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataTable")
            .field("columns", &self.columns.len())
            .field("rows", &self.items.len())
            .field("selected", &self.selected)
            .field("descending", &self.descending)
            .finish()
    }
}

/// Station table: ID and Name columns, sortable `byid` and `byname`
pub fn feature_table() -> DataTable<Feature> {
    DataTable::new(
        vec![
            Column::new("id", "ID", |feature: &Feature| feature.id_text()),
            Column::new("name", "Name", |feature: &Feature| {
                feature.properties.name.as_ref().map(display_value).unwrap_or_default()
            }),
        ],
        vec![
            Sort::new("byid", "ID", |feature: &Feature| SortKey::from_value(feature.id.as_ref())),
            Sort::new("byname", "Name", |feature: &Feature| {
                SortKey::from_value(feature.properties.name.as_ref())
            }),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::feature::FeatureProperties;

    fn stations() -> Vec<Feature> {
        vec![
            Feature::new(3, -122.0, 37.0, FeatureProperties::named("Berkeley", "#f00")),
            Feature::new(1, -118.0, 34.0, FeatureProperties::named("Pasadena", "#0f0")),
            Feature::new(2, -117.0, 33.0, FeatureProperties::named("Berkeley", "#00f")),
        ]
    }

    #[test]
    fn test_rows_follow_collection_order_without_sort() {
        let mut table = feature_table();
        table.render(&stations());

        assert_eq!(table.headers(), ["ID", "Name"]);
        let ids: Vec<String> = table.rows().into_iter().map(|row| row[0].clone()).collect();
        assert_eq!(ids, ["3", "1", "2"]);
    }

    #[test]
    fn test_sort_by_id_and_name() {
        let mut table = feature_table();
        table.render(&stations());

        table.select_sort("byid").unwrap();
        let by_id: Vec<String> = table.rows().into_iter().map(|row| row[0].clone()).collect();
        assert_eq!(by_id, ["1", "2", "3"]);

        table.select_sort("byname").unwrap();
        let by_name: Vec<String> = table.rows().into_iter().map(|row| row[0].clone()).collect();
        // equal names keep collection order
        assert_eq!(by_name, ["3", "2", "1"]);

        let mut a = by_id.clone();
        let mut b = by_name.clone();
        a.sort();
        b.sort();
        assert_eq!(a, b);
    }

    #[test]
    fn test_reselecting_sort_toggles_direction() {
        let mut table = feature_table();
        table.render(&stations());

        table.select_sort("byid").unwrap();
        table.select_sort("byid").unwrap();
        assert!(table.is_descending());
        let ids: Vec<String> = table.rows().into_iter().map(|row| row[0].clone()).collect();
        assert_eq!(ids, ["3", "2", "1"]);

        assert!(table.select_sort("bycolor").is_err());
    }

    #[test]
    fn test_sort_key_order() {
        let mut keys = vec![
            SortKey::Text("b".into()),
            SortKey::Number(10.0),
            SortKey::Missing,
            SortKey::Number(2.0),
            SortKey::Text("a".into()),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                SortKey::Missing,
                SortKey::Number(2.0),
                SortKey::Number(10.0),
                SortKey::Text("a".into()),
                SortKey::Text("b".into()),
            ]
        );
    }

    #[test]
    fn test_sort_key_equality_matches_ordering() {
        assert_eq!(SortKey::Number(-0.0).cmp(&SortKey::Number(0.0)), Ordering::Less);
        assert_ne!(SortKey::Number(-0.0), SortKey::Number(0.0));
        assert_eq!(SortKey::Number(f64::NAN), SortKey::Number(f64::NAN));
        assert_eq!(SortKey::Text("a".into()), SortKey::Text("a".into()));
    }

    #[test]
    fn test_empty_id_and_name_sort_as_missing() {
        let mut table = feature_table();
        table.render(&[
            Feature::new("b", 0.0, 0.0, FeatureProperties::named("", "#fff")),
            Feature::new("", 1.0, 1.0, FeatureProperties::named("Z", "#fff")),
            Feature::new("a", 2.0, 2.0, FeatureProperties::named("Y", "#fff")),
        ]);

        table.select_sort("byid").unwrap();
        let ids: Vec<String> = table.rows().into_iter().map(|row| row[0].clone()).collect();
        assert_eq!(ids, ["", "a", "b"]);

        table.select_sort("byname").unwrap();
        let names: Vec<String> = table.rows().into_iter().map(|row| row[1].clone()).collect();
        assert_eq!(names, ["", "Y", "Z"]);

        assert_eq!(SortKey::from_value(Some(&Value::String(String::new()))), SortKey::Missing);
        assert_eq!(SortKey::from_value(Some(&serde_json::json!(0))), SortKey::Number(0.0));
    }

    #[test]
    fn test_html_is_escaped() {
        let mut table = feature_table();
        table.render(&[Feature::new("x", 0.0, 0.0, FeatureProperties::named("A&B", "#fff"))]);
        let html = table.to_html();
        assert!(html.contains("<th class=\"id\">ID</th>"));
        assert!(html.contains("<td class=\"name\">A&amp;B</td>"));
    }
}
