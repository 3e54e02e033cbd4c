/*!
# Purchase-Order Fields

Extraction of the fixed purchase-order field set and its export as a
single-row CSV.

The model is asked for `KEY: value` lines. Parsing keeps every line that has a
`:` (split at the first one, both sides trimmed) and ignores the rest. Keys
outside [`FIELD_COLUMNS`] survive parsing but are dropped at CSV export;
columns without a parsed key are left empty.
*/

use crate::prompts::PromptEngine;
use crate::types::{GenerateTextParams, LanguageModel};
use crate::{OrderScanError, Result};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::io::Write;
use std::sync::Arc;
use tracing::info;

/// Value the model is told to use for unknown fields
pub const NOT_AVAILABLE: &str = "N/A";

/// Model key → CSV column, in export order
pub const FIELD_COLUMNS: [(&str, &str); 23] = [
    ("ORDER_DATE", "Order date"),
    ("ORDER_NUMBER", "Order number"),
    ("CONTRACT_NUMBER", "Contract Number"),
    ("ORDERER", "Orderer"),
    ("BILLING_ADDRESS", "Billing address"),
    ("DELIVERY_ADDRESS", "Delivery address"),
    ("SUPPLIER_ADDRESS", "Supplier address"),
    ("OUR_RANGE", "our range"),
    ("OFFER_DATE", "Offer date"),
    ("DELIVERY_DATE", "Delivery date"),
    ("DELIVERY_CONDITIONS", "Delivery conditions"),
    ("PAYMENT_TERMS", "Payment terms"),
    ("REMARKS", "Remarks"),
    ("MATERIAL_NUMBER_KUNDE", "Material number Kunde"),
    ("MATERIAL_NUMBER_CCL", "Material number CCL"),
    ("MATERIAL_DESCRIPTION", "Material description"),
    ("DRAWING_NUMBER", "Drawing number"),
    ("CROWD", "Crowd"),
    ("PRICE_PER_UNIT", "Price/unit"),
    ("PRICE_PIECE", "Price piece"),
    ("NET_AMOUNT", "net amount"),
    ("CURRENCY", "Currency"),
    ("COMMODITY_NUMBER", "Commodity number"),
];

/// Field keys in prompt order
pub fn field_keys() -> Vec<&'static str> {
    FIELD_COLUMNS.iter().map(|(key, _)| *key).collect()
}

/// CSV header in export order
pub fn csv_header() -> Vec<&'static str> {
    FIELD_COLUMNS.iter().map(|(_, column)| *column).collect()
}

/// CSV column for a model key
pub fn column_for(key: &str) -> Option<&'static str> {
    FIELD_COLUMNS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, column)| *column)
}

/// Parsed `KEY: value` pairs in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuredFields {
    entries: Vec<(String, String)>,
}

impl StructuredFields {
    /// Empty mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse raw model output line by line
    pub fn parse(raw: &str) -> Self {
        let mut fields = Self::new();
        for line in raw.split('\n') {
            if let Some((key, value)) = line.split_once(':') {
                fields.insert(key.trim(), value.trim());
            }
        }
        fields
    }

    /// Insert or overwrite (an overwritten key keeps its position)
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Value for `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Number of parsed keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing was parsed
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(key, value)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Keys that have no CSV column
    pub fn unmapped_keys(&self) -> Vec<&str> {
        self.entries
            .iter()
            .map(|(k, _)| k.as_str())
            .filter(|k| column_for(k).is_none())
            .collect()
    }

    /// Row values in [`csv_header`] order; missing fields are empty
    pub fn csv_row(&self) -> Vec<String> {
        FIELD_COLUMNS
            .iter()
            .map(|(key, _)| self.get(key).unwrap_or_default().to_string())
            .collect()
    }

    /// Write header and the single row as CSV (CRLF line endings)
    pub fn write_csv<W: Write>(&self, out: W) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::CRLF)
            .from_writer(out);
        writer.write_record(csv_header())?;
        writer.write_record(self.csv_row())?;
        writer.flush()?;
        Ok(())
    }

    /// CSV document as a string
    pub fn to_csv_string(&self) -> Result<String> {
        let mut buf = Vec::new();
        self.write_csv(&mut buf)?;
        String::from_utf8(buf).map_err(|e| OrderScanError::other(e.to_string()))
    }
}

impl Serialize for StructuredFields {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Asks the model for the purchase-order fields in a single request
pub struct FieldExtractor {
    model: Arc<dyn LanguageModel>,
    prompts: PromptEngine,
}

impl FieldExtractor {
    /// Create an extractor
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            model,
            prompts: PromptEngine::new(),
        }
    }

    /// Run the extraction request and parse its answer
    pub async fn extract(&self, text: &str) -> Result<StructuredFields> {
        let prompt = self.prompts.fields_prompt(text, &field_keys())?;
        let raw = self
            .model
            .generate_text(GenerateTextParams::prompt(prompt))
            .await?;

        let fields = StructuredFields::parse(&raw);
        let unmapped = fields.unmapped_keys();
        info!(
            "FIELDS_PARSED keys={} unmapped={}",
            fields.len(),
            unmapped.len()
        );
        if !unmapped.is_empty() {
            tracing::debug!("FIELDS_UNMAPPED keys={:?}", unmapped);
        }
        Ok(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MockLanguageModel;

    #[test]
    fn test_parse_ignores_lines_without_colon() {
        let fields = StructuredFields::parse("ORDER_NUMBER: 12345\nNOTES\nCURRENCY: EUR");
        assert_eq!(fields.len(), 2);
        assert_eq!(fields.get("ORDER_NUMBER"), Some("12345"));
        assert_eq!(fields.get("CURRENCY"), Some("EUR"));
        assert_eq!(fields.get("NOTES"), None);
    }

    #[test]
    fn test_parse_splits_on_first_colon_and_trims() {
        let fields = StructuredFields::parse(
            "  ORDER_DATE :  2024-03-01 \r\nREMARKS: deliver at 08:30: gate 4\n\n",
        );
        assert_eq!(fields.get("ORDER_DATE"), Some("2024-03-01"));
        assert_eq!(fields.get("REMARKS"), Some("deliver at 08:30: gate 4"));
    }

    #[test]
    fn test_parse_keeps_unknown_keys_and_last_duplicate() {
        let fields = StructuredFields::parse("FOO: bar\nCURRENCY: USD\nCURRENCY: EUR");
        assert_eq!(fields.get("FOO"), Some("bar"));
        assert_eq!(fields.get("CURRENCY"), Some("EUR"));
        assert_eq!(fields.unmapped_keys(), vec!["FOO"]);
        let keys: Vec<&str> = fields.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["FOO", "CURRENCY"]);
    }

    #[test]
    fn test_parse_keeps_not_available_sentinel() {
        let fields = StructuredFields::parse("DRAWING_NUMBER: N/A");
        assert_eq!(fields.get("DRAWING_NUMBER"), Some(NOT_AVAILABLE));
        assert_eq!(fields.csv_row()[16], NOT_AVAILABLE);
    }

    #[test]
    fn test_header_order() {
        let header = csv_header();
        assert_eq!(header.len(), 23);
        assert_eq!(header[0], "Order date");
        assert_eq!(header[1], "Order number");
        assert_eq!(header[18], "Price/unit");
        assert_eq!(header[22], "Commodity number");
        assert_eq!(column_for("NET_AMOUNT"), Some("net amount"));
        assert_eq!(column_for("NOTES"), None);
    }

    #[test]
    fn test_csv_export_single_field() {
        let mut fields = StructuredFields::new();
        fields.insert("ORDER_NUMBER", "12345");

        let csv_text = fields.to_csv_string().unwrap();
        let mut reader = csv::Reader::from_reader(csv_text.as_bytes());

        let header: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(header, csv_header());

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.len(), header.len());
        for (column, value) in header.iter().zip(row.iter()) {
            if column == "Order number" {
                assert_eq!(value, "12345");
            } else {
                assert_eq!(value, "", "column {} should be empty", column);
            }
        }
    }

    #[test]
    fn test_csv_export_drops_unknown_and_quotes_commas() {
        let fields = StructuredFields::parse(
            "BILLING_ADDRESS: Hauptstr. 1, 50667 Koeln\nINTERNAL_NOTE: secret",
        );
        let csv_text = fields.to_csv_string().unwrap();
        assert!(!csv_text.contains("secret"));
        assert!(csv_text.contains("\"Hauptstr. 1, 50667 Koeln\""));
        assert!(csv_text.ends_with("\r\n"));

        let mut reader = csv::Reader::from_reader(csv_text.as_bytes());
        let row = reader.records().next().unwrap().unwrap();
        assert_eq!(&row[4], "Hauptstr. 1, 50667 Koeln");
    }

    #[test]
    fn test_serializes_as_map() {
        let fields = StructuredFields::parse("ORDER_NUMBER: 1\nCURRENCY: EUR");
        let json = serde_json::to_value(&fields).unwrap();
        assert_eq!(json, serde_json::json!({ "ORDER_NUMBER": "1", "CURRENCY": "EUR" }));
    }

    #[tokio::test]
    async fn test_extractor_issues_exactly_one_request() {
        let mut model = MockLanguageModel::new();
        model
            .expect_generate_text()
            .times(1)
            .withf(|params| {
                params.prompt.contains("Purchase order 4711")
                    && params.prompt.contains("ORDER_DATE:")
                    && params.prompt.contains("COMMODITY_NUMBER:")
            })
            .returning(|_| Ok("ORDER_NUMBER: 4711\nSome chatter\nCURRENCY: EUR".to_string()));

        let extractor = FieldExtractor::new(Arc::new(model));
        let fields = extractor.extract("Purchase order 4711").await.unwrap();

        assert_eq!(fields.get("ORDER_NUMBER"), Some("4711"));
        assert_eq!(fields.get("CURRENCY"), Some("EUR"));
        assert_eq!(fields.len(), 2);
    }

    #[tokio::test]
    async fn test_extractor_propagates_model_failure() {
        let mut model = MockLanguageModel::new();
        model
            .expect_generate_text()
            .times(1)
            .returning(|_| Err(OrderScanError::model("401 Unauthorized")));

        let extractor = FieldExtractor::new(Arc::new(model));
        let err = extractor.extract("anything").await.unwrap_err();
        assert!(matches!(err, OrderScanError::Model(_)));
    }
}
