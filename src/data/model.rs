use std::fmt;

use crate::error::{HarnessError, Result};

// ---------------------------------------------------------------------------
// Attribute – a named, typed column
// ---------------------------------------------------------------------------

/// Column type. A nominal domain is fixed once the attribute is built; rows
/// refer to labels by their position in it.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeKind {
    Numeric,
    Nominal(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    name: String,
    kind: AttributeKind,
}

impl Attribute {
    pub fn numeric(name: impl Into<String>) -> Self {
        Attribute {
            name: name.into(),
            kind: AttributeKind::Numeric,
        }
    }

    /// Build a nominal attribute. Labels are expected to be distinct; the
    /// loaders reject duplicate declarations before getting here.
    pub fn nominal(name: impl Into<String>, domain: Vec<String>) -> Self {
        Attribute {
            name: name.into(),
            kind: AttributeKind::Nominal(domain),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &AttributeKind {
        &self.kind
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.kind, AttributeKind::Numeric)
    }

    pub fn is_nominal(&self) -> bool {
        matches!(self.kind, AttributeKind::Nominal(_))
    }

    /// The nominal domain, `None` for numeric attributes.
    pub fn domain(&self) -> Option<&[String]> {
        match &self.kind {
            AttributeKind::Nominal(domain) => Some(domain),
            AttributeKind::Numeric => None,
        }
    }

    /// Position of `label` in the nominal domain.
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.domain()?.iter().position(|l| l == label)
    }

    /// Label stored at `index` in the nominal domain.
    pub fn label(&self, index: usize) -> Option<&str> {
        self.domain()?.get(index).map(String::as_str)
    }

    /// Whether `value` is a legal cell for this column.
    pub fn accepts(&self, value: &Value) -> bool {
        match (value, &self.kind) {
            (Value::Missing, _) => true,
            (Value::Numeric(_), AttributeKind::Numeric) => true,
            (Value::Nominal(i), AttributeKind::Nominal(domain)) => *i < domain.len(),
            _ => false,
        }
    }

    /// Render a cell of this column as text: the label for nominal cells,
    /// the number for numeric ones, `?` for missing.
    pub fn render(&self, value: &Value) -> String {
        match value {
            Value::Nominal(i) => self
                .label(*i)
                .map(str::to_string)
                .unwrap_or_else(|| format!("#{i}")),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            AttributeKind::Numeric => write!(f, "{} numeric", self.name),
            AttributeKind::Nominal(domain) => write!(f, "{} {{{}}}", self.name, domain.join(",")),
        }
    }
}

/// Text used when a number becomes a nominal label: always carries a
/// fractional part or exponent (`3.0`, `0.25`, `1e20`).
pub fn number_label(value: f64) -> String {
    format!("{value:?}")
}

// ---------------------------------------------------------------------------
// Value – a single cell
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Numeric(f64),
    /// Index into the owning attribute's domain.
    Nominal(usize),
    Missing,
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Numeric(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_index(&self) -> Option<usize> {
        match self {
            Value::Nominal(i) => Some(*i),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Numeric(v) => write!(f, "{v}"),
            Value::Nominal(i) => write!(f, "#{i}"),
            Value::Missing => write!(f, "?"),
        }
    }
}

// ---------------------------------------------------------------------------
// Row – one record, aligned by position with the attribute list
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Row { values }
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn push(&mut self, value: Value) {
        self.values.push(value);
    }

    pub(crate) fn set(&mut self, index: usize, value: Value) {
        self.values[index] = value;
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Row::new(values)
    }
}

// ---------------------------------------------------------------------------
// Dataset – attributes, rows and the target column
// ---------------------------------------------------------------------------

/// An in-memory table. Attribute position is authoritative; names may repeat.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    relation: String,
    attributes: Vec<Attribute>,
    rows: Vec<Row>,
    /// Explicit target column. `None` means "last column".
    target: Option<usize>,
}

impl Dataset {
    /// Empty dataset with the given schema.
    pub fn new(relation: impl Into<String>, attributes: Vec<Attribute>) -> Self {
        Dataset {
            relation: relation.into(),
            attributes,
            rows: Vec::new(),
            target: None,
        }
    }

    /// Dataset with the given schema and rows, validating every row.
    pub fn with_rows(
        relation: impl Into<String>,
        attributes: Vec<Attribute>,
        rows: Vec<Row>,
    ) -> Result<Self> {
        let mut dataset = Dataset::new(relation, attributes);
        dataset.rows.reserve(rows.len());
        for row in rows {
            dataset.push_row(row)?;
        }
        Ok(dataset)
    }

    /// Append a row after checking its width and cell types.
    pub fn push_row(&mut self, row: Row) -> Result<()> {
        if row.len() != self.attributes.len() {
            return Err(HarnessError::Schema(format!(
                "row {} has {} value(s), relation '{}' has {} attribute(s)",
                self.rows.len(),
                row.len(),
                self.relation,
                self.attributes.len()
            )));
        }
        for (col, (attr, value)) in self.attributes.iter().zip(row.values()).enumerate() {
            if !attr.accepts(value) {
                return Err(HarnessError::Schema(format!(
                    "row {}, column {col} ('{}'): value {value} does not fit the attribute kind",
                    self.rows.len(),
                    attr.name()
                )));
            }
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn relation(&self) -> &str {
        &self.relation
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn attribute(&self, index: usize) -> Option<&Attribute> {
        self.attributes.get(index)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn num_attributes(&self) -> usize {
        self.attributes.len()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Target column: the explicit index if one was set, else the last column.
    pub fn target_index(&self) -> Option<usize> {
        self.target
            .or_else(|| self.attributes.len().checked_sub(1))
    }

    pub fn target_attribute(&self) -> Option<&Attribute> {
        self.target_index().and_then(|i| self.attributes.get(i))
    }

    /// Values of column `index`, in row order.
    pub fn column(&self, index: usize) -> impl Iterator<Item = Value> + '_ {
        self.rows
            .iter()
            .map(move |row| row.get(index).copied().unwrap_or(Value::Missing))
    }

    // -- Structural mutation, reserved for schema reconciliation --

    pub(crate) fn set_target(&mut self, index: usize) {
        self.target = Some(index);
    }

    /// Append a column, filling each row from `fill`.
    pub(crate) fn append_attribute(&mut self, attribute: Attribute, fill: impl Fn(&Row) -> Value) {
        for row in &mut self.rows {
            let value = fill(row);
            row.push(value);
        }
        self.attributes.push(attribute);
    }

    /// Swap column `index` for a new attribute and per-row values.
    pub(crate) fn replace_attribute(&mut self, index: usize, attribute: Attribute, values: Vec<Value>) {
        debug_assert_eq!(values.len(), self.rows.len());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.set(index, value);
        }
        self.attributes[index] = attribute;
    }
}
