use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use arrow::array::{
    Array, ArrayRef, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
    LargeStringArray, StringArray,
};
use arrow::datatypes::DataType;
use log::debug;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{Attribute, Dataset, Row, Value};
use crate::error::{HarnessError, Result};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Options for delimited (CSV / TXT) inputs. Ignored by the other formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// First line holds column names. When `false`, columns are named
    /// `<file stem>_dim<i>` and every line is data.
    pub has_header: bool,
    /// Field separator. `None` sniffs the first line: comma, then tab, then space.
    pub delimiter: Option<u8>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            has_header: true,
            delimiter: None,
        }
    }
}

impl LoadOptions {
    pub fn headerless() -> Self {
        LoadOptions {
            has_header: false,
            delimiter: None,
        }
    }
}

/// Load a dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.arff`           – attribute-relation file with declared attribute kinds
/// * `.csv` / `.txt`   – delimited values, kinds inferred from content
/// * `.json`           – `[{ "a": 1.0, "class": "x" }, ...]`
/// * `.parquet`        – scalar columns (numbers, strings, booleans)
pub fn load_file(path: &Path, options: &LoadOptions) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "arff" => load_arff(path)?,
        "csv" | "txt" => load_delimited(path, options)?,
        "json" => load_json(path)?,
        "parquet" | "pq" => load_parquet(path)?,
        other => {
            return Err(HarnessError::format(
                path,
                0,
                format!("unsupported file extension: .{other}"),
            ))
        }
    };

    debug!(
        "loaded {} row(s) x {} attribute(s) from {}",
        dataset.len(),
        dataset.num_attributes(),
        path.display()
    );
    Ok(dataset)
}

fn relation_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("relation")
        .to_string()
}

// ---------------------------------------------------------------------------
// Kind inference shared by the header-less formats
// ---------------------------------------------------------------------------

/// A raw cell before the column kind is known.
#[derive(Debug, Clone)]
enum Cell {
    Missing,
    Number { value: f64, text: String },
    Text(String),
}

impl Cell {
    fn parse(raw: &str) -> Cell {
        let raw = raw.trim();
        if raw.is_empty() || raw == "?" {
            return Cell::Missing;
        }
        match raw.parse::<f64>() {
            Ok(value) => Cell::Number {
                value,
                text: raw.to_string(),
            },
            Err(_) => Cell::Text(raw.to_string()),
        }
    }
}

/// Collects one column's cells, then decides its kind: numeric when every
/// present cell is a number, nominal otherwise with labels in first-seen order.
struct ColumnBuilder {
    name: String,
    cells: Vec<Cell>,
}

impl ColumnBuilder {
    fn new(name: impl Into<String>) -> Self {
        ColumnBuilder {
            name: name.into(),
            cells: Vec::new(),
        }
    }

    fn finish(self) -> (Attribute, Vec<Value>) {
        let all_numeric = self
            .cells
            .iter()
            .all(|c| !matches!(c, Cell::Text(_)));

        if all_numeric {
            let values = self
                .cells
                .into_iter()
                .map(|c| match c {
                    Cell::Number { value, .. } => Value::Numeric(value),
                    _ => Value::Missing,
                })
                .collect();
            return (Attribute::numeric(self.name), values);
        }

        let mut domain: Vec<String> = Vec::new();
        let mut lookup: HashMap<String, usize> = HashMap::new();
        let values = self
            .cells
            .into_iter()
            .map(|c| {
                let label = match c {
                    Cell::Missing => return Value::Missing,
                    Cell::Number { text, .. } => text,
                    Cell::Text(text) => text,
                };
                let next = domain.len();
                let index = *lookup.entry(label.clone()).or_insert(next);
                if index == next {
                    domain.push(label);
                }
                Value::Nominal(index)
            })
            .collect();
        (Attribute::nominal(self.name, domain), values)
    }
}

fn build_dataset(relation: String, columns: Vec<ColumnBuilder>) -> Result<Dataset> {
    let n_rows = columns.first().map_or(0, |c| c.cells.len());
    let (attributes, column_values): (Vec<Attribute>, Vec<Vec<Value>>) =
        columns.into_iter().map(ColumnBuilder::finish).unzip();

    let mut rows: Vec<Row> = (0..n_rows)
        .map(|_| Row::new(Vec::with_capacity(attributes.len())))
        .collect();
    for values in column_values {
        for (row, value) in rows.iter_mut().zip(values) {
            row.push(value);
        }
    }
    Dataset::with_rows(relation, attributes, rows)
}

// ---------------------------------------------------------------------------
// ARFF loader
// ---------------------------------------------------------------------------

/// Layout:
///
/// ```text
/// % comment
/// @relation iris
/// @attribute sepallength numeric
/// @attribute class {Iris-setosa,Iris-versicolor}
/// @data
/// 5.1,Iris-setosa
/// ?,Iris-versicolor
/// ```
fn load_arff(path: &Path) -> Result<Dataset> {
    let text = std::fs::read_to_string(path).map_err(|e| HarnessError::io(path, e))?;

    let mut relation = relation_name(path);
    let mut attributes: Vec<Attribute> = Vec::new();
    let mut rows: Vec<Row> = Vec::new();
    let mut in_data = false;

    for (line_idx, raw_line) in text.lines().enumerate() {
        let line_no = line_idx + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('%') {
            continue;
        }
        let fail = |message: String| HarnessError::format(path, line_no, message);

        if in_data {
            rows.push(parse_arff_row(line, &attributes).map_err(fail)?);
            continue;
        }

        let (keyword, rest) = split_keyword(line);
        match keyword.to_ascii_lowercase().as_str() {
            "@relation" => {
                let (name, _) = next_token(rest).map_err(fail)?;
                relation = name;
            }
            "@attribute" => attributes.push(parse_arff_attribute(rest).map_err(fail)?),
            "@data" => {
                if attributes.is_empty() {
                    return Err(fail("@data section before any @attribute".into()));
                }
                in_data = true;
            }
            other => return Err(fail(format!("unexpected header line starting with '{other}'"))),
        }
    }

    if !in_data {
        return Err(HarnessError::format(path, 0, "missing @data section"));
    }
    Dataset::with_rows(relation, attributes, rows)
}

fn split_keyword(line: &str) -> (&str, &str) {
    match line.find(char::is_whitespace) {
        Some(pos) => (&line[..pos], line[pos..].trim_start()),
        None => (line, ""),
    }
}

fn parse_arff_attribute(rest: &str) -> std::result::Result<Attribute, String> {
    let (name, kind) = next_token(rest)?;
    let kind = kind.trim();

    if let Some(body) = kind.strip_prefix('{') {
        let body = body
            .strip_suffix('}')
            .ok_or_else(|| format!("attribute '{name}': unterminated nominal domain"))?;
        let domain = split_fields(body, ',')?;
        if domain.is_empty() || domain.iter().any(String::is_empty) {
            return Err(format!("attribute '{name}': empty nominal label"));
        }
        for (i, label) in domain.iter().enumerate() {
            if domain[..i].contains(label) {
                return Err(format!("attribute '{name}': duplicate nominal label '{label}'"));
            }
        }
        return Ok(Attribute::nominal(name, domain));
    }

    let (type_name, _) = split_keyword(kind);
    match type_name.to_ascii_lowercase().as_str() {
        "numeric" | "real" | "integer" => Ok(Attribute::numeric(name)),
        "string" | "date" | "relational" => {
            Err(format!("attribute '{name}': unsupported type '{type_name}'"))
        }
        "" => Err(format!("attribute '{name}': missing type")),
        other => Err(format!("attribute '{name}': unknown type '{other}'")),
    }
}

fn parse_arff_row(line: &str, attributes: &[Attribute]) -> std::result::Result<Row, String> {
    if line.starts_with('{') {
        return Err("sparse data rows are not supported".into());
    }
    let fields = split_fields(line, ',')?;
    if fields.len() != attributes.len() {
        return Err(format!(
            "expected {} value(s), found {}",
            attributes.len(),
            fields.len()
        ));
    }

    let values = attributes
        .iter()
        .zip(&fields)
        .map(|(attr, field)| {
            if field == "?" {
                return Ok(Value::Missing);
            }
            if attr.is_numeric() {
                field
                    .parse::<f64>()
                    .map(Value::Numeric)
                    .map_err(|_| format!("'{field}' is not a number (attribute '{}')", attr.name()))
            } else {
                attr.index_of(field)
                    .map(Value::Nominal)
                    .ok_or_else(|| format!("'{field}' is not in the domain of '{}'", attr.name()))
            }
        })
        .collect::<std::result::Result<Vec<_>, String>>()?;
    Ok(Row::new(values))
}

/// Read one possibly-quoted token, returning it and the remaining input.
/// Unquoted tokens end at whitespace or `{`.
fn next_token(input: &str) -> std::result::Result<(String, &str), String> {
    let input = input.trim_start();
    let mut chars = input.char_indices();
    match chars.next() {
        None => Err("expected a name".into()),
        Some((_, quote @ ('\'' | '"'))) => {
            let mut token = String::new();
            let mut escaped = false;
            for (i, c) in chars {
                if escaped {
                    token.push(c);
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == quote {
                    return Ok((token, &input[i + c.len_utf8()..]));
                } else {
                    token.push(c);
                }
            }
            Err(format!("unterminated quote in '{input}'"))
        }
        Some(_) => {
            let end = input
                .find(|c: char| c.is_whitespace() || c == '{')
                .unwrap_or(input.len());
            Ok((input[..end].to_string(), &input[end..]))
        }
    }
}

/// Split on `sep`, honouring single/double quotes and backslash escapes.
/// Unquoted fields are trimmed.
fn split_fields(input: &str, sep: char) -> std::result::Result<Vec<String>, String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut was_quoted = false;
    let mut escaped = false;

    for c in input.chars() {
        if let Some(q) = quote {
            if escaped {
                current.push(c);
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            } else {
                current.push(c);
            }
            continue;
        }
        if c == sep {
            fields.push(finish_field(&mut current, was_quoted));
            was_quoted = false;
        } else if was_quoted && c.is_whitespace() {
            continue;
        } else if (c == '\'' || c == '"') && current.trim().is_empty() {
            current.clear();
            quote = Some(c);
            was_quoted = true;
        } else {
            current.push(c);
        }
    }
    if quote.is_some() {
        return Err(format!("unterminated quote in '{input}'"));
    }
    if !current.trim().is_empty() || was_quoted || !fields.is_empty() {
        fields.push(finish_field(&mut current, was_quoted));
    }
    Ok(fields)
}

fn finish_field(current: &mut String, was_quoted: bool) -> String {
    let field = std::mem::take(current);
    if was_quoted {
        field
    } else {
        field.trim().to_string()
    }
}

// ---------------------------------------------------------------------------
// Delimited (CSV / TXT) loader
// ---------------------------------------------------------------------------

/// With a header row, its fields name the columns. Without one, columns are
/// `<stem>_dim0`, `<stem>_dim1`, ... Kinds are inferred from the cells; an
/// empty cell or `?` is missing.
fn load_delimited(path: &Path, options: &LoadOptions) -> Result<Dataset> {
    let delimiter = match options.delimiter {
        Some(d) => d,
        None => sniff_delimiter(path)?,
    };
    // Runs of spaces separate a single pair of fields.
    let collapse = delimiter == b' ';

    let file = File::open(path).map_err(|e| HarnessError::io(path, e))?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(options.has_header)
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let fields_of = |record: &csv::StringRecord| -> Vec<String> {
        record
            .iter()
            .filter(|f| !(collapse && f.is_empty()))
            .map(str::to_string)
            .collect()
    };

    let mut columns: Vec<ColumnBuilder> = Vec::new();
    if options.has_header {
        let headers = reader.headers().map_err(|e| csv_error(path, e))?.clone();
        columns = fields_of(&headers).into_iter().map(ColumnBuilder::new).collect();
    }

    let stem = relation_name(path);
    for result in reader.records() {
        let record = result.map_err(|e| csv_error(path, e))?;
        let line = record.position().map_or(0, |p| p.line() as usize);
        let fields = fields_of(&record);
        if fields.is_empty() {
            continue;
        }

        if columns.is_empty() && !options.has_header {
            columns = (0..fields.len())
                .map(|i| ColumnBuilder::new(format!("{stem}_dim{i}")))
                .collect();
        }
        if fields.len() != columns.len() {
            return Err(HarnessError::format(
                path,
                line,
                format!("expected {} field(s), found {}", columns.len(), fields.len()),
            ));
        }
        for (column, field) in columns.iter_mut().zip(&fields) {
            column.cells.push(Cell::parse(field));
        }
    }

    if columns.is_empty() {
        return Err(HarnessError::format(path, 0, "no columns found"));
    }
    build_dataset(stem, columns)
}

fn sniff_delimiter(path: &Path) -> Result<u8> {
    let file = File::open(path).map_err(|e| HarnessError::io(path, e))?;
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| HarnessError::io(path, e))?;
        if line.trim().is_empty() {
            continue;
        }
        return Ok(if line.contains(',') {
            b','
        } else if line.contains('\t') {
            b'\t'
        } else {
            b' '
        });
    }
    Ok(b',')
}

fn csv_error(path: &Path, err: csv::Error) -> HarnessError {
    let line = err.position().map_or(0, |p| p.line() as usize);
    let message = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(e) => HarnessError::io(path, e),
        _ => HarnessError::format(path, line, message),
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "sepal": 5.1, "petal": 1.4, "class": "setosa" },
///   ...
/// ]
/// ```
///
/// Column order follows the keys of the first record. A key missing from a
/// later record, or `null`, is a missing value.
fn load_json(path: &Path) -> Result<Dataset> {
    let text = std::fs::read_to_string(path).map_err(|e| HarnessError::io(path, e))?;
    let root: JsonValue = serde_json::from_str(&text)
        .map_err(|e| HarnessError::format(path, e.line(), format!("parsing JSON: {e}")))?;

    let records = root
        .as_array()
        .ok_or_else(|| HarnessError::format(path, 0, "expected top-level JSON array"))?;

    let mut columns: Vec<ColumnBuilder> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let record_no = i + 1;
        let obj = rec.as_object().ok_or_else(|| {
            HarnessError::format(path, record_no, format!("record {i} is not a JSON object"))
        })?;

        if i == 0 {
            columns = obj.keys().map(ColumnBuilder::new).collect();
        } else if let Some(extra) = obj.keys().find(|k| !columns.iter().any(|c| &c.name == *k)) {
            return Err(HarnessError::format(
                path,
                record_no,
                format!("record {i} has unexpected field '{extra}'"),
            ));
        }

        for column in &mut columns {
            let cell = json_to_cell(obj.get(&column.name)).ok_or_else(|| {
                HarnessError::format(
                    path,
                    record_no,
                    format!("record {i}, field '{}': nested values are not supported", column.name),
                )
            })?;
            column.cells.push(cell);
        }
    }

    if columns.is_empty() {
        return Err(HarnessError::format(path, 0, "no records found"));
    }
    build_dataset(relation_name(path), columns)
}

fn json_to_cell(val: Option<&JsonValue>) -> Option<Cell> {
    let cell = match val {
        None | Some(JsonValue::Null) => Cell::Missing,
        Some(JsonValue::Number(n)) => Cell::Number {
            value: n.as_f64()?,
            text: n.to_string(),
        },
        Some(JsonValue::String(s)) => Cell::Text(s.clone()),
        Some(JsonValue::Bool(b)) => Cell::Text(b.to_string()),
        Some(JsonValue::Array(_)) | Some(JsonValue::Object(_)) => return None,
    };
    Some(cell)
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file of scalar columns.
///
/// Int32/Int64/Float32/Float64 columns become numeric attributes, Utf8 and
/// Boolean columns nominal ones. Nulls are missing values. Works with files
/// written by both **Pandas** and **Polars**.
fn load_parquet(path: &Path) -> Result<Dataset> {
    let file = File::open(path).map_err(|e| HarnessError::io(path, e))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| HarnessError::format(path, 0, format!("reading parquet metadata: {e}")))?;
    let reader = builder
        .build()
        .map_err(|e| HarnessError::format(path, 0, format!("building parquet reader: {e}")))?;

    let mut columns: Vec<ColumnBuilder> = Vec::new();
    let mut rows_seen = 0usize;

    for batch_result in reader {
        let batch = batch_result
            .map_err(|e| HarnessError::format(path, 0, format!("reading parquet record batch: {e}")))?;
        let schema = batch.schema();

        if columns.is_empty() {
            columns = schema
                .fields()
                .iter()
                .map(|f| ColumnBuilder::new(f.name().clone()))
                .collect();
        }

        for (column, array) in columns.iter_mut().zip(batch.columns()) {
            for row in 0..batch.num_rows() {
                let cell = extract_cell(array, row).map_err(|message| {
                    HarnessError::format(
                        path,
                        rows_seen + row + 1,
                        format!("column '{}': {message}", column.name),
                    )
                })?;
                column.cells.push(cell);
            }
        }
        rows_seen += batch.num_rows();
    }

    if columns.is_empty() {
        return Err(HarnessError::format(path, 0, "no columns found"));
    }
    build_dataset(relation_name(path), columns)
}

// -- Parquet / Arrow helpers --

fn downcast<'a, T: 'static>(col: &'a ArrayRef) -> std::result::Result<&'a T, String> {
    col.as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| format!("unexpected array layout for {:?}", col.data_type()))
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &ArrayRef, row: usize) -> std::result::Result<Cell, String> {
    if col.is_null(row) {
        return Ok(Cell::Missing);
    }
    let number = |value: f64| Cell::Number {
        value,
        text: value.to_string(),
    };
    let cell = match col.data_type() {
        DataType::Utf8 => Cell::Text(downcast::<StringArray>(col)?.value(row).to_string()),
        DataType::LargeUtf8 => Cell::Text(downcast::<LargeStringArray>(col)?.value(row).to_string()),
        DataType::Int32 => number(downcast::<Int32Array>(col)?.value(row) as f64),
        DataType::Int64 => number(downcast::<Int64Array>(col)?.value(row) as f64),
        DataType::Float32 => number(downcast::<Float32Array>(col)?.value(row) as f64),
        DataType::Float64 => number(downcast::<Float64Array>(col)?.value(row)),
        DataType::Boolean => Cell::Text(downcast::<BooleanArray>(col)?.value(row).to_string()),
        other => return Err(format!("unsupported column type {other:?}")),
    };
    Ok(cell)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::AttributeKind;
    use arrow::array::Date32Array;
    use std::io::Write;
    use std::sync::Arc;

    fn write_temp(name: &str, contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        (dir, path)
    }

    const IRIS: &str = "\
% tiny iris sample
@RELATION iris

@ATTRIBUTE sepallength NUMERIC
@attribute 'petal width' real
@attribute class {Iris-setosa, Iris-versicolor,'Iris virginica'}

@data
5.1,0.2,Iris-setosa
?,1.3,Iris-versicolor
6.3,2.5,'Iris virginica'
";

    #[test]
    fn arff_declares_kinds_and_domains() {
        let (_dir, path) = write_temp("iris.arff", IRIS);
        let ds = load_file(&path, &LoadOptions::default()).unwrap();

        assert_eq!(ds.relation(), "iris");
        assert_eq!(ds.num_attributes(), 3);
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.attribute(1).unwrap().name(), "petal width");
        assert_eq!(
            ds.attribute(2).unwrap().domain().unwrap(),
            &["Iris-setosa", "Iris-versicolor", "Iris virginica"]
        );
        assert_eq!(ds.row(1).unwrap().values()[0], Value::Missing);
        assert_eq!(ds.row(2).unwrap().values()[2], Value::Nominal(2));
    }

    #[test]
    fn arff_rejects_label_outside_domain() {
        let body = "@relation r\n@attribute c {a,b}\n@data\na\nz\n";
        let (_dir, path) = write_temp("bad.arff", body);
        let err = load_file(&path, &LoadOptions::default()).unwrap_err();
        match err {
            HarnessError::Format { line, message, .. } => {
                assert_eq!(line, 5);
                assert!(message.contains("'z'"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn arff_without_data_section_is_a_format_error() {
        let (_dir, path) = write_temp("nodata.arff", "@relation r\n@attribute x numeric\n");
        assert!(matches!(
            load_file(&path, &LoadOptions::default()),
            Err(HarnessError::Format { .. })
        ));
    }

    #[test]
    fn arff_rejects_sparse_rows_and_string_attributes() {
        let sparse = "@relation r\n@attribute x numeric\n@data\n{0 1}\n";
        let (_d1, p1) = write_temp("sparse.arff", sparse);
        assert!(load_file(&p1, &LoadOptions::default()).is_err());

        let strings = "@relation r\n@attribute s string\n@data\nfoo\n";
        let (_d2, p2) = write_temp("strings.arff", strings);
        assert!(load_file(&p2, &LoadOptions::default()).is_err());
    }

    #[test]
    fn csv_with_header_infers_kinds() {
        let (_dir, path) = write_temp("t.csv", "x,y,label\n1.0,2,b\n3.5,,a\n0,4,b\n");
        let ds = load_file(&path, &LoadOptions::default()).unwrap();

        assert_eq!(ds.attribute(0).unwrap().name(), "x");
        assert!(ds.attribute(1).unwrap().is_numeric());
        assert_eq!(ds.row(1).unwrap().values()[1], Value::Missing);
        // first-occurrence order
        assert_eq!(ds.attribute(2).unwrap().domain().unwrap(), &["b", "a"]);
        assert_eq!(ds.row(1).unwrap().values()[2], Value::Nominal(1));
    }

    #[test]
    fn headerless_csv_synthesizes_dim_names() {
        let (_dir, path) = write_temp("blobs.csv", "1,2,0\n3,4,1\n");
        let ds = load_file(&path, &LoadOptions::headerless()).unwrap();

        let names: Vec<&str> = ds.attributes().iter().map(|a| a.name()).collect();
        assert_eq!(names, ["blobs_dim0", "blobs_dim1", "blobs_dim2"]);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.row(1).unwrap().values()[0], Value::Numeric(3.0));
    }

    #[test]
    fn space_delimited_txt_collapses_runs() {
        let (_dir, path) = write_temp("pts.txt", "1  2 x\n3 4   y\n");
        let ds = load_file(&path, &LoadOptions::headerless()).unwrap();
        assert_eq!(ds.num_attributes(), 3);
        assert!(matches!(ds.attribute(2).unwrap().kind(), AttributeKind::Nominal(_)));
    }

    #[test]
    fn ragged_csv_reports_line() {
        let (_dir, path) = write_temp("ragged.csv", "a,b\n1,2\n3\n");
        let err = load_file(&path, &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, HarnessError::Format { line: 3, .. }), "{err}");
    }

    #[test]
    fn json_records_keep_key_order() {
        let body = r#"[{"z": 1.0, "a": "yes"}, {"z": null, "a": "no"}, {"a": "yes"}]"#;
        let (_dir, path) = write_temp("recs.json", body);
        let ds = load_file(&path, &LoadOptions::default()).unwrap();

        assert_eq!(ds.attribute(0).unwrap().name(), "z");
        assert_eq!(ds.attribute(1).unwrap().domain().unwrap(), &["yes", "no"]);
        assert_eq!(ds.row(2).unwrap().values()[0], Value::Missing);
    }

    fn write_parquet(name: &str, columns: Vec<(&str, ArrayRef)>) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        let batch = arrow::record_batch::RecordBatch::try_from_iter(columns).unwrap();
        let file = File::create(&path).unwrap();
        let mut writer = parquet::arrow::ArrowWriter::try_new(file, batch.schema(), None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
        (dir, path)
    }

    #[test]
    fn parquet_maps_arrow_types_to_kinds() {
        let (_dir, path) = write_parquet(
            "blobs.parquet",
            vec![
                ("x", Arc::new(Float64Array::from(vec![Some(1.5), None, Some(3.0)])) as ArrayRef),
                ("n", Arc::new(Int64Array::from(vec![4, 5, 6])) as ArrayRef),
                ("flag", Arc::new(BooleanArray::from(vec![true, false, true])) as ArrayRef),
                ("class", Arc::new(StringArray::from(vec![Some("b"), Some("a"), None])) as ArrayRef),
            ],
        );
        let ds = load_file(&path, &LoadOptions::default()).unwrap();

        assert_eq!(ds.relation(), "blobs");
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.attribute(0).unwrap().kind(), &AttributeKind::Numeric);
        assert_eq!(ds.attribute(1).unwrap().kind(), &AttributeKind::Numeric);
        assert_eq!(ds.attribute(2).unwrap().domain().unwrap(), &["true", "false"]);
        assert_eq!(ds.attribute(3).unwrap().domain().unwrap(), &["b", "a"]);
        assert_eq!(
            ds.row(1).unwrap().values(),
            &[Value::Missing, Value::Numeric(5.0), Value::Nominal(1), Value::Nominal(1)]
        );
        assert_eq!(ds.row(2).unwrap().values()[3], Value::Missing);
        assert_eq!(ds.target_attribute().unwrap().name(), "class");
    }

    #[test]
    fn parquet_rejects_unsupported_column_types() {
        let (_dir, path) = write_parquet(
            "dates.pq",
            vec![
                ("x", Arc::new(Float64Array::from(vec![1.0])) as ArrayRef),
                ("day", Arc::new(Date32Array::from(vec![19_000])) as ArrayRef),
            ],
        );
        let err = load_file(&path, &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, HarnessError::Format { line: 1, .. }), "{err}");
        assert!(err.to_string().contains("day"), "{err}");
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_file(&dir.path().join("absent.arff"), &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, HarnessError::Io { .. }));
    }

    #[test]
    fn unknown_extension_is_format_error() {
        let (_dir, path) = write_temp("data.xlsx", "");
        assert!(matches!(
            load_file(&path, &LoadOptions::default()),
            Err(HarnessError::Format { .. })
        ));
    }

    #[test]
    fn split_fields_handles_quotes() {
        let fields = split_fields(r#"a, 'b, c' ,"d\"e",?"#, ',').unwrap();
        assert_eq!(fields, ["a", "b, c", "d\"e", "?"]);
        assert!(split_fields("'open", ',').is_err());
    }
}
