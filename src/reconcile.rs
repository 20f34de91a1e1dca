//! Schema reconciliation between a training (reference) dataset and the
//! datasets scored against it.
//!
//! Every operation takes the dataset by value and hands back the reconciled
//! one. Columns are only ever appended or retyped in place; existing columns
//! keep their position and meaning.

use std::collections::HashMap;

use log::{debug, info, warn};

use crate::data::model::{number_label, Attribute, AttributeKind, Dataset, Row, Value};
use crate::error::{HarnessError, Result};

/// Give `test` a label column when it has none.
///
/// When `test` carries exactly one attribute fewer than `reference`, a
/// nominal column is appended whose domain is a verbatim copy of the
/// reference target's domain; every row gets index 0 in it. A test set that
/// already has as many attributes as the reference is returned untouched, so
/// applying this twice is the same as applying it once.
pub fn reconcile_target_placeholder(reference: &Dataset, test: Dataset) -> Result<Dataset> {
    let want = reference.num_attributes();
    let have = test.num_attributes();
    if have >= want {
        return Ok(test);
    }
    if want - have > 1 {
        return Err(HarnessError::Schema(format!(
            "test set '{}' has {have} attribute(s), reference '{}' has {want}; only a missing label column can be added",
            test.relation(),
            reference.relation()
        )));
    }

    let target_index = target_index_of(reference)?;
    if target_index + 1 != want {
        return Err(HarnessError::Schema(format!(
            "reference target is column {target_index} of {want}; a placeholder can only stand in for a trailing target"
        )));
    }
    let target = &reference.attributes()[target_index];
    let domain = match target.domain() {
        Some(domain) if !domain.is_empty() => domain.to_vec(),
        _ => {
            return Err(HarnessError::Schema(format!(
                "reference target '{}' has no nominal domain to copy",
                target.name()
            )))
        }
    };

    info!(
        "test set '{}' has no label column; adding placeholder '{}' with {} class(es)",
        test.relation(),
        target.name(),
        domain.len()
    );
    let mut test = test;
    test.append_attribute(Attribute::nominal(target.name(), domain), |_| Value::Nominal(0));
    let last = test.num_attributes() - 1;
    test.set_target(last);
    Ok(test)
}

/// Turn a numeric target into a nominal one.
///
/// Each distinct observed value becomes a label, in the order values are
/// first seen (not sorted): probability columns downstream follow this
/// order. Missing targets stay missing. A target that is already nominal is
/// returned as is.
pub fn coerce_numeric_target_to_nominal(dataset: Dataset) -> Result<Dataset> {
    let index = target_index_of(&dataset)?;
    let attr = &dataset.attributes()[index];
    if attr.is_nominal() {
        return Ok(dataset);
    }

    let mut domain: Vec<String> = Vec::new();
    let mut lookup: HashMap<String, usize> = HashMap::new();
    let values: Vec<Value> = dataset
        .column(index)
        .map(|value| match value {
            Value::Numeric(v) => {
                let label = number_label(v);
                let next = domain.len();
                let idx = *lookup.entry(label.clone()).or_insert(next);
                if idx == next {
                    domain.push(label);
                }
                Value::Nominal(idx)
            }
            _ => Value::Missing,
        })
        .collect();

    if domain.len() < 2 {
        return Err(HarnessError::DegenerateTarget {
            attribute: attr.name().to_string(),
            distinct: domain.len(),
        });
    }

    debug!(
        "coerced numeric target '{}' into {} classes: {:?}",
        attr.name(),
        domain.len(),
        domain
    );
    let coerced = Attribute::nominal(attr.name(), domain);
    let mut dataset = dataset;
    dataset.replace_attribute(index, coerced, values);
    Ok(dataset)
}

/// Make `test`'s target column use exactly the reference target's domain.
///
/// Needed after the reference target was coerced to nominal: the test
/// labels are matched to reference labels by text, and labels the reference
/// never saw become missing. Numeric-to-numeric targets pass through.
pub fn align_target_domain(reference: &Dataset, test: Dataset) -> Result<Dataset> {
    let ref_target = reference
        .target_attribute()
        .ok_or_else(|| HarnessError::Schema("reference has no attributes".into()))?;
    let index = target_index_of(&test)?;
    let test_target = &test.attributes()[index];

    let Some(ref_domain) = ref_target.domain() else {
        if test_target.is_nominal() {
            return Err(HarnessError::Schema(format!(
                "reference target '{}' is numeric but test target '{}' is nominal",
                ref_target.name(),
                test_target.name()
            )));
        }
        return Ok(test);
    };
    if test_target.domain() == Some(ref_domain) {
        return Ok(test);
    }

    let (values, unseen) = relabel(&test, index, ref_target);
    if unseen > 0 {
        warn!(
            "{unseen} test label(s) of '{}' do not occur in the training set; treated as missing",
            test_target.name()
        );
    }
    let aligned = Attribute::nominal(test_target.name(), ref_domain.to_vec());
    let mut test = test;
    test.replace_attribute(index, aligned, values);
    Ok(test)
}

/// Re-code the nominal feature columns of `test` into the reference's
/// domains.
///
/// Each file builds its nominal domains on its own, so one label can sit at
/// different indices in train and test. Labels are matched by text; labels
/// the reference never saw become missing. The target column is left to
/// [`align_target_domain`], and columns whose kinds differ to
/// [`check_compatible`].
pub fn align_feature_domains(reference: &Dataset, test: Dataset) -> Result<Dataset> {
    let target = reference.target_index();
    let width = reference.num_attributes().min(test.num_attributes());
    let mut test = test;

    for index in (0..width).filter(|&i| Some(i) != target) {
        let ref_attr = &reference.attributes()[index];
        let Some(ref_domain) = ref_attr.domain() else {
            continue;
        };
        let test_attr = &test.attributes()[index];
        if test_attr.domain().map_or(true, |d| d == ref_domain) {
            continue;
        }

        let (values, unseen) = relabel(&test, index, ref_attr);
        if unseen > 0 {
            warn!(
                "{unseen} value(s) of '{}' do not occur in the training set; treated as missing",
                test_attr.name()
            );
        }
        debug!("re-coded nominal column '{}' onto the training domain", test_attr.name());
        let aligned = Attribute::nominal(test_attr.name(), ref_domain.to_vec());
        test.replace_attribute(index, aligned, values);
    }
    Ok(test)
}

/// Express column `index` of `dataset` as indices into `onto`'s
/// domain, matching by label text. Returns the values and the count of
/// labels with no counterpart.
fn relabel(dataset: &Dataset, index: usize, onto: &Attribute) -> (Vec<Value>, usize) {
    let source = &dataset.attributes()[index];
    let mut unseen = 0usize;
    let values = dataset
        .column(index)
        .map(|value| {
            if value.is_missing() {
                return Value::Missing;
            }
            let label = match value {
                Value::Numeric(v) => number_label(v),
                nominal => source.render(&nominal),
            };
            match onto.index_of(&label) {
                Some(i) => Value::Nominal(i),
                None => {
                    unseen += 1;
                    Value::Missing
                }
            }
        })
        .collect();
    (values, unseen)
}

/// Select the target column. Defaults to the last column when never called.
pub fn set_target_index(dataset: Dataset, index: usize) -> Result<Dataset> {
    if index >= dataset.num_attributes() {
        return Err(HarnessError::Index {
            index,
            len: dataset.num_attributes(),
        });
    }
    let mut dataset = dataset;
    dataset.set_target(index);
    Ok(dataset)
}

/// Append the columns of `responses` to `data`, row by row.
///
/// Used when regressors and responses come from separate files. Rows are
/// rebuilt, never shared, and the target falls back to the last column.
pub fn merge_responses(data: Dataset, responses: &Dataset) -> Result<Dataset> {
    if data.len() != responses.len() {
        return Err(HarnessError::Schema(format!(
            "cannot merge '{}' ({} rows) with responses '{}' ({} rows)",
            data.relation(),
            data.len(),
            responses.relation(),
            responses.len()
        )));
    }

    let attributes: Vec<Attribute> = data
        .attributes()
        .iter()
        .chain(responses.attributes())
        .cloned()
        .collect();
    let rows: Vec<Row> = data
        .rows()
        .iter()
        .zip(responses.rows())
        .map(|(x, y)| Row::new(x.values().iter().chain(y.values()).copied().collect()))
        .collect();

    Dataset::with_rows(data.relation(), attributes, rows)
}

/// Check `test` can be scored by a model fitted on `reference`: same width,
/// and each column numeric or nominal on both sides.
pub fn check_compatible(reference: &Dataset, test: &Dataset) -> Result<()> {
    if reference.num_attributes() != test.num_attributes() {
        return Err(HarnessError::Schema(format!(
            "reference has {} attribute(s), test has {}",
            reference.num_attributes(),
            test.num_attributes()
        )));
    }
    for (i, (r, t)) in reference.attributes().iter().zip(test.attributes()).enumerate() {
        match (r.kind(), t.kind()) {
            (AttributeKind::Numeric, AttributeKind::Numeric) => {}
            (AttributeKind::Nominal(rd), AttributeKind::Nominal(td)) => {
                if rd != td {
                    warn!(
                        "column {i}: nominal domains differ between '{}' and '{}'",
                        r.name(),
                        t.name()
                    );
                }
            }
            _ => {
                return Err(HarnessError::Schema(format!(
                    "column {i}: reference '{r}' and test '{t}' have different kinds"
                )))
            }
        }
    }
    Ok(())
}

fn target_index_of(dataset: &Dataset) -> Result<usize> {
    dataset
        .target_index()
        .ok_or_else(|| HarnessError::Schema(format!("'{}' has no attributes", dataset.relation())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(domain: &[&str]) -> Vec<String> {
        domain.iter().map(|s| s.to_string()).collect()
    }

    fn reference() -> Dataset {
        Dataset::with_rows(
            "train",
            vec![
                Attribute::numeric("x"),
                Attribute::numeric("y"),
                Attribute::nominal("class", labels(&["a", "b", "c"])),
            ],
            vec![
                Row::new(vec![Value::Numeric(0.0), Value::Numeric(1.0), Value::Nominal(0)]),
                Row::new(vec![Value::Numeric(2.0), Value::Numeric(3.0), Value::Nominal(1)]),
                Row::new(vec![Value::Numeric(4.0), Value::Numeric(5.0), Value::Nominal(2)]),
            ],
        )
        .unwrap()
    }

    fn unlabeled() -> Dataset {
        Dataset::with_rows(
            "test",
            vec![Attribute::numeric("x"), Attribute::numeric("y")],
            vec![
                Row::new(vec![Value::Numeric(9.0), Value::Numeric(8.0)]),
                Row::new(vec![Value::Missing, Value::Numeric(7.0)]),
            ],
        )
        .unwrap()
    }

    fn numeric_target(values: &[f64]) -> Dataset {
        Dataset::with_rows(
            "reg",
            vec![Attribute::numeric("x"), Attribute::numeric("y")],
            values
                .iter()
                .enumerate()
                .map(|(i, v)| Row::new(vec![Value::Numeric(i as f64), Value::Numeric(*v)]))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn placeholder_copies_reference_domain_and_fills_index_zero() {
        let original = unlabeled();
        let test = reconcile_target_placeholder(&reference(), original.clone()).unwrap();

        assert_eq!(test.num_attributes(), 3);
        let added = test.attribute(2).unwrap();
        assert_eq!(added.domain().unwrap(), &["a", "b", "c"]);
        assert_eq!(test.target_index(), Some(2));
        for (before, after) in original.rows().iter().zip(test.rows()) {
            assert_eq!(&after.values()[..2], before.values());
            assert_eq!(after.values()[2], Value::Nominal(0));
            assert_eq!(added.render(&after.values()[2]), "a");
        }
    }

    #[test]
    fn placeholder_is_idempotent() {
        let reference = reference();
        let once = reconcile_target_placeholder(&reference, unlabeled()).unwrap();
        let twice = reconcile_target_placeholder(&reference, once.clone()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn placeholder_needs_a_nominal_reference_target() {
        let reference = numeric_target(&[1.0, 2.0]);
        let test = Dataset::new("t", vec![Attribute::numeric("x")]);
        let err = reconcile_target_placeholder(&reference, test).unwrap_err();
        assert!(matches!(err, HarnessError::Schema(_)));
    }

    #[test]
    fn placeholder_refuses_to_pad_several_columns() {
        let test = Dataset::new("t", vec![Attribute::numeric("x")]);
        assert!(reconcile_target_placeholder(&reference(), test).is_err());
    }

    #[test]
    fn coercion_uses_first_occurrence_order() {
        let ds = coerce_numeric_target_to_nominal(numeric_target(&[3.0, 1.0, 3.0, 2.0])).unwrap();
        let target = ds.target_attribute().unwrap();

        assert_eq!(target.domain().unwrap(), &["3.0", "1.0", "2.0"]);
        let coded: Vec<Value> = ds.column(1).collect();
        assert_eq!(
            coded,
            vec![Value::Nominal(0), Value::Nominal(1), Value::Nominal(0), Value::Nominal(2)]
        );
        // Features are untouched.
        assert_eq!(ds.row(3).unwrap().values()[0], Value::Numeric(3.0));
    }

    #[test]
    fn coercion_rejects_a_single_distinct_value() {
        let err = coerce_numeric_target_to_nominal(numeric_target(&[5.0, 5.0, 5.0])).unwrap_err();
        assert!(matches!(err, HarnessError::DegenerateTarget { distinct: 1, .. }));
    }

    #[test]
    fn coercion_leaves_nominal_targets_alone() {
        let ds = reference();
        assert_eq!(coerce_numeric_target_to_nominal(ds.clone()).unwrap(), ds);
    }

    #[test]
    fn set_target_index_bounds_check() {
        let ds = set_target_index(reference(), 0).unwrap();
        assert_eq!(ds.target_index(), Some(0));
        let err = set_target_index(reference(), 3).unwrap_err();
        assert!(matches!(err, HarnessError::Index { index: 3, len: 3 }));
    }

    #[test]
    fn align_maps_numeric_test_labels_onto_reference_domain() {
        let train = coerce_numeric_target_to_nominal(numeric_target(&[3.0, 1.0, 2.0])).unwrap();
        let test = numeric_target(&[1.0, 7.0, 3.0]);
        let aligned = align_target_domain(&train, test).unwrap();

        assert_eq!(aligned.target_attribute(), train.target_attribute());
        let coded: Vec<Value> = aligned.column(1).collect();
        assert_eq!(coded, vec![Value::Nominal(1), Value::Missing, Value::Nominal(0)]);
    }

    #[test]
    fn merge_appends_response_columns() {
        let x = unlabeled();
        let y = Dataset::with_rows(
            "responses",
            vec![Attribute::numeric("r")],
            vec![
                Row::new(vec![Value::Numeric(0.5)]),
                Row::new(vec![Value::Numeric(1.5)]),
            ],
        )
        .unwrap();
        let merged = merge_responses(x, &y).unwrap();

        assert_eq!(merged.num_attributes(), 3);
        assert_eq!(merged.target_attribute().unwrap().name(), "r");
        assert_eq!(merged.row(1).unwrap().values()[2], Value::Numeric(1.5));
    }

    #[test]
    fn merge_rejects_row_count_mismatch() {
        let y = Dataset::new("responses", vec![Attribute::numeric("r")]);
        assert!(matches!(
            merge_responses(unlabeled(), &y),
            Err(HarnessError::Schema(_))
        ));
    }

    #[test]
    fn feature_domains_are_recoded_by_label() {
        let train = Dataset::with_rows(
            "train",
            vec![
                Attribute::nominal("colour", labels(&["red", "blue"])),
                Attribute::nominal("class", labels(&["a", "b"])),
            ],
            vec![
                Row::new(vec![Value::Nominal(0), Value::Nominal(0)]),
                Row::new(vec![Value::Nominal(1), Value::Nominal(1)]),
            ],
        )
        .unwrap();
        let test = Dataset::with_rows(
            "test",
            vec![
                Attribute::nominal("colour", labels(&["blue", "green", "red"])),
                Attribute::nominal("class", labels(&["b", "a"])),
            ],
            vec![
                Row::new(vec![Value::Nominal(0), Value::Nominal(0)]),
                Row::new(vec![Value::Nominal(1), Value::Nominal(1)]),
                Row::new(vec![Value::Nominal(2), Value::Nominal(1)]),
                Row::new(vec![Value::Missing, Value::Nominal(0)]),
            ],
        )
        .unwrap();

        let aligned = align_feature_domains(&train, test.clone()).unwrap();

        assert_eq!(aligned.attribute(0), train.attribute(0));
        let colour: Vec<Value> = aligned.column(0).collect();
        assert_eq!(
            colour,
            vec![Value::Nominal(1), Value::Missing, Value::Nominal(0), Value::Missing]
        );
        // The target is not a feature.
        assert_eq!(aligned.attribute(1), test.attribute(1));
        assert_eq!(aligned.column(1).collect::<Vec<_>>(), test.column(1).collect::<Vec<_>>());
    }

    #[test]
    fn matching_feature_domains_pass_through() {
        let reference = reference();
        let padded = reconcile_target_placeholder(&reference, unlabeled()).unwrap();
        assert_eq!(align_feature_domains(&reference, padded.clone()).unwrap(), padded);
    }

    #[test]
    fn compatibility_checks_width_and_kinds() {
        let reference = reference();
        assert!(check_compatible(&reference, &unlabeled()).is_err());
        let padded = reconcile_target_placeholder(&reference, unlabeled()).unwrap();
        assert!(check_compatible(&reference, &padded).is_ok());
    }
}
