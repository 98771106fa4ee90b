use std::sync::Arc;

use arraymerge::{
    data_type::DataType,
    merge::{Merge, MergeError},
    selection::{AxisPredicate, Selection},
    selector::Selector,
    source::{MemorySource, Source},
    values::{ArrayValues, ScalarValue},
};

fn time_source(time: Vec<i64>) -> Result<Source, Box<dyn std::error::Error>> {
    let len = time.len();
    let mut source = MemorySource::stored();
    source
        .add_coordinate("time", DataType::Int64, time)?
        .add_variable("v", &["time"], DataType::Int32, vec![0i64; len])?;
    Ok(Arc::new(source))
}

#[test]
fn merge_overlapping_time() -> Result<(), Box<dyn std::error::Error>> {
    let merge = Merge::new(vec![time_source(vec![1, 2, 3])?, time_source(vec![3, 4, 5])?])?;
    assert_eq!(
        merge.axis("time").unwrap().values(),
        &ArrayValues::Int(vec![1, 2, 3, 4, 5])
    );
    let v = merge.variable("v").unwrap();
    assert_eq!(v.shape(), &[5]);
    assert_eq!(v.correspondence(0).unwrap().global(), &[Selector::Range(0..3)]);
    assert_eq!(v.correspondence(1).unwrap().global(), &[Selector::Range(2..5)]);
    assert_eq!(v.correspondence(1).unwrap().local(), &[Selector::Range(0..3)]);
    Ok(())
}

#[test]
fn merge_select_drops_disjoint_source() -> Result<(), Box<dyn std::error::Error>> {
    let merge = Merge::new(vec![time_source(vec![1, 2, 3])?, time_source(vec![3, 4, 5])?])?;
    let selection =
        Selection::new().with_predicate("time", AxisPredicate::range(None, Some(ScalarValue::Int(3))));
    let selected = merge.select(&selection)?;
    assert_eq!(
        selected.axis("time").unwrap().values(),
        &ArrayValues::Int(vec![1, 2])
    );
    let v = selected.variable("v").unwrap();
    assert_eq!(v.correspondences().len(), 1);
    assert_eq!(v.correspondence(0).unwrap().global(), &[Selector::Range(0..2)]);
    Ok(())
}

#[test]
fn merge_select_interleaved() -> Result<(), Box<dyn std::error::Error>> {
    let merge = Merge::new(vec![time_source(vec![10, 20, 30, 40])?, time_source(vec![50])?])?;
    let selection = Selection::new().with_predicate(
        "time",
        AxisPredicate::Values(vec![10i64, 30, 40, 50].into_iter().map(ScalarValue::Int).collect()),
    );
    let selected = merge.select(&selection)?;
    let v = selected.variable("v").unwrap();
    let first = v.correspondence(0).unwrap();
    assert_eq!(first.global(), &[Selector::Range(0..3)]);
    assert_eq!(first.local(), &[Selector::Indices(vec![0, 2, 3])]);
    assert_eq!(
        v.correspondence(1).unwrap().global(),
        &[Selector::Range(3..4)]
    );
    Ok(())
}

#[test]
fn merge_interleaved_axis() -> Result<(), Box<dyn std::error::Error>> {
    let merge = Merge::new(vec![time_source(vec![10, 20, 30, 40])?, time_source(vec![15])?])?;
    let selection = Selection::new().with_predicate(
        "time",
        AxisPredicate::Mask(vec![true, true, false, true, true]),
    );
    let selected = merge.select(&selection)?;
    assert_eq!(
        selected.axis("time").unwrap().values(),
        &ArrayValues::Int(vec![10, 15, 30, 40])
    );
    let first = selected.variable("v").unwrap().correspondence(0).unwrap();
    assert_eq!(first.global(), &[Selector::Indices(vec![0, 2, 3])]);
    assert_eq!(first.local(), &[Selector::Indices(vec![0, 2, 3])]);
    Ok(())
}

#[test]
fn merge_select_datetime_string() -> Result<(), Box<dyn std::error::Error>> {
    let mut source = MemorySource::stored();
    source
        .add_coordinate("time", DataType::Int32, vec![0i32, 1, 2, 3])?
        .set_attribute("time", "units", "days since 2000-01-01")?
        .set_attribute("time", "calendar", "standard")?;
    let merge = Merge::new(vec![Arc::new(source)])?;
    let selected = merge.select(&Selection::new().with_predicate(
        "time",
        AxisPredicate::range(Some("2000-01-02".into()), Some("2000-01-04".into())),
    ))?;
    assert_eq!(
        selected.axis("time").unwrap().values(),
        &ArrayValues::Int(vec![1, 2])
    );
    Ok(())
}

#[test]
fn merge_dimension_mismatch() -> Result<(), Box<dyn std::error::Error>> {
    let mut second = MemorySource::stored();
    second
        .add_coordinate("time", DataType::Int64, vec![4i64])?
        .add_coordinate("x", DataType::Int64, vec![0i64])?
        .add_variable("v", &["time", "x"], DataType::Int32, vec![0i32])?;
    let result = Merge::new(vec![time_source(vec![1, 2])?, Arc::new(second)]);
    assert!(matches!(result, Err(MergeError::DimensionMismatch { source_id: 1, .. })));
    Ok(())
}

#[test]
fn merge_unsorted_coordinate() -> Result<(), Box<dyn std::error::Error>> {
    let result = Merge::new(vec![time_source(vec![3, 1, 2])?]);
    assert!(matches!(result, Err(MergeError::UnsortedCoordinate(name, 0)) if name == "time"));
    Ok(())
}

#[test]
fn merge_encoding_conflict_keeps_first() -> Result<(), Box<dyn std::error::Error>> {
    let mut second = MemorySource::stored();
    second.add_coordinate("time", DataType::Int16, vec![4i16])?;
    let merge = Merge::new(vec![time_source(vec![1, 2])?, Arc::new(second)])?;
    let time = merge.axis("time").unwrap();
    assert_eq!(time.encoding().data_type(), DataType::Int64);
    assert_eq!(time.values(), &ArrayValues::Int(vec![1, 2, 4]));
    Ok(())
}

#[test]
fn merge_float_without_encoding() -> Result<(), Box<dyn std::error::Error>> {
    let mut source = MemorySource::labelled();
    source.add_coordinate("x", DataType::Float64, vec![0.5f64, 1.5])?;
    assert!(matches!(
        Merge::new(vec![Arc::new(source)]),
        Err(MergeError::EncodingError(_))
    ));
    Ok(())
}
