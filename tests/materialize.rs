use std::sync::Arc;

use arraymerge::{
    codec::{decode, parse_datetime},
    data_type::DataType,
    merge::{Merge, WriteOptions},
    selection::{AxisPredicate, Selection},
    sink::MemorySink,
    source::{MemorySource, Source},
    values::{ArrayValues, ScalarValue},
};

const MISSING: i64 = i16::MIN as i64;

fn grid_source(
    time: Vec<i64>,
    x: Vec<i64>,
    values: Vec<i64>,
) -> Result<Source, Box<dyn std::error::Error>> {
    let mut source = MemorySource::stored();
    source
        .add_coordinate("time", DataType::Int64, time)?
        .add_coordinate("x", DataType::Int64, x)?
        .add_variable("a", &["time", "x"], DataType::Int16, values)?;
    Ok(Arc::new(source))
}

#[rustfmt::skip]
#[test]
fn materialize_last_source_wins() -> Result<(), Box<dyn std::error::Error>> {
    let merge = Merge::new(vec![
        grid_source(vec![1, 2, 3], vec![0, 1], vec![1, 2, 3, 4, 5, 6])?,
        grid_source(vec![3, 4, 5], vec![0, 1], vec![9; 6])?,
    ])?;
    let sink = MemorySink::new();
    merge.write(&sink, &WriteOptions::default())?;

    assert_eq!(sink.array_names(), vec!["a", "time", "x"]);
    assert_eq!(sink.retrieve("time"), Some(ArrayValues::Int(vec![1, 2, 3, 4, 5])));
    assert_eq!(sink.retrieve("x"), Some(ArrayValues::Int(vec![0, 1])));
    assert_eq!(
        sink.retrieve("a"),
        Some(ArrayValues::Int(vec![
            1, 2,
            3, 4,
            9, 9,
            9, 9,
            9, 9,
        ]))
    );
    Ok(())
}

#[rustfmt::skip]
#[test]
fn materialize_fill_value() -> Result<(), Box<dyn std::error::Error>> {
    let merge = Merge::new(vec![
        grid_source(vec![1, 2], vec![0, 1], vec![1, 2, 3, 4])?,
        grid_source(vec![3], vec![1], vec![5])?,
    ])?;
    let sink = MemorySink::new();
    merge.write(&sink, &WriteOptions::default())?;

    let declaration = sink.declaration("a").unwrap();
    assert_eq!(declaration.fill_value, Some(ScalarValue::Int(MISSING)));
    assert_eq!(declaration.dimensions, vec!["time", "x"]);
    assert!(!declaration.dimension_scale);
    assert!(sink.declaration("time").unwrap().dimension_scale);
    assert_eq!(
        sink.retrieve("a"),
        Some(ArrayValues::Int(vec![
            1, 2,
            3, 4,
            MISSING, 5,
        ]))
    );
    Ok(())
}

#[rustfmt::skip]
#[test]
fn materialize_transposed_source() -> Result<(), Box<dyn std::error::Error>> {
    let mut transposed = MemorySource::stored();
    transposed
        .add_coordinate("time", DataType::Int64, vec![4i64, 5])?
        .add_coordinate("x", DataType::Int64, vec![0i64, 1])?
        // (x, time)
        .add_variable("a", &["x", "time"], DataType::Int16, vec![40i64, 50, 41, 51])?;
    let merge = Merge::new(vec![
        grid_source(vec![1, 2, 3], vec![0, 1], vec![1, 2, 3, 4, 5, 6])?,
        Arc::new(transposed),
    ])?;
    assert!(merge.variable("a").unwrap().correspondence(1).unwrap().is_permuted());

    let sink = MemorySink::new();
    let mut options = WriteOptions::default();
    options.set_chunk_shape("a", vec![1, 1]).set_chunk_stop_factor(1);
    merge.write(&sink, &options)?;
    assert_eq!(
        sink.retrieve("a"),
        Some(ArrayValues::Int(vec![
            1, 2,
            3, 4,
            5, 6,
            40, 41,
            50, 51,
        ]))
    );
    Ok(())
}

#[test]
fn materialize_selected_interleaved() -> Result<(), Box<dyn std::error::Error>> {
    let mut first = MemorySource::stored();
    first
        .add_coordinate("time", DataType::Int64, vec![10i64, 20, 30, 40])?
        .add_variable("v", &["time"], DataType::Int32, vec![1i32, 2, 3, 4])?;
    let mut second = MemorySource::stored();
    second
        .add_coordinate("time", DataType::Int64, vec![50i64])?
        .add_variable("v", &["time"], DataType::Int32, vec![5i32])?;
    let merge = Merge::new(vec![Arc::new(first), Arc::new(second)])?;
    let selected = merge.select(&Selection::new().with_predicate(
        "time",
        AxisPredicate::Values(vec![10i64, 30, 40, 50].into_iter().map(ScalarValue::Int).collect()),
    ))?;

    let sink = MemorySink::new();
    selected.write(&sink, &WriteOptions::default())?;
    assert_eq!(sink.retrieve("time"), Some(ArrayValues::Int(vec![10, 30, 40, 50])));
    assert_eq!(sink.retrieve("v"), Some(ArrayValues::Int(vec![1, 3, 4, 5])));
    Ok(())
}

#[test]
fn materialize_labelled_datetime_scaled() -> Result<(), Box<dyn std::error::Error>> {
    let time: Vec<_> = ["2000-01-01", "2000-01-02", "2000-01-03"]
        .into_iter()
        .filter_map(parse_datetime)
        .collect();
    let mut source = MemorySource::labelled();
    source
        .add_coordinate("time", DataType::DateTime, time.clone())?
        .add_variable("temperature", &["time"], DataType::Float64, vec![20.0f64, 20.5, f64::NAN])?
        .set_attribute("temperature", "dtype", "int16")?
        .set_attribute("temperature", "scale_factor", 0.1)?;
    let merge = Merge::new(vec![Arc::new(source)])?;

    let sink = MemorySink::new();
    merge.write(&sink, &WriteOptions::default())?;

    let time_declaration = sink.declaration("time").unwrap();
    assert_eq!(time_declaration.data_type, DataType::Int64);
    assert_eq!(
        sink.retrieve("time"),
        Some(ArrayValues::Int(vec![946_684_800, 946_771_200, 946_857_600]))
    );
    assert_eq!(
        decode(&sink.retrieve("time").unwrap(), &time_declaration.encoding)?,
        ArrayValues::from(time)
    );

    let declaration = sink.declaration("temperature").unwrap();
    assert_eq!(declaration.data_type, DataType::Int16);
    let stored = sink.retrieve("temperature").unwrap();
    assert_eq!(stored, ArrayValues::Int(vec![200, 205, MISSING]));
    let ArrayValues::Float(decoded) = decode(&stored, &declaration.encoding)? else {
        panic!("expected floating point values");
    };
    assert_eq!(&decoded[..2], &[20.0, 20.5]);
    assert!(decoded[2].is_nan());
    Ok(())
}

#[test]
fn materialize_scalar_variable() -> Result<(), Box<dyn std::error::Error>> {
    let scalar_source = |version: i32| -> Result<Source, Box<dyn std::error::Error>> {
        let mut source = MemorySource::stored();
        source.add_variable("version", &[], DataType::Int32, vec![version])?;
        Ok(Arc::new(source))
    };
    let merge = Merge::new(vec![scalar_source(1)?, scalar_source(2)?])?;
    let sink = MemorySink::new();
    merge.write(&sink, &WriteOptions::default())?;

    let declaration = sink.declaration("version").unwrap();
    assert!(declaration.shape.is_empty());
    assert_eq!(declaration.chunk_shape, None);
    assert_eq!(declaration.fill_value, None);
    assert_eq!(sink.retrieve("version"), Some(ArrayValues::Int(vec![2])));
    Ok(())
}

#[test]
fn materialize_unlimited_dimension() -> Result<(), Box<dyn std::error::Error>> {
    let merge = Merge::new(vec![grid_source(vec![1, 2], vec![0], vec![1, 2])?])?;
    let sink = MemorySink::new();
    let mut options = WriteOptions::default();
    options.set_unlimited("time");
    merge.write(&sink, &options)?;

    let declaration = sink.declaration("a").unwrap();
    assert_eq!(declaration.extensible, vec![true, false]);
    let chunk_shape = declaration.chunk_shape.unwrap().to_array_shape();
    assert_eq!(chunk_shape, vec![1024, 1]);
    Ok(())
}
