//! A rust library for merging chunked multidimensional array datasets onto a unified coordinate space.
//!
//! Each input dataset (a [source](source)) carries its own one-dimensional coordinate arrays and a set of variables
//! defined over them. Sources may overlap, interleave, or be disjoint along any coordinate.
//! `arraymerge` computes:
//!  - the sorted union of the on-disk coordinate values of every source ([`coordinate::unify_coordinates`]),
//!  - for every source and every variable, which elements of the unified array it covers and where they live in the source ([`variable::index_variables`]),
//!  - an output chunk shape for every array ([`chunk_layout::guess_chunk_shape`]), and
//!  - chunk-aligned copy instructions from each source into the merged output ([`chunk_plan::decompose`]).
//!
//! The unified view can be narrowed with a [`Selection`](selection::Selection) and written out to any [`sink`].
//!
//! ## Getting Started
//! [`merge::Merge`] is the place to start. It owns the encodings, coordinates and variables computed from a set of sources.
//!
//! ## Example
//! ```rust
//! # use std::sync::Arc;
//! use arraymerge::{
//!     data_type::DataType,
//!     merge::{Merge, WriteOptions},
//!     selection::{AxisPredicate, Selection},
//!     sink::MemorySink,
//!     source::{MemorySource, Source},
//!     values::ScalarValue,
//! };
//!
//! let mut first = MemorySource::stored();
//! first.add_coordinate("time", DataType::Int64, vec![1i64, 2, 3])?;
//! first.add_variable("temperature", &["time"], DataType::Int16, vec![10i64, 11, 12])?;
//! let mut second = MemorySource::stored();
//! second.add_coordinate("time", DataType::Int64, vec![3i64, 4, 5])?;
//! second.add_variable("temperature", &["time"], DataType::Int16, vec![13i64, 14, 15])?;
//!
//! let sources: Vec<Source> = vec![Arc::new(first), Arc::new(second)];
//! let merge = Merge::new(sources)?;
//! assert_eq!(merge.axis("time").unwrap().len(), 5);
//!
//! let selection = Selection::new().with_predicate(
//!     "time",
//!     AxisPredicate::range(None, Some(ScalarValue::Int(3))),
//! );
//! let selected = merge.select(&selection)?;
//!
//! let sink = MemorySink::new();
//! selected.write(&sink, &WriteOptions::default())?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Logging
//! `arraymerge` logs through the [`log`] facade. Contributions that are dropped because they do not overlap the unified
//! coordinates are logged at the `debug` level, and encoding conflicts between sources at the `warn` level.
//!
//! ## Licence
//! `arraymerge` is licensed under either of the Apache License, Version 2.0 or the MIT license, at your option.

#![warn(unused_variables)]
#![warn(dead_code)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![deny(clippy::missing_panics_doc)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod array_subset;
pub mod chunk_layout;
pub mod chunk_plan;
pub mod chunk_shape;
pub mod codec;
pub mod config;
pub mod coordinate;
pub mod data_type;
pub mod merge;
pub mod selection;
pub mod selector;
pub mod sink;
pub mod source;
pub mod values;
pub mod variable;

/// An array shape. Dimensions may be zero.
pub type ArrayShape = Vec<u64>;

/// An ND index to an element in an array.
pub type ArrayIndices = Vec<u64>;
