//! Merge sessions.
//!
//! A [`Merge`] holds everything computed from a list of sources: the unified [`Encodings`] of every array, the unified
//! [`Axes`], and the [`Variable`]s with the correspondence of each contributing source.
//!
//! A merge can be narrowed with [`Merge::select`], planned with [`Merge::plan`], and written to a sink with
//! [`Merge::write`]. Sources are written in ascending order, so where sources overlap the last source wins.

mod merge_errors;
mod write_options;
mod write_plan;

pub use merge_errors::MergeError;
pub use write_options::WriteOptions;
pub use write_plan::{AxisPlan, VariablePlan, WritePlan};

use std::collections::{BTreeMap, BTreeSet};

use crate::{
    array_subset::ArraySubset,
    chunk_layout::guess_chunk_shape_with_limits,
    chunk_plan::decompose,
    chunk_shape::ChunkShape,
    codec::Encoding,
    coordinate::{normalise, unify_coordinates, Axes, Axis, Encodings},
    selection::{filter_coordinates, Selection},
    sink::{ArrayDeclaration, SinkTraits},
    source::Source,
    variable::{index_variables, Variable},
};

/// Collect the unified encoding of every array of `sources`.
///
/// The first source defining an array sets its on-disk data type, and later sources only fill in unset encoding
/// fields. An encoding with a conflicting on-disk data type is logged and ignored.
///
/// # Errors
/// Returns a [`MergeError`] if an array cannot be read or has invalid encoding attributes.
pub fn collect_encodings(sources: &[Source]) -> Result<Encodings, MergeError> {
    let mut encodings = Encodings::new();
    for (source_id, source) in sources.iter().enumerate() {
        for name in source
            .coordinate_names()
            .into_iter()
            .chain(source.variable_names())
        {
            let info = source.array_info(&name)?;
            let encoding = Encoding::from_attributes(info.data_type(), info.attributes())?;
            if let Some(existing) = encodings.get_mut(&name) {
                if let Err(err) = existing.merge(&encoding) {
                    log::warn!("array {name} of source {source_id}: {err}, keeping the first encoding");
                }
            } else {
                encodings.insert(name, encoding);
            }
        }
    }
    Ok(encodings)
}

/// A merge of sources onto unified coordinates.
#[derive(Clone, Debug)]
pub struct Merge {
    sources: Vec<Source>,
    encodings: Encodings,
    axes: Axes,
    variables: BTreeMap<String, Variable>,
}

impl Merge {
    /// Merge `sources`.
    ///
    /// The id of each source is its position in `sources`.
    ///
    /// # Errors
    /// Returns a [`MergeError`] if
    ///  - a source cannot be read,
    ///  - an array has invalid encoding attributes,
    ///  - coordinates of the same name hold incompatible values or are not strictly increasing, or
    ///  - a variable has different dimensions in two sources.
    pub fn new(sources: Vec<Source>) -> Result<Self, MergeError> {
        let encodings = collect_encodings(&sources)?;
        let axes = unify_coordinates(&sources, &encodings)?;
        let variables = index_variables(&sources, &axes, &encodings)?;
        Ok(Self {
            sources,
            encodings,
            axes,
            variables,
        })
    }

    /// Return the sources.
    #[must_use]
    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    /// Return the unified encodings.
    #[must_use]
    pub const fn encodings(&self) -> &Encodings {
        &self.encodings
    }

    /// Return the unified axes.
    #[must_use]
    pub const fn axes(&self) -> &Axes {
        &self.axes
    }

    /// Return the axis `name`.
    #[must_use]
    pub fn axis(&self, name: &str) -> Option<&Axis> {
        self.axes.get(name)
    }

    /// Return the variables.
    #[must_use]
    pub const fn variables(&self) -> &BTreeMap<String, Variable> {
        &self.variables
    }

    /// Return the variable `name`.
    #[must_use]
    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    /// Return a new merge restricted by `selection`. This merge is unchanged.
    ///
    /// Axis predicates are applied first and the variables re-indexed against the filtered axes.
    /// Removing a coordinate removes every variable using it, and restricting the variables removes every coordinate
    /// that no remaining variable uses.
    ///
    /// # Errors
    /// Returns a [`MergeError`] if a predicate names an unknown axis or is incompatible with its axis, or a source
    /// cannot be re-indexed.
    pub fn select(&self, selection: &Selection) -> Result<Self, MergeError> {
        let mut axes = self.axes.clone();
        let mut variables = if selection.predicates().is_empty() {
            self.variables.clone()
        } else {
            for (name, predicate) in selection.predicates() {
                let axis = filter_coordinates(&self.axes, name, predicate)?;
                axes.insert(name.clone(), axis);
            }
            index_variables(&self.sources, &axes, &self.encodings)?
        };

        let retain_dimensions = |axes: &Axes, variables: &mut BTreeMap<String, Variable>| {
            variables.retain(|_, variable| {
                variable
                    .dimensions()
                    .iter()
                    .all(|dimension| axes.contains_key(dimension))
            });
        };
        let retain_used = |axes: &mut Axes, variables: &BTreeMap<String, Variable>| {
            let used: BTreeSet<&String> = variables
                .values()
                .flat_map(Variable::dimensions)
                .collect();
            axes.retain(|name, _| used.contains(name));
        };

        if let Some(include) = selection.included_coordinates() {
            axes.retain(|name, _| include.contains(name));
            retain_dimensions(&axes, &mut variables);
        }
        if !selection.excluded_coordinates().is_empty() {
            let exclude = selection.excluded_coordinates();
            axes.retain(|name, _| !exclude.contains(name));
            retain_dimensions(&axes, &mut variables);
        }
        if let Some(include) = selection.included_variables() {
            variables.retain(|name, _| include.contains(name));
            retain_used(&mut axes, &variables);
        }
        if let Some(exclude) = selection.excluded_variables() {
            variables.retain(|name, _| !exclude.contains(name));
            retain_used(&mut axes, &variables);
        }

        Ok(Self {
            sources: self.sources.clone(),
            encodings: self.encodings.clone(),
            axes,
            variables,
        })
    }

    /// Plan writing the merge with `options`.
    ///
    /// Axes are declared as dimension scales. Variables are declared with their dimension names and their missing
    /// value as the fill value, and every contributing source gets a [chunk plan](crate::chunk_plan).
    /// Scalar variables are declared without chunking or a fill value.
    ///
    /// # Errors
    /// Returns [`MergeError::InvalidChunkShape`] if a chunk shape override does not match its array.
    pub fn plan(&self, options: &WriteOptions) -> Result<WritePlan, MergeError> {
        let axes = self
            .axes
            .values()
            .map(|axis| {
                let shape = vec![axis.len()];
                let extensible = vec![options.is_unlimited(axis.name())];
                let chunk_shape = chunk_shape(axis.name(), &shape, &extensible, axis.encoding(), options)?;
                let declaration = ArrayDeclaration {
                    name: axis.name().to_string(),
                    shape,
                    data_type: axis.encoding().data_type(),
                    fill_value: None,
                    chunk_shape,
                    extensible,
                    dimensions: vec![axis.name().to_string()],
                    dimension_scale: true,
                    encoding: axis.encoding().clone(),
                };
                Ok(AxisPlan::new(declaration, axis.values().clone()))
            })
            .collect::<Result<Vec<_>, MergeError>>()?;

        let variables = self
            .variables
            .values()
            .map(|variable| {
                let extensible: Vec<bool> = variable
                    .dimensions()
                    .iter()
                    .map(|dimension| options.is_unlimited(dimension))
                    .collect();
                let chunk_shape = chunk_shape(
                    variable.name(),
                    variable.shape(),
                    &extensible,
                    variable.encoding(),
                    options,
                )?;
                let fill_value = if variable.is_scalar() {
                    None
                } else {
                    variable.encoding().missing_value().cloned()
                };
                let chunk_plans = variable
                    .correspondences()
                    .iter()
                    .map(|(&source_id, correspondence)| {
                        let entries = decompose(
                            correspondence,
                            chunk_shape.as_ref(),
                            options.chunk_stop_factor(),
                        );
                        log::trace!(
                            "variable {}: {} chunk plan entries from source {source_id}",
                            variable.name(),
                            entries.len()
                        );
                        (source_id, entries)
                    })
                    .collect();
                let declaration = ArrayDeclaration {
                    name: variable.name().to_string(),
                    shape: variable.shape().to_vec(),
                    data_type: variable.encoding().data_type(),
                    fill_value,
                    chunk_shape,
                    extensible,
                    dimensions: variable.dimensions().to_vec(),
                    dimension_scale: false,
                    encoding: variable.encoding().clone(),
                };
                Ok(VariablePlan::new(declaration, chunk_plans))
            })
            .collect::<Result<Vec<_>, MergeError>>()?;

        Ok(WritePlan::new(axes, variables))
    }

    /// Write the merge to `sink` with `options`.
    ///
    /// Every axis is declared and written, then every variable is declared and the contribution of each source is
    /// copied in ascending source order. Values are transposed to the canonical dimension order of the variable and
    /// normalised to its on-disk encoding.
    ///
    /// # Errors
    /// Returns a [`MergeError`] if planning fails, a source cannot be read, values cannot be encoded, or the sink
    /// rejects a declaration or write.
    pub fn write(&self, sink: &dyn SinkTraits, options: &WriteOptions) -> Result<(), MergeError> {
        let plan = self.plan(options)?;

        for axis in plan.axes() {
            let declaration = axis.declaration();
            sink.create_array(declaration)?;
            sink.store_array_subset(
                &declaration.name,
                &ArraySubset::new_with_shape(declaration.shape.clone()),
                axis.values(),
            )?;
        }

        for variable_plan in plan.variables() {
            let declaration = variable_plan.declaration();
            sink.create_array(declaration)?;
            let Some(variable) = self.variables.get(&declaration.name) else {
                continue;
            };
            for (&source_id, entries) in variable_plan.chunk_plans() {
                let (Some(source), Some(correspondence)) = (
                    self.sources.get(source_id),
                    variable.correspondence(source_id),
                ) else {
                    continue;
                };
                let inverse_dimension_order = correspondence.inverse_dimension_order();
                for entry in entries {
                    let values = source.retrieve_subset(&declaration.name, entry.local())?;
                    let values = if correspondence.is_permuted() {
                        values.permuted(entry.local().shape(), &inverse_dimension_order)?
                    } else {
                        values
                    };
                    let values = normalise(source.representation(), &values, variable.encoding())?;
                    sink.store_array_subset(&declaration.name, entry.global(), &values)?;
                }
            }
        }
        Ok(())
    }
}

/// Return the chunk shape of the array `name`: its override in `options`, or a guess.
fn chunk_shape(
    name: &str,
    shape: &[u64],
    extensible: &[bool],
    encoding: &Encoding,
    options: &WriteOptions,
) -> Result<Option<ChunkShape>, MergeError> {
    if shape.is_empty() {
        return Ok(None);
    }
    if let Some(chunk_shape) = options.chunk_shape(name) {
        let invalid = || MergeError::InvalidChunkShape {
            name: name.to_string(),
            chunk_shape: chunk_shape.to_vec(),
            dimensionality: shape.len(),
        };
        if chunk_shape.len() != shape.len() {
            return Err(invalid());
        }
        return ChunkShape::try_from(chunk_shape)
            .map(Some)
            .map_err(|_| invalid());
    }
    Ok(guess_chunk_shape_with_limits(
        shape,
        extensible,
        encoding.data_type().element_size(),
        options.chunk_size_limits(),
    ))
}
