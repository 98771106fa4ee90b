//! Variables and their correspondence with sources.
//!
//! A [`Variable`] is an array over unified axes assembled from the contributions of one or more sources.
//! The contribution of each source is described by a [`Correspondence`]: for every dimension, the positions along the
//! unified axis covered by the source and where those elements live along the source's own coordinate.
//!
//! Variables are built by a [`VariableIndexer`], or with [`index_variables`] for a whole list of sources.

use std::collections::BTreeMap;

use crate::{
    codec::Encoding,
    coordinate::{encoding_of, normalised_coordinate, Axes, Encodings},
    merge::MergeError,
    selector::{classify, Selector},
    source::{Source, SourceId, SourceTraits},
    values::ArrayValues,
    ArrayShape,
};

/// The correspondence between a variable and the contribution of one source.
///
/// Selectors are held in the canonical dimension order of the variable. Along every dimension the global and local
/// selectors select the same number of positions, and the `i`th global position holds the `i`th local position.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Correspondence {
    global: Vec<Selector>,
    local: Vec<Selector>,
    dimension_order: Vec<usize>,
}

impl Correspondence {
    /// Create a new correspondence.
    ///
    /// `dimension_order[native]` is the canonical position of the source's native dimension `native`.
    ///
    /// # Panics
    /// Panics if the lengths of `global`, `local` and `dimension_order` differ, or the global and local selectors of a
    /// dimension select a different number of positions.
    #[must_use]
    pub fn new(global: Vec<Selector>, local: Vec<Selector>, dimension_order: Vec<usize>) -> Self {
        assert_eq!(global.len(), local.len());
        assert_eq!(global.len(), dimension_order.len());
        assert!(std::iter::zip(&global, &local).all(|(global, local)| global.len() == local.len()));
        Self {
            global,
            local,
            dimension_order,
        }
    }

    /// Return the global selectors in canonical dimension order.
    #[must_use]
    pub fn global(&self) -> &[Selector] {
        &self.global
    }

    /// Return the local selectors in canonical dimension order.
    #[must_use]
    pub fn local(&self) -> &[Selector] {
        &self.local
    }

    /// Return the dimension order, mapping each native dimension of the source to its canonical position.
    #[must_use]
    pub fn dimension_order(&self) -> &[usize] {
        &self.dimension_order
    }

    /// Returns true if the native dimension order of the source differs from the canonical order.
    #[must_use]
    pub fn is_permuted(&self) -> bool {
        self.dimension_order
            .iter()
            .enumerate()
            .any(|(native, &canonical)| native != canonical)
    }

    /// Return the canonical dimension of each native dimension, inverted: the native dimension of each canonical
    /// dimension.
    #[must_use]
    pub fn inverse_dimension_order(&self) -> Vec<usize> {
        let mut inverse = vec![0; self.dimension_order.len()];
        for (native, &canonical) in self.dimension_order.iter().enumerate() {
            inverse[canonical] = native;
        }
        inverse
    }

    /// Return the number of elements contributed.
    #[must_use]
    pub fn num_elements(&self) -> u64 {
        self.global.iter().map(Selector::len).product()
    }
}

/// A variable.
#[derive(Clone, Debug, PartialEq)]
pub struct Variable {
    name: String,
    dimensions: Vec<String>,
    shape: ArrayShape,
    encoding: Encoding,
    correspondences: BTreeMap<SourceId, Correspondence>,
}

impl Variable {
    /// Return the name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the dimension names in canonical order.
    #[must_use]
    pub fn dimensions(&self) -> &[String] {
        &self.dimensions
    }

    /// Return the global shape.
    #[must_use]
    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    /// Returns true if the variable has no dimensions.
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        self.dimensions.is_empty()
    }

    /// Return the encoding.
    #[must_use]
    pub const fn encoding(&self) -> &Encoding {
        &self.encoding
    }

    /// Return the correspondences of the contributing sources.
    #[must_use]
    pub const fn correspondences(&self) -> &BTreeMap<SourceId, Correspondence> {
        &self.correspondences
    }

    /// Return the correspondence of `source_id`.
    #[must_use]
    pub fn correspondence(&self, source_id: SourceId) -> Option<&Correspondence> {
        self.correspondences.get(&source_id)
    }
}

/// Builds [`Variable`]s from sources, one source at a time.
///
/// The first source defining a variable fixes its canonical dimension order.
/// Indexing a source again replaces its previous correspondences.
pub struct VariableIndexer<'a> {
    axes: &'a Axes,
    encodings: &'a Encodings,
    variables: BTreeMap<String, Variable>,
}

impl<'a> VariableIndexer<'a> {
    /// Create a new variable indexer over unified `axes`.
    #[must_use]
    pub fn new(axes: &'a Axes, encodings: &'a Encodings) -> Self {
        Self {
            axes,
            encodings,
            variables: BTreeMap::new(),
        }
    }

    /// Index the variables of `source`.
    ///
    /// A contribution that does not overlap the unified axes along some dimension is dropped, and any previous
    /// contribution of the source to that variable is removed.
    ///
    /// # Errors
    /// Returns a [`MergeError`] if
    ///  - a variable dimension has no unified axis or is not a coordinate of the source
    ///    ([`MergeError::MissingCoordinate`]),
    ///  - a coordinate of the source is not strictly increasing ([`MergeError::UnsortedCoordinate`]),
    ///  - the set of dimensions of a variable differs from a previous source ([`MergeError::DimensionMismatch`]), or
    ///  - the source cannot be read.
    pub fn index_source(
        &mut self,
        source_id: SourceId,
        source: &dyn SourceTraits,
    ) -> Result<(), MergeError> {
        let coordinate_names = source.coordinate_names();
        let mut local_coordinates: BTreeMap<String, ArrayValues> = BTreeMap::new();

        for name in source.variable_names() {
            let info = source.array_info(&name)?;
            let native = info.dimensions();
            let canonical = self
                .variables
                .get(&name)
                .map_or_else(|| native.to_vec(), |variable| variable.dimensions.clone());

            let mut global = Vec::with_capacity(native.len());
            let mut local = Vec::with_capacity(native.len());
            let mut overlaps = true;
            for dimension in native {
                let missing_coordinate = || MergeError::MissingCoordinate {
                    variable: name.clone(),
                    dimension: dimension.clone(),
                };
                let axis = self.axes.get(dimension).ok_or_else(missing_coordinate)?;
                if !coordinate_names.contains(dimension) {
                    return Err(missing_coordinate());
                }
                if !local_coordinates.contains_key(dimension) {
                    let values = normalised_coordinate(source, dimension, self.encodings)?;
                    if !values.is_strictly_increasing() {
                        return Err(MergeError::UnsortedCoordinate(
                            dimension.clone(),
                            source_id,
                        ));
                    }
                    local_coordinates.insert(dimension.clone(), values);
                }
                let local_values = &local_coordinates[dimension];

                let global_positions = axis.values().positions_in(local_values)?;
                if global_positions.is_empty() {
                    overlaps = false;
                    break;
                }
                let local_positions = local_values.positions_in(axis.values())?;
                global.push(classify(global_positions));
                local.push(classify(local_positions));
            }

            if !overlaps {
                log::debug!("source {source_id} does not overlap variable {name}, dropping its contribution");
                if let Some(variable) = self.variables.get_mut(&name) {
                    variable.correspondences.remove(&source_id);
                }
                continue;
            }

            let mut native_sorted = native.to_vec();
            native_sorted.sort();
            let mut canonical_sorted = canonical.clone();
            canonical_sorted.sort();
            if native_sorted != canonical_sorted {
                return Err(MergeError::DimensionMismatch {
                    variable: name,
                    source_id,
                    dimensions: native.to_vec(),
                    expected: canonical,
                });
            }

            let dimension_order: Vec<usize> = native
                .iter()
                .map(|dimension| {
                    canonical
                        .iter()
                        .position(|canonical| canonical == dimension)
                        .unwrap_or_default()
                })
                .collect();
            let mut global_canonical = vec![Selector::default(); native.len()];
            let mut local_canonical = vec![Selector::default(); native.len()];
            for (native_dimension, (global, local)) in
                std::iter::zip(global, local).enumerate()
            {
                global_canonical[dimension_order[native_dimension]] = global;
                local_canonical[dimension_order[native_dimension]] = local;
            }
            let correspondence =
                Correspondence::new(global_canonical, local_canonical, dimension_order);

            if let Some(variable) = self.variables.get_mut(&name) {
                variable.correspondences.insert(source_id, correspondence);
            } else {
                let shape = canonical
                    .iter()
                    .map(|dimension| self.axes.get(dimension).map_or(0, |axis| axis.len()))
                    .collect();
                let encoding = encoding_of(source, &name, self.encodings)?;
                self.variables.insert(
                    name.clone(),
                    Variable {
                        name,
                        dimensions: canonical,
                        shape,
                        encoding,
                        correspondences: BTreeMap::from([(source_id, correspondence)]),
                    },
                );
            }
        }
        Ok(())
    }

    /// Finish indexing and return the variables by name.
    #[must_use]
    pub fn finish(self) -> BTreeMap<String, Variable> {
        self.variables
    }
}

/// Index the variables of `sources` against the unified `axes`.
///
/// The id of each source is its position in `sources`.
///
/// # Errors
/// See [`VariableIndexer::index_source`].
pub fn index_variables(
    sources: &[Source],
    axes: &Axes,
    encodings: &Encodings,
) -> Result<BTreeMap<String, Variable>, MergeError> {
    let mut indexer = VariableIndexer::new(axes, encodings);
    for (source_id, source) in sources.iter().enumerate() {
        indexer.index_source(source_id, source.as_ref())?;
    }
    Ok(indexer.finish())
}
