use std::collections::BTreeMap;

use crate::{
    chunk_plan::ChunkPlanEntry, sink::ArrayDeclaration, source::SourceId, values::ArrayValues,
};

/// The plan of an axis: its declaration and on-disk values.
#[derive(Clone, Debug, PartialEq)]
pub struct AxisPlan {
    declaration: ArrayDeclaration,
    values: ArrayValues,
}

impl AxisPlan {
    pub(crate) fn new(declaration: ArrayDeclaration, values: ArrayValues) -> Self {
        Self {
            declaration,
            values,
        }
    }

    /// Return the declaration.
    #[must_use]
    pub const fn declaration(&self) -> &ArrayDeclaration {
        &self.declaration
    }

    /// Return the on-disk values.
    #[must_use]
    pub const fn values(&self) -> &ArrayValues {
        &self.values
    }
}

/// The plan of a variable: its declaration and the chunk plan of every contributing source.
#[derive(Clone, Debug, PartialEq)]
pub struct VariablePlan {
    declaration: ArrayDeclaration,
    chunk_plans: BTreeMap<SourceId, Vec<ChunkPlanEntry>>,
}

impl VariablePlan {
    pub(crate) fn new(
        declaration: ArrayDeclaration,
        chunk_plans: BTreeMap<SourceId, Vec<ChunkPlanEntry>>,
    ) -> Self {
        Self {
            declaration,
            chunk_plans,
        }
    }

    /// Return the declaration.
    #[must_use]
    pub const fn declaration(&self) -> &ArrayDeclaration {
        &self.declaration
    }

    /// Return the chunk plans by source, in ascending source order.
    #[must_use]
    pub const fn chunk_plans(&self) -> &BTreeMap<SourceId, Vec<ChunkPlanEntry>> {
        &self.chunk_plans
    }

    /// Return the total number of chunk plan entries.
    #[must_use]
    pub fn num_entries(&self) -> usize {
        self.chunk_plans.values().map(Vec::len).sum()
    }
}

/// The plan of a merge: every axis then every variable, in name order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WritePlan {
    axes: Vec<AxisPlan>,
    variables: Vec<VariablePlan>,
}

impl WritePlan {
    pub(crate) fn new(axes: Vec<AxisPlan>, variables: Vec<VariablePlan>) -> Self {
        Self { axes, variables }
    }

    /// Return the axis plans.
    #[must_use]
    pub fn axes(&self) -> &[AxisPlan] {
        &self.axes
    }

    /// Return the variable plans.
    #[must_use]
    pub fn variables(&self) -> &[VariablePlan] {
        &self.variables
    }

    /// Return the plan of the variable `name`.
    #[must_use]
    pub fn variable(&self, name: &str) -> Option<&VariablePlan> {
        self.variables
            .iter()
            .find(|variable| variable.declaration.name == name)
    }
}
