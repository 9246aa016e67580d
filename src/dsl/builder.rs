//! Fluent construction of workflows in code. Nested builders hand their parent
//! back from `build()`, so a whole document reads top to bottom:
//!
//! ```
//! use afcl_graph::dsl::builder::{Body, WorkflowBuilder};
//!
//! let workflow = WorkflowBuilder::new("wf")
//!     .data_in("input", "string", "input")
//!     .function("f", "serverless")
//!         .data_in("in", "string", "wf/input")
//!         .data_out("out", "string")
//!         .build()
//!     .data_out("result", "string", "f/out")
//!     .build();
//! assert_eq!(workflow.workflow_body.len(), 1);
//! ```

use crate::dsl::{
    AtomicFunction, ConditionEntry, ConditionExpr, DataIn, DataOut, Function, IfThenElse,
    Parallel, ParallelFor, PropertyConstraint, Section, Sequence, Workflow,
};

fn data_in(name: &str, data_type: &str, source: &str) -> DataIn {
    DataIn {
        name: name.to_string(),
        data_type: data_type.to_string(),
        source: Some(source.to_string()),
        constraints: Vec::new(),
    }
}

fn data_out(name: &str, data_type: &str, source: Option<&str>) -> DataOut {
    DataOut {
        name: name.to_string(),
        data_type: data_type.to_string(),
        source: source.map(str::to_string),
    }
}

fn push_constraint(data_ins: &mut [DataIn], name: &str, value: &str) {
    if let Some(last) = data_ins.last_mut() {
        last.constraints.push(PropertyConstraint {
            name: name.to_string(),
            value: value.to_string(),
        });
    }
}

/// Anything that holds a list of functions. Provides the entry points for
/// every function construct.
pub trait Body: Sized {
    fn push(&mut self, function: Function);

    fn function(self, name: &str, function_type: &str) -> AtomicBuilder<Self> {
        AtomicBuilder {
            parent: self,
            function: AtomicFunction {
                name: name.to_string(),
                function_type: function_type.to_string(),
                data_ins: Vec::new(),
                data_outs: Vec::new(),
                properties: Vec::new(),
            },
        }
    }

    fn sequence(self, name: &str) -> SequenceBuilder<Self> {
        SequenceBuilder {
            parent: self,
            sequence: Sequence {
                name: name.to_string(),
                data_ins: Vec::new(),
                data_outs: Vec::new(),
                sequence_body: Vec::new(),
            },
        }
    }

    fn parallel(self, name: &str) -> ParallelBuilder<Self> {
        ParallelBuilder {
            parent: self,
            parallel: Parallel {
                name: name.to_string(),
                data_ins: Vec::new(),
                data_outs: Vec::new(),
                parallel_body: Vec::new(),
            },
        }
    }

    fn if_then_else(self, name: &str) -> IfBuilder<Self> {
        IfBuilder {
            parent: self,
            compound: IfThenElse {
                name: name.to_string(),
                data_ins: Vec::new(),
                condition: ConditionExpr::default(),
                then_branch: Vec::new(),
                else_branch: Vec::new(),
                data_outs: Vec::new(),
            },
            in_else: false,
        }
    }

    fn parallel_for(self, name: &str) -> ParallelForBuilder<Self> {
        ParallelForBuilder {
            parent: self,
            compound: ParallelFor {
                name: name.to_string(),
                data_ins: Vec::new(),
                iterators: Vec::new(),
                loop_body: Vec::new(),
                data_outs: Vec::new(),
            },
        }
    }
}

pub struct WorkflowBuilder {
    name: String,
    data_ins: Vec<DataIn>,
    data_outs: Vec<DataOut>,
    body: Vec<Function>,
}

impl WorkflowBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            data_ins: Vec::new(),
            data_outs: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Workflow input; `source` is the key in the input JSON.
    pub fn data_in(mut self, name: &str, data_type: &str, source: &str) -> Self {
        self.data_ins.push(data_in(name, data_type, source));
        self
    }

    pub fn data_out(mut self, name: &str, data_type: &str, source: &str) -> Self {
        self.data_outs.push(data_out(name, data_type, Some(source)));
        self
    }

    pub fn build(self) -> Workflow {
        Workflow {
            name: self.name,
            data_ins: self.data_ins,
            data_outs: self.data_outs,
            workflow_body: self.body,
        }
    }
}

impl Body for WorkflowBuilder {
    fn push(&mut self, function: Function) {
        self.body.push(function);
    }
}

pub struct AtomicBuilder<P: Body> {
    parent: P,
    function: AtomicFunction,
}

impl<P: Body> AtomicBuilder<P> {
    pub fn data_in(mut self, name: &str, data_type: &str, source: &str) -> Self {
        self.function.data_ins.push(data_in(name, data_type, source));
        self
    }

    /// Attaches a constraint to the most recently added input.
    pub fn constraint(mut self, name: &str, value: &str) -> Self {
        push_constraint(&mut self.function.data_ins, name, value);
        self
    }

    pub fn data_out(mut self, name: &str, data_type: &str) -> Self {
        self.function.data_outs.push(data_out(name, data_type, None));
        self
    }

    pub fn property(mut self, name: &str, value: &str) -> Self {
        self.function.properties.push(PropertyConstraint {
            name: name.to_string(),
            value: value.to_string(),
        });
        self
    }

    pub fn build(mut self) -> P {
        self.parent.push(Function::Atomic(self.function));
        self.parent
    }
}

pub struct SequenceBuilder<P: Body> {
    parent: P,
    sequence: Sequence,
}

impl<P: Body> SequenceBuilder<P> {
    pub fn data_in(mut self, name: &str, data_type: &str, source: &str) -> Self {
        self.sequence.data_ins.push(data_in(name, data_type, source));
        self
    }

    pub fn data_out(mut self, name: &str, data_type: &str, source: &str) -> Self {
        self.sequence.data_outs.push(data_out(name, data_type, Some(source)));
        self
    }

    pub fn build(mut self) -> P {
        self.parent.push(Function::Sequence(self.sequence));
        self.parent
    }
}

impl<P: Body> Body for SequenceBuilder<P> {
    fn push(&mut self, function: Function) {
        self.sequence.sequence_body.push(function);
    }
}

pub struct ParallelBuilder<P: Body> {
    parent: P,
    parallel: Parallel,
}

impl<P: Body> ParallelBuilder<P> {
    pub fn data_in(mut self, name: &str, data_type: &str, source: &str) -> Self {
        self.parallel.data_ins.push(data_in(name, data_type, source));
        self
    }

    pub fn data_out(mut self, name: &str, data_type: &str, source: &str) -> Self {
        self.parallel.data_outs.push(data_out(name, data_type, Some(source)));
        self
    }

    /// Starts a new section; subsequent functions land in it.
    pub fn section(mut self) -> Self {
        self.parallel.parallel_body.push(Section::default());
        self
    }

    pub fn build(mut self) -> P {
        self.parent.push(Function::Parallel(self.parallel));
        self.parent
    }
}

impl<P: Body> Body for ParallelBuilder<P> {
    fn push(&mut self, function: Function) {
        if self.parallel.parallel_body.is_empty() {
            self.parallel.parallel_body.push(Section::default());
        }
        if let Some(section) = self.parallel.parallel_body.last_mut() {
            section.section.push(function);
        }
    }
}

pub struct IfBuilder<P: Body> {
    parent: P,
    compound: IfThenElse,
    in_else: bool,
}

impl<P: Body> IfBuilder<P> {
    pub fn data_in(mut self, name: &str, data_type: &str, source: &str) -> Self {
        self.compound.data_ins.push(data_in(name, data_type, source));
        self
    }

    pub fn data_out(mut self, name: &str, data_type: &str, source: &str) -> Self {
        self.compound.data_outs.push(data_out(name, data_type, Some(source)));
        self
    }

    pub fn combined_with(mut self, combinator: &str) -> Self {
        self.compound.condition.combined_with = combinator.to_string();
        self
    }

    pub fn condition(self, data1: &str, data2: &str, data_type: &str, operator: &str) -> Self {
        self.add_condition(data1, data2, data_type, operator, false)
    }

    pub fn negated_condition(
        self,
        data1: &str,
        data2: &str,
        data_type: &str,
        operator: &str,
    ) -> Self {
        self.add_condition(data1, data2, data_type, operator, true)
    }

    /// Functions added from here on go into the then branch.
    pub fn then_branch(mut self) -> Self {
        self.in_else = false;
        self
    }

    /// Functions added from here on go into the else branch.
    pub fn else_branch(mut self) -> Self {
        self.in_else = true;
        self
    }

    pub fn build(mut self) -> P {
        self.parent.push(Function::Conditional(self.compound));
        self.parent
    }

    fn add_condition(
        mut self,
        data1: &str,
        data2: &str,
        data_type: &str,
        operator: &str,
        negation: bool,
    ) -> Self {
        self.compound.condition.conditions.push(ConditionEntry {
            data1: data1.to_string(),
            data2: data2.to_string(),
            data_type: data_type.to_string(),
            operator: operator.to_string(),
            negation,
        });
        self
    }
}

impl<P: Body> Body for IfBuilder<P> {
    fn push(&mut self, function: Function) {
        if self.in_else {
            self.compound.else_branch.push(function);
        } else {
            self.compound.then_branch.push(function);
        }
    }
}

pub struct ParallelForBuilder<P: Body> {
    parent: P,
    compound: ParallelFor,
}

impl<P: Body> ParallelForBuilder<P> {
    pub fn data_in(mut self, name: &str, data_type: &str, source: &str) -> Self {
        self.compound.data_ins.push(data_in(name, data_type, source));
        self
    }

    pub fn constraint(mut self, name: &str, value: &str) -> Self {
        push_constraint(&mut self.compound.data_ins, name, value);
        self
    }

    pub fn iterator(mut self, iterator: &str) -> Self {
        self.compound.iterators.push(iterator.to_string());
        self
    }

    pub fn data_out(mut self, name: &str, data_type: &str, source: &str) -> Self {
        self.compound.data_outs.push(data_out(name, data_type, Some(source)));
        self
    }

    pub fn build(mut self) -> P {
        self.parent.push(Function::ParallelFor(self.compound));
        self.parent
    }
}

impl<P: Body> Body for ParallelForBuilder<P> {
    fn push(&mut self, function: Function) {
        self.compound.loop_body.push(function);
    }
}
