//! Boundary of the compiled graph: binding workflow inputs to root nodes and
//! handing leaf values to a result handler.

pub mod input;
pub mod output;

pub use input::{bind_inputs, InputDataProvider, InputDataProviderFile};
pub use output::{collect_outputs, OutputDataHandler, OutputDataPrinter};
