pub(crate) mod classifier;
pub(crate) mod keys;
pub(crate) mod model;
pub(crate) mod parser;
pub(crate) mod scoring;

pub(crate) use classifier::ProblemHosts;
pub(crate) use model::{AssignmentDocument, StoredAssignment, Submission};
pub(crate) use parser::AssignmentParser;
pub(crate) use scoring::{group_index, score};
