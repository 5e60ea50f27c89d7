pub(crate) mod assignment;
pub(crate) mod identifiers;
pub(crate) mod probe;
pub(crate) mod storage;
