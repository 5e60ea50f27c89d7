pub(crate) mod assignments;
pub(crate) mod work;
