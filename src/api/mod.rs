pub(crate) mod assignments;
pub(crate) mod errors;
pub(crate) mod handlers;
pub(crate) mod helpers;
pub(crate) mod router;
pub(crate) mod work;
