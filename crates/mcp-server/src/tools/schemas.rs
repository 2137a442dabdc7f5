pub(crate) mod search;
pub(crate) mod term_details;
