pub(crate) mod access;
pub(crate) mod codes;
pub(crate) mod grading;
pub(crate) mod scheduling;
