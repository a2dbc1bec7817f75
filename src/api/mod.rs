pub(crate) mod auth;
pub(crate) mod classrooms;
pub(crate) mod errors;
pub(crate) mod guards;
pub(crate) mod handlers;
pub(crate) mod launches;
pub(crate) mod results;
pub(crate) mod router;
pub(crate) mod students;
pub(crate) mod submissions;
pub(crate) mod validation;
