pub(crate) mod classrooms;
pub(crate) mod launches;
pub(crate) mod results;
pub(crate) mod students;
pub(crate) mod users;
