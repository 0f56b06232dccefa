// Library root: the draft actor and session bootstrap, shared by the binary
// and integration tests.

pub mod actor;
pub mod app;
