// Template synthesis: the remote generation client, template display catalog
// and the orchestrator that turns a canonical document into artifacts.

pub mod catalog;
pub mod client;
pub mod handlers;
pub mod orchestrator;
