// Canonical resume document: normalization from analysis payloads, form
// editing, submission checks and the wire shapes derived from it.

pub mod aliases;
pub mod editor;
pub mod flatten;
pub mod handlers;
pub mod normalize;
pub mod record;
pub mod validation;
