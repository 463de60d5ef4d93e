// lfpy — parameter resolution and emission for the Python target
//
// Library root. Loading (model), checks (validate), resolution (resolve), and
// Python emission (emit) are wired together by `pipeline`.

pub mod ast;
pub mod config;
pub mod decl;
pub mod diag;
pub mod dump;
pub mod emit;
pub mod error;
pub mod id;
pub mod instance;
pub mod model;
pub mod pipeline;
pub mod resolve;
pub mod target;
pub mod validate;
