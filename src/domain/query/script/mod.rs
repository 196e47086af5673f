pub mod ast;
pub mod builtins;
pub mod guard;
pub mod interpreter;
pub mod parser;
pub mod script_error;
pub mod value;
