//! Rule trees, evaluation results and their AST

pub mod applier;
pub mod ast;
pub mod node;
pub mod result;

pub use applier::{NamedRule, RuleApplier, RuleFailure, ValidationInput};
pub use ast::Ast;
pub use node::{PredicateNode, RuleNode};
pub use result::{Failure, Operation, PredicateCall, RuleResult};
