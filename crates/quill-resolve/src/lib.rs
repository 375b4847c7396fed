//! Constructor candidate resolution for `new` expressions.
//!
//! Given a type reference and call-site arguments, [`ConstructorResolver`] finds every
//! constructor of every class the reference may denote that can accept the arguments.
//! Groovy rules apply on top of Java's: named arguments either bind to a single
//! `Map` parameter or become property assignments after a no-argument constructor,
//! parameters with default values may be omitted, and incomplete code returns every
//! candidate for completion and signature help.

mod args;
mod constructor;
mod diagnostics;
mod filter;
mod scope;
mod type_ref;

pub use args::{classify, Argument, ArgumentList, ArgumentShape, CallArguments};
pub use constructor::{ConstructorResolver, NewExpression, NewTarget};
pub use diagnostics::{
    ambiguous_constructor_diag, format_call_arguments, format_constructor_signature,
    format_failure_reason, unresolved_constructor_diag, unresolved_type_diag,
};
pub use filter::{
    constructor_candidates, filter_applicable, most_specific, Applicability,
    CandidateFailureReason, ConstructorCandidate, RejectedCandidate, ResolutionResult,
    ResolveOptions, ResolvedConstructor,
};
pub use scope::{
    ClassCollector, Import, ImportLevel, ImportScope, NameHintProcessor, ScopeDeclaration,
    ScopeProcessor, GROOVY_DEFAULT_IMPORTS,
};
pub use type_ref::{
    resolve_type_ref, resolve_type_ref_to_type, ResolvedType, SymbolTable, TypeArgRef,
    TypeRefParseError, TypeReference,
};
