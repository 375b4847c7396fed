use quill_types::{format_type, Diagnostic, Span, Type, TypeEnv};

use crate::args::CallArguments;
use crate::filter::{CandidateFailureReason, ConstructorCandidate, RejectedCandidate, ResolvedConstructor};
use crate::type_ref::TypeReference;

const MAX_LISTED_REJECTED: usize = 5;
const MAX_LISTED_AMBIGUOUS: usize = 8;

/// `Point(int, int)`, `Tuple(String, Object...)`
pub fn format_constructor_signature(env: &dyn TypeEnv, candidate: &ConstructorCandidate) -> String {
    let mut out = constructor_name(env, candidate);
    out.push('(');
    for (idx, param) in candidate.params.iter().enumerate() {
        if idx != 0 {
            out.push_str(", ");
        }
        if candidate.is_varargs && idx + 1 == candidate.params.len() {
            match &param.ty {
                Type::Array(elem) => out.push_str(&format_type(env, elem)),
                other => out.push_str(&format_type(env, other)),
            }
            out.push_str("...");
        } else {
            out.push_str(&format_type(env, &param.ty));
        }
    }
    out.push(')');
    out
}

pub fn format_failure_reason(env: &dyn TypeEnv, reason: &CandidateFailureReason) -> String {
    match reason {
        CandidateFailureReason::WrongArity { min, max, found } => match max {
            Some(max) if max == min => format!("wrong arity: expected {min}, found {found}"),
            Some(max) => format!("wrong arity: expected {min} to {max}, found {found}"),
            None => format!("wrong arity: expected at least {min}, found {found} (varargs)"),
        },
        CandidateFailureReason::ArgumentConversion {
            arg_index,
            from,
            to,
        } => {
            let from = format_type(env, from);
            let to = format_type(env, to);
            format!(
                "argument {}: cannot convert from {from} to {to}",
                arg_index + 1
            )
        }
    }
}

pub fn format_call_arguments(env: &dyn TypeEnv, args: &CallArguments) -> String {
    let rendered = args
        .named
        .iter()
        .map(|(label, ty)| format!("{label}: {}", format_type(env, ty)))
        .chain(args.positional.iter().map(|ty| format_type(env, ty)))
        .collect::<Vec<_>>();
    format!("({})", rendered.join(", "))
}

pub fn unresolved_type_diag(reference: &TypeReference, span: Option<Span>) -> Diagnostic {
    Diagnostic::error(
        "unresolved-type",
        format!("unresolved type `{reference}`"),
        span,
    )
}

pub fn unresolved_constructor_diag(
    env: &dyn TypeEnv,
    reference: &TypeReference,
    args: &CallArguments,
    rejected: &[RejectedCandidate],
    span: Option<Span>,
) -> Diagnostic {
    let mut message = format!(
        "unresolved constructor `{reference}` with arguments {}",
        format_call_arguments(env, args)
    );
    if rejected.is_empty() {
        return Diagnostic::error("unresolved-constructor", message, span);
    }

    message.push_str("\n\ncandidates:");
    for rejected in rejected.iter().take(MAX_LISTED_REJECTED) {
        message.push_str("\n  - ");
        message.push_str(&format_constructor_signature(env, &rejected.candidate));
        message.push_str("\n    ");
        message.push_str(&format_failure_reason(env, &rejected.reason));
    }
    if rejected.len() > MAX_LISTED_REJECTED {
        message.push_str(&format!(
            "\n  ... and {} more",
            rejected.len() - MAX_LISTED_REJECTED
        ));
    }

    Diagnostic::error("unresolved-constructor", message, span)
}

pub fn ambiguous_constructor_diag(
    env: &dyn TypeEnv,
    reference: &TypeReference,
    candidates: &[ResolvedConstructor],
    span: Option<Span>,
) -> Diagnostic {
    let mut message = format!("ambiguous constructor call `{reference}`");
    if candidates.is_empty() {
        return Diagnostic::error("ambiguous-constructor", message, span);
    }

    message.push_str("\n\ncandidates:");
    for cand in candidates.iter().take(MAX_LISTED_AMBIGUOUS) {
        message.push_str("\n  - ");
        message.push_str(&format_constructor_signature(env, &cand.candidate));
    }
    if candidates.len() > MAX_LISTED_AMBIGUOUS {
        message.push_str(&format!(
            "\n  ... and {} more",
            candidates.len() - MAX_LISTED_AMBIGUOUS
        ));
    }

    Diagnostic::error("ambiguous-constructor", message, span)
}

fn constructor_name(env: &dyn TypeEnv, candidate: &ConstructorCandidate) -> String {
    match env.class(candidate.owner.class) {
        Some(class) => class.simple_name().to_string(),
        None => format!("<class#{}>", candidate.owner.class.to_raw()),
    }
}
