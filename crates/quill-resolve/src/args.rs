//! Call-site arguments of a `new` expression.

use indexmap::IndexMap;
use quill_types::{MapLiteralType, Type};

/// One argument as written at the call site.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Argument {
    Expr(Type),
    /// `label: value`
    Named { label: String, value: Type },
}

/// The raw argument list of a call, in source order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ArgumentList {
    pub args: Vec<Argument>,
}

impl ArgumentList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn positional(types: impl IntoIterator<Item = Type>) -> Self {
        Self {
            args: types.into_iter().map(Argument::Expr).collect(),
        }
    }

    #[must_use]
    pub fn with_expr(mut self, ty: Type) -> Self {
        self.args.push(Argument::Expr(ty));
        self
    }

    #[must_use]
    pub fn with_named(mut self, label: impl Into<String>, value: Type) -> Self {
        self.args.push(Argument::Named {
            label: label.into(),
            value,
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArgumentShape {
    Empty,
    Positional,
    Named,
    Mixed,
}

/// Arguments split by kind.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallArguments {
    pub positional: Vec<Type>,
    pub named: IndexMap<String, Type>,
}

impl CallArguments {
    pub fn shape(&self) -> ArgumentShape {
        match (self.positional.is_empty(), self.named.is_empty()) {
            (true, true) => ArgumentShape::Empty,
            (false, true) => ArgumentShape::Positional,
            (true, false) => ArgumentShape::Named,
            (false, false) => ArgumentShape::Mixed,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.shape() == ArgumentShape::Empty
    }

    /// The structural map type Groovy builds from the named arguments.
    pub fn map_literal(&self) -> MapLiteralType {
        MapLiteralType::new(
            self.named
                .iter()
                .map(|(key, ty)| (key.clone(), ty.clone()))
                .collect(),
        )
    }
}

/// Split `list` into positional and named arguments.
///
/// Positional arguments keep their order. A repeated label keeps the position of its
/// first occurrence and the value of its last.
pub fn classify(list: &ArgumentList) -> CallArguments {
    let mut out = CallArguments::default();
    for arg in &list.args {
        match arg {
            Argument::Expr(ty) => out.positional.push(ty.clone()),
            Argument::Named { label, value } => {
                out.named.insert(label.clone(), value.clone());
            }
        }
    }
    out
}
