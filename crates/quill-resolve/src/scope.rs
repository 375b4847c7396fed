//! Lexical/import scope walking.
//!
//! Scopes feed declarations to a [`ScopeProcessor`]. Processors may advertise a
//! name hint; scopes are *allowed* to use it to skip work but are not required to,
//! so [`NameHintProcessor`] re-applies the hint before delegating.

use quill_types::{simple_name, ClassId, TypeEnv};

use crate::type_ref::{ResolvedType, SymbolTable};

/// A class declaration visible from a scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScopeDeclaration<'a> {
    pub class: ClassId,
    /// Name the declaration is visible under (the class's simple name).
    pub name: &'a str,
    pub binary_name: &'a str,
    pub type_param_count: usize,
}

pub trait ScopeProcessor {
    /// Visit one declaration. Returns `false` to stop the walk.
    fn execute(&mut self, decl: &ScopeDeclaration<'_>) -> bool;

    /// The only name this processor is interested in, if any.
    fn name_hint(&self) -> Option<&str> {
        None
    }
}

/// Drops declarations whose name differs from the delegate's name hint.
#[derive(Debug)]
pub struct NameHintProcessor<P> {
    delegate: P,
    hint: Option<String>,
}

impl<P: ScopeProcessor> NameHintProcessor<P> {
    pub fn new(delegate: P) -> Self {
        let hint = delegate.name_hint().map(str::to_string);
        Self { delegate, hint }
    }

    pub fn into_inner(self) -> P {
        self.delegate
    }
}

impl<P: ScopeProcessor> ScopeProcessor for NameHintProcessor<P> {
    fn execute(&mut self, decl: &ScopeDeclaration<'_>) -> bool {
        match &self.hint {
            Some(hint) if hint != decl.name => true,
            _ => self.delegate.execute(decl),
        }
    }

    fn name_hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }
}

/// Collects classes accepting a given number of type arguments.
///
/// The collector only advertises its name; wrap it in a [`NameHintProcessor`] to filter
/// by it.
#[derive(Debug)]
pub struct ClassCollector {
    name: String,
    generic_arity: usize,
    found: Vec<ClassId>,
}

impl ClassCollector {
    pub fn new(name: impl Into<String>, generic_arity: usize) -> Self {
        Self {
            name: name.into(),
            generic_arity,
            found: Vec::new(),
        }
    }

    pub fn into_found(self) -> Vec<ClassId> {
        self.found
    }
}

impl ScopeProcessor for ClassCollector {
    fn execute(&mut self, decl: &ScopeDeclaration<'_>) -> bool {
        let arity_ok = self.generic_arity == 0 || decl.type_param_count == self.generic_arity;
        if arity_ok && !self.found.contains(&decl.class) {
            self.found.push(decl.class);
        }
        true
    }

    fn name_hint(&self) -> Option<&str> {
        Some(&self.name)
    }
}

/// Imports implicitly present in every Groovy compilation unit.
pub const GROOVY_DEFAULT_IMPORTS: &[&str] = &[
    "java.lang.*",
    "java.util.*",
    "java.io.*",
    "java.net.*",
    "groovy.lang.*",
    "groovy.util.*",
    "java.math.BigInteger",
    "java.math.BigDecimal",
];

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Import {
    /// `import a.b.C`
    Single(String),
    /// `import a.b.*`
    OnDemand(String),
}

impl Import {
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        match text.strip_suffix(".*") {
            Some(package) => Import::OnDemand(package.to_string()),
            None => Import::Single(text.to_string()),
        }
    }
}

/// Shadowing levels of a compilation unit, highest priority first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImportLevel {
    SingleType,
    SamePackage,
    OnDemand,
    /// [`GROOVY_DEFAULT_IMPORTS`], consulted after every explicit import.
    Default,
}

impl ImportLevel {
    pub const ALL: [ImportLevel; 4] = [
        ImportLevel::SingleType,
        ImportLevel::SamePackage,
        ImportLevel::OnDemand,
        ImportLevel::Default,
    ];
}

/// The import scope of a single compilation unit.
pub struct ImportScope<'env> {
    env: &'env dyn TypeEnv,
    package: Option<String>,
    imports: Vec<Import>,
    default_imports: Vec<Import>,
}

impl<'env> ImportScope<'env> {
    /// A scope in the unnamed package with the Groovy default imports.
    pub fn new(env: &'env dyn TypeEnv) -> Self {
        Self {
            env,
            package: None,
            imports: Vec::new(),
            default_imports: GROOVY_DEFAULT_IMPORTS
                .iter()
                .map(|text| Import::parse(text))
                .collect(),
        }
    }

    #[must_use]
    pub fn without_default_imports(mut self) -> Self {
        self.default_imports.clear();
        self
    }

    #[must_use]
    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        let package = package.into();
        self.package = (!package.is_empty()).then_some(package);
        self
    }

    #[must_use]
    pub fn with_import(mut self, text: &str) -> Self {
        self.imports.push(Import::parse(text));
        self
    }

    pub fn package(&self) -> Option<&str> {
        self.package.as_deref()
    }

    pub fn imports(&self) -> &[Import] {
        &self.imports
    }

    /// Walk every level in shadowing order. Returns `false` if the processor stopped
    /// the walk.
    pub fn process_declarations(&self, processor: &mut dyn ScopeProcessor) -> bool {
        ImportLevel::ALL
            .into_iter()
            .all(|level| self.process_level(level, processor))
    }

    pub fn process_level(&self, level: ImportLevel, processor: &mut dyn ScopeProcessor) -> bool {
        for id in self.env.classes() {
            let Some(class) = self.env.class(id) else {
                continue;
            };
            let binary_name = class.name.as_str();
            let visible = match level {
                ImportLevel::SingleType => imports_class(&self.imports, binary_name),
                ImportLevel::SamePackage => {
                    is_top_level(binary_name) && package_of(binary_name) == self.package()
                }
                ImportLevel::OnDemand => imports_package_of(&self.imports, binary_name),
                ImportLevel::Default => {
                    imports_class(&self.default_imports, binary_name)
                        || imports_package_of(&self.default_imports, binary_name)
                }
            };
            if !visible {
                continue;
            }
            let decl = ScopeDeclaration {
                class: id,
                name: simple_name(binary_name),
                binary_name,
                type_param_count: class.type_params.len(),
            };
            if !processor.execute(&decl) {
                return false;
            }
        }
        true
    }

    fn lookup_simple(&self, name: &str, generic_arity: usize) -> Vec<ClassId> {
        for level in ImportLevel::ALL {
            let mut processor = NameHintProcessor::new(ClassCollector::new(name, generic_arity));
            self.process_level(level, &mut processor);
            let found = processor.into_inner().into_found();
            if !found.is_empty() {
                return found;
            }
        }
        Vec::new()
    }

    fn lookup_qualified(&self, name: &str, generic_arity: usize) -> Vec<ClassId> {
        // `java.util.Map`, or `java.util.Map.Entry` spelled with dots.
        let segments: Vec<&str> = name.split('.').collect();
        for split in (1..=segments.len()).rev() {
            let mut binary = segments[..split].join(".");
            for nested in &segments[split..] {
                binary.push('$');
                binary.push_str(nested);
            }
            if let Some(id) = self.env.lookup_class(&binary) {
                return self.filter_arity(vec![id], generic_arity);
            }
        }

        // `Outer.Inner` where `Outer` is itself resolved through the scope.
        let (first, rest) = match name.split_once('.') {
            Some(parts) => parts,
            None => return Vec::new(),
        };
        let mut out = Vec::new();
        for outer in self.lookup_simple(first, 0) {
            let Some(outer_def) = self.env.class(outer) else {
                continue;
            };
            let binary = format!("{}${}", outer_def.name, rest.replace('.', "$"));
            if let Some(id) = self.env.lookup_class(&binary) {
                out.push(id);
            }
        }
        self.filter_arity(out, generic_arity)
    }

    fn filter_arity(&self, ids: Vec<ClassId>, generic_arity: usize) -> Vec<ClassId> {
        if generic_arity == 0 {
            return ids;
        }
        ids.into_iter()
            .filter(|id| {
                self.env
                    .class(*id)
                    .is_some_and(|class| class.type_params.len() == generic_arity)
            })
            .collect()
    }
}

impl SymbolTable for ImportScope<'_> {
    fn lookup_type(&self, name: &str, generic_arity: usize) -> Vec<ResolvedType> {
        let ids = if name.contains('.') {
            self.lookup_qualified(name, generic_arity)
        } else {
            self.lookup_simple(name, generic_arity)
        };
        tracing::trace!(
            target: "quill.resolve",
            name,
            generic_arity,
            candidates = ids.len(),
            "looked up type name"
        );
        ids.into_iter().map(ResolvedType::new).collect()
    }
}

/// A single-type import naming `binary_name` (nested classes spelled with dots).
fn imports_class(imports: &[Import], binary_name: &str) -> bool {
    let dotted = binary_name.replace('$', ".");
    imports
        .iter()
        .any(|import| matches!(import, Import::Single(name) if *name == dotted))
}

/// A star import of the package of top-level class `binary_name`.
fn imports_package_of(imports: &[Import], binary_name: &str) -> bool {
    is_top_level(binary_name)
        && imports.iter().any(|import| {
            matches!(import, Import::OnDemand(package) if package_of(binary_name) == Some(package.as_str()))
        })
}

fn package_of(binary_name: &str) -> Option<&str> {
    binary_name.rsplit_once('.').map(|(package, _)| package)
}

fn is_top_level(binary_name: &str) -> bool {
    !binary_name.contains('$')
}
