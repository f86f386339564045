//! Declaration model: the interface surface of one compilation unit, as handed
//! over by the upstream analyzer.
//!
//! Everything here is immutable input. The only behavior is [`Module::validate`],
//! which rejects shapes the synthesizers cannot express correctly.
use indexmap::IndexSet;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::DeclarationError;

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// C++ keywords and alternative tokens. Names emitted verbatim as a C++ symbol,
/// member or type must avoid these.
const RESERVED: &[&str] = &[
    "alignas", "alignof", "and", "and_eq", "asm", "auto", "bitand", "bitor", "bool", "break",
    "case", "catch", "char", "char8_t", "char16_t", "char32_t", "class", "co_await", "co_return",
    "co_yield", "compl", "concept", "const", "const_cast", "consteval", "constexpr", "constinit",
    "continue", "decltype", "default", "delete", "do", "double", "dynamic_cast", "else", "enum",
    "explicit", "export", "extern", "false", "float", "for", "friend", "goto", "if", "inline",
    "int", "long", "mutable", "namespace", "new", "noexcept", "not", "not_eq", "nullptr",
    "operator", "or", "or_eq", "private", "protected", "public", "register", "reinterpret_cast",
    "requires", "return", "short", "signed", "sizeof", "static", "static_assert", "static_cast",
    "struct", "switch", "template", "this", "thread_local", "throw", "true", "try", "typedef",
    "typeid", "typename", "union", "unsigned", "using", "virtual", "void", "volatile", "wchar_t",
    "while", "xor", "xor_eq",
];

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterType {
    Void,
    Boolean,
    Int32,
    Int64,
    Double,
    String,
    Object,
    Any,
    Function,
    /// A type that is its own conversion operator.
    Interface(String),
    Sequence(Box<ParameterType>),
}

/// Return types add two bespoke handles to the generic value types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnType {
    /// An asynchronous result handle that converts itself.
    Promise,
    /// An owning handle to a native instance of the named interface.
    Instance(String),
    #[serde(untagged)]
    Value(ParameterType),
}

impl Default for ReturnType {
    fn default() -> Self {
        ReturnType::Value(ParameterType::Void)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argument {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: ParameterType,
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDeclaration {
    pub name: String,
    #[serde(default)]
    pub args: Vec<Argument>,
    #[serde(default, rename = "return_type")]
    pub returns: ReturnType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDeclaration {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: ParameterType,
    #[serde(default)]
    pub readonly: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDecl {
    pub constructor: FunctionDeclaration,
    #[serde(default)]
    pub properties: Vec<PropertyDeclaration>,
    #[serde(default)]
    pub methods: Vec<FunctionDeclaration>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Member {
    Function(FunctionDeclaration),
    Class(ClassDecl),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub id: String,
    pub backing_type_name: String,
    /// Include path (without extension) of the native implementation header.
    #[serde(default)]
    pub implement: Option<String>,
    #[serde(default)]
    pub members: Vec<Member>,
}

/// What the analyzer writes: a single module or a batch of them.
#[derive(Debug, Clone)]
pub enum ModuleSet {
    Many(Vec<Module>),
    One(Module),
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl ModuleSet {
    pub fn into_vec(self) -> Vec<Module> {
        match self {
            ModuleSet::One(m) => vec![m],
            ModuleSet::Many(ms) => ms,
        }
    }
}

impl FunctionDeclaration {
    pub fn required_count(&self) -> usize {
        self.args.iter().filter(|a| a.required).count()
    }
}

impl Module {
    pub fn functions(&self) -> impl Iterator<Item = &FunctionDeclaration> {
        self.members.iter().filter_map(|m| match m {
            Member::Function(f) => Some(f),
            Member::Class(_) => None,
        })
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassDecl> {
        self.members.iter().filter_map(|m| match m {
            Member::Class(c) => Some(c),
            Member::Function(_) => None,
        })
    }

    /// The module's single class, if any. Call after [`Module::validate`].
    pub fn class(&self) -> Option<&ClassDecl> {
        self.classes().next()
    }

    pub fn implement_path(&self) -> String {
        self.implement.clone().unwrap_or_else(|| format!("core/{}", self.id))
    }

    /// Reject declarations the synthesizers would silently mis-generate.
    pub fn validate(&self) -> Result<(), DeclarationError> {
        check_identifier(&self.id)?;
        check_symbol(&self.backing_type_name)?;

        let class_count = self.classes().count();
        if class_count > 1 {
            return Err(DeclarationError::MultipleClasses {
                module: self.id.clone(),
                count: class_count,
            });
        }

        let mut symbols = Names::new(format!("module '{}'", self.id));
        for f in self.functions() {
            validate_function(f)?;
            symbols.insert(&f.name)?;
        }

        if let Some(class) = self.class() {
            validate_arguments(&class.constructor)?;
            check_return_type(&class.constructor.returns)?;

            let mut props = Names::new(format!("properties of '{}'", self.backing_type_name));
            for p in &class.properties {
                check_symbol(&p.name)?;
                if p.ty == ParameterType::Void {
                    return Err(DeclarationError::VoidProperty { property: p.name.clone() });
                }
                check_parameter_type(&p.ty)?;
                props.insert(&p.name)?;
                symbols.insert(&format!("{}AttributeGetCallback", p.name))?;
                if !p.readonly {
                    symbols.insert(&format!("{}AttributeSetCallback", p.name))?;
                }
            }

            let mut methods = Names::new(format!("methods of '{}'", self.backing_type_name));
            for m in &class.methods {
                validate_function(m)?;
                methods.insert(&m.name)?;
                symbols.insert(&m.name)?;
            }
        }
        Ok(())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

struct Names {
    scope: String,
    seen: IndexSet<String>,
}

impl Names {
    fn new(scope: String) -> Self {
        Self { scope, seen: IndexSet::new() }
    }
    fn insert(&mut self, name: &str) -> Result<(), DeclarationError> {
        if !self.seen.insert(name.to_string()) {
            return Err(DeclarationError::DuplicateName {
                scope: self.scope.clone(),
                name: name.to_string(),
            });
        }
        Ok(())
    }
}

fn validate_function(f: &FunctionDeclaration) -> Result<(), DeclarationError> {
    check_symbol(&f.name)?;
    validate_arguments(f)?;
    check_return_type(&f.returns)
}

fn validate_arguments(f: &FunctionDeclaration) -> Result<(), DeclarationError> {
    let mut names = Names::new(format!("arguments of '{}'", f.name));
    let mut seen_optional = false;
    for arg in &f.args {
        check_identifier(&arg.name)?;
        names.insert(&arg.name)?;
        if arg.ty == ParameterType::Void {
            return Err(DeclarationError::VoidArgument {
                function: f.name.clone(),
                argument: arg.name.clone(),
            });
        }
        check_parameter_type(&arg.ty)?;
        if arg.required && seen_optional {
            return Err(DeclarationError::RequiredAfterOptional {
                function: f.name.clone(),
                argument: arg.name.clone(),
            });
        }
        seen_optional |= !arg.required;
    }
    Ok(())
}

fn check_return_type(ty: &ReturnType) -> Result<(), DeclarationError> {
    match ty {
        ReturnType::Promise => Ok(()),
        ReturnType::Instance(name) => check_symbol(name),
        ReturnType::Value(ty) => check_parameter_type(ty),
    }
}

fn check_parameter_type(ty: &ParameterType) -> Result<(), DeclarationError> {
    match ty {
        ParameterType::Interface(name) => check_symbol(name),
        ParameterType::Sequence(inner) => check_parameter_type(inner),
        _ => Ok(()),
    }
}

fn check_identifier(name: &str) -> Result<(), DeclarationError> {
    if IDENTIFIER.is_match(name) {
        Ok(())
    } else {
        Err(DeclarationError::InvalidIdentifier { name: name.to_string() })
    }
}

/// Argument names only appear behind an `args_` prefix; everything else is
/// spelled out as-is.
fn check_symbol(name: &str) -> Result<(), DeclarationError> {
    check_identifier(name)?;
    if RESERVED.contains(&name) {
        return Err(DeclarationError::InvalidIdentifier { name: name.to_string() });
    }
    Ok(())
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
