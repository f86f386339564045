// Strongly-typed glue IR. Synthesizers produce it, codegen renders it, the
// evaluator runs it. No text lives here except identifiers.

use crate::types::Converter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallMode {
    Free,        // static on the backing type, receives the execution context
    Method,      // on the instance recovered from `this_val`
    Constructor, // `Create` on the backing type
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    pub slot: usize,          // argv index
    pub argument: String,     // declared argument name
    pub converter: Converter, // Optional<..> for trailing optionals
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchPoint {
    pub conversion: Option<Conversion>, // optional converted right before this point
    pub max_argc: Option<usize>,        // fires when argc <= max_argc; None = always
    pub arguments: Vec<String>,         // declared names passed to the native call
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultKind {
    Void,
    Promise,                // ScriptPromise, converts itself
    Instance(String),       // owning pointer to a native instance, starts null
    Converted(Converter),   // Converter<T>::ImplType, converted back through T
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallBody {
    pub name: String,               // declared name, used in arity errors
    pub native: String,             // native member to invoke
    pub owner: String,              // native backing class
    pub mode: CallMode,
    pub declared_argc: usize,       // every declared slot, required or not
    pub required: Vec<Conversion>,  // contiguous prefix, slots 0..R
    pub dispatch: Vec<DispatchPoint>, // never empty; last point is the catch-all
    pub result: ResultKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Getter {
    pub symbol: String,
    pub native: String,
    pub converter: Converter,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Setter {
    pub symbol: String,
    pub native: String,
    pub converter: Converter,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accessor {
    pub property: String,
    pub owner: String,
    pub getter: Getter,
    pub setter: Option<Setter>,   // None for readonly
}

/// A callback definition in the emitted unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Callback {
    pub symbol: String,
    pub body: CallBody,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionEntry {
    pub name: String,
    pub callback: String,
    pub argc: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeEntry {
    pub name: String,
    pub getter: String,
    pub setter: Option<String>, // rendered as nullptr
}

/// Registration tables. `class` is present iff the module declares a class.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tables {
    pub global_functions: Vec<FunctionEntry>,
    pub class: Option<ClassTables>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassTables {
    pub constructor_name: String,
    pub prototype_methods: Vec<FunctionEntry>,
    pub prototype_properties: Vec<AttributeEntry>,
}

/// Everything one module turns into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    pub id: String,
    pub class_name: String,
    pub implement: String,
    pub functions: Vec<Callback>,
    pub constructor: Option<Callback>,
    pub accessors: Vec<Accessor>,
    pub methods: Vec<Callback>,
    pub tables: Tables,
}

impl CallBody {
    pub fn required_count(&self) -> usize {
        self.required.len()
    }
}
