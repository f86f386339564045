//! Type mapping: abstract parameter kinds → native conversion operators.
//!
//! Total and stateless. The rendered form of a [`Converter`] is the template
//! argument handed to the native `Converter<...>` machinery.
use std::fmt;

use crate::model::ParameterType;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Converter {
    Boolean,
    Int32,
    Int64,
    Double,
    DomString,
    Object,
    Any,
    Callback,
    Sequence(Box<Converter>),
    /// An interface type named by the declaration converts itself.
    Interface(String),
    /// Absent or `undefined` input yields "not supplied" instead of an error.
    Optional(Box<Converter>),
}

pub fn map_type(ty: &ParameterType) -> Converter {
    match ty {
        ParameterType::Boolean => Converter::Boolean,
        ParameterType::Int32 => Converter::Int32,
        ParameterType::Int64 => Converter::Int64,
        ParameterType::Double => Converter::Double,
        ParameterType::String => Converter::DomString,
        ParameterType::Object => Converter::Object,
        ParameterType::Function => Converter::Callback,
        ParameterType::Interface(name) => Converter::Interface(name.clone()),
        ParameterType::Sequence(inner) => Converter::Sequence(Box::new(map_type(inner))),
        // void only makes sense as a return kind; as a value it carries anything
        ParameterType::Void | ParameterType::Any => Converter::Any,
    }
}

/// Mapping used for trailing optional arguments.
pub fn map_optional(ty: &ParameterType) -> Converter {
    Converter::Optional(Box::new(map_type(ty)))
}

impl fmt::Display for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Converter::Boolean => f.write_str("IDLBoolean"),
            Converter::Int32 => f.write_str("IDLInt32"),
            Converter::Int64 => f.write_str("IDLInt64"),
            Converter::Double => f.write_str("IDLDouble"),
            Converter::DomString => f.write_str("IDLDOMString"),
            Converter::Object => f.write_str("IDLObject"),
            Converter::Any => f.write_str("IDLAny"),
            Converter::Callback => f.write_str("IDLCallback"),
            Converter::Sequence(inner) => write!(f, "IDLSequence<{inner}>"),
            Converter::Interface(name) => f.write_str(name),
            Converter::Optional(inner) => write!(f, "IDLOptional<{inner}>"),
        }
    }
}
