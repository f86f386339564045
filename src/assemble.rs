//! Module assembly: synthesize every member, then fold the per-member pieces
//! into one [`Unit`] with its registration tables.
//!
//! Each member produces a self-contained [`Part`]; parts never see each other.
//! The fold is the only place tables grow.
use crate::accessor::lower_accessor;
use crate::error::DeclarationError;
use crate::ir::{
    Accessor, AttributeEntry, CallMode, Callback, ClassTables, FunctionEntry, Tables, Unit,
};
use crate::lower::lower_call_body;
use crate::model::{ClassDecl, FunctionDeclaration, Member, Module};

/// Output of synthesizing one member.
#[derive(Debug, Default)]
struct Part {
    functions: Vec<Callback>,
    global_entries: Vec<FunctionEntry>,
    class: Option<ClassPart>,
}

#[derive(Debug)]
struct ClassPart {
    constructor: Callback,
    accessors: Vec<Accessor>,
    methods: Vec<Callback>,
    method_entries: Vec<FunctionEntry>,
    property_entries: Vec<AttributeEntry>,
}

pub fn assemble(module: &Module) -> Result<Unit, DeclarationError> {
    module.validate()?;
    let owner = module.backing_type_name.as_str();

    let unit = Unit {
        id: module.id.clone(),
        class_name: owner.to_string(),
        implement: module.implement_path(),
        functions: Vec::new(),
        constructor: None,
        accessors: Vec::new(),
        methods: Vec::new(),
        tables: Tables::default(),
    };

    Ok(module
        .members
        .iter()
        .map(|member| synthesize(member, owner))
        .fold(unit, merge))
}

fn synthesize(member: &Member, owner: &str) -> Part {
    match member {
        Member::Function(f) => Part {
            functions: vec![Callback {
                symbol: f.name.clone(),
                body: lower_call_body(f, owner, CallMode::Free),
            }],
            global_entries: vec![entry(f)],
            class: None,
        },
        Member::Class(class) => Part {
            class: Some(synthesize_class(class, owner)),
            ..Part::default()
        },
    }
}

fn synthesize_class(class: &ClassDecl, owner: &str) -> ClassPart {
    let accessors: Vec<Accessor> = class
        .properties
        .iter()
        .map(|p| lower_accessor(p, owner))
        .collect();
    let property_entries = accessors
        .iter()
        .map(|a| AttributeEntry {
            name: a.property.clone(),
            getter: a.getter.symbol.clone(),
            setter: a.setter.as_ref().map(|s| s.symbol.clone()),
        })
        .collect();

    ClassPart {
        constructor: Callback {
            symbol: "ConstructorCallback".to_string(),
            body: lower_call_body(&class.constructor, owner, CallMode::Constructor),
        },
        accessors,
        methods: class
            .methods
            .iter()
            .map(|m| Callback {
                symbol: m.name.clone(),
                body: lower_call_body(m, owner, CallMode::Method),
            })
            .collect(),
        method_entries: class.methods.iter().map(entry).collect(),
        property_entries,
    }
}

fn entry(f: &FunctionDeclaration) -> FunctionEntry {
    FunctionEntry {
        name: f.name.clone(),
        callback: f.name.clone(),
        argc: f.args.len(),
    }
}

fn merge(mut unit: Unit, part: Part) -> Unit {
    unit.functions.extend(part.functions);
    unit.tables.global_functions.extend(part.global_entries);
    if let Some(class) = part.class {
        // validate() guarantees this runs at most once
        unit.constructor = Some(class.constructor);
        unit.accessors = class.accessors;
        unit.methods = class.methods;
        unit.tables.class = Some(ClassTables {
            constructor_name: unit.class_name.clone(),
            prototype_methods: class.method_entries,
            prototype_properties: class.property_entries,
        });
    }
    unit
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn module(value: serde_json::Value) -> Module {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn functions_only_module_has_no_class_tables() {
        let m = module(json!({
            "id": "console", "backing_type_name": "Console",
            "members": [
                {"kind": "function", "name": "log", "args": [{"name": "message", "type": "any", "required": false}]},
                {"kind": "function", "name": "clear"}
            ]
        }));
        let unit = assemble(&m).unwrap();
        assert_eq!(unit.tables.global_functions.len(), 2);
        assert_eq!(unit.tables.global_functions[0].argc, 1);
        assert_eq!(unit.tables.global_functions[1].argc, 0);
        assert!(unit.tables.class.is_none());
        assert!(unit.constructor.is_none());
        assert!(unit.methods.is_empty());
    }

    #[test]
    fn class_module_fills_all_four_tables() {
        let m = module(json!({
            "id": "blob", "backing_type_name": "Blob",
            "members": [
                {"kind": "function", "name": "createBlob"},
                {
                    "kind": "class",
                    "constructor": {"name": "constructor", "args": [
                        {"name": "parts", "type": {"sequence": "any"}},
                        {"name": "options", "type": "object", "required": false}
                    ]},
                    "properties": [{"name": "size", "type": "int64", "readonly": true}],
                    "methods": [
                        {"name": "slice", "args": [{"name": "start", "type": "int64", "required": false}], "return_type": {"instance": "Blob"}},
                        {"name": "text", "return_type": "promise"}
                    ]
                }
            ]
        }));
        let unit = assemble(&m).unwrap();

        assert_eq!(unit.tables.global_functions.len(), 1);
        let class = unit.tables.class.as_ref().expect("class tables");
        assert_eq!(class.constructor_name, "Blob");
        assert_eq!(class.prototype_methods.len(), 2);
        assert_eq!(class.prototype_methods[0].argc, 1);
        assert_eq!(class.prototype_properties.len(), 1);
        assert_eq!(class.prototype_properties[0].getter, "sizeAttributeGetCallback");
        assert_eq!(class.prototype_properties[0].setter, None);

        let ctor = unit.constructor.as_ref().unwrap();
        assert_eq!(ctor.body.required_count(), 1);
        assert_eq!(ctor.body.dispatch.len(), 2);
        assert_eq!(unit.methods.len(), 2);
        assert_eq!(unit.accessors.len(), 1);
    }

    #[test]
    fn invalid_modules_are_rejected_before_synthesis() {
        let class = json!({"kind": "class", "constructor": {"name": "constructor"}});
        let m = module(json!({"id": "m", "backing_type_name": "M", "members": [class.clone(), class]}));
        assert!(matches!(assemble(&m), Err(DeclarationError::MultipleClasses { count: 2, .. })));
    }

    #[test]
    fn member_order_is_preserved() {
        let m = module(json!({
            "id": "m", "backing_type_name": "M",
            "members": [
                {"kind": "function", "name": "b"},
                {"kind": "function", "name": "a"},
                {"kind": "function", "name": "c"}
            ]
        }));
        let unit = assemble(&m).unwrap();
        let names: Vec<_> = unit.functions.iter().map(|c| c.symbol.as_str()).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }
}
