//! Property accessors: a getter always, a setter unless the property is readonly.
use crate::ir::{Accessor, Getter, Setter};
use crate::model::PropertyDeclaration;
use crate::names;
use crate::types::map_type;

pub fn lower_accessor(prop: &PropertyDeclaration, owner: &str) -> Accessor {
    let converter = map_type(&prop.ty);
    let setter = (!prop.readonly).then(|| Setter {
        symbol: names::setter_symbol(&prop.name),
        native: names::native_setter(&prop.name),
        converter: converter.clone(),
    });
    Accessor {
        property: prop.name.clone(),
        owner: owner.to_string(),
        getter: Getter {
            symbol: names::getter_symbol(&prop.name),
            native: prop.name.clone(),
            converter,
        },
        setter,
    }
}
