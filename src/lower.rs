//! Call-body synthesis: one declaration → an arity-gated dispatch chain.
//!
//! A variable-arity engine call becomes a linear chain of invocation points,
//! one per supplied-argument count from `R` (required count) up to every
//! declared slot. Each point converts exactly one more trailing optional
//! before deciding whether it is the call for this `argc`. Absent optionals
//! are never converted.
//!
//! The last point has no threshold: surplus arguments past the declared slots
//! are ignored and the full-arity call fires.
use crate::ir::{CallBody, CallMode, Conversion, DispatchPoint, ResultKind};
use crate::model::{FunctionDeclaration, ParameterType, ReturnType};
use crate::types::{map_optional, map_type};

/// Lower a validated declaration. `owner` is the native backing class.
pub fn lower_call_body(decl: &FunctionDeclaration, owner: &str, mode: CallMode) -> CallBody {
    let required_count = decl.args.iter().take_while(|a| a.required).count();
    let (required_args, optional_args) = decl.args.split_at(required_count);

    let required: Vec<Conversion> = required_args
        .iter()
        .enumerate()
        .map(|(slot, arg)| Conversion {
            slot,
            argument: arg.name.clone(),
            converter: map_type(&arg.ty),
        })
        .collect();

    let mut arguments: Vec<String> = required_args.iter().map(|a| a.name.clone()).collect();
    let mut dispatch = Vec::with_capacity(optional_args.len() + 1);
    dispatch.push(DispatchPoint {
        conversion: None,
        max_argc: (!optional_args.is_empty()).then_some(required_count),
        arguments: arguments.clone(),
    });

    for (offset, arg) in optional_args.iter().enumerate() {
        let slot = required_count + offset;
        let is_last = offset + 1 == optional_args.len();
        arguments.push(arg.name.clone());
        dispatch.push(DispatchPoint {
            conversion: Some(Conversion {
                slot,
                argument: arg.name.clone(),
                converter: map_optional(&arg.ty),
            }),
            max_argc: (!is_last).then_some(slot + 1),
            arguments: arguments.clone(),
        });
    }

    CallBody {
        name: decl.name.clone(),
        native: native_member(decl, mode),
        owner: owner.to_string(),
        mode,
        declared_argc: decl.args.len(),
        required,
        dispatch,
        result: result_kind(&decl.returns, owner, mode),
    }
}

fn native_member(decl: &FunctionDeclaration, mode: CallMode) -> String {
    if mode == CallMode::Constructor || decl.name == "constructor" {
        "Create".to_string()
    } else {
        decl.name.clone()
    }
}

fn result_kind(returns: &ReturnType, owner: &str, mode: CallMode) -> ResultKind {
    if mode == CallMode::Constructor {
        return ResultKind::Instance(owner.to_string());
    }
    match returns {
        ReturnType::Value(ParameterType::Void) => ResultKind::Void,
        ReturnType::Promise => ResultKind::Promise,
        ReturnType::Instance(name) => ResultKind::Instance(name.clone()),
        ReturnType::Value(ty) => ResultKind::Converted(map_type(ty)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Argument;
    use crate::types::Converter;

    fn arg(name: &str, ty: ParameterType, required: bool) -> Argument {
        Argument { name: name.into(), ty, required }
    }

    fn decl(name: &str, args: Vec<Argument>, returns: ReturnType) -> FunctionDeclaration {
        FunctionDeclaration { name: name.into(), args, returns }
    }

    #[test]
    fn draw_builds_two_points() {
        let d = decl(
            "draw",
            vec![arg("x", ParameterType::Int32, true), arg("label", ParameterType::String, false)],
            ReturnType::default(),
        );
        let body = lower_call_body(&d, "Canvas", CallMode::Free);

        assert_eq!(body.required_count(), 1);
        assert_eq!(body.required[0].slot, 0);
        assert_eq!(body.required[0].converter, Converter::Int32);
        assert_eq!(body.dispatch.len(), 2);

        let minimal = &body.dispatch[0];
        assert_eq!(minimal.conversion, None);
        assert_eq!(minimal.max_argc, Some(1));
        assert_eq!(minimal.arguments, vec!["x"]);

        let full = &body.dispatch[1];
        let conversion = full.conversion.as_ref().unwrap();
        assert_eq!(conversion.slot, 1);
        assert_eq!(conversion.converter.to_string(), "IDLOptional<IDLDOMString>");
        assert_eq!(full.max_argc, None, "last point is the catch-all");
        assert_eq!(full.arguments, vec!["x", "label"]);
        assert_eq!(body.result, ResultKind::Void);
    }

    #[test]
    fn thresholds_climb_one_slot_at_a_time() {
        let d = decl(
            "fill",
            vec![
                arg("a", ParameterType::Double, true),
                arg("b", ParameterType::Double, true),
                arg("c", ParameterType::Double, false),
                arg("d", ParameterType::Double, false),
                arg("e", ParameterType::Double, false),
            ],
            ReturnType::Value(ParameterType::Boolean),
        );
        let body = lower_call_body(&d, "Canvas", CallMode::Method);
        let thresholds: Vec<_> = body.dispatch.iter().map(|p| p.max_argc).collect();
        assert_eq!(thresholds, vec![Some(2), Some(3), Some(4), None]);
        let slots: Vec<_> = body
            .dispatch
            .iter()
            .filter_map(|p| p.conversion.as_ref().map(|c| c.slot))
            .collect();
        assert_eq!(slots, vec![2, 3, 4]);
        assert_eq!(body.dispatch[2].arguments, vec!["a", "b", "c", "d"]);
        assert_eq!(body.result, ResultKind::Converted(Converter::Boolean));
    }

    #[test]
    fn no_optionals_means_one_unconditional_point() {
        let d = decl("ping", vec![arg("n", ParameterType::Int64, true)], ReturnType::Promise);
        let body = lower_call_body(&d, "Net", CallMode::Free);
        assert_eq!(body.dispatch.len(), 1);
        assert_eq!(body.dispatch[0].max_argc, None);
        assert_eq!(body.result, ResultKind::Promise);
    }

    #[test]
    fn all_optional_starts_at_zero() {
        let d = decl(
            "log",
            vec![arg("message", ParameterType::Any, false)],
            ReturnType::default(),
        );
        let body = lower_call_body(&d, "Console", CallMode::Free);
        assert!(body.required.is_empty());
        assert_eq!(body.dispatch[0].max_argc, Some(0));
        assert!(body.dispatch[0].arguments.is_empty());
        assert_eq!(body.dispatch[1].conversion.as_ref().unwrap().slot, 0);
    }

    #[test]
    fn constructor_always_returns_an_owner_instance() {
        let d = decl("constructor", vec![], ReturnType::default());
        let body = lower_call_body(&d, "Blob", CallMode::Constructor);
        assert_eq!(body.native, "Create");
        assert_eq!(body.result, ResultKind::Instance("Blob".into()));
    }

    #[test]
    fn instance_return_is_bespoke() {
        let d = decl("slice", vec![], ReturnType::Instance("Blob".into()));
        let body = lower_call_body(&d, "Blob", CallMode::Method);
        assert_eq!(body.result, ResultKind::Instance("Blob".into()));

        let d = decl("peer", vec![], ReturnType::Value(ParameterType::Interface("Blob".into())));
        let body = lower_call_body(&d, "Blob", CallMode::Method);
        assert_eq!(body.result, ResultKind::Converted(Converter::Interface("Blob".into())));
    }
}
