//! Dispatch evaluator: runs a [`CallBody`] the way the emitted glue runs it,
//! against a caller-supplied conversion hook instead of a script engine.
use crate::error::CallError;
use crate::ir::{CallBody, Conversion};

/// The native call that fired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub point: usize,               // index into `CallBody::dispatch`
    pub arguments: Vec<String>,     // names handed to the native member
    pub converted_slots: Vec<usize>, // argv slots converted, in order
}

/// Evaluate `body` for a call with `argc` arguments. `convert` returns
/// `false` when the value in a slot cannot be converted.
pub fn evaluate<F>(body: &CallBody, argc: usize, mut convert: F) -> Result<Invocation, CallError>
where
    F: FnMut(&Conversion) -> bool,
{
    let required = body.required_count();
    if argc < required {
        return Err(CallError::Arity {
            name: body.name.clone(),
            required,
            actual: argc,
        });
    }

    let mut converted_slots = Vec::with_capacity(body.declared_argc);
    let mut attempt = |conversion: &Conversion| {
        if convert(conversion) {
            converted_slots.push(conversion.slot);
            Ok(())
        } else {
            Err(CallError::Conversion {
                argument: conversion.argument.clone(),
                target: conversion.converter.to_string(),
            })
        }
    };

    for conversion in &body.required {
        attempt(conversion)?;
    }
    let mut fired = None;
    for (index, point) in body.dispatch.iter().enumerate() {
        if let Some(conversion) = &point.conversion {
            attempt(conversion)?;
        }
        if point.max_argc.is_none_or(|max| argc <= max) {
            fired = Some((index, point.arguments.clone()));
            break;
        }
    }

    match fired {
        Some((point, arguments)) => Ok(Invocation { point, arguments, converted_slots }),
        // lowering always ends the chain with a catch-all
        None => Err(CallError::Arity {
            name: body.name.clone(),
            required: body.declared_argc,
            actual: argc,
        }),
    }
}

/// Which point fires for every argument count from `R` through one past the
/// declared slots, assuming every conversion succeeds.
pub fn dispatch_table(body: &CallBody) -> Vec<(usize, Invocation)> {
    (body.required_count()..=body.declared_argc + 1)
        .filter_map(|argc| evaluate(body, argc, |_| true).ok().map(|inv| (argc, inv)))
        .collect()
}
