//! Text emission: renders a [`Unit`] into the QuickJS binding source and its
//! header. All decisions were made during lowering; this module only spells
//! them out.
use crate::config::Options;
use crate::ir::{
    Accessor, AttributeEntry, CallBody, CallMode, Callback, ClassTables, Conversion,
    DispatchPoint, FunctionEntry, ResultKind, Unit,
};
use crate::names;

const EXCEPTION_CHECK: [&str; 3] = [
    "if (exception_state.HasException()) {",
    "  return exception_state.ToQuickJS();",
    "}",
];

pub struct Codegen<'a> {
    opts: &'a Options,
    out: String,
}

impl<'a> Codegen<'a> {
    pub fn new(opts: &'a Options) -> Self {
        Self { opts, out: String::new() }
    }

    pub fn into_string(self) -> String {
        self.out
    }

    // ————————————————————————————————————————————————————————————————————————
    // SOURCE
    // ————————————————————————————————————————————————————————————————————————

    pub fn emit_source(&mut self, unit: &Unit) {
        let wrapper = names::wrapper_name(&unit.class_name);

        self.copyright();
        self.line(0, format!("#include \"{}.h\"", names::file_stem(&unit.id)));
        for include in [
            "bindings/qjs/member_installer.h",
            "bindings/qjs/qjs_function.h",
            "bindings/qjs/converter_impl.h",
            "bindings/qjs/script_wrappable.h",
            "bindings/qjs/script_promise.h",
            "core/executing_context.h",
        ] {
            self.line(0, format!("#include \"{include}\""));
        }
        self.line(0, format!("#include \"{}.h\"", unit.implement));
        self.blank();
        self.line(0, format!("namespace {} {{", self.opts.namespace));
        self.blank();

        if unit.tables.class.is_some() {
            self.line(
                0,
                format!(
                    "const WrapperTypeInfo& {}::wrapper_type_info_ = {wrapper}::m_wrapperTypeInfo;",
                    unit.class_name
                ),
            );
            self.blank();
        }

        for callback in &unit.functions {
            self.callback(callback);
        }
        if let Some(constructor) = &unit.constructor {
            self.callback(constructor);
        }
        for accessor in &unit.accessors {
            self.getter(accessor);
        }
        for accessor in &unit.accessors {
            self.setter(accessor);
        }
        for callback in &unit.methods {
            self.callback(callback);
        }

        self.install_entry(&wrapper, unit.tables.class.is_some());
        self.global_installer(&wrapper, &unit.tables.global_functions);
        if let Some(class) = &unit.tables.class {
            self.constructor_installer(&wrapper, class);
            self.prototype_methods_installer(&wrapper, &class.prototype_methods);
            self.prototype_properties_installer(&wrapper, &class.prototype_properties);
        }

        self.line(0, format!("}}  // namespace {}", self.opts.namespace));
    }

    fn callback(&mut self, callback: &Callback) {
        let body = &callback.body;
        match body.mode {
            CallMode::Constructor => self.line(
                0,
                format!(
                    "JSValue {}::{}(JSContext* ctx, JSValue func_obj, JSValue this_val, int argc, JSValue* argv, int flags) {{",
                    names::wrapper_name(&body.owner),
                    callback.symbol
                ),
            ),
            CallMode::Free | CallMode::Method => self.line(
                0,
                format!(
                    "static JSValue {}(JSContext* ctx, JSValueConst this_val, int argc, JSValueConst* argv) {{",
                    callback.symbol
                ),
            ),
        }
        self.call_body(body);
        self.line(0, "}");
        self.blank();
    }

    fn call_body(&mut self, body: &CallBody) {
        let required = body.required_count();
        if required > 0 {
            self.line(1, format!("if (argc < {required}) {{"));
            self.line(
                2,
                format!(
                    "return JS_ThrowTypeError(ctx, \"Failed to execute '{}' : {required} argument required, but %d present.\", argc);",
                    body.name
                ),
            );
            self.line(1, "}");
            self.blank();
        }

        self.line(1, "ExceptionState exception_state;");
        if let Some(decl) = result_declaration(&body.result) {
            self.line(1, decl);
        }
        self.line(1, "ExecutingContext* context = ExecutingContext::From(ctx);");
        if body.mode == CallMode::Method {
            self.line(1, format!("auto* self = toScriptWrappable<{}>(this_val);", body.owner));
        }
        self.blank();

        self.line(1, "do {  // Dummy loop for use of 'break'.");
        for conversion in &body.required {
            self.conversion(2, conversion);
        }
        for point in &body.dispatch {
            self.dispatch_point(2, body, point);
        }
        self.line(1, "} while (false);");
        self.blank();

        self.exception_check(1);
        self.line(1, format!("return {};", result_expression(&body.result)));
    }

    fn conversion(&mut self, depth: usize, conversion: &Conversion) {
        self.line(
            depth,
            format!(
                "auto&& args_{} = Converter<{}>::FromValue(ctx, argv[{}], exception_state);",
                conversion.argument, conversion.converter, conversion.slot
            ),
        );
        self.exception_check(depth);
    }

    fn dispatch_point(&mut self, depth: usize, body: &CallBody, point: &DispatchPoint) {
        if let Some(conversion) = &point.conversion {
            self.blank();
            self.conversion(depth, conversion);
        }
        let call = invocation(body, point);
        match point.max_argc {
            Some(max) => {
                self.line(depth, format!("if (argc <= {max}) {{"));
                self.line(depth + 1, call);
                self.line(depth + 1, "break;");
                self.line(depth, "}");
            }
            None => self.line(depth, call),
        }
    }

    fn getter(&mut self, accessor: &Accessor) {
        let getter = &accessor.getter;
        self.line(
            0,
            format!(
                "static JSValue {}(JSContext* ctx, JSValueConst this_val, int argc, JSValueConst* argv) {{",
                getter.symbol
            ),
        );
        self.receiver(accessor);
        self.line(
            1,
            format!("return Converter<{}>::ToValue(ctx, self->{}());", getter.converter, getter.native),
        );
        self.line(0, "}");
        self.blank();
    }

    fn setter(&mut self, accessor: &Accessor) {
        let Some(setter) = &accessor.setter else {
            return;
        };
        self.line(
            0,
            format!(
                "static JSValue {}(JSContext* ctx, JSValueConst this_val, int argc, JSValueConst* argv) {{",
                setter.symbol
            ),
        );
        self.receiver(accessor);
        self.line(1, "ExceptionState exception_state;");
        self.line(
            1,
            format!("auto&& v = Converter<{}>::FromValue(ctx, argv[0], exception_state);", setter.converter),
        );
        self.exception_check(1);
        self.line(1, format!("self->{}(v, exception_state);", setter.native));
        self.exception_check(1);
        self.line(1, "return JS_NULL;");
        self.line(0, "}");
        self.blank();
    }

    fn receiver(&mut self, accessor: &Accessor) {
        self.line(1, format!("auto* self = toScriptWrappable<{}>(this_val);", accessor.owner));
        self.line(1, "assert(self != nullptr);");
    }

    fn install_entry(&mut self, wrapper: &str, has_class: bool) {
        self.line(0, format!("void {wrapper}::Install(ExecutingContext* context) {{"));
        self.line(1, "InstallGlobalFunctions(context);");
        if has_class {
            self.line(1, "InstallConstructor(context);");
            self.line(1, "InstallPrototypeMethods(context);");
            self.line(1, "InstallPrototypeProperties(context);");
        }
        self.line(0, "}");
        self.blank();
    }

    fn global_installer(&mut self, wrapper: &str, entries: &[FunctionEntry]) {
        self.line(0, format!("void {wrapper}::InstallGlobalFunctions(ExecutingContext* context) {{"));
        self.function_config(entries);
        self.blank();
        self.line(1, "MemberInstaller::InstallFunctions(context, context->Global(), functionConfig);");
        self.line(0, "}");
        self.blank();
    }

    fn constructor_installer(&mut self, wrapper: &str, class: &ClassTables) {
        self.line(0, format!("void {wrapper}::InstallConstructor(ExecutingContext* context) {{"));
        self.line(1, "const WrapperTypeInfo* wrapperTypeInfo = GetWrapperTypeInfo();");
        self.line(1, "JSValue constructor = context->contextData()->constructorForType(wrapperTypeInfo);");
        self.blank();
        self.line(1, "std::initializer_list<MemberInstaller::AttributeConfig> attributeConfig {");
        self.line(2, format!("{{\"{}\", nullptr, nullptr, constructor}},", class.constructor_name));
        self.line(1, "};");
        self.line(1, "MemberInstaller::InstallAttributes(context, context->Global(), attributeConfig);");
        self.line(0, "}");
        self.blank();
    }

    fn prototype_methods_installer(&mut self, wrapper: &str, entries: &[FunctionEntry]) {
        self.line(0, format!("void {wrapper}::InstallPrototypeMethods(ExecutingContext* context) {{"));
        self.prototype_lookup();
        self.function_config(entries);
        self.blank();
        self.line(1, "MemberInstaller::InstallFunctions(context, prototype, functionConfig);");
        self.line(0, "}");
        self.blank();
    }

    fn prototype_properties_installer(&mut self, wrapper: &str, entries: &[AttributeEntry]) {
        self.line(0, format!("void {wrapper}::InstallPrototypeProperties(ExecutingContext* context) {{"));
        self.prototype_lookup();
        self.line(1, "std::initializer_list<MemberInstaller::AttributeConfig> attributesConfig {");
        for entry in entries {
            let setter = entry.setter.as_deref().unwrap_or("nullptr");
            self.line(2, format!("{{\"{}\", {}, {setter}}},", entry.name, entry.getter));
        }
        self.line(1, "};");
        self.blank();
        self.line(1, "MemberInstaller::InstallAttributes(context, prototype, attributesConfig);");
        self.line(0, "}");
        self.blank();
    }

    fn prototype_lookup(&mut self) {
        self.line(1, "const WrapperTypeInfo* wrapperTypeInfo = GetWrapperTypeInfo();");
        self.line(1, "JSValue prototype = context->contextData()->prototypeForType(wrapperTypeInfo);");
        self.blank();
    }

    fn function_config(&mut self, entries: &[FunctionEntry]) {
        self.line(1, "std::initializer_list<MemberInstaller::FunctionConfig> functionConfig {");
        for entry in entries {
            self.line(2, format!("{{\"{}\", {}, {}}},", entry.name, entry.callback, entry.argc));
        }
        self.line(1, "};");
    }

    // ————————————————————————————————————————————————————————————————————————
    // HEADER
    // ————————————————————————————————————————————————————————————————————————

    pub fn emit_header(&mut self, unit: &Unit) {
        let wrapper = names::wrapper_name(&unit.class_name);
        let guard = names::header_guard(&self.opts.guard_prefix, &unit.id);
        let has_class = unit.tables.class.is_some();

        self.copyright();
        self.line(0, format!("#ifndef {guard}"));
        self.line(0, format!("#define {guard}"));
        self.blank();
        self.line(0, "#include <quickjs/quickjs.h>");
        self.line(0, "#include \"bindings/qjs/wrapper_type_info.h\"");
        self.blank();
        self.line(0, format!("namespace {} {{", self.opts.namespace));
        self.blank();
        self.line(0, "class ExecutingContext;");
        self.blank();
        self.line(0, format!("class {wrapper} final {{"));
        self.line(0, " public:");
        self.line(1, "static void Install(ExecutingContext* context);");
        if has_class {
            self.blank();
            self.line(1, "static WrapperTypeInfo* GetWrapperTypeInfo() {");
            self.line(2, "return const_cast<WrapperTypeInfo*>(&m_wrapperTypeInfo);");
            self.line(1, "}");
            self.line(
                1,
                "static JSValue ConstructorCallback(JSContext* ctx, JSValue func_obj, JSValue this_val, int argc, JSValue* argv, int flags);",
            );
            self.line(1, "static const WrapperTypeInfo m_wrapperTypeInfo;");
        }
        self.blank();
        self.line(0, " private:");
        self.line(1, "static void InstallGlobalFunctions(ExecutingContext* context);");
        if has_class {
            self.line(1, "static void InstallConstructor(ExecutingContext* context);");
            self.line(1, "static void InstallPrototypeMethods(ExecutingContext* context);");
            self.line(1, "static void InstallPrototypeProperties(ExecutingContext* context);");
        }
        self.line(0, "};");
        self.blank();
        self.line(0, format!("}}  // namespace {}", self.opts.namespace));
        self.blank();
        self.line(0, format!("#endif  // {guard}"));
    }

    // ————————————————————————————————————————————————————————————————————————
    // INTERNAL HELPERS
    // ————————————————————————————————————————————————————————————————————————

    fn copyright(&mut self) {
        let opts = self.opts;
        if opts.copyright.is_empty() {
            return;
        }
        self.line(0, "/*");
        for text in &opts.copyright {
            self.line(0, format!(" * {text}"));
        }
        self.line(0, " */");
        self.blank();
    }

    fn exception_check(&mut self, depth: usize) {
        for text in EXCEPTION_CHECK {
            self.line(depth, text);
        }
    }

    fn line(&mut self, depth: usize, text: impl AsRef<str>) {
        for _ in 0..depth {
            self.out.push_str("  ");
        }
        self.out.push_str(text.as_ref());
        self.out.push('\n');
    }

    fn blank(&mut self) {
        self.out.push('\n');
    }
}

fn invocation(body: &CallBody, point: &DispatchPoint) -> String {
    let mut args: Vec<String> = point.arguments.iter().map(|a| format!("args_{a}")).collect();
    args.push("exception_state".to_string());
    let call = match body.mode {
        CallMode::Method => format!("self->{}({})", body.native, args.join(", ")),
        CallMode::Free | CallMode::Constructor => {
            format!("{}::{}(context, {})", body.owner, body.native, args.join(", "))
        }
    };
    match body.result {
        ResultKind::Void => format!("{call};"),
        _ => format!("return_value = {call};"),
    }
}

fn result_declaration(result: &ResultKind) -> Option<String> {
    match result {
        ResultKind::Void => None,
        ResultKind::Promise => Some("ScriptPromise return_value;".to_string()),
        ResultKind::Instance(name) => Some(format!("{name}* return_value = nullptr;")),
        ResultKind::Converted(converter) => {
            Some(format!("Converter<{converter}>::ImplType return_value;"))
        }
    }
}

fn result_expression(result: &ResultKind) -> String {
    match result {
        ResultKind::Void => "JS_NULL".to_string(),
        ResultKind::Promise => "return_value.ToQuickJS()".to_string(),
        ResultKind::Instance(_) => {
            "return_value == nullptr ? JS_NULL : return_value->ToQuickJS()".to_string()
        }
        ResultKind::Converted(converter) => format!("Converter<{converter}>::ToValue(ctx, return_value)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::assemble;
    use crate::model::Module;
    use serde_json::json;

    fn render(value: serde_json::Value) -> (String, String) {
        let module: Module = serde_json::from_value(value).unwrap();
        let unit = assemble(&module).unwrap();
        let opts = Options::default();
        let mut source = Codegen::new(&opts);
        source.emit_source(&unit);
        let mut header = Codegen::new(&opts);
        header.emit_header(&unit);
        (source.into_string(), header.into_string())
    }

    fn canvas() -> serde_json::Value {
        json!({
            "id": "canvas", "backing_type_name": "Canvas",
            "members": [{
                "kind": "function", "name": "draw",
                "args": [
                    {"name": "x", "type": "int32"},
                    {"name": "label", "type": "string", "required": false}
                ]
            }]
        })
    }

    #[test]
    fn renders_the_draw_chain() {
        let (source, _) = render(canvas());
        let expected = "\
static JSValue draw(JSContext* ctx, JSValueConst this_val, int argc, JSValueConst* argv) {
  if (argc < 1) {
    return JS_ThrowTypeError(ctx, \"Failed to execute 'draw' : 1 argument required, but %d present.\", argc);
  }

  ExceptionState exception_state;
  ExecutingContext* context = ExecutingContext::From(ctx);

  do {  // Dummy loop for use of 'break'.
    auto&& args_x = Converter<IDLInt32>::FromValue(ctx, argv[0], exception_state);
    if (exception_state.HasException()) {
      return exception_state.ToQuickJS();
    }
    if (argc <= 1) {
      Canvas::draw(context, args_x, exception_state);
      break;
    }

    auto&& args_label = Converter<IDLOptional<IDLDOMString>>::FromValue(ctx, argv[1], exception_state);
    if (exception_state.HasException()) {
      return exception_state.ToQuickJS();
    }
    Canvas::draw(context, args_x, args_label, exception_state);
  } while (false);

  if (exception_state.HasException()) {
    return exception_state.ToQuickJS();
  }
  return JS_NULL;
}
";
        assert!(source.contains(expected), "{source}");
    }

    #[test]
    fn functions_only_module_omits_class_installers() {
        let (source, header) = render(canvas());
        assert!(source.contains("{\"draw\", draw, 2},"));
        assert!(source.contains("void QJSCanvas::InstallGlobalFunctions(ExecutingContext* context) {"));
        assert!(!source.contains("InstallConstructor"));
        assert!(!source.contains("InstallPrototypeMethods"));
        assert!(!source.contains("InstallPrototypeProperties"));
        assert!(!source.contains("wrapper_type_info_"));
        assert!(!header.contains("ConstructorCallback"));
        assert!(source.ends_with("}  // namespace kraken\n"));
    }

    #[test]
    fn class_module_renders_every_table() {
        let (source, header) = render(json!({
            "id": "blob", "backing_type_name": "Blob",
            "members": [
                {"kind": "function", "name": "createBlob", "return_type": {"instance": "Blob"}},
                {
                    "kind": "class",
                    "constructor": {"name": "constructor", "args": [
                        {"name": "parts", "type": {"sequence": "any"}},
                        {"name": "options", "type": "object", "required": false}
                    ]},
                    "properties": [
                        {"name": "size", "type": "int64", "readonly": true},
                        {"name": "type", "type": "string"}
                    ],
                    "methods": [{"name": "text", "return_type": "promise"}]
                }
            ]
        }));

        assert!(source.contains("const WrapperTypeInfo& Blob::wrapper_type_info_ = QJSBlob::m_wrapperTypeInfo;"));
        assert!(source.contains(
            "JSValue QJSBlob::ConstructorCallback(JSContext* ctx, JSValue func_obj, JSValue this_val, int argc, JSValue* argv, int flags) {"
        ));
        assert!(source.contains("  Blob* return_value = nullptr;"));
        assert!(source.contains("      return_value = Blob::Create(context, args_parts, exception_state);"));
        assert!(source.contains("    return_value = Blob::Create(context, args_parts, args_options, exception_state);"));
        assert!(source.contains("{\"createBlob\", createBlob, 0},"));
        assert!(source.contains("{\"Blob\", nullptr, nullptr, constructor},"));
        assert!(source.contains("{\"text\", text, 0},"));
        assert!(source.contains("{\"size\", sizeAttributeGetCallback, nullptr},"));
        assert!(source.contains("{\"type\", typeAttributeGetCallback, typeAttributeSetCallback},"));
        assert!(!source.contains("sizeAttributeSetCallback"));
        assert!(source.contains("    return_value = self->text(exception_state);"));
        assert!(source.contains("  return return_value.ToQuickJS();"));

        assert!(header.contains("#ifndef KRAKENBRIDGE_BINDINGS_QJS_BLOB_H_"));
        assert!(header.contains("class QJSBlob final {"));
        assert!(header.contains("static void InstallPrototypeProperties(ExecutingContext* context);"));
    }

    #[test]
    fn setter_returns_the_no_value_token() {
        let (source, _) = render(json!({
            "id": "input", "backing_type_name": "Input",
            "members": [{
                "kind": "class",
                "constructor": {"name": "constructor"},
                "properties": [{"name": "value", "type": "string"}]
            }]
        }));
        let expected = "\
static JSValue valueAttributeSetCallback(JSContext* ctx, JSValueConst this_val, int argc, JSValueConst* argv) {
  auto* self = toScriptWrappable<Input>(this_val);
  assert(self != nullptr);
  ExceptionState exception_state;
  auto&& v = Converter<IDLDOMString>::FromValue(ctx, argv[0], exception_state);
  if (exception_state.HasException()) {
    return exception_state.ToQuickJS();
  }
  self->setValue(v, exception_state);
  if (exception_state.HasException()) {
    return exception_state.ToQuickJS();
  }
  return JS_NULL;
}
";
        assert!(source.contains(expected), "{source}");
        assert!(source.contains("return Converter<IDLDOMString>::ToValue(ctx, self->value());"));
    }

    #[test]
    fn converted_results_round_through_the_same_operator() {
        let (source, _) = render(json!({
            "id": "math", "backing_type_name": "MathUtil",
            "members": [{"kind": "function", "name": "values", "return_type": {"sequence": "double"}}]
        }));
        assert!(source.contains("  Converter<IDLSequence<IDLDouble>>::ImplType return_value;"));
        assert!(source.contains("    return_value = MathUtil::values(context, exception_state);"));
        assert!(source.contains("  return Converter<IDLSequence<IDLDouble>>::ToValue(ctx, return_value);"));
        assert!(!source.contains("if (argc <"), "no arity guard without required arguments");
    }

    #[test]
    fn options_drive_namespace_and_copyright() {
        let module: Module = serde_json::from_value(canvas()).unwrap();
        let unit = assemble(&module).unwrap();
        let opts = Options {
            namespace: "webf".into(),
            copyright: Vec::new(),
            ..Options::default()
        };
        let mut cg = Codegen::new(&opts);
        cg.emit_source(&unit);
        let source = cg.into_string();
        assert!(source.starts_with("#include \"qjs_canvas.h\""));
        assert!(source.contains("namespace webf {"));
    }
}
