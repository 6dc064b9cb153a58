//! Declaration stream: the generated header.
//!
//! Types are written by walking the parameter tree in declaration order,
//! which puts every type ahead of the first struct or alias that uses it.
//! Reflection specializations follow the namespace.

use crate::cpp::{self, Qualify};
use crate::writer::CodeWriter;
use crate::{CppConfig, RUNTIME};
use catena_core::{DeviceModel, ParamId, ParamNode, TypeDeclKind};

pub(crate) fn write_header(model: &DeviceModel, config: &CppConfig) -> String {
    let mut w = CodeWriter::new();
    w.line("#pragma once");
    w.blank();
    w.line("// This file was auto-generated by catena-codegen. Do not modify by hand.");
    w.line(format!("// Source: {}", config.source_name));
    w.blank();
    for include in [
        "<Device.h>",
        "<StructInfo.h>",
        "<cstdint>",
        "<string>",
        "<tuple>",
        "<variant>",
        "<vector>",
    ] {
        w.line(format!("#include {}", include));
    }
    w.blank();
    w.line(format!("extern {}::Device dm;", RUNTIME));
    w.blank();

    let ns = &model.namespace;
    w.open(format!("namespace {} {{", ns));
    for id in model.params.values().chain(model.commands.values()) {
        write_types(&mut w, model, *id, false);
    }
    w.close(format!("}} // namespace {}", ns));

    write_reflection(&mut w, model);
    w.finish()
}

fn write_types(w: &mut CodeWriter, model: &DeviceModel, id: ParamId, in_struct: bool) {
    let node = model.param(id);
    if let Some(tid) = node.declares {
        let decl = model.type_decl(tid);
        match &decl.kind {
            TypeDeclKind::Struct { .. } => {
                w.open(format!("struct {} {{", decl.name));
                for child in model.children(id) {
                    write_types(w, model, child.id, true);
                }
                for child in model.children(id) {
                    w.line(member(model, child));
                }
                w.line("using isCatenaStruct = void;");
                w.close("};");
            }
            TypeDeclKind::Variant { .. } => {
                write_holder(w, model, node, in_struct);
                let alternatives: Vec<String> = model
                    .children(id)
                    .map(|c| cpp::param_type(model, c, Qualify::Inside))
                    .collect();
                w.line(format!(
                    "using {} = std::variant<{}>;",
                    decl.name,
                    alternatives.join(", ")
                ));
            }
            TypeDeclKind::ArrayAlias { .. } => {}
        }
    } else if node.is_command {
        write_holder(w, model, node, in_struct);
    }
    if let Some(alias) = owned_alias(model, node) {
        w.line(alias);
    }
}

/// The `using` line for an array alias introduced by this node, if any.
/// Params that share a template's array type reuse its alias.
fn owned_alias(model: &DeviceModel, node: &ParamNode) -> Option<String> {
    let decl = model.type_decl(node.alias?);
    if decl.owner != node.id {
        return None;
    }
    match &decl.kind {
        TypeDeclKind::ArrayAlias { element } => Some(format!(
            "using {} = std::vector<{}>;",
            decl.name,
            cpp::type_name(model, element, Qualify::Inside)
        )),
        _ => None,
    }
}

fn declares_anything(model: &DeviceModel, node: &ParamNode) -> bool {
    node.declares.is_some() || owned_alias(model, node).is_some()
}

/// `_<oid>` scope for the types of a variant's alternatives or a command's
/// params. A namespace at file level, a nested struct inside a struct.
fn write_holder(w: &mut CodeWriter, model: &DeviceModel, node: &ParamNode, in_struct: bool) {
    if !model.children(node.id).any(|c| declares_anything(model, c)) {
        return;
    }
    let name = format!("_{}", node.oid);
    if in_struct {
        w.open(format!("struct {} {{", name));
    } else {
        w.open(format!("namespace {} {{", name));
    }
    for child in model.children(node.id) {
        write_types(w, model, child.id, in_struct);
    }
    if in_struct {
        w.close("};");
    } else {
        w.close(format!("}} // namespace {}", name));
    }
}

fn member(model: &DeviceModel, child: &ParamNode) -> String {
    let ty = cpp::param_type(model, child, Qualify::Inside);
    match &child.value {
        Some(v) => format!(
            "{} {} = {};",
            ty,
            child.oid,
            cpp::initializer(model, v, Qualify::Inside)
        ),
        None => format!("{} {}{{}};", ty, child.oid),
    }
}

fn write_reflection(w: &mut CodeWriter, model: &DeviceModel) {
    let outside = Qualify::Outside(&model.namespace);
    for decl in model.types() {
        let full = format!("{}::{}", model.namespace, decl.qualified_name());
        let children: Vec<&ParamNode> = model.children(decl.owner).collect();
        match &decl.kind {
            TypeDeclKind::Struct { fields } => {
                w.blank();
                w.line("template<>");
                w.open(format!("struct {}::StructInfo<{}> {{", RUNTIME, full));
                w.line(format!("using T = {};", full));
                let infos: Vec<String> = children
                    .iter()
                    .map(|c| {
                        format!(
                            "{}::FieldInfo<{}, T>",
                            RUNTIME,
                            cpp::param_type(model, c, outside)
                        )
                    })
                    .collect();
                w.line(format!("using Type = std::tuple<{}>;", infos.join(", ")));
                let entries = cpp::braced(
                    fields
                        .iter()
                        .map(|f| format!("{{{}, &T::{}}}", cpp::quote(&f.name), f.name)),
                );
                w.line(format!("static constexpr Type fields = {};", entries));
                w.close("};");
            }
            TypeDeclKind::Variant { alternatives } => {
                w.blank();
                w.line("template<>");
                w.open(format!("struct {}::VariantInfo<{}> {{", RUNTIME, full));
                let infos: Vec<String> = children
                    .iter()
                    .map(|c| {
                        format!(
                            "{}::AlternativeInfo<{}>",
                            RUNTIME,
                            cpp::param_type(model, c, outside)
                        )
                    })
                    .collect();
                w.line(format!("using Type = std::tuple<{}>;", infos.join(", ")));
                let entries = cpp::braced(
                    alternatives
                        .iter()
                        .map(|a| format!("{{{}}}", cpp::quote(&a.name))),
                );
                w.line(format!("static constexpr Type alternatives = {};", entries));
                w.close("};");
            }
            TypeDeclKind::ArrayAlias { .. } => {}
        }
    }
}
