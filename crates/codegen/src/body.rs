//! Definition stream: the generated source file.
//!
//! Order of the output is fixed: the device, language packs, shared
//! constraints, then each top-level param (inline constraints, value,
//! descriptors parent-first, the param itself), commands, and menus last.

use crate::cpp::{self, Qualify};
use crate::writer::CodeWriter;
use crate::{CppConfig, RUNTIME};
use catena_core::constraint::{NamedChoices, Picklist, Range};
use catena_core::{
    ConstraintId, ConstraintKind, ConstraintNode, ConstraintOwner, DeviceModel, ParamId,
};
use std::collections::HashSet;

pub(crate) fn write_body(model: &DeviceModel, config: &CppConfig) -> String {
    let mut w = CodeWriter::new();
    w.line("// This file was auto-generated by catena-codegen. Do not modify by hand.");
    w.line(format!("// Source: {}", config.source_name));
    w.blank();
    w.line(format!("#include \"{}\"", config.header_name()));
    w.blank();
    for include in [
        "<Device.h>",
        "<LanguagePack.h>",
        "<Menu.h>",
        "<MenuGroup.h>",
        "<NamedChoiceConstraint.h>",
        "<ParamDescriptor.h>",
        "<ParamWithValue.h>",
        "<PicklistConstraint.h>",
        "<RangeConstraint.h>",
    ] {
        w.line(format!("#include {}", include));
    }
    w.blank();
    w.line("#include <functional>");
    w.blank();
    w.line(format!("using {}::Device;", RUNTIME));
    w.line(format!("using DetailLevel = {}::DetailLevel;", RUNTIME));
    w.line(format!("using {}::Scopes_e;", RUNTIME));
    w.line("using Scope = typename catena::patterns::EnumDecorator<Scopes_e>;");
    w.blank();

    write_device(&mut w, model);

    if !model.language_packs.is_empty() {
        w.blank();
        for pack in &model.language_packs {
            w.line(format!(
                "{}::LanguagePack _{}LanguagePack {{{}, {}, dm}};",
                RUNTIME,
                pack.id,
                cpp::quote(&pack.name),
                cpp::polyglot(&pack.words)
            ));
        }
    }

    if !model.shared_constraints.is_empty() {
        w.blank();
        for id in model.shared_constraints.values() {
            write_constraint(&mut w, model.constraint(*id));
        }
    }

    let mut sequencer = Sequencer {
        model,
        w: &mut w,
        emitted: HashSet::new(),
    };
    for id in model.params.values() {
        sequencer.w.blank();
        sequencer.write_param(*id);
    }
    for id in model.commands.values() {
        sequencer.w.blank();
        sequencer.write_command(*id);
    }

    write_menus(&mut w, model);
    w.finish()
}

fn write_device(w: &mut CodeWriter, model: &DeviceModel) {
    let d = &model.device;
    let scopes = cpp::braced(
        d.access_scopes
            .iter()
            .map(|s| format!("Scope({})()", cpp::quote(s))),
    );
    let default_scope = match &d.default_scope {
        Some(s) => format!("Scope({})()", cpp::quote(s)),
        None => "{}".to_string(),
    };
    w.line(format!(
        "Device dm {{{}, DetailLevel({})(), {}, {}, {}, {}}};",
        d.slot,
        cpp::quote(d.detail_level.as_str()),
        scopes,
        default_scope,
        cpp::bool_literal(d.multi_set_enabled),
        cpp::bool_literal(d.subscriptions)
    ));
}

fn constraint_var(c: &ConstraintNode) -> String {
    if c.is_shared() {
        format!("{}Constraint", c.ident)
    } else {
        format!("{}ParamConstraint", c.ident)
    }
}

fn write_constraint(w: &mut CodeWriter, c: &ConstraintNode) {
    let var = constraint_var(c);
    let shared_flag = cpp::bool_literal(c.is_shared());
    let line = match &c.kind {
        ConstraintKind::IntRange(r) => {
            range_line(&var, "int32_t", r, |v| v.to_string(), &c.oid, shared_flag)
        }
        ConstraintKind::FloatRange(r) => {
            range_line(&var, "float", r, |v| cpp::float_literal(*v), &c.oid, shared_flag)
        }
        ConstraintKind::IntChoice(n) => {
            named_line(&var, "int32_t", n, |v| v.to_string(), &c.oid, shared_flag)
        }
        ConstraintKind::StringChoice(n) => {
            named_line(&var, "std::string", n, |v| cpp::quote(v), &c.oid, shared_flag)
        }
        ConstraintKind::Picklist(p) => picklist_line(&var, p, &c.oid, shared_flag),
    };
    w.line(line);
}

fn range_line<T>(
    var: &str,
    ty: &str,
    r: &Range<T>,
    lit: impl Fn(&T) -> String,
    oid: &str,
    shared: &str,
) -> String {
    format!(
        "{}::RangeConstraint<{}> {} {{{}, {}, {}, {}, {}, {}, {}, dm}};",
        RUNTIME,
        ty,
        var,
        lit(&r.min),
        lit(&r.max),
        lit(&r.step),
        lit(&r.display_min),
        lit(&r.display_max),
        cpp::quote(oid),
        shared
    )
}

fn named_line<T>(
    var: &str,
    ty: &str,
    n: &NamedChoices<T>,
    lit: impl Fn(&T) -> String,
    oid: &str,
    shared: &str,
) -> String {
    let choices = cpp::braced(
        n.choices
            .iter()
            .map(|c| format!("{{{}, {}}}", lit(&c.value), cpp::polyglot(&c.name))),
    );
    format!(
        "{}::NamedChoiceConstraint<{}> {} {{{}, {}, {}, {}, dm}};",
        RUNTIME,
        ty,
        var,
        choices,
        cpp::bool_literal(n.strict),
        cpp::quote(oid),
        shared
    )
}

fn picklist_line(var: &str, p: &Picklist, oid: &str, shared: &str) -> String {
    format!(
        "{}::PicklistConstraint {} {{{}, {}, {}, {}, dm}};",
        RUNTIME,
        var,
        cpp::string_list(&p.choices),
        cpp::bool_literal(p.strict),
        cpp::quote(oid),
        shared
    )
}

struct Sequencer<'m, 'w> {
    model: &'m DeviceModel,
    w: &'w mut CodeWriter,
    emitted: HashSet<ConstraintId>,
}

impl Sequencer<'_, '_> {
    fn write_param(&mut self, id: ParamId) {
        let model = self.model;
        let node = model.param(id);
        let outside = Qualify::Outside(&model.namespace);
        let ty = cpp::param_type(model, node, outside);
        let value = match &node.value {
            Some(v) => format!(" = {}", cpp::initializer(model, v, outside)),
            None => "{}".to_string(),
        };
        self.w.line(format!("{} {}{};", ty, node.oid, value));
        self.write_descriptors(id);
        self.w.line(format!(
            "{}::ParamWithValue<{}> {}Param {{{}, {}Descriptor, dm, false}};",
            RUNTIME,
            ty,
            node.ident(),
            node.oid,
            node.ident()
        ));
    }

    fn write_command(&mut self, id: ParamId) {
        let node = self.model.param(id);
        self.write_descriptors(id);
        self.w.line(format!(
            "{rt}::ParamWithValue<{rt}::EmptyValue> {ident}Param {{{rt}::emptyValue, {ident}Descriptor, dm, true}};",
            rt = RUNTIME,
            ident = node.ident()
        ));
    }

    /// Descriptors for the subtree under `root`, each preceded by the
    /// inline constraint it owns.
    fn write_descriptors(&mut self, root: ParamId) {
        let model = self.model;
        for id in model.subtree(root) {
            let node = model.param(id);
            let constraint_ref = match node.constraint {
                Some(cid) => {
                    let c = model.constraint(cid);
                    if c.owner == ConstraintOwner::Param(id) && self.emitted.insert(cid) {
                        write_constraint(self.w, c);
                    }
                    format!("&{}", constraint_var(c))
                }
                None => "nullptr".to_string(),
            };
            let parent_ref = match node.parent {
                Some(p) => format!("&{}Descriptor", model.param(p).ident()),
                None => "nullptr".to_string(),
            };
            self.w.line(format!(
                "{}::ParamDescriptor {}Descriptor {{catena::ParamType::{}, {}, {}, {}, {}, {}, {}, {}, {}, dm, {}}};",
                RUNTIME,
                node.ident(),
                node.ty.param_type().code(),
                cpp::string_list(&node.meta.oid_aliases),
                cpp::polyglot(&node.meta.name),
                cpp::optional_string(&node.meta.widget),
                cpp::optional_string(&node.meta.access_scope),
                cpp::bool_literal(node.meta.read_only),
                cpp::quote(&node.oid),
                constraint_ref,
                parent_ref,
                cpp::bool_literal(node.is_command)
            ));
        }
    }
}

fn write_menus(w: &mut CodeWriter, model: &DeviceModel) {
    for group in &model.menu_groups {
        w.blank();
        let group_var = format!("_{}MenuGroup", group.oid);
        w.line(format!(
            "{}::MenuGroup {} {{{}, {}, dm}};",
            RUNTIME,
            group_var,
            cpp::quote(&group.oid),
            cpp::polyglot(&group.name)
        ));
        for menu in &group.menus {
            w.line(format!(
                "{}::Menu _{}_{}Menu {{{}, {}, {}, {}, {}, {}, {}, {}}};",
                RUNTIME,
                group.oid,
                menu.oid,
                cpp::polyglot(&menu.name),
                cpp::bool_literal(menu.hidden),
                cpp::bool_literal(menu.disabled),
                cpp::string_list(&menu.param_oids),
                cpp::string_list(&menu.command_oids),
                cpp::polyglot(&menu.client_hints),
                cpp::quote(&menu.oid),
                group_var
            ));
        }
    }
}
