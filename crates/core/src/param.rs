//! Parameter Resolver: resolves one parameter descriptor (and, recursively,
//! its children) into the model.
//!
//! Nodes are allocated top-down and finished bottom-up. A node is entered
//! in the template registry only once it is complete, which is what makes
//! a param referring to itself as a template fail with a missing template.

use crate::constraint::resolve_param_constraint;
use crate::descriptor::{Entries, ImportDesc, ParamDesc};
use crate::error::ResolveError;
use crate::loader::{load_param, Format};
use crate::model::{
    ConstraintId, DeviceModel, Namespace, ParamId, ParamMeta, ParamNode, ParamType,
    TemplateRegistry, TypeId, ValueType,
};
use crate::source::DocumentSource;
use crate::synth;
use crate::template::{self, TemplateBinding};
use crate::value::resolve_value;
use indexmap::IndexMap;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// State threaded through a single resolution pass.
pub struct ResolveContext<'a> {
    pub model: DeviceModel,
    pub registry: TemplateRegistry,
    /// Nodes whose constraint has already been registered.
    pub(crate) constrained: HashMap<ParamId, ConstraintId>,
    /// Identifier stem of every node so far, with the OID that claimed it.
    idents: HashMap<String, String>,
    source: &'a dyn DocumentSource,
    import_stack: Vec<PathBuf>,
}

impl<'a> ResolveContext<'a> {
    pub fn new(model: DeviceModel, source: &'a dyn DocumentSource) -> Self {
        ResolveContext {
            model,
            registry: TemplateRegistry::default(),
            constrained: HashMap::new(),
            idents: HashMap::new(),
            source,
            import_stack: Vec::new(),
        }
    }

    pub fn into_model(self) -> DeviceModel {
        self.model
    }

    /// Reserve the identifier stem of a new node. `/a_b` and `/a/b` both
    /// flatten to `_a_b`, so the second one to arrive is refused.
    pub(crate) fn claim_ident(&mut self, id: ParamId) -> Result<(), ResolveError> {
        let node = self.model.param(id);
        match self.idents.entry(node.ident()) {
            Entry::Occupied(e) => Err(ResolveError::NameClash {
                oid: node.fqoid.clone(),
                ident: e.key().clone(),
                other: e.get().clone(),
            }),
            Entry::Vacant(e) => {
                e.insert(node.fqoid.clone());
                Ok(())
            }
        }
    }

    /// Make a finished node visible as a template. Command trees never
    /// serve as templates.
    pub(crate) fn register(&mut self, id: ParamId) {
        let node = self.model.param(id);
        if node.namespace == Namespace::Params {
            self.registry.insert(&node.fqoid, id);
        }
    }
}

/// Where in the tree a descriptor is being resolved.
#[derive(Debug, Clone)]
pub(crate) struct ParamSite {
    pub parent: Option<ParamId>,
    pub namespace: Namespace,
    /// Scope that types declared by this param are placed in.
    pub scope: Vec<String>,
    /// Folder that `{"url": "include"}` imports resolve against.
    pub folder: PathBuf,
}

impl ParamSite {
    pub fn root(namespace: Namespace, folder: &Path) -> Self {
        ParamSite {
            parent: None,
            namespace,
            scope: Vec::new(),
            folder: folder.to_path_buf(),
        }
    }
}

/// Resolve every entry of an OID-keyed block, in document order.
pub(crate) fn resolve_block(
    cx: &mut ResolveContext,
    site: &ParamSite,
    scope_name: &str,
    params: &Entries<ParamDesc>,
) -> Result<IndexMap<String, ParamId>, ResolveError> {
    if let Some(dup) = params.duplicate() {
        return Err(ResolveError::DuplicateOid {
            scope: scope_name.to_string(),
            oid: dup.to_string(),
        });
    }
    let mut out = IndexMap::new();
    for (oid, desc) in params.iter() {
        let id = resolve_param(cx, site, oid, desc)?;
        out.insert(oid.to_string(), id);
    }
    Ok(out)
}

pub(crate) fn resolve_param(
    cx: &mut ResolveContext,
    site: &ParamSite,
    oid: &str,
    desc: &ParamDesc,
) -> Result<ParamId, ResolveError> {
    let fqoid = match site.parent {
        Some(p) => format!("{}/{}", cx.model.param(p).fqoid, oid),
        None => format!("/{}", oid),
    };

    if let Some(import) = &desc.import {
        let (path, imported) = load_import(cx, &fqoid, oid, import, &site.folder)?;
        cx.import_stack.push(path);
        let resolved = resolve_param(cx, site, oid, &imported);
        cx.import_stack.pop();
        return resolved;
    }

    let is_command = site.namespace == Namespace::Commands && site.parent.is_none();
    let declared = if is_command {
        if desc.template_oid.is_some() {
            return Err(ResolveError::InvalidCommand {
                oid: fqoid,
                reason: "commands cannot use a template".into(),
            });
        }
        if desc.value.is_some() {
            return Err(ResolveError::InvalidCommand {
                oid: fqoid,
                reason: "commands cannot carry a value".into(),
            });
        }
        ParamType::Empty
    } else {
        let code = desc.type_code.as_deref().unwrap_or("");
        ParamType::from_code(code).ok_or_else(|| ResolveError::UnknownParamType {
            oid: fqoid.clone(),
            code: code.to_string(),
        })?
    };
    log::debug!("resolving {} ({})", fqoid, declared.code());

    let id = cx.model.push_node(ParamNode {
        id: ParamId(0),
        oid: oid.to_string(),
        fqoid: fqoid.clone(),
        parent: site.parent,
        namespace: site.namespace,
        is_command,
        declared,
        ty: ValueType::Empty,
        declares: None,
        alias: None,
        template: None,
        constraint: None,
        value: None,
        children: IndexMap::new(),
        meta: ParamMeta {
            name: desc.name.as_ref().map(|n| n.pairs()).unwrap_or_default(),
            oid_aliases: desc.oid_aliases.clone(),
            widget: desc.widget.clone(),
            access_scope: desc.access_scope.clone(),
            read_only: desc.read_only,
        },
    });
    cx.claim_ident(id)?;

    let own_constraint = match &desc.constraint {
        Some(c) => Some(resolve_param_constraint(cx, id, c)?),
        None => None,
    };

    let binding = match &desc.template_oid {
        Some(t) => Some(template::bind(cx, &fqoid, declared, t)?),
        None => None,
    };

    let child_folder = site.folder.join(oid);
    let (ty, declares, alias) = match &binding {
        Some(b) => {
            if !desc.params.is_empty() {
                return Err(ResolveError::InvalidTemplate {
                    oid: fqoid,
                    reason: "a templated parameter takes its params from the template".into(),
                });
            }
            template::instantiate_children(cx, id, b.template)?;
            if b.over_elements && type_id(b.ty.element()).is_some() {
                check_nested_name(cx, site, &fqoid, &synth::type_name(oid))?;
            }
            let alias = templated_alias(cx, id, site, oid, b);
            (b.ty.clone(), None, alias)
        }
        None if declared.declares_type() => {
            let name = synth::element_name(oid, declared.is_array());
            check_nested_name(cx, site, &fqoid, &name)?;
            if declared.is_array() {
                check_nested_name(cx, site, &fqoid, &synth::type_name(oid))?;
            }
            let is_struct = declared.element() == ParamType::Struct;
            let scope = synth::child_scope(&site.scope, oid, is_struct.then_some(name.as_str()));
            let child_site = ParamSite {
                parent: Some(id),
                namespace: site.namespace,
                scope,
                folder: child_folder,
            };
            let children = resolve_block(cx, &child_site, &fqoid, &desc.params)?;
            cx.model.param_mut(id).children = children;
            let element = if is_struct {
                ValueType::Struct(synth::declare_struct(cx, id, site.scope.clone(), name))
            } else {
                if desc.params.is_empty() {
                    return Err(ResolveError::EmptyVariant { oid: fqoid });
                }
                ValueType::Variant(synth::declare_variant(cx, id, site.scope.clone(), name))
            };
            let declares = type_id(&element);
            if declared.is_array() {
                let alias =
                    synth::declare_array_alias(cx, id, site.scope.clone(), oid, element.clone());
                (ValueType::Array(Box::new(element)), declares, Some(alias))
            } else {
                (element, declares, None)
            }
        }
        None => {
            if !desc.params.is_empty() {
                // only commands may nest params under a non-struct type
                if !is_command {
                    return Err(ResolveError::UnexpectedParams {
                        oid: fqoid,
                        param_type: declared.code().to_string(),
                    });
                }
                let child_site = ParamSite {
                    parent: Some(id),
                    namespace: site.namespace,
                    scope: synth::child_scope(&site.scope, oid, None),
                    folder: child_folder,
                };
                let children = resolve_block(cx, &child_site, &fqoid, &desc.params)?;
                cx.model.param_mut(id).children = children;
            }
            // scalar codes always have a scalar form
            let ty = ValueType::scalar(declared).unwrap_or(ValueType::Empty);
            (ty, None, None)
        }
    };

    let constraint = own_constraint.or(binding.as_ref().and_then(|b| b.constraint));
    if let Some(c) = constraint {
        check_constraint_type(&cx.model, &fqoid, c, &ty)?;
    }

    let value = match &desc.value {
        Some(v) => Some(resolve_value(&cx.model, &fqoid, &ty, v)?),
        None => binding.as_ref().and_then(|b| b.initializer.clone()),
    };

    let node = cx.model.param_mut(id);
    node.ty = ty;
    node.declares = declares;
    node.alias = alias;
    node.template = binding.map(|b| b.template);
    node.constraint = constraint;
    node.value = value;
    cx.register(id);
    Ok(id)
}

/// A type nested in a struct may not share the struct's own name.
fn check_nested_name(
    cx: &ResolveContext,
    site: &ParamSite,
    fqoid: &str,
    name: &str,
) -> Result<(), ResolveError> {
    match (site.scope.last(), site.parent) {
        (Some(enclosing), Some(parent)) if enclosing == name => Err(ResolveError::NameClash {
            oid: fqoid.to_string(),
            ident: name.to_string(),
            other: cx.model.param(parent).fqoid.clone(),
        }),
        _ => Ok(()),
    }
}

fn type_id(ty: &ValueType) -> Option<TypeId> {
    match ty {
        ValueType::Struct(t) | ValueType::Variant(t) => Some(*t),
        _ => None,
    }
}

/// An array templated on a single struct or variant still needs a
/// container alias of its own.
fn templated_alias(
    cx: &mut ResolveContext,
    id: ParamId,
    site: &ParamSite,
    oid: &str,
    binding: &TemplateBinding,
) -> Option<TypeId> {
    if !binding.over_elements {
        return cx.model.param(binding.template).alias;
    }
    let element = binding.ty.element().clone();
    type_id(&element)?;
    Some(synth::declare_array_alias(cx, id, site.scope.clone(), oid, element))
}

fn check_constraint_type(
    model: &DeviceModel,
    fqoid: &str,
    constraint: ConstraintId,
    ty: &ValueType,
) -> Result<(), ResolveError> {
    let kind = &model.constraint(constraint).kind;
    if ty.element().param_type() != kind.scalar() {
        return Err(ResolveError::ConstraintTypeMismatch {
            oid: fqoid.to_string(),
            code: kind.code().to_string(),
            param_type: ty.param_type().code().to_string(),
        });
    }
    Ok(())
}

/// Read the descriptor an `import` entry points at, refusing cycles.
fn load_import(
    cx: &ResolveContext,
    fqoid: &str,
    oid: &str,
    import: &ImportDesc,
    folder: &Path,
) -> Result<(PathBuf, ParamDesc), ResolveError> {
    let error = |target: &str, reason: String| ResolveError::Import {
        oid: fqoid.to_string(),
        import: target.to_string(),
        reason,
    };
    let path = match (&import.file, import.url.as_deref()) {
        (Some(file), _) => folder.join(file),
        (None, Some("include")) => {
            let json = folder.join(format!("param.{}.{}", oid, Format::Json.extension()));
            let yaml = folder.join(format!("param.{}.{}", oid, Format::Yaml.extension()));
            if !cx.source.exists(&json) && cx.source.exists(&yaml) {
                yaml
            } else {
                json
            }
        }
        (None, Some(url)) => {
            return Err(error(url, "only {\"url\": \"include\"} imports are supported".into()))
        }
        (None, None) => return Err(error("", "import needs a url or a file".into())),
    };
    let shown = path.display().to_string();
    let canonical = cx
        .source
        .canonicalize(&path)
        .map_err(|e| error(&shown, e.to_string()))?;
    if cx.import_stack.contains(&canonical) {
        return Err(error(&shown, "import cycle".into()));
    }
    log::debug!("{} imported from {}", fqoid, shown);
    let desc = load_param(&path, cx.source).map_err(|e| error(&shown, e))?;
    Ok((canonical, desc))
}
