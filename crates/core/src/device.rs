//! Device Assembler: builds a [`DeviceModel`] from a device document.
//!
//! Order matters and is fixed: device settings, language packs, shared
//! constraints, params, commands, then menus (which may only point at
//! params and commands that exist).

use crate::constraint::resolve_shared;
use crate::descriptor::{DeviceDesc, PolyglotText};
use crate::error::ResolveError;
use crate::loader::{load_device_with_source, DeviceDocument};
use crate::model::{
    normalize_oid, DeviceInfo, DeviceModel, LanguagePack, Menu, MenuGroup, Namespace,
};
use crate::param::{resolve_block, ParamSite, ResolveContext};
use crate::source::{DocumentSource, FileSystemSource};
use std::path::Path;

/// Load and resolve the device model at `path` from the filesystem.
pub fn resolve_file(path: &Path) -> Result<DeviceModel, ResolveError> {
    resolve_file_with_source(path, &FileSystemSource)
}

pub fn resolve_file_with_source(
    path: &Path,
    source: &dyn DocumentSource,
) -> Result<DeviceModel, ResolveError> {
    let doc = load_device_with_source(path, source)?;
    resolve_document(&doc, source)
}

pub fn resolve_document(
    doc: &DeviceDocument,
    source: &dyn DocumentSource,
) -> Result<DeviceModel, ResolveError> {
    resolve_device(&doc.namespace, &doc.desc, &doc.import_root, source)
}

/// Resolve a parsed device description. `import_root` is the folder that
/// top-level `{"url": "include"}` imports are read from.
pub fn resolve_device(
    namespace: &str,
    desc: &DeviceDesc,
    import_root: &Path,
    source: &dyn DocumentSource,
) -> Result<DeviceModel, ResolveError> {
    let device = device_info(desc)?;
    let mut cx = ResolveContext::new(DeviceModel::new(namespace.to_string(), device), source);

    if let Some(packs) = &desc.language_packs {
        if let Some(dup) = packs.packs.duplicate() {
            return Err(ResolveError::DuplicateOid {
                scope: "language_packs".into(),
                oid: dup.to_string(),
            });
        }
        cx.model.language_packs = packs
            .packs
            .iter()
            .map(|(id, pack)| LanguagePack {
                id: id.to_string(),
                name: pack.name.clone(),
                words: pack.words.0.clone(),
            })
            .collect();
    }

    resolve_shared(&mut cx, &desc.constraints)?;

    let params = resolve_block(
        &mut cx,
        &ParamSite::root(Namespace::Params, import_root),
        "params",
        &desc.params,
    )?;
    cx.model.params = params;

    let commands = resolve_block(
        &mut cx,
        &ParamSite::root(Namespace::Commands, import_root),
        "commands",
        &desc.commands,
    )?;
    cx.model.commands = commands;

    let menu_groups = resolve_menus(&cx.model, desc)?;
    cx.model.menu_groups = menu_groups;

    let model = cx.into_model();
    log::info!(
        "resolved device '{}': {} params, {} commands, {} types, {} constraints",
        model.namespace,
        model.params.len(),
        model.commands.len(),
        model.types().len(),
        model.constraints().len()
    );
    Ok(model)
}

fn device_info(desc: &DeviceDesc) -> Result<DeviceInfo, ResolveError> {
    if let Some(scope) = &desc.default_scope {
        if !desc.access_scopes.is_empty() && !desc.access_scopes.contains(scope) {
            return Err(ResolveError::InvalidDevice {
                reason: format!(
                    "default_scope '{}' is not one of the access scopes ({})",
                    scope,
                    desc.access_scopes.join(", ")
                ),
            });
        }
    }
    Ok(DeviceInfo {
        slot: desc.slot,
        detail_level: desc.detail_level,
        access_scopes: desc.access_scopes.clone(),
        default_scope: desc.default_scope.clone(),
        multi_set_enabled: desc.multi_set_enabled,
        subscriptions: desc.subscriptions,
    })
}

fn display(name: &Option<PolyglotText>) -> Vec<(String, String)> {
    name.as_ref().map(|n| n.pairs()).unwrap_or_default()
}

fn resolve_menus(model: &DeviceModel, desc: &DeviceDesc) -> Result<Vec<MenuGroup>, ResolveError> {
    if let Some(dup) = desc.menu_groups.duplicate() {
        return Err(ResolveError::DuplicateOid {
            scope: "menu_groups".into(),
            oid: dup.to_string(),
        });
    }
    let mut groups = Vec::new();
    for (group_oid, group) in desc.menu_groups.iter() {
        if let Some(dup) = group.menus.duplicate() {
            return Err(ResolveError::DuplicateOid {
                scope: format!("menu group '{}'", group_oid),
                oid: dup.to_string(),
            });
        }
        let mut menus = Vec::new();
        for (menu_oid, menu) in group.menus.iter() {
            let label = format!("{}/{}", group_oid, menu_oid);
            let param_oids = check_targets(&label, "param", &menu.param_oids, |o| {
                model.find_param(o)
            })?;
            let command_oids = check_targets(&label, "command", &menu.command_oids, |o| {
                model.find_command(o)
            })?;
            menus.push(Menu {
                oid: menu_oid.to_string(),
                name: display(&menu.name),
                hidden: menu.hidden,
                disabled: menu.disabled,
                param_oids,
                command_oids,
                client_hints: menu.client_hints.0.clone(),
            });
        }
        groups.push(MenuGroup {
            oid: group_oid.to_string(),
            name: display(&group.name),
            menus,
        });
    }
    Ok(groups)
}

fn check_targets<T>(
    menu: &str,
    kind: &str,
    oids: &[String],
    find: impl Fn(&str) -> Option<T>,
) -> Result<Vec<String>, ResolveError> {
    oids.iter()
        .map(|oid| {
            let oid = normalize_oid(oid);
            match find(&oid) {
                Some(_) => Ok(oid),
                None => Err(ResolveError::MissingMenuTarget {
                    menu: menu.to_string(),
                    kind: kind.to_string(),
                    target: oid,
                }),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::InMemorySource;

    fn resolve_json(json: &str) -> Result<DeviceModel, ResolveError> {
        let desc: DeviceDesc = serde_json::from_str(json).unwrap();
        resolve_device("test", &desc, Path::new("/m/params"), &InMemorySource::new())
    }

    #[test]
    fn device_settings_carry_through() {
        let model = resolve_json(
            r#"{"slot": 2, "multi_set_enabled": true, "subscriptions": true,
                "access_scopes": ["monitor", "operate"], "default_scope": "operate"}"#,
        )
        .unwrap();
        assert_eq!(model.device.slot, 2);
        assert!(model.device.multi_set_enabled);
        assert_eq!(model.device.default_scope.as_deref(), Some("operate"));
    }

    #[test]
    fn default_scope_must_be_an_access_scope() {
        let err = resolve_json(r#"{"access_scopes": ["monitor"], "default_scope": "admin"}"#)
            .unwrap_err();
        assert!(matches!(err, ResolveError::InvalidDevice { .. }));
    }

    #[test]
    fn menus_must_point_at_existing_params() {
        let err = resolve_json(
            r#"{"params": {"gain": {"type": "INT32"}},
                "menu_groups": {"status": {"menus": {"main": {"param_oids": ["/gain", "/missing"]}}}}}"#,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ResolveError::MissingMenuTarget {
                menu: "status/main".into(),
                kind: "param".into(),
                target: "/missing".into(),
            }
        );
    }

    #[test]
    fn menu_oids_are_normalized() {
        let model = resolve_json(
            r#"{"params": {"gain": {"type": "INT32"}},
                "commands": {"reset": {}},
                "menu_groups": {"status": {"menus": {"main": {"param_oids": ["gain"], "command_oids": ["/reset"]}}}}}"#,
        )
        .unwrap();
        let menu = &model.menu_groups[0].menus[0];
        assert_eq!(menu.param_oids, vec!["/gain"]);
        assert_eq!(menu.command_oids, vec!["/reset"]);
    }

    #[test]
    fn language_packs_keep_order() {
        let model = resolve_json(
            r#"{"language_packs": {"packs": {
                "es": {"name": "Spanish", "words": {"greeting": "Hola"}},
                "fr": {"name": "French", "words": {}}
            }}}"#,
        )
        .unwrap();
        let ids: Vec<_> = model.language_packs.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["es", "fr"]);
        assert_eq!(model.language_packs[0].words[0].1, "Hola");
    }
}
