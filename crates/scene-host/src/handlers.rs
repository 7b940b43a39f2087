//! Registered command surface
//!
//! Handler bodies are plain functions over `SceneHost`; the bridge treats them
//! as opaque. Parameter shapes, result shapes, and error messages follow the
//! wire contract the agent side already speaks.

use crate::SceneHost;
use crate::assets::{resolve_asset, scan_library};
use crate::error::SceneError;
use crate::scene::{Modifier, SceneObject};
use scene_bridge_core::{CommandRegistry, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use tracing::debug;

/// Register every scene command on `registry`
pub fn register_commands(registry: &mut CommandRegistry<SceneHost>) {
    registry.register("get_scene_info", |host, _params| get_scene_info(host));
    registry.register("get_object_info", |host, params| {
        get_object_info(host, parse_params(params)?)
    });
    registry.register("get_viewport_screenshot", |host, params| {
        get_viewport_screenshot(host, parse_params(params)?)
    });
    registry.register("execute_code", |host, params| {
        execute_code(host, parse_params(params)?)
    });
    registry.register("get_asset_libraries", |host, _params| {
        get_asset_libraries(host)
    });
    registry.register("list_assets", |host, params| {
        list_assets(host, parse_params(params)?)
    });
    registry.register("append_asset", |host, params| {
        append_asset(host, parse_params(params)?)
    });
    registry.register("get_modifiers", |host, params| {
        get_modifiers(host, parse_params(params)?)
    });
    registry.register("add_modifier", |host, params| {
        add_modifier(host, parse_params(params)?)
    });
    registry.register("remove_modifier", |host, params| {
        remove_modifier(host, parse_params(params)?)
    });
    registry.register("apply_modifier", |host, params| {
        apply_modifier(host, parse_params(params)?)
    });
    registry.register("set_geometry_nodes_input", |host, params| {
        set_geometry_nodes_input(host, parse_params(params)?)
    });
}

fn parse_params<T: DeserializeOwned>(params: Value) -> Result<T> {
    serde_json::from_value(params).map_err(|e| SceneError::InvalidParams(e.to_string()).into())
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn get_scene_info(host: &mut SceneHost) -> Result<Value> {
    let scene = &host.scene;
    let objects: Vec<Value> = scene
        .objects()
        .iter()
        .take(20)
        .map(|object| {
            json!({
                "name": object.name,
                "type": object.object_type,
                "location": [
                    round2(object.location[0]),
                    round2(object.location[1]),
                    round2(object.location[2]),
                ],
            })
        })
        .collect();

    Ok(json!({
        "name": scene.name,
        "object_count": scene.object_count(),
        "objects": objects,
        "materials_count": scene.materials.len(),
    }))
}

#[derive(Debug, Deserialize)]
struct ObjectInfoParams {
    name: String,
}

fn get_object_info(host: &mut SceneHost, p: ObjectInfoParams) -> Result<Value> {
    let object = host
        .scene
        .object(&p.name)
        .ok_or_else(|| SceneError::ObjectNotFound(p.name.clone()))?;

    let mut info = json!({
        "name": object.name,
        "type": object.object_type,
        "location": object.location,
        "rotation": object.rotation,
        "scale": object.scale,
        "visible": object.visible,
        "materials": object.materials,
    });
    if let Some(mesh) = &object.mesh {
        info["mesh"] = json!({
            "vertices": mesh.vertices,
            "edges": mesh.edges,
            "polygons": mesh.polygons,
        });
    }
    Ok(info)
}

fn default_max_size() -> u32 {
    800
}

#[derive(Debug, Deserialize)]
struct ScreenshotParams {
    #[serde(default = "default_max_size")]
    #[allow(dead_code)]
    max_size: u32,
}

fn get_viewport_screenshot(_host: &mut SceneHost, _p: ScreenshotParams) -> Result<Value> {
    // A headless in-memory scene has no viewport to capture
    Err(SceneError::NoViewport.into())
}

#[derive(Debug, Deserialize)]
struct ExecuteCodeParams {
    #[allow(dead_code)]
    code: String,
}

fn execute_code(_host: &mut SceneHost, _p: ExecuteCodeParams) -> Result<Value> {
    Err(SceneError::CodeExecutionUnsupported.into())
}

fn get_asset_libraries(host: &mut SceneHost) -> Result<Value> {
    let libraries: Vec<Value> = host
        .asset_libraries()
        .iter()
        .map(|library| {
            json!({
                "name": library.name,
                "path": library.path.display().to_string(),
            })
        })
        .collect();
    Ok(Value::Array(libraries))
}

fn default_limit() -> usize {
    50
}

#[derive(Debug, Deserialize)]
struct ListAssetsParams {
    library_name: String,
    #[serde(default)]
    search: String,
    #[serde(default)]
    offset: usize,
    #[serde(default = "default_limit")]
    limit: usize,
}

fn list_assets(host: &mut SceneHost, p: ListAssetsParams) -> Result<Value> {
    let library = host
        .library(&p.library_name)
        .ok_or_else(|| SceneError::LibraryNotFound(p.library_name.clone()))?;

    let mut assets = scan_library(&library.path)?;
    if !p.search.is_empty() {
        let needle = p.search.to_lowercase();
        assets.retain(|asset| asset.name.to_lowercase().contains(&needle));
    }

    let total = assets.len();
    let page: Vec<Value> = assets
        .into_iter()
        .skip(p.offset)
        .take(p.limit)
        .map(|asset| json!({ "name": asset.name, "blend_file": asset.blend_file }))
        .collect();

    Ok(json!({
        "library": p.library_name,
        "total": total,
        "offset": p.offset,
        "limit": p.limit,
        "assets": page,
    }))
}

fn default_location() -> [f64; 3] {
    [0.0; 3]
}

#[derive(Debug, Deserialize)]
struct AppendAssetParams {
    library_name: String,
    asset_name: String,
    #[serde(default = "default_location")]
    location: [f64; 3],
}

fn append_asset(host: &mut SceneHost, p: AppendAssetParams) -> Result<Value> {
    let library = host
        .library(&p.library_name)
        .ok_or_else(|| SceneError::LibraryNotFound(p.library_name.clone()))?;
    let blend_path = resolve_asset(&library.path, &p.asset_name)?;
    debug!(
        "Appending asset {} from {}",
        p.asset_name,
        blend_path.display()
    );

    // The asset materializes as a mesh object named after the asset; element
    // counts are unknown until the host loads the file's data for real.
    let mut object = SceneObject::new(&p.asset_name, "MESH");
    object.location = p.location;
    let name = host.scene.add_object(object);

    Ok(json!({
        "appended_objects": [name],
        "location": p.location,
    }))
}

#[derive(Debug, Deserialize)]
struct GetModifiersParams {
    object_name: String,
}

fn modifier_info(modifier: &Modifier) -> Value {
    let mut info = json!({
        "name": modifier.name,
        "type": modifier.modifier_type,
        "properties": modifier.properties,
    });
    if let Some(group) = &modifier.node_group {
        info["node_group"] = json!(group.name);
        info["inputs"] = Value::Array(
            group
                .inputs
                .iter()
                .map(|input| {
                    json!({
                        "identifier": input.identifier,
                        "name": input.name,
                        "socket_type": input.socket_type,
                        "value": input.value,
                    })
                })
                .collect(),
        );
    }
    info
}

fn get_modifiers(host: &mut SceneHost, p: GetModifiersParams) -> Result<Value> {
    let object = host
        .scene
        .object(&p.object_name)
        .ok_or_else(|| SceneError::ObjectNotFound(p.object_name.clone()))?;
    Ok(Value::Array(
        object.modifiers.iter().map(modifier_info).collect(),
    ))
}

#[derive(Debug, Deserialize)]
struct AddModifierParams {
    object_name: String,
    modifier_type: String,
    modifier_name: Option<String>,
    properties: Option<Map<String, Value>>,
}

fn add_modifier(host: &mut SceneHost, p: AddModifierParams) -> Result<Value> {
    let object = host
        .scene
        .object_mut(&p.object_name)
        .ok_or_else(|| SceneError::ObjectNotFound(p.object_name.clone()))?;

    let base = p.modifier_name.unwrap_or_else(|| p.modifier_type.clone());
    let name = object.unique_modifier_name(&base);

    let mut modifier = Modifier::new(&name, &p.modifier_type);
    if let Some(properties) = p.properties {
        modifier.properties = properties;
    }
    let properties = modifier.properties.clone();
    object.modifiers.push(modifier);

    Ok(json!({
        "modifier_name": name,
        "type": p.modifier_type,
        "properties": properties,
    }))
}

#[derive(Debug, Deserialize)]
struct ModifierTargetParams {
    object_name: String,
    modifier_name: String,
}

fn remove_modifier(host: &mut SceneHost, p: ModifierTargetParams) -> Result<Value> {
    let object = host
        .scene
        .object_mut(&p.object_name)
        .ok_or_else(|| SceneError::ObjectNotFound(p.object_name.clone()))?;
    let index = object
        .modifiers
        .iter()
        .position(|m| m.name == p.modifier_name)
        .ok_or_else(|| SceneError::ModifierNotFound(p.modifier_name.clone()))?;
    object.modifiers.remove(index);
    Ok(json!({ "removed": p.modifier_name }))
}

fn apply_modifier(host: &mut SceneHost, p: ModifierTargetParams) -> Result<Value> {
    let object = host
        .scene
        .object_mut(&p.object_name)
        .ok_or_else(|| SceneError::ObjectNotFound(p.object_name.clone()))?;
    let index = object
        .modifiers
        .iter()
        .position(|m| m.name == p.modifier_name)
        .ok_or_else(|| SceneError::ModifierNotFound(p.modifier_name.clone()))?;
    // Applying folds the modifier into the mesh and drops it from the stack
    object.modifiers.remove(index);
    Ok(json!({ "applied": p.modifier_name }))
}

#[derive(Debug, Deserialize)]
struct SetNodesInputParams {
    object_name: String,
    modifier_name: String,
    input_name: String,
    value: Value,
}

fn set_geometry_nodes_input(host: &mut SceneHost, p: SetNodesInputParams) -> Result<Value> {
    // Resolve the target socket first; the reference checks below need the
    // scene immutably.
    let (identifier, socket_type) = {
        let object = host
            .scene
            .object(&p.object_name)
            .ok_or_else(|| SceneError::ObjectNotFound(p.object_name.clone()))?;
        let modifier = object
            .modifier(&p.modifier_name)
            .ok_or_else(|| SceneError::ModifierNotFound(p.modifier_name.clone()))?;
        if modifier.modifier_type != "NODES" {
            return Err(SceneError::NotGeometryNodes {
                name: p.modifier_name,
                kind: modifier.modifier_type.clone(),
            }
            .into());
        }
        let group = modifier
            .node_group
            .as_ref()
            .ok_or_else(|| SceneError::NoNodeGroup(p.modifier_name.clone()))?;

        match group
            .inputs
            .iter()
            .find(|input| input.identifier == p.input_name || input.name == p.input_name)
        {
            Some(input) => (input.identifier.clone(), input.socket_type.clone()),
            None => {
                let available = group
                    .inputs
                    .iter()
                    .map(|input| format!("{} ({})", input.identifier, input.name))
                    .collect();
                return Err(SceneError::InputNotFound {
                    input: p.input_name,
                    available,
                }
                .into());
            }
        }
    };

    // Reference sockets must point at something that exists on this host
    if socket_type == "NodeSocketObject" {
        if let Some(target) = p.value.as_str() {
            if host.scene.object(target).is_none() {
                return Err(SceneError::ObjectNotFound(target.to_string()).into());
            }
        }
    } else if socket_type == "NodeSocketMaterial" {
        if let Some(target) = p.value.as_str() {
            if !host.scene.materials.iter().any(|m| m == target) {
                return Err(SceneError::MaterialNotFound(target.to_string()).into());
            }
        }
    }

    let object = host
        .scene
        .object_mut(&p.object_name)
        .ok_or_else(|| SceneError::ObjectNotFound(p.object_name.clone()))?;
    let modifier = object
        .modifier_mut(&p.modifier_name)
        .ok_or_else(|| SceneError::ModifierNotFound(p.modifier_name.clone()))?;
    let group = modifier
        .node_group
        .as_mut()
        .ok_or_else(|| SceneError::NoNodeGroup(p.modifier_name.clone()))?;
    if let Some(input) = group
        .inputs
        .iter_mut()
        .find(|input| input.identifier == identifier)
    {
        input.value = p.value.clone();
    }

    // String values render bare, everything else as JSON text
    let rendered = match &p.value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    };
    Ok(json!({
        "modifier": p.modifier_name,
        "input": identifier,
        "value": rendered,
    }))
}
