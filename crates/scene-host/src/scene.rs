//! In-memory scene graph
//!
//! Objects keep creation order and names are unique within a scene; colliding
//! names get a numeric suffix (`Cube.001`) the way the host application's
//! datablock naming works. Modifier stacks follow the same rule per object.

use serde_json::{Map, Value};

/// Mutable scene state: objects in creation order plus scene-level materials
#[derive(Debug, Clone)]
pub struct Scene {
    pub name: String,
    objects: Vec<SceneObject>,
    pub materials: Vec<String>,
}

impl Scene {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            objects: Vec::new(),
            materials: Vec::new(),
        }
    }

    /// The default startup scene: a cube, a light, and a camera
    pub fn default_startup() -> Self {
        let mut scene = Scene::new("Scene");
        scene.add_object(SceneObject::mesh("Cube", MeshStats::cube()));
        scene.add_object(SceneObject::new("Light", "LIGHT"));
        scene.add_object(SceneObject::new("Camera", "CAMERA"));
        scene.materials.push("Material".into());
        scene
    }

    /// Insert an object, uniquifying its name on collision; returns the final name
    pub fn add_object(&mut self, mut object: SceneObject) -> String {
        let name = uniquify(&object.name, |candidate| {
            self.objects.iter().any(|o| o.name == candidate)
        });
        object.name = name.clone();
        self.objects.push(object);
        name
    }

    pub fn object(&self, name: &str) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.name == name)
    }

    pub fn object_mut(&mut self, name: &str) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|o| o.name == name)
    }

    pub fn remove_object(&mut self, name: &str) -> bool {
        match self.objects.iter().position(|o| o.name == name) {
            Some(index) => {
                self.objects.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }
}

/// One object in the scene graph
#[derive(Debug, Clone)]
pub struct SceneObject {
    pub name: String,
    /// Host object kind, e.g. `MESH`, `LIGHT`, `CAMERA`
    pub object_type: String,
    pub location: [f64; 3],
    pub rotation: [f64; 3],
    pub scale: [f64; 3],
    pub visible: bool,
    pub materials: Vec<String>,
    pub mesh: Option<MeshStats>,
    pub modifiers: Vec<Modifier>,
}

impl SceneObject {
    pub fn new(name: impl Into<String>, object_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            object_type: object_type.into(),
            location: [0.0; 3],
            rotation: [0.0; 3],
            scale: [1.0; 3],
            visible: true,
            materials: Vec::new(),
            mesh: None,
            modifiers: Vec::new(),
        }
    }

    pub fn mesh(name: impl Into<String>, stats: MeshStats) -> Self {
        let mut object = Self::new(name, "MESH");
        object.mesh = Some(stats);
        object
    }

    pub fn modifier(&self, name: &str) -> Option<&Modifier> {
        self.modifiers.iter().find(|m| m.name == name)
    }

    pub fn modifier_mut(&mut self, name: &str) -> Option<&mut Modifier> {
        self.modifiers.iter_mut().find(|m| m.name == name)
    }

    /// Stack-unique modifier name derived from `base`
    pub fn unique_modifier_name(&self, base: &str) -> String {
        uniquify(base, |candidate| {
            self.modifiers.iter().any(|m| m.name == candidate)
        })
    }
}

/// Mesh element counts, reported by `get_object_info`
#[derive(Debug, Clone, Copy)]
pub struct MeshStats {
    pub vertices: usize,
    pub edges: usize,
    pub polygons: usize,
}

impl MeshStats {
    pub fn cube() -> Self {
        Self {
            vertices: 8,
            edges: 12,
            polygons: 6,
        }
    }
}

/// One entry in an object's modifier stack
#[derive(Debug, Clone)]
pub struct Modifier {
    pub name: String,
    /// Modifier kind, e.g. `SUBSURF`, `BEVEL`, `NODES`
    pub modifier_type: String,
    pub properties: Map<String, Value>,
    /// Present only for `NODES` modifiers with a group assigned
    pub node_group: Option<NodeGroup>,
}

impl Modifier {
    pub fn new(name: impl Into<String>, modifier_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            modifier_type: modifier_type.into(),
            properties: Map::new(),
            node_group: None,
        }
    }
}

/// Geometry nodes group exposed through a `NODES` modifier
#[derive(Debug, Clone)]
pub struct NodeGroup {
    pub name: String,
    pub inputs: Vec<NodeInput>,
}

/// One input socket on a node group interface
#[derive(Debug, Clone)]
pub struct NodeInput {
    /// Stable identifier, e.g. `Socket_2`
    pub identifier: String,
    /// Display name shown in the host UI
    pub name: String,
    /// Socket kind, e.g. `NodeSocketFloat`, `NodeSocketObject`
    pub socket_type: String,
    pub value: Value,
}

fn uniquify(base: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(base) {
        return base.to_string();
    }
    let mut counter = 1;
    loop {
        let candidate = format!("{base}.{counter:03}");
        if !taken(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startup_scene_shape() {
        let scene = Scene::default_startup();
        assert_eq!(scene.name, "Scene");
        assert_eq!(scene.object_count(), 3);
        assert!(scene.object("Cube").unwrap().mesh.is_some());
        assert_eq!(scene.object("Camera").unwrap().object_type, "CAMERA");
        assert_eq!(scene.materials, vec!["Material"]);
    }

    #[test]
    fn colliding_object_names_get_suffixes() {
        let mut scene = Scene::new("Test");
        assert_eq!(scene.add_object(SceneObject::new("Cube", "MESH")), "Cube");
        assert_eq!(
            scene.add_object(SceneObject::new("Cube", "MESH")),
            "Cube.001"
        );
        assert_eq!(
            scene.add_object(SceneObject::new("Cube", "MESH")),
            "Cube.002"
        );
        assert_eq!(scene.object_count(), 3);
    }

    #[test]
    fn remove_object_by_name() {
        let mut scene = Scene::new("Test");
        scene.add_object(SceneObject::new("Cube", "MESH"));
        assert!(scene.remove_object("Cube"));
        assert!(!scene.remove_object("Cube"));
        assert_eq!(scene.object_count(), 0);
    }

    #[test]
    fn modifier_names_are_stack_unique() {
        let mut object = SceneObject::new("Cube", "MESH");
        object.modifiers.push(Modifier::new("Bevel", "BEVEL"));
        assert_eq!(object.unique_modifier_name("Bevel"), "Bevel.001");
        assert_eq!(object.unique_modifier_name("Array"), "Array");
    }
}
