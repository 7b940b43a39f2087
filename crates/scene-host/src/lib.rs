//! # scene-host
//!
//! Reference host for the scene bridge: an in-memory scene graph plus the
//! full registered command surface agents expect. The `scene-hostd` binary
//! wires it to a [`scene_bridge_server::BridgeServer`].
//!
//! Host state is only ever touched by the executor that owns it, so nothing
//! in here needs locks.

pub mod assets;
pub mod error;
pub mod handlers;
pub mod scene;

pub use assets::AssetLibrary;
pub use error::SceneError;
pub use handlers::register_commands;
pub use scene::Scene;

use std::path::Path;

/// Everything a running host owns: the scene graph and the configured asset
/// libraries
pub struct SceneHost {
    pub scene: Scene,
    asset_libraries: Vec<AssetLibrary>,
}

impl SceneHost {
    pub fn new(scene: Scene) -> Self {
        Self {
            scene,
            asset_libraries: Vec::new(),
        }
    }

    /// Host with the default startup scene and no libraries
    pub fn default_startup() -> Self {
        Self::new(Scene::default_startup())
    }

    /// Configure an asset library; the path is checked lazily at scan time
    pub fn add_asset_library(&mut self, name: impl Into<String>, path: impl AsRef<Path>) {
        self.asset_libraries.push(AssetLibrary {
            name: name.into(),
            path: path.as_ref().to_path_buf(),
        });
    }

    pub fn asset_libraries(&self) -> &[AssetLibrary] {
        &self.asset_libraries
    }

    pub fn library(&self, name: &str) -> Option<&AssetLibrary> {
        self.asset_libraries.iter().find(|l| l.name == name)
    }
}

impl Default for SceneHost {
    fn default() -> Self {
        Self::default_startup()
    }
}
