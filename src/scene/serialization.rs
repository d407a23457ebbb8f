use crate::scene::{SceneGraph, ShapeKind, VisibilityMode};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SerializationError>;

/// Everything the panel can edit, captured as a loadable preset. Textures are
/// deliberately not persisted; only the panel-editable values are.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScenePreset {
    pub mode: VisibilityMode,
    pub visible: Vec<ShapeKind>,
    pub base_color: [f32; 3],
    pub opacity: f32,
    pub scale: f32,
    pub gradient: f32,
    pub wireframe: bool,
    pub action_weights: Vec<f32>,
    pub time_scale: f32,
}

impl ScenePreset {
    pub fn capture(
        scene: &SceneGraph,
        gradient: f32,
        action_weights: Vec<f32>,
        time_scale: f32,
    ) -> Self {
        Self {
            mode: scene.mode,
            visible: scene
                .shapes()
                .iter()
                .filter(|shape| shape.visible)
                .map(|shape| shape.kind)
                .collect(),
            base_color: scene.material.base_color,
            opacity: scene.material.opacity,
            scale: scene.shapes().first().map(|s| s.scale).unwrap_or(1.0),
            gradient,
            wireframe: scene.material.wireframe,
            action_weights,
            time_scale,
        }
    }

    /// Writes the preset back into the scene. Mixer weights and time scale are
    /// returned to the caller because the mixer lives outside the scene graph.
    pub fn apply(&self, scene: &mut SceneGraph) {
        for kind in ShapeKind::ALL {
            scene.set_visible(kind, self.visible.contains(&kind));
        }
        // A hand-edited Single preset may list several shapes; set_mode
        // re-establishes exclusivity.
        scene.set_mode(self.mode);
        scene.set_base_color(self.base_color);
        scene.apply_gradient(self.gradient);
        scene.set_opacity(self.opacity);
        scene.set_uniform_scale(self.scale);
        scene.set_wireframe(self.wireframe);
    }
}

pub fn save_preset_to_file(preset: &ScenePreset, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(preset)?;
    std::fs::write(path, json)?;
    Ok(())
}

pub fn load_preset_from_file(path: &Path) -> Result<ScenePreset> {
    let json = std::fs::read_to_string(path)?;
    let preset: ScenePreset = serde_json::from_str(&json)?;
    Ok(preset)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_preset() -> ScenePreset {
        ScenePreset {
            mode: VisibilityMode::Gallery,
            visible: vec![ShapeKind::Cube, ShapeKind::Cone],
            base_color: [1.0, 0.0, 0.0],
            opacity: 0.8,
            scale: 1.5,
            gradient: -0.5,
            wireframe: true,
            action_weights: vec![1.0, 0.25, 0.0],
            time_scale: 0.5,
        }
    }

    #[test]
    fn preset_roundtrips_through_json() {
        let preset = sample_preset();
        let json = serde_json::to_string_pretty(&preset).unwrap();
        let loaded: ScenePreset = serde_json::from_str(&json).unwrap();
        assert_eq!(preset, loaded);
    }

    #[test]
    fn preset_applies_panel_state_to_scene() {
        let mut scene = SceneGraph::new(VisibilityMode::Single);
        sample_preset().apply(&mut scene);

        assert_eq!(scene.mode, VisibilityMode::Gallery);
        assert_eq!(scene.visible_count(), 2);
        assert!(scene.is_visible(ShapeKind::Cube));
        assert!(scene.is_visible(ShapeKind::Cone));
        assert_eq!(scene.material.base_color, [1.0, 0.0, 0.0]);
        // Gradient -0.5 blends halfway to white off the base color.
        assert_eq!(scene.material.color, [1.0, 0.5, 0.5]);
        assert!(scene.material.wireframe);
        assert!(scene.shapes().iter().all(|s| s.scale == 1.5));
        assert!(scene.shapes().iter().all(|s| s.overlay_visible));
    }

    #[test]
    fn single_mode_preset_with_several_shapes_keeps_one() {
        let mut preset = sample_preset();
        preset.mode = VisibilityMode::Single;

        let mut scene = SceneGraph::new(VisibilityMode::Gallery);
        preset.apply(&mut scene);
        assert_eq!(scene.mode, VisibilityMode::Single);
        assert_eq!(scene.visible_count(), 1);
        assert!(scene.is_visible(ShapeKind::Cube));
    }

    #[test]
    fn capture_reflects_scene_state() {
        let mut scene = SceneGraph::new(VisibilityMode::Single);
        scene.toggle_shape(ShapeKind::Sphere, true);
        scene.set_base_color([0.2, 0.4, 0.6]);
        scene.set_uniform_scale(0.5);

        let preset = ScenePreset::capture(&scene, 0.0, vec![1.0, 0.0, 0.0], 1.0);
        assert_eq!(preset.mode, VisibilityMode::Single);
        assert_eq!(preset.visible, vec![ShapeKind::Sphere]);
        assert_eq!(preset.base_color, [0.2, 0.4, 0.6]);
        assert_eq!(preset.scale, 0.5);
    }

    #[test]
    fn save_load_roundtrip_via_file() {
        let preset = sample_preset();

        let mut path = std::env::temp_dir();
        let nonce = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        path.push(format!(
            "polyviz_preset_{}_{}.json",
            std::process::id(),
            nonce
        ));

        save_preset_to_file(&preset, &path).unwrap();
        let loaded = load_preset_from_file(&path).unwrap();
        assert_eq!(preset, loaded);

        let _ = std::fs::remove_file(path);
    }
}
