pub mod geometry;
pub mod serialization;

use geometry::MeshData;
use glam::Vec3;

/// The fixed primitive catalog. A typed enum instead of string-keyed labels so
/// panel events cannot reference an unknown shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ShapeKind {
    Sphere,
    Icosahedron,
    Octahedron,
    Tetrahedron,
    Cube,
    Cone,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 6] = [
        ShapeKind::Sphere,
        ShapeKind::Icosahedron,
        ShapeKind::Octahedron,
        ShapeKind::Tetrahedron,
        ShapeKind::Cube,
        ShapeKind::Cone,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ShapeKind::Sphere => "Esfera",
            ShapeKind::Icosahedron => "Icosaedro",
            ShapeKind::Octahedron => "Octaedro",
            ShapeKind::Tetrahedron => "Tetraedro",
            ShapeKind::Cube => "Cubo",
            ShapeKind::Cone => "Cono",
        }
    }

    /// Hard-coded catalog dimensions.
    pub fn tessellate(self) -> MeshData {
        match self {
            ShapeKind::Sphere => geometry::uv_sphere(75.0, 20, 10),
            ShapeKind::Icosahedron => geometry::icosahedron(75.0, 1),
            ShapeKind::Octahedron => geometry::octahedron(75.0, 2),
            ShapeKind::Tetrahedron => geometry::tetrahedron(75.0, 0),
            ShapeKind::Cube => geometry::boxed(100.0, 100.0, 100.0, 4),
            ShapeKind::Cone => geometry::cone(75.0, 120.0, 40, 5),
        }
    }
}

/// Whether enabling a shape hides the rest (the single-shape panel variants)
/// or leaves the others alone (the gallery variant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum VisibilityMode {
    Single,
    Gallery,
}

/// The one material every mesh shares. Mutations here are globally visible
/// across all shapes, which is the point: the panel edits this value and the
/// renderer reads it every frame.
pub struct MaterialState {
    /// Picker value; the gradient re-derives from this.
    pub base_color: [f32; 3],
    /// Effective color after the gradient blend.
    pub color: [f32; 3],
    pub opacity: f32,
    pub wireframe: bool,
    pub texture: Option<image::RgbaImage>,
    /// Set on texture assign/clear, cleared by the renderer after upload.
    pub texture_dirty: bool,
}

pub const DEFAULT_COLOR: [f32; 3] = [0.0, 1.0, 0.0];

impl Default for MaterialState {
    fn default() -> Self {
        Self {
            base_color: DEFAULT_COLOR,
            color: DEFAULT_COLOR,
            opacity: 1.0,
            wireframe: false,
            texture: None,
            texture_dirty: false,
        }
    }
}

pub struct SceneShape {
    pub kind: ShapeKind,
    pub visible: bool,
    pub scale: f32,
    /// Edge overlay is tessellated once with the mesh and only ever
    /// visibility-toggled afterwards, never regenerated.
    pub overlay_visible: bool,
    pub mesh: MeshData,
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn max_extent(&self) -> f32 {
        let e = self.extent();
        e.x.max(e.y).max(e.z)
    }

    pub fn union(self, other: Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

pub const SCALE_RANGE: (f32, f32) = (0.1, 2.0);

pub struct SceneGraph {
    shapes: Vec<SceneShape>,
    pub material: MaterialState,
    pub mode: VisibilityMode,
    /// Animation-panel toggles: hide every fill / force every edge overlay,
    /// without touching the per-shape flags.
    pub show_model: bool,
    pub show_edges: bool,
}

impl SceneGraph {
    /// Build one mesh per catalog entry, all initially hidden.
    pub fn new(mode: VisibilityMode) -> Self {
        let shapes = ShapeKind::ALL
            .into_iter()
            .map(|kind| SceneShape {
                kind,
                visible: false,
                scale: 1.0,
                overlay_visible: false,
                mesh: kind.tessellate(),
            })
            .collect();
        Self {
            shapes,
            material: MaterialState::default(),
            mode,
            show_model: true,
            show_edges: false,
        }
    }

    pub fn shapes(&self) -> &[SceneShape] {
        &self.shapes
    }

    pub fn is_visible(&self, kind: ShapeKind) -> bool {
        self.shape(kind).visible
    }

    pub fn visible_count(&self) -> usize {
        self.shapes.iter().filter(|s| s.visible).count()
    }

    // Shapes are built in `ShapeKind::ALL` order, which matches the enum's
    // declaration order, so the discriminant is the index.
    fn shape(&self, kind: ShapeKind) -> &SceneShape {
        &self.shapes[kind as usize]
    }

    fn shape_mut(&mut self, kind: ShapeKind) -> &mut SceneShape {
        &mut self.shapes[kind as usize]
    }

    /// Single mode: reset every flag, then set the chosen one. Gallery mode:
    /// touch only the chosen shape.
    pub fn toggle_shape(&mut self, kind: ShapeKind, enabled: bool) {
        if self.mode == VisibilityMode::Single {
            for shape in &mut self.shapes {
                shape.visible = false;
            }
        }
        self.shape_mut(kind).visible = enabled;
    }

    pub fn set_visible(&mut self, kind: ShapeKind, visible: bool) {
        self.shape_mut(kind).visible = visible;
    }

    /// Entering `Single` mode re-establishes exclusivity: the first visible
    /// shape in catalog order stays, the rest are hidden.
    pub fn set_mode(&mut self, mode: VisibilityMode) {
        self.mode = mode;
        if mode == VisibilityMode::Single {
            let mut kept = false;
            for shape in &mut self.shapes {
                if shape.visible {
                    shape.visible = !kept;
                    kept = true;
                }
            }
        }
    }

    /// Sets the picker color. The material is shared, so every mesh picks
    /// this up on the next frame.
    pub fn set_base_color(&mut self, color: [f32; 3]) {
        self.material.base_color = color;
        self.material.color = color;
    }

    /// `modified = lerp(base, white, |g|)`. The absolute value is deliberate:
    /// g and -g of equal magnitude must produce identical colors.
    pub fn apply_gradient(&mut self, gradient: f32) {
        let t = gradient.abs().clamp(0.0, 1.0);
        self.material.color = lerp_color(self.material.base_color, [1.0, 1.0, 1.0], t);
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        self.material.opacity = opacity.clamp(0.0, 1.0);
    }

    /// Uniform scale applied to every mesh, clamped to the panel range.
    /// Returns the clamped value so the panel can stay in sync.
    pub fn set_uniform_scale(&mut self, scale: f32) -> f32 {
        let scale = scale.clamp(SCALE_RANGE.0, SCALE_RANGE.1);
        for shape in &mut self.shapes {
            shape.scale = scale;
        }
        scale
    }

    pub fn set_wireframe(&mut self, wireframe: bool) {
        self.material.wireframe = wireframe;
        for shape in &mut self.shapes {
            shape.overlay_visible = wireframe;
        }
    }

    pub fn set_texture(&mut self, texture: image::RgbaImage) {
        self.material.texture = Some(texture);
        self.material.texture_dirty = true;
    }

    pub fn clear_texture(&mut self) {
        if self.material.texture.take().is_some() {
            self.material.texture_dirty = true;
        }
    }

    /// AABB union over the whole catalog (hidden shapes included), scaled by
    /// each mesh's current scale.
    pub fn bounds(&self) -> Option<Aabb> {
        self.shapes
            .iter()
            .filter_map(|shape| {
                let (min, max) = shape.mesh.min_max()?;
                Some(Aabb::new(min * shape.scale, max * shape.scale))
            })
            .reduce(Aabb::union)
    }
}

pub fn lerp_color(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_mode_keeps_exactly_one_visible() {
        let mut scene = SceneGraph::new(VisibilityMode::Single);
        scene.toggle_shape(ShapeKind::Sphere, true);
        scene.toggle_shape(ShapeKind::Cube, true);
        assert_eq!(scene.visible_count(), 1);
        assert!(scene.is_visible(ShapeKind::Cube));
        assert!(!scene.is_visible(ShapeKind::Sphere));

        scene.toggle_shape(ShapeKind::Cube, false);
        assert_eq!(scene.visible_count(), 0);
    }

    #[test]
    fn catalog_order_matches_enum_discriminants() {
        for (index, kind) in ShapeKind::ALL.iter().enumerate() {
            assert_eq!(*kind as usize, index);
        }
        let scene = SceneGraph::new(VisibilityMode::Gallery);
        for kind in ShapeKind::ALL {
            assert_eq!(scene.shapes()[kind as usize].kind, kind);
        }
    }

    #[test]
    fn switching_to_single_mode_restores_exclusivity() {
        let mut scene = SceneGraph::new(VisibilityMode::Gallery);
        scene.toggle_shape(ShapeKind::Sphere, true);
        scene.toggle_shape(ShapeKind::Cube, true);
        scene.toggle_shape(ShapeKind::Cone, true);
        assert_eq!(scene.visible_count(), 3);

        scene.set_mode(VisibilityMode::Single);
        assert_eq!(scene.visible_count(), 1);
        assert!(scene.is_visible(ShapeKind::Sphere));

        // Switching back out changes nothing.
        scene.set_mode(VisibilityMode::Gallery);
        assert_eq!(scene.visible_count(), 1);
    }

    #[test]
    fn gallery_mode_toggles_independently() {
        let mut scene = SceneGraph::new(VisibilityMode::Gallery);
        scene.toggle_shape(ShapeKind::Sphere, true);
        scene.toggle_shape(ShapeKind::Cube, true);
        assert_eq!(scene.visible_count(), 2);
        scene.toggle_shape(ShapeKind::Sphere, false);
        assert!(scene.is_visible(ShapeKind::Cube));
        assert_eq!(scene.visible_count(), 1);
    }

    #[test]
    fn gradient_is_symmetric_in_sign() {
        let mut scene = SceneGraph::new(VisibilityMode::Single);
        scene.set_base_color([1.0, 0.0, 0.0]);
        scene.apply_gradient(0.5);
        let positive = scene.material.color;
        scene.apply_gradient(-0.5);
        assert_eq!(positive, scene.material.color);
        assert_eq!(positive, [1.0, 0.5, 0.5]);
    }

    #[test]
    fn gradient_rederives_from_base_color() {
        let mut scene = SceneGraph::new(VisibilityMode::Single);
        scene.set_base_color([0.0, 0.0, 1.0]);
        scene.apply_gradient(1.0);
        assert_eq!(scene.material.color, [1.0, 1.0, 1.0]);
        scene.apply_gradient(0.0);
        assert_eq!(scene.material.color, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn uniform_scale_applies_to_every_mesh_and_clamps() {
        let mut scene = SceneGraph::new(VisibilityMode::Gallery);
        assert_eq!(scene.set_uniform_scale(1.4), 1.4);
        assert!(scene.shapes().iter().all(|s| s.scale == 1.4));
        assert_eq!(scene.set_uniform_scale(5.0), 2.0);
        assert!(scene.shapes().iter().all(|s| s.scale == 2.0));
        assert_eq!(scene.set_uniform_scale(0.0), 0.1);
    }

    #[test]
    fn wireframe_toggles_are_stable_and_do_not_accumulate() {
        let mut scene = SceneGraph::new(VisibilityMode::Gallery);
        let segment_counts: Vec<usize> = scene
            .shapes()
            .iter()
            .map(|s| s.mesh.edge_positions.len())
            .collect();
        for _ in 0..10 {
            scene.set_wireframe(true);
            assert!(scene.shapes().iter().all(|s| s.overlay_visible));
            scene.set_wireframe(false);
            assert!(scene.shapes().iter().all(|s| !s.overlay_visible));
        }
        let after: Vec<usize> = scene
            .shapes()
            .iter()
            .map(|s| s.mesh.edge_positions.len())
            .collect();
        assert_eq!(segment_counts, after);
    }

    #[test]
    fn texture_clear_only_marks_dirty_when_assigned() {
        let mut scene = SceneGraph::new(VisibilityMode::Single);
        scene.clear_texture();
        assert!(!scene.material.texture_dirty);
        scene.set_texture(image::RgbaImage::new(2, 2));
        assert!(scene.material.texture_dirty);
        scene.material.texture_dirty = false;
        scene.clear_texture();
        assert!(scene.material.texture.is_none());
        assert!(scene.material.texture_dirty);
    }

    #[test]
    fn bounds_cover_the_largest_shape() {
        let scene = SceneGraph::new(VisibilityMode::Gallery);
        let bounds = scene.bounds().unwrap();
        // Spheres of radius 75 dominate the 100^3 cube.
        assert!(bounds.max_extent() >= 150.0 - 1.0);
        assert!(bounds.center().length() < 5.0);
    }

    #[test]
    fn end_to_end_panel_scenario() {
        // Default state: everything hidden, green material.
        let mut scene = SceneGraph::new(VisibilityMode::Single);
        assert_eq!(scene.visible_count(), 0);
        assert_eq!(scene.material.color, DEFAULT_COLOR);

        scene.toggle_shape(ShapeKind::Cube, true);
        assert!(scene.is_visible(ShapeKind::Cube));
        assert_eq!(scene.visible_count(), 1);
        assert_eq!(scene.material.color, DEFAULT_COLOR);

        scene.set_base_color([1.0, 0.0, 0.0]);
        assert_eq!(scene.material.color, [1.0, 0.0, 0.0]);

        scene.apply_gradient(-0.5);
        assert_eq!(
            scene.material.color,
            lerp_color([1.0, 0.0, 0.0], [1.0, 1.0, 1.0], 0.5)
        );
    }
}
