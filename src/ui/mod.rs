use crate::anim::{ActionKind, AnimationMixer, SINGLE_STEP_SIZE};
use crate::scene::{SceneGraph, ShapeKind, VisibilityMode, SCALE_RANGE};

/// Mirror of every panel widget's current value; the egui pass edits these and
/// pushes changes into the scene/mixer the moment a widget reports one.
pub struct PanelState {
    shape_enabled: [bool; ShapeKind::ALL.len()],
    pub color: [f32; 3],
    pub opacity: f32,
    pub scale: f32,
    pub gradient: f32,
    pub wireframe: bool,
    pub crossfade_duration: f32,
}

/// Actions the panel requests but cannot perform itself (dialogs, camera,
/// preset IO); the app executes them after the egui pass.
#[derive(Default)]
pub struct PanelResponse {
    pub load_texture: bool,
    pub reset_texture: bool,
    pub frame_camera: bool,
    pub save_preset: bool,
    pub load_preset: bool,
}

impl PanelState {
    pub fn new(scene: &SceneGraph) -> Self {
        let mut state = Self {
            shape_enabled: [false; ShapeKind::ALL.len()],
            color: scene.material.base_color,
            opacity: scene.material.opacity,
            scale: 1.0,
            gradient: 0.0,
            wireframe: scene.material.wireframe,
            crossfade_duration: crate::anim::DEFAULT_CROSSFADE_DURATION,
        };
        state.sync_from(scene);
        state
    }

    /// Re-reads the widget mirrors from the scene. Needed after single-mode
    /// toggles (which reset sibling checkboxes) and after preset loads.
    pub fn sync_from(&mut self, scene: &SceneGraph) {
        for (flag, kind) in self.shape_enabled.iter_mut().zip(ShapeKind::ALL) {
            *flag = scene.is_visible(kind);
        }
        self.color = scene.material.base_color;
        self.opacity = scene.material.opacity;
        self.wireframe = scene.material.wireframe;
        if let Some(shape) = scene.shapes().first() {
            self.scale = shape.scale;
        }
    }

    pub fn gradient(&self) -> f32 {
        self.gradient
    }

    pub fn set_gradient(&mut self, gradient: f32) {
        self.gradient = gradient;
    }

    pub fn draw(
        &mut self,
        ctx: &egui::Context,
        scene: &mut SceneGraph,
        mixer: &mut AnimationMixer,
    ) -> PanelResponse {
        let mut response = PanelResponse::default();

        egui::Window::new("Panel de Control")
            .default_width(310.0)
            .show(ctx, |ui| {
                egui::CollapsingHeader::new("Formas del Poligono")
                    .default_open(true)
                    .show(ui, |ui| {
                        let mut mode = scene.mode;
                        ui.horizontal(|ui| {
                            ui.selectable_value(&mut mode, VisibilityMode::Single, "Unica");
                            ui.selectable_value(&mut mode, VisibilityMode::Gallery, "Galeria");
                        });
                        if mode != scene.mode {
                            // Entering Single mode may hide shapes; resync.
                            scene.set_mode(mode);
                            for (flag, kind) in self.shape_enabled.iter_mut().zip(ShapeKind::ALL) {
                                *flag = scene.is_visible(kind);
                            }
                        }
                        let mut toggled = None;
                        for (flag, kind) in self.shape_enabled.iter_mut().zip(ShapeKind::ALL) {
                            if ui.checkbox(flag, kind.label()).changed() {
                                toggled = Some((kind, *flag));
                            }
                        }
                        if let Some((kind, enabled)) = toggled {
                            scene.toggle_shape(kind, enabled);
                            // Single mode just reset the siblings.
                            for (flag, kind) in self.shape_enabled.iter_mut().zip(ShapeKind::ALL) {
                                *flag = scene.is_visible(kind);
                            }
                        }
                    });

                egui::CollapsingHeader::new("Propiedades del Poligono")
                    .default_open(true)
                    .show(ui, |ui| {
                        if ui.color_edit_button_rgb(&mut self.color).changed() {
                            scene.set_base_color(self.color);
                        }
                        if ui
                            .add(
                                egui::Slider::new(&mut self.opacity, 0.0..=1.0).text("Opacidad"),
                            )
                            .changed()
                        {
                            scene.set_opacity(self.opacity);
                        }
                        if ui
                            .add(
                                egui::Slider::new(&mut self.scale, SCALE_RANGE.0..=SCALE_RANGE.1)
                                    .text("Tamaño"),
                            )
                            .changed()
                        {
                            self.scale = scene.set_uniform_scale(self.scale);
                        }
                        if ui
                            .add(
                                egui::Slider::new(&mut self.gradient, -1.0..=1.0)
                                    .step_by(0.1)
                                    .text("Degradado de Color"),
                            )
                            .changed()
                        {
                            scene.apply_gradient(self.gradient);
                        }
                    });

                egui::CollapsingHeader::new("Material y Textura")
                    .default_open(true)
                    .show(ui, |ui| {
                        if ui.checkbox(&mut self.wireframe, "Wireframe").changed() {
                            scene.set_wireframe(self.wireframe);
                        }
                        ui.horizontal(|ui| {
                            if ui.button("Cargar Textura").clicked() {
                                response.load_texture = true;
                            }
                            if ui.button("Reiniciar Poligono").clicked() {
                                response.reset_texture = true;
                            }
                        });
                    });

                egui::CollapsingHeader::new("Animacion")
                    .default_open(false)
                    .show(ui, |ui| {
                        ui.checkbox(&mut scene.show_model, "Mostrar Modelo");
                        ui.checkbox(&mut scene.show_edges, "Mostrar Aristas");
                        ui.horizontal(|ui| {
                            if ui.button("Activar Todas").clicked() {
                                mixer.activate_all();
                            }
                            if ui.button("Desactivar Todas").clicked() {
                                mixer.deactivate_all();
                            }
                        });
                        ui.horizontal(|ui| {
                            let pause_label =
                                if mixer.is_paused() { "Continuar" } else { "Pausar" };
                            if ui.button(pause_label).clicked() {
                                mixer.pause_continue();
                            }
                            if ui.button("Paso a Paso").clicked() {
                                mixer.single_step(SINGLE_STEP_SIZE);
                            }
                        });
                        for action in ActionKind::ALL {
                            let mut weight = mixer.weight(action);
                            if ui
                                .add(egui::Slider::new(&mut weight, 0.0..=1.0).text(action.label()))
                                .changed()
                            {
                                mixer.set_weight(action, weight);
                            }
                        }
                        ui.add(
                            egui::Slider::new(&mut self.crossfade_duration, 0.0..=5.0)
                                .text("Duracion de Fundido"),
                        );
                        for (from, to) in crossfade_pairs() {
                            if ui
                                .button(format!("{} → {}", from.label(), to.label()))
                                .clicked()
                            {
                                mixer.prepare_cross_fade(from, to, self.crossfade_duration);
                            }
                        }
                        let mut time_scale = mixer.time_scale();
                        if ui
                            .add(egui::Slider::new(&mut time_scale, 0.0..=2.0).text("Velocidad"))
                            .changed()
                        {
                            mixer.set_time_scale(time_scale);
                        }
                    });

                ui.separator();
                ui.horizontal(|ui| {
                    if ui.button("Encuadrar Camara").clicked() {
                        response.frame_camera = true;
                    }
                    if ui.button("Guardar Preset").clicked() {
                        response.save_preset = true;
                    }
                    if ui.button("Cargar Preset").clicked() {
                        response.load_preset = true;
                    }
                });
            });

        response
    }
}

fn crossfade_pairs() -> [(ActionKind, ActionKind); 3] {
    [
        (ActionKind::Spin, ActionKind::Bob),
        (ActionKind::Bob, ActionKind::Pulse),
        (ActionKind::Pulse, ActionKind::Spin),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panel_state_mirrors_the_scene() {
        let mut scene = SceneGraph::new(VisibilityMode::Single);
        scene.toggle_shape(ShapeKind::Cone, true);
        scene.set_base_color([0.5, 0.25, 0.0]);
        scene.set_uniform_scale(1.25);

        let panel = PanelState::new(&scene);
        assert_eq!(panel.color, [0.5, 0.25, 0.0]);
        assert_eq!(panel.scale, 1.25);
        let enabled: Vec<bool> = ShapeKind::ALL
            .iter()
            .map(|k| scene.is_visible(*k))
            .collect();
        assert_eq!(panel.shape_enabled.to_vec(), enabled);
    }

    #[test]
    fn sync_follows_single_mode_resets() {
        let mut scene = SceneGraph::new(VisibilityMode::Single);
        let mut panel = PanelState::new(&scene);
        scene.toggle_shape(ShapeKind::Sphere, true);
        scene.toggle_shape(ShapeKind::Cube, true);
        panel.sync_from(&scene);
        assert_eq!(
            panel.shape_enabled.iter().filter(|v| **v).count(),
            1,
            "only the last enabled shape stays checked"
        );
    }
}
