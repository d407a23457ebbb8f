mod egui_host;
mod timing;

use crate::anim::{ActionKind, AnimationMixer};
use crate::render::{OrbitCamera, RenderContext};
use crate::scene::serialization::{self, ScenePreset};
use crate::scene::{SceneGraph, VisibilityMode};
use crate::ui::{PanelResponse, PanelState};
use egui_host::EguiHost;
use timing::FrameTiming;

use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowAttributes, WindowId};

const WINDOW_TITLE: &str = "Polyviz - Galeria de Primitivas";

type TextureResult = Result<image::RgbaImage, String>;

pub struct App {
    window: Option<Arc<Window>>,
    render: Option<RenderContext>,
    egui: Option<EguiHost>,
    scene: SceneGraph,
    mixer: AnimationMixer,
    panel: PanelState,
    camera: OrbitCamera,
    timing: FrameTiming,
    target_frame_duration: Duration,
    next_frame_time: Instant,
    /// Completion channel for an in-flight texture decode. There is no
    /// cancellation; a newer request simply replaces the receiver.
    texture_rx: Option<mpsc::Receiver<TextureResult>>,
    orbit_drag: bool,
    cursor_pos: Option<(f32, f32)>,
}

impl App {
    fn new() -> Self {
        let scene = SceneGraph::new(VisibilityMode::Single);
        let panel = PanelState::new(&scene);
        Self {
            window: None,
            render: None,
            egui: None,
            scene,
            mixer: AnimationMixer::new(),
            panel,
            camera: OrbitCamera::default(),
            timing: FrameTiming::new(WINDOW_TITLE.to_string()),
            target_frame_duration: Duration::from_millis(16),
            next_frame_time: Instant::now(),
            texture_rx: None,
            orbit_drag: false,
            cursor_pos: None,
        }
    }

    fn update_target_frame_duration(&mut self, window: &Window) {
        let mut target = Duration::from_millis(16);
        if let Some(monitor) = window.current_monitor() {
            if let Some(millihz) = monitor.refresh_rate_millihertz() {
                let hz = millihz as f32 / 1000.0;
                if hz > 1.0 {
                    target = Duration::from_secs_f32(1.0 / hz);
                }
            }
        }
        self.target_frame_duration = target;
        self.next_frame_time = Instant::now() + self.target_frame_duration;
    }

    fn handle_resize(&mut self, new_size: PhysicalSize<u32>) {
        if let Some(render) = &mut self.render {
            render.resize(new_size);
        }
    }

    fn poll_texture_load(&mut self) {
        let Some(rx) = &self.texture_rx else {
            return;
        };
        match rx.try_recv() {
            Ok(Ok(img)) => {
                log::info!("Texture loaded ({}x{})", img.width(), img.height());
                self.scene.set_texture(img);
                self.texture_rx = None;
            }
            Ok(Err(message)) => {
                log::warn!("Failed to load texture: {}", message);
                self.texture_rx = None;
            }
            Err(mpsc::TryRecvError::Empty) => {}
            Err(mpsc::TryRecvError::Disconnected) => {
                self.texture_rx = None;
            }
        }
    }

    fn frame(&mut self) {
        let Some(window) = self.window.clone() else {
            return;
        };
        self.timing.update(Some(&window), Instant::now());
        let dt = self.timing.frame_dt;

        self.poll_texture_load();

        let mut response = PanelResponse::default();
        let paint = {
            let Some(egui) = &mut self.egui else {
                return;
            };
            let scene = &mut self.scene;
            let mixer = &mut self.mixer;
            let panel = &mut self.panel;
            egui.run_ui(&window, |ctx| {
                response = panel.draw(ctx, scene, mixer);
            })
        };

        if response.load_texture {
            self.handle_load_texture_action();
        }
        if response.reset_texture {
            self.scene.clear_texture();
        }
        if response.frame_camera {
            self.camera.frame_bounds(self.scene.bounds());
        }
        if response.save_preset {
            self.handle_save_preset_action();
        }
        if response.load_preset {
            self.handle_load_preset_action();
        }

        self.camera.update(dt);
        self.mixer.update(dt);

        let Some(render) = &mut self.render else {
            return;
        };
        if self.scene.material.texture_dirty {
            render.apply_material_texture(self.scene.material.texture.as_ref());
            self.scene.material.texture_dirty = false;
        }
        if let Err(err) = render.render_frame(&self.scene, &self.camera, self.mixer.sample(), paint)
        {
            log::error!("Frame skipped: {}", err);
        }
    }

    fn handle_load_texture_action(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter(
                "Imagenes",
                &["png", "jpg", "jpeg", "bmp", "gif", "tga", "webp"],
            )
            .pick_file()
        else {
            // Cancelled dialog leaves the material untouched.
            return;
        };

        log::info!("Loading texture: {}", path.display());
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let result = image::open(&path)
                .map(|img| img.to_rgba8())
                .map_err(|err| err.to_string());
            // The receiver may already have been replaced by a newer request.
            let _ = tx.send(result);
        });
        self.texture_rx = Some(rx);
    }

    fn handle_save_preset_action(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Preset", &["json"])
            .set_file_name("preset.json")
            .save_file()
        else {
            return;
        };
        let weights = ActionKind::ALL
            .iter()
            .map(|action| self.mixer.weight(*action))
            .collect();
        let preset = ScenePreset::capture(
            &self.scene,
            self.panel.gradient(),
            weights,
            self.mixer.time_scale(),
        );
        match serialization::save_preset_to_file(&preset, &path) {
            Ok(()) => log::info!("Preset saved to {}", path.display()),
            Err(err) => log::warn!("Failed to save preset: {}", err),
        }
    }

    fn handle_load_preset_action(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Preset", &["json"])
            .pick_file()
        else {
            return;
        };
        match serialization::load_preset_from_file(&path) {
            Ok(preset) => {
                preset.apply(&mut self.scene);
                for (action, weight) in ActionKind::ALL.iter().zip(&preset.action_weights) {
                    self.mixer.set_weight(*action, *weight);
                }
                self.mixer.set_time_scale(preset.time_scale);
                self.panel.set_gradient(preset.gradient);
                self.panel.sync_from(&self.scene);
                log::info!("Preset loaded from {}", path.display());
            }
            Err(err) => log::warn!("Failed to load preset: {}", err),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = WindowAttributes::default()
            .with_title(WINDOW_TITLE)
            .with_inner_size(PhysicalSize::new(1280u32, 720u32))
            .with_resizable(true);

        let window = Arc::new(
            event_loop
                .create_window(window_attrs)
                .expect("Failed to create window"),
        );

        match RenderContext::new(window.clone(), &self.scene) {
            Ok(render) => self.render = Some(render),
            Err(err) => {
                log::error!("Rendering unavailable: {}", err);
                event_loop.exit();
                return;
            }
        }
        self.egui = Some(EguiHost::new(&window));

        // Frame the whole catalog on startup.
        self.camera.frame_bounds(self.scene.bounds());

        self.update_target_frame_duration(&window);
        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let consumed = match (&mut self.egui, &self.window) {
            (Some(egui), Some(window)) => egui.on_window_event(window, &event),
            _ => false,
        };

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.physical_key == PhysicalKey::Code(KeyCode::Escape) {
                    event_loop.exit();
                }
            }
            WindowEvent::Resized(new_size) => {
                self.handle_resize(new_size);
                if let Some(window) = self.window.clone() {
                    self.update_target_frame_duration(&window);
                }
            }
            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(window) = self.window.as_ref() {
                    let size = window.inner_size();
                    self.handle_resize(size);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let pos = (position.x as f32, position.y as f32);
                if self.orbit_drag && !consumed {
                    if let Some((last_x, last_y)) = self.cursor_pos {
                        self.camera.on_drag(pos.0 - last_x, pos.1 - last_y);
                    }
                }
                self.cursor_pos = Some(pos);
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor_pos = None;
                self.orbit_drag = false;
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if button == MouseButton::Left {
                    self.orbit_drag = state == ElementState::Pressed && !consumed;
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                if !consumed {
                    let scroll = match delta {
                        MouseScrollDelta::LineDelta(_, y) => y,
                        MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 50.0,
                    };
                    self.camera.on_scroll(scroll);
                }
            }
            WindowEvent::RedrawRequested => {
                self.frame();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        if now >= self.next_frame_time {
            if let Some(window) = &self.window {
                window.request_redraw();
            }
            self.next_frame_time = now + self.target_frame_duration;
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_frame_time));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texture_decode_completion_assigns_the_material() {
        let mut app = App::new();
        let (tx, rx) = mpsc::channel();
        app.texture_rx = Some(rx);

        // Nothing decoded yet: the poll keeps waiting.
        app.poll_texture_load();
        assert!(app.texture_rx.is_some());
        assert!(app.scene.material.texture.is_none());

        tx.send(Ok(image::RgbaImage::new(4, 4))).unwrap();
        app.poll_texture_load();
        assert!(app.scene.material.texture.is_some());
        assert!(app.scene.material.texture_dirty);
        assert!(app.texture_rx.is_none());
    }

    #[test]
    fn failed_texture_decode_leaves_the_material_untouched() {
        let mut app = App::new();
        let (tx, rx) = mpsc::channel();
        app.texture_rx = Some(rx);

        tx.send(Err("not an image".to_string())).unwrap();
        app.poll_texture_load();
        assert!(app.scene.material.texture.is_none());
        assert!(!app.scene.material.texture_dirty);
        assert!(app.texture_rx.is_none());
    }

    #[test]
    fn dropped_decode_thread_clears_the_receiver() {
        let mut app = App::new();
        let (tx, rx) = mpsc::channel::<TextureResult>();
        app.texture_rx = Some(rx);
        drop(tx);

        app.poll_texture_load();
        assert!(app.texture_rx.is_none());
        assert!(app.scene.material.texture.is_none());
    }
}

pub fn run() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    log::info!("Polyviz - primitive shape gallery");
    log::info!("   Press ESC or close the window to exit");

    let event_loop = EventLoop::new().expect("Failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new();
    event_loop.run_app(&mut app).expect("Event loop error");

    log::info!("Goodbye!");
}
