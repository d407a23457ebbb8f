//! Polyviz - a small gallery of animated primitive shapes.
//!
//! A wgpu viewport shows six primitives sharing one material, with an
//! orbit camera and an egui control panel for visibility, color, scale,
//! textures and the procedural animation mixer.

mod anim;
mod app;
mod render;
mod scene;
mod ui;

fn main() {
    app::run();
}
