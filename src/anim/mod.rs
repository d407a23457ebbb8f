//! Procedural animation mixer backing the "Animacion" panel folder.
//!
//! Three named actions blend into the per-frame model transform of every
//! visible mesh: a spin about Y, a vertical bob, and a scale pulse. Weights,
//! crossfades, pause/step and the global time scale follow the classic
//! mixer-panel operations.

/// Named animation actions, fixed like the shape catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Spin,
    Bob,
    Pulse,
}

impl ActionKind {
    pub const ALL: [ActionKind; 3] = [ActionKind::Spin, ActionKind::Bob, ActionKind::Pulse];

    pub fn label(self) -> &'static str {
        match self {
            ActionKind::Spin => "Girar",
            ActionKind::Bob => "Flotar",
            ActionKind::Pulse => "Pulsar",
        }
    }

    fn index(self) -> usize {
        match self {
            ActionKind::Spin => 0,
            ActionKind::Bob => 1,
            ActionKind::Pulse => 2,
        }
    }
}

/// Default crossfade duration in seconds of scaled mixer time.
pub const DEFAULT_CROSSFADE_DURATION: f32 = 1.0;
/// Fixed advance used by the single-step button while paused.
pub const SINGLE_STEP_SIZE: f32 = 0.05;
pub const TIME_SCALE_RANGE: (f32, f32) = (0.0, 2.0);

const SPIN_SPEED: f32 = 0.8; // rad/s at weight 1
const BOB_SPEED: f32 = 2.0;
const BOB_AMPLITUDE: f32 = 20.0; // world units, catalog shapes span ~150
const PULSE_SPEED: f32 = 3.0;
const PULSE_AMPLITUDE: f32 = 0.15;

struct CrossFade {
    from: ActionKind,
    to: ActionKind,
    duration: f32,
    elapsed: f32,
    from_start: f32,
    to_start: f32,
}

/// Blended transform parameters for one frame, applied uniformly to every
/// visible mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActionSample {
    pub spin_angle: f32,
    pub bob_offset: f32,
    pub pulse_scale: f32,
}

pub struct AnimationMixer {
    weights: [f32; 3],
    time: f32,
    spin_angle: f32,
    time_scale: f32,
    paused: bool,
    fade: Option<CrossFade>,
}

impl Default for AnimationMixer {
    fn default() -> Self {
        Self::new()
    }
}

impl AnimationMixer {
    pub fn new() -> Self {
        Self {
            weights: [1.0, 0.0, 0.0],
            time: 0.0,
            spin_angle: 0.0,
            time_scale: 1.0,
            paused: false,
            fade: None,
        }
    }

    pub fn weight(&self, action: ActionKind) -> f32 {
        self.weights[action.index()]
    }

    pub fn set_weight(&mut self, action: ActionKind, weight: f32) {
        self.weights[action.index()] = weight.clamp(0.0, 1.0);
    }

    pub fn activate_all(&mut self) {
        self.fade = None;
        self.weights = [1.0; 3];
    }

    pub fn deactivate_all(&mut self) {
        self.fade = None;
        self.weights = [0.0; 3];
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pause_continue(&mut self) {
        self.paused = !self.paused;
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.clamp(TIME_SCALE_RANGE.0, TIME_SCALE_RANGE.1);
    }

    /// Linear weight transfer over `duration` seconds of scaled time. The
    /// target ends up with the source's starting weight and the source at
    /// zero; a non-positive duration applies immediately.
    pub fn prepare_cross_fade(&mut self, from: ActionKind, to: ActionKind, duration: f32) {
        if from == to {
            return;
        }
        let fade = CrossFade {
            from,
            to,
            duration,
            elapsed: 0.0,
            from_start: self.weight(from),
            to_start: self.weight(to),
        };
        if duration <= 0.0 {
            self.finish_fade(&fade);
        } else {
            self.fade = Some(fade);
        }
    }

    fn finish_fade(&mut self, fade: &CrossFade) {
        self.weights[fade.to.index()] = fade.from_start;
        self.weights[fade.from.index()] = 0.0;
    }

    /// Advances one fixed step while paused (pauses first if it was running).
    pub fn single_step(&mut self, step: f32) {
        self.paused = true;
        self.advance(step);
    }

    /// Per-frame tick; a no-op while paused.
    pub fn update(&mut self, dt: f32) {
        if self.paused {
            return;
        }
        self.advance(dt * self.time_scale);
    }

    fn advance(&mut self, dt: f32) {
        self.time += dt;
        self.spin_angle += dt * SPIN_SPEED * self.weight(ActionKind::Spin);

        if let Some(mut fade) = self.fade.take() {
            fade.elapsed += dt;
            if fade.elapsed >= fade.duration {
                self.finish_fade(&fade);
            } else {
                let p = fade.elapsed / fade.duration;
                self.weights[fade.from.index()] = fade.from_start * (1.0 - p);
                self.weights[fade.to.index()] =
                    fade.to_start + (fade.from_start - fade.to_start) * p;
                self.fade = Some(fade);
            }
        }
    }

    pub fn sample(&self) -> ActionSample {
        ActionSample {
            spin_angle: self.spin_angle,
            bob_offset: (self.time * BOB_SPEED).sin()
                * BOB_AMPLITUDE
                * self.weight(ActionKind::Bob),
            pulse_scale: 1.0
                + (self.time * PULSE_SPEED).sin()
                    * PULSE_AMPLITUDE
                    * self.weight(ActionKind::Pulse),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_clamp_to_unit_range() {
        let mut mixer = AnimationMixer::new();
        mixer.set_weight(ActionKind::Bob, 3.0);
        assert_eq!(mixer.weight(ActionKind::Bob), 1.0);
        mixer.set_weight(ActionKind::Bob, -1.0);
        assert_eq!(mixer.weight(ActionKind::Bob), 0.0);
    }

    #[test]
    fn bulk_activation_sets_every_weight() {
        let mut mixer = AnimationMixer::new();
        mixer.activate_all();
        assert!(ActionKind::ALL.iter().all(|a| mixer.weight(*a) == 1.0));
        mixer.deactivate_all();
        assert!(ActionKind::ALL.iter().all(|a| mixer.weight(*a) == 0.0));
    }

    #[test]
    fn crossfade_transfers_weight_linearly() {
        let mut mixer = AnimationMixer::new();
        mixer.deactivate_all();
        mixer.set_weight(ActionKind::Spin, 1.0);
        mixer.prepare_cross_fade(ActionKind::Spin, ActionKind::Bob, 2.0);

        mixer.update(1.0);
        assert!((mixer.weight(ActionKind::Spin) - 0.5).abs() < 1e-5);
        assert!((mixer.weight(ActionKind::Bob) - 0.5).abs() < 1e-5);

        mixer.update(1.5);
        assert_eq!(mixer.weight(ActionKind::Spin), 0.0);
        assert_eq!(mixer.weight(ActionKind::Bob), 1.0);
    }

    #[test]
    fn zero_duration_crossfade_applies_immediately() {
        let mut mixer = AnimationMixer::new();
        mixer.set_weight(ActionKind::Spin, 0.75);
        mixer.prepare_cross_fade(ActionKind::Spin, ActionKind::Pulse, 0.0);
        assert_eq!(mixer.weight(ActionKind::Spin), 0.0);
        assert_eq!(mixer.weight(ActionKind::Pulse), 0.75);
    }

    #[test]
    fn pause_gates_updates_and_single_step_advances() {
        let mut mixer = AnimationMixer::new();
        mixer.pause_continue();
        let before = mixer.sample();
        mixer.update(1.0);
        assert_eq!(before, mixer.sample());

        mixer.single_step(SINGLE_STEP_SIZE);
        assert!(mixer.is_paused());
        let stepped = mixer.sample();
        assert!((stepped.spin_angle - SINGLE_STEP_SIZE * 0.8).abs() < 1e-6);
    }

    #[test]
    fn time_scale_scales_the_clock() {
        let mut fast = AnimationMixer::new();
        let mut slow = AnimationMixer::new();
        slow.set_time_scale(0.5);
        fast.update(1.0);
        slow.update(1.0);
        assert!((fast.sample().spin_angle - 2.0 * slow.sample().spin_angle).abs() < 1e-6);

        slow.set_time_scale(10.0);
        assert_eq!(slow.time_scale(), TIME_SCALE_RANGE.1);
    }

    #[test]
    fn self_crossfade_is_a_no_op() {
        let mut mixer = AnimationMixer::new();
        mixer.prepare_cross_fade(ActionKind::Spin, ActionKind::Spin, 1.0);
        mixer.update(0.5);
        assert_eq!(mixer.weight(ActionKind::Spin), 1.0);
    }
}
