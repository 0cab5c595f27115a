// SPDX-License-Identifier: GPL-3.0-only

//! Visual effects applied to camera frames
//!
//! This module is the single source of truth for the effect catalog and the
//! shared effect parameters. The WGSL source carries one fragment entry point
//! per effect; [`compositor::EffectCompositor`] compiles all of them ahead of
//! time so switching effects at runtime never stalls the pipeline.

pub mod compositor;

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

pub use compositor::EffectCompositor;

/// Effect shader source (WGSL)
///
/// Contains the fullscreen quad vertex stage and one fragment entry point
/// per [`EffectKind`].
pub const EFFECT_SHADER: &str = include_str!("effects.wgsl");

/// The selectable visual effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EffectKind {
    /// Smooth skin enhancement with warm glow
    #[default]
    Beautify,
    /// Soft dreamy effect with subtle highlights
    Dreamy,
    /// Classic film look with grain effect
    Vintage,
    /// Wave distortion effect
    Wave,
}

impl EffectKind {
    /// All effects, in catalog order
    pub const ALL: [EffectKind; 4] = [
        EffectKind::Beautify,
        EffectKind::Dreamy,
        EffectKind::Vintage,
        EffectKind::Wave,
    ];

    /// Display name for CLI/UI
    pub fn display_name(&self) -> &'static str {
        match self {
            EffectKind::Beautify => "Beautify",
            EffectKind::Dreamy => "Dreamy",
            EffectKind::Vintage => "Vintage",
            EffectKind::Wave => "Wave",
        }
    }

    /// One-line description for the effect catalog
    pub fn description(&self) -> &'static str {
        match self {
            EffectKind::Beautify => "Smooth skin enhancement with warm glow",
            EffectKind::Dreamy => "Soft dreamy effect with subtle highlights",
            EffectKind::Vintage => "Classic film look with grain effect",
            EffectKind::Wave => "Wave effect",
        }
    }

    /// WGSL fragment entry point implementing this effect
    pub fn fragment_entry(&self) -> &'static str {
        match self {
            EffectKind::Beautify => "fs_beautify",
            EffectKind::Dreamy => "fs_dreamy",
            EffectKind::Vintage => "fs_vintage",
            EffectKind::Wave => "fs_wave",
        }
    }

    /// Stable index into per-effect pipeline arrays
    pub fn index(&self) -> usize {
        match self {
            EffectKind::Beautify => 0,
            EffectKind::Dreamy => 1,
            EffectKind::Vintage => 2,
            EffectKind::Wave => 3,
        }
    }

    fn from_index(index: u32) -> EffectKind {
        match index {
            1 => EffectKind::Dreamy,
            2 => EffectKind::Vintage,
            3 => EffectKind::Wave,
            _ => EffectKind::Beautify,
        }
    }

    /// Parse an effect from a (case-insensitive) name
    pub fn from_name(name: &str) -> Option<EffectKind> {
        EffectKind::ALL
            .into_iter()
            .find(|kind| kind.display_name().eq_ignore_ascii_case(name))
    }
}

impl std::fmt::Display for EffectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Minimum selectable intensity
pub const MIN_INTENSITY: f32 = 0.0;

/// Maximum selectable intensity
pub const MAX_INTENSITY: f32 = 2.0;

/// Per-frame effect parameters, read once at the top of a composite
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectParams {
    pub kind: EffectKind,
    pub intensity: f32,
    /// Seconds since the pipeline started, drives animated effects
    pub elapsed: f32,
}

/// Shared effect selection and intensity
///
/// Mutated by callers on any thread, read once per frame by the compositor.
/// Both fields are independent atomic value swaps; a reader may observe a new
/// kind with the previous intensity for a single frame, which is benign. No
/// field is ever observed partially written.
#[derive(Debug)]
pub struct EffectState {
    kind: AtomicU32,
    intensity_bits: AtomicU32,
    started: Instant,
}

impl EffectState {
    pub fn new(kind: EffectKind, intensity: f32) -> Self {
        Self {
            kind: AtomicU32::new(kind.index() as u32),
            intensity_bits: AtomicU32::new(clamp_intensity(intensity).to_bits()),
            started: Instant::now(),
        }
    }

    /// Select the active effect; effective from the next composite
    pub fn set_effect(&self, kind: EffectKind) {
        self.kind.store(kind.index() as u32, Ordering::Relaxed);
    }

    /// Set the effect intensity, clamped to [0, 2]
    pub fn set_intensity(&self, intensity: f32) {
        self.intensity_bits
            .store(clamp_intensity(intensity).to_bits(), Ordering::Relaxed);
    }

    /// Currently selected effect
    pub fn effect(&self) -> EffectKind {
        EffectKind::from_index(self.kind.load(Ordering::Relaxed))
    }

    /// Read the parameters for one frame
    pub fn snapshot(&self) -> EffectParams {
        EffectParams {
            kind: self.effect(),
            intensity: f32::from_bits(self.intensity_bits.load(Ordering::Relaxed)),
            elapsed: self.started.elapsed().as_secs_f32(),
        }
    }
}

impl Default for EffectState {
    fn default() -> Self {
        Self::new(EffectKind::default(), 1.0)
    }
}

fn clamp_intensity(intensity: f32) -> f32 {
    if intensity.is_nan() {
        return MIN_INTENSITY;
    }
    intensity.clamp(MIN_INTENSITY, MAX_INTENSITY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effect_names_round_trip() {
        for kind in EffectKind::ALL {
            assert_eq!(EffectKind::from_name(kind.display_name()), Some(kind));
        }
        assert_eq!(EffectKind::from_name("beautify"), Some(EffectKind::Beautify));
        assert_eq!(EffectKind::from_name("nope"), None);
    }

    #[test]
    fn test_effect_indices_are_stable() {
        for (i, kind) in EffectKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }

    #[test]
    fn test_intensity_is_clamped() {
        let state = EffectState::new(EffectKind::Wave, 1.0);
        state.set_intensity(5.0);
        assert_eq!(state.snapshot().intensity, MAX_INTENSITY);
        state.set_intensity(-1.0);
        assert_eq!(state.snapshot().intensity, MIN_INTENSITY);
        state.set_intensity(f32::NAN);
        assert_eq!(state.snapshot().intensity, MIN_INTENSITY);
    }

    #[test]
    fn test_effect_switch_is_whole_value() {
        let state = EffectState::default();
        state.set_effect(EffectKind::Vintage);
        assert_eq!(state.snapshot().kind, EffectKind::Vintage);
        state.set_effect(EffectKind::Wave);
        assert_eq!(state.effect(), EffectKind::Wave);
    }
}
