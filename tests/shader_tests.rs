// SPDX-License-Identifier: GPL-3.0-only

//! Shader validation without a GPU
//!
//! Parses and validates the effect shader with naga so a WGSL regression
//! fails in CI rather than at first composite on a user's machine.

use effectcam::EffectKind;
use effectcam::effects::EFFECT_SHADER;

fn validated_module() -> naga::Module {
    let module = naga::front::wgsl::parse_str(EFFECT_SHADER)
        .unwrap_or_else(|e| panic!("effects.wgsl failed to parse: {}", e));

    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    )
    .validate(&module)
    .expect("effects.wgsl failed validation");

    module
}

#[test]
fn test_effect_shader_is_valid_wgsl() {
    validated_module();
}

#[test]
fn test_every_effect_has_a_fragment_entry() {
    let module = validated_module();
    let entry_points: Vec<&str> = module
        .entry_points
        .iter()
        .map(|ep| ep.name.as_str())
        .collect();

    assert!(entry_points.contains(&"vs_fullscreen"));
    for kind in EffectKind::ALL {
        assert!(
            entry_points.contains(&kind.fragment_entry()),
            "Missing fragment entry point for {}",
            kind
        );
    }
}
