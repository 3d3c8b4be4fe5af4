use texture_qa::{
    clip::{ClipDriver, ClipSettings},
    config::Config,
    dialback::{DialbackPolicy, LoopState, QaLoopController, RelaxOrder},
    frame::Frame,
    qa::{QaEvaluator, QaThresholds, SceneElement},
    texture::{signature, HalftoneSpec, TextureConfig, TextureSpec, TextureTransform},
};

fn strong_spec() -> TextureSpec {
    TextureSpec {
        enable: true,
        grain_strength: 0.8,
        feather_px: 5.0,
        posterize_levels: 2,
        halftone: HalftoneSpec { enable: true, opacity: 0.8, ..Default::default() },
    }
}

fn low_contrast_scene() -> Vec<SceneElement> {
    vec![SceneElement::text("headline", "#000000", [0.1, 0.1, 0.5, 0.2]).with_background("#000080")]
}

#[test]
fn strong_texture_on_low_contrast_scene_is_dialed_back() {
    let frame = Frame::new_filled(160, 90, [0, 0, 128]);
    let controller = QaLoopController::default();
    let outcome = controller
        .run_spec(&frame, Some(&low_contrast_scene()), &strong_spec(), 11, 2)
        .unwrap();

    assert!(outcome.dialback_applied());
    assert_eq!(outcome.attempts_used(), 3);
    assert!(!outcome.succeeded);
    assert_eq!(outcome.final_state(), LoopState::Exhausted);
    assert!(!outcome.final_config().unwrap().halftone().enabled());
    assert_eq!(outcome.frame.dimensions(), frame.dimensions());
}

#[test]
fn sampled_dark_blue_background_is_dialed_back() {
    let frame = Frame::new_filled(160, 90, [0, 0, 128]);
    let scene = vec![SceneElement::text("headline", "#000000", [0.1, 0.1, 0.5, 0.2])];
    let controller = QaLoopController::default();
    let outcome = controller
        .run_spec(&frame, Some(&scene), &strong_spec(), 11, 2)
        .unwrap();

    assert!(outcome.dialback_applied());
    assert_eq!(outcome.attempts_used(), 3);
    assert!(!outcome.succeeded);
    assert!(!outcome.final_config().unwrap().halftone().enabled());

    for record in &outcome.attempts {
        let ratio = record.result.detail("contrast:headline").unwrap();
        assert!(ratio < 4.5, "attempt {} had contrast {}", record.attempt, ratio);
        assert!(record.result.warnings().iter().all(|w| !w.starts_with("background_fallback")));
    }
}

#[test]
fn equal_configs_share_a_signature() {
    let build = |grain: f64| -> TextureConfig {
        TextureSpec { enable: true, grain_strength: grain, ..Default::default() }
            .validate()
            .unwrap()
    };

    assert_eq!(signature(&build(0.12)), signature(&build(0.12)));
    assert_ne!(signature(&build(0.12)), signature(&build(0.15)));
}

#[test]
fn signature_ignores_file_format() {
    let from_toml = Config::from_toml_str(
        r#"
        [texture]
        posterize_levels = 4
        grain_strength = 0.12
        enable = true
        "#,
    )
    .unwrap()
    .texture_config()
    .unwrap();

    let from_json: TextureSpec =
        serde_json::from_str(r#"{"enable": true, "grain_strength": 1.2e-1, "posterize_levels": 4}"#)
            .unwrap();

    assert_eq!(signature(&from_toml), signature(&from_json.validate().unwrap()));
}

#[test]
fn invalid_text_color_is_a_single_failure() {
    let frame = Frame::new_filled(100, 100, [255, 255, 255]);
    let scene = vec![SceneElement::text("t", "not-a-colour", [0.1, 0.1, 0.5, 0.2])];
    let result = QaEvaluator::new(QaThresholds::default()).evaluate(&frame, Some(&scene));

    assert!(!result.ok());
    assert_eq!(result.fails().len(), 1);
    assert!(result.fails()[0].starts_with("invalid_color:t"));
}

#[test]
fn missing_placement_passes() {
    let frame = Frame::new_filled(32, 32, [0, 0, 0]);
    let result = QaEvaluator::new(QaThresholds::default()).evaluate(&frame, None);
    assert!(result.ok());
    assert!(result.fails().is_empty());
}

#[test]
fn disabled_texture_is_identity() {
    let frame = Frame::from_fn(40, 30, |x, y| [x as u8 * 6, y as u8 * 8, 90, 255]);
    let mut spec = strong_spec();
    spec.enable = false;
    let config = spec.validate().unwrap();

    assert_eq!(TextureTransform::new().apply(&frame, &config, 5), frame);
}

#[test]
fn relaxation_is_monotonic() {
    for order in [RelaxOrder::Simultaneous, RelaxOrder::HalftoneFirst] {
        let policy = DialbackPolicy::new(0.5, 2, order).unwrap();
        let mut config = strong_spec().validate().unwrap();
        for _ in 0..10 {
            let relaxed = policy.relax(&config);
            assert!(relaxed.grain_strength() <= config.grain_strength());
            assert!(relaxed.feather_px() <= config.feather_px());
            assert!(relaxed.posterize_levels() >= config.posterize_levels());
            assert!(!relaxed.halftone().enabled());
            config = relaxed;
        }
    }
}

#[test]
fn loop_always_terminates_within_budget() {
    let frame = Frame::new_filled(64, 64, [0, 0, 128]);
    let controller = QaLoopController::default();
    let config = strong_spec().validate().unwrap();

    for max_retries in 0..5 {
        let outcome = controller.run(&frame, Some(&low_contrast_scene()), &config, 3, max_retries);
        assert!(outcome.attempts_used() <= max_retries as usize + 1);
        assert!(outcome.attempts_used() >= 1);
    }
}

#[test]
fn clip_output_is_independent_of_thread_count() {
    let frames: Vec<Frame> = (0..6)
        .map(|i| Frame::new_filled(24, 16, [i * 30, 60, 200 - i * 20]))
        .collect();
    let config = strong_spec().validate().unwrap();

    let run = |threads: usize| -> Vec<Frame> {
        let driver = ClipDriver::new(ClipSettings {
            processing_threads: threads,
            static_grain: false,
        })
        .unwrap();
        driver.texture_frames(&frames, &config, 21).unwrap()
    };

    assert_eq!(run(1), run(4));
}
