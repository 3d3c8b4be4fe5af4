// Minimal smoke run of the texture and QA loop on a synthesized frame

use texture_qa::{
    dialback::QaLoopController,
    frame::Frame,
    qa::SceneElement,
    texture::{signature, HalftoneSpec, TextureSpec, TextureTransform},
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🎞️  Testing texture-qa Core Functionality");

    // Test 1: Frame Creation
    println!("\n1. Synthesizing Frame...");
    let frame = Frame::from_fn(320, 180, |x, y| {
        let shade = ((x + y) % 64) as u8;
        [shade / 2, shade / 2, 40 + shade, 255]
    });
    println!("   Created frame: {}x{}", frame.width(), frame.height());

    // Test 2: Configuration
    println!("\n2. Validating Texture Config...");
    let config = TextureSpec {
        enable: true,
        grain_strength: 0.8,
        feather_px: 5.0,
        posterize_levels: 2,
        halftone: HalftoneSpec { enable: true, opacity: 0.8, ..Default::default() },
    }
    .validate()?;
    println!("   Signature: {}", signature(&config));

    // Test 3: Transform
    println!("\n3. Applying Texture...");
    let transform = TextureTransform::new();
    println!("   Active stages: {:?}", transform.active_stages(&config));
    let textured = transform.apply(&frame, &config, 7);
    println!("   Output frame: {}x{}", textured.width(), textured.height());

    // Test 4: QA Loop
    println!("\n4. Running QA Loop...");
    let scene = vec![
        SceneElement::text("title", "#000000", [0.1, 0.1, 0.6, 0.15]).with_background("#101060"),
        SceneElement::text("caption", "#ffffff", [0.1, 0.75, 0.8, 0.1]),
    ];
    let controller = QaLoopController::default();
    let outcome = controller.run(&frame, Some(&scene), &config, 7, 2);

    for record in &outcome.attempts {
        println!(
            "   Attempt {}: config {} ok={} fails={:?}",
            record.attempt,
            record.signature.short(),
            record.result.ok(),
            record.result.fails()
        );
    }
    println!("   Succeeded: {}", outcome.succeeded);
    println!("   Dial-back applied: {}", outcome.dialback_applied());
    println!("   Final state: {:?}", outcome.final_state());

    match outcome.frame.as_image().save("minimal_test_output.png") {
        Ok(()) => println!("   📁 Output saved to: minimal_test_output.png"),
        Err(e) => println!("   ⚠️  Could not save file: {}", e),
    }

    println!("\n🎉 Smoke run finished.");
    Ok(())
}
