use ndarray::{Array2, Array3};
use siox_rust::segmentation::{
    segment, Certainty, Refinement, SegmentationOutcome, Segmenter, SioxParams,
};
use siox_rust::selection::blob::{keep_largest_blob, label_components};

const BLUE: [u8; 3] = [0, 0, 255];
const RED: [u8; 3] = [255, 0, 0];

/// RGB image of `background` with a `foreground` square covering `from..to`.
fn square_image(size: usize, from: usize, to: usize, background: [u8; 3], foreground: [u8; 3]) -> Array3<u8> {
    Array3::from_shape_fn((size, size, 3), |(y, x, c)| {
        if (from..to).contains(&y) && (from..to).contains(&x) {
            foreground[c]
        } else {
            background[c]
        }
    })
}

/// Deterministic noise so tests do not depend on a RNG crate.
fn lcg(seed: &mut u32) -> u32 {
    *seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
    *seed >> 8
}

/// RGB image of `background` with each rectangle `(y0, y1, x0, x1, colour)` painted on top.
fn painted(size: usize, background: [u8; 3], rects: &[(usize, usize, usize, usize, [u8; 3])]) -> Array3<u8> {
    Array3::from_shape_fn((size, size, 3), |(y, x, c)| {
        rects
            .iter()
            .rev()
            .find(|r| (r.0..r.1).contains(&y) && (r.2..r.3).contains(&x))
            .map_or(background[c], |r| r.4[c])
    })
}

/// Certain-background frame around an unknown interior.
fn framed_hints(size: usize) -> Array2<f32> {
    Array2::from_shape_fn((size, size), |(y, x)| {
        if y == 0 || x == 0 || y == size - 1 || x == size - 1 {
            0.0
        } else {
            0.5
        }
    })
}

fn is_binary(m: &Array2<f32>) -> bool {
    m.iter().all(|&v| v == 0.0 || v == 1.0)
}

#[test]
fn test_uniform_background_gives_empty_mask() {
    let image = Array3::from_elem((4, 4, 3), 90u8);
    let mut confidence = Array2::from_elem((4, 4), 0.05f32);

    let outcome = segment(image.view(), &mut confidence, &SioxParams::default()).unwrap();

    assert_eq!(outcome, SegmentationOutcome::Segmented);
    assert!(confidence.iter().all(|&v| v == 0.0));
}

#[test]
fn test_two_tone_block_is_extracted() {
    let image = square_image(10, 0, 5, BLUE, RED);
    let mut confidence = Array2::from_shape_fn((10, 10), |(y, x)| {
        if y < 5 && x < 5 {
            0.95
        } else {
            0.05
        }
    });

    segment(image.view(), &mut confidence, &SioxParams::default()).unwrap();

    for ((y, x), &v) in confidence.indexed_iter() {
        let expected = if y < 5 && x < 5 { 1.0 } else { 0.0 };
        assert_eq!(v, expected, "pixel ({}, {})", x, y);
    }
}

#[test]
fn test_without_foreground_hints_uses_cluster_size() {
    let image = square_image(12, 3, 9, BLUE, RED);
    let mut confidence = Array2::from_shape_fn((12, 12), |(y, x)| {
        if y == 0 || x == 0 || y == 11 || x == 11 {
            0.05
        } else {
            0.5
        }
    });

    let mut segmenter = Segmenter::new(SioxParams::default()).unwrap();
    let outcome = segmenter
        .extract(image.view(), &mut confidence, Refinement::RECALCULATE)
        .unwrap();

    assert_eq!(outcome, SegmentationOutcome::Segmented);
    assert!(segmenter.foreground_signature().map_or(true, |s| s.is_empty()));

    // Red is far from the blue background signature, so it becomes foreground
    for y in 4..8 {
        for x in 4..8 {
            assert_eq!(confidence[[y, x]], 1.0);
        }
    }
    assert_eq!(confidence[[1, 1]], 0.0);
    assert!(is_binary(&confidence));
}

#[test]
fn test_no_background_hints_is_noop() {
    let image = square_image(6, 1, 4, BLUE, RED);
    let mut confidence = Array2::from_shape_fn((6, 6), |(y, x)| {
        if (1..4).contains(&y) && (1..4).contains(&x) {
            0.95
        } else {
            0.4
        }
    });
    let before = confidence.clone();

    let outcome = segment(image.view(), &mut confidence, &SioxParams::default()).unwrap();

    assert_eq!(outcome, SegmentationOutcome::NoBackground);
    assert_eq!(confidence, before);
}

#[test]
fn test_scattered_background_is_pruned_to_noop() {
    // 20 distinct grays, 5% each: every stage-two cluster is below the cutoff
    let image = Array3::from_shape_fn((4, 5, 1), |(y, x, _)| ((y * 5 + x) * 12) as u8);
    let mut confidence = Array2::from_elem((4, 5), 0.05f32);
    let before = confidence.clone();

    let outcome = segment(image.view(), &mut confidence, &SioxParams::default()).unwrap();

    assert_eq!(outcome, SegmentationOutcome::NoBackground);
    assert_eq!(confidence, before);
}

#[test]
fn test_isolated_pixel_is_suppressed() {
    let mut image = square_image(16, 5, 11, BLUE, RED);
    image[[2, 13, 0]] = 255;
    image[[2, 13, 2]] = 0;

    let mut confidence = Array2::from_shape_fn((16, 16), |(y, x)| {
        if y == 0 || x == 0 || y == 15 || x == 15 {
            0.0
        } else {
            0.5
        }
    });
    confidence[[8, 8]] = 1.0;

    segment(image.view(), &mut confidence, &SioxParams::default()).unwrap();

    assert_eq!(confidence[[2, 13]], 0.0);
    for y in 6..10 {
        for x in 6..10 {
            assert_eq!(confidence[[y, x]], 1.0);
        }
    }
}

#[test]
fn test_random_input_properties() {
    const PALETTE: [[u8; 3]; 4] = [[0, 0, 255], [0, 0, 160], [255, 0, 0], [200, 40, 40]];

    let mut seed = 7u32;
    let image = Array3::from_shape_fn((24, 24, 4), |(y, x, c)| {
        if c == 3 {
            return 255;
        }
        let inside = (6..18).contains(&y) && (6..18).contains(&x);
        let shade = (x * 31 + y * 17) % 2;
        PALETTE[if inside { 2 + shade } else { shade }][c]
    });
    let hints = Array2::from_shape_fn((24, 24), |(y, x)| {
        if y < 2 || x < 2 {
            return 0.0;
        }
        match lcg(&mut seed) % 6 {
            0 => 0.0,
            1 => 1.0,
            2 => 0.05,
            3 => 0.95,
            _ => 0.5,
        }
    });

    let params = SioxParams::default();
    let mut first = hints.clone();
    segment(image.view(), &mut first, &params).unwrap();
    let mut second = hints.clone();
    segment(image.view(), &mut second, &params).unwrap();

    assert!(is_binary(&first));
    assert_eq!(first, second);

    for (&hint, &value) in hints.iter().zip(first.iter()) {
        match Certainty::of(hint) {
            Certainty::Background => assert_eq!(value, 0.0),
            Certainty::Foreground => assert_eq!(value, 1.0),
            Certainty::Unknown => {}
        }
    }
}

#[test]
fn test_largest_blob_is_connected() {
    let mut seed = 42u32;
    for _ in 0..8 {
        let mut matrix = Array2::from_shape_fn((20, 20), |_| (lcg(&mut seed) % 100) as f32 / 100.0);
        keep_largest_blob(&mut matrix, 0.5);

        let field = label_components(&matrix, f32::MIN_POSITIVE);
        assert!(field.component_count() <= 1);
    }
}

#[test]
fn test_multiblob_keeps_comparable_blobs() {
    let image = painted(20, BLUE, &[(4, 10, 2, 8, RED), (4, 10, 12, 18, RED)]);
    let mut hints = framed_hints(20);
    hints[[7, 5]] = 1.0;

    let mut single = hints.clone();
    segment(image.view(), &mut single, &SioxParams::default()).unwrap();
    let mut multi = hints.clone();
    segment(image.view(), &mut multi, &SioxParams::default().with_multiblob(true)).unwrap();

    // Equal sizes: single-blob mode keeps the first one found
    assert_eq!(single[[7, 5]], 1.0);
    assert_eq!(single[[7, 15]], 0.0);

    assert_eq!(multi[[7, 5]], 1.0);
    assert_eq!(multi[[7, 15]], 1.0);
    assert_eq!(label_components(&multi, 0.5).component_count(), 2);
}

#[test]
fn test_multiblob_keeps_small_hinted_blob() {
    let image = painted(26, BLUE, &[(2, 16, 2, 16, RED), (18, 24, 18, 24, RED)]);
    let mut hints = framed_hints(26);
    hints[[8, 8]] = 1.0;
    for y in 20..22 {
        for x in 20..22 {
            hints[[y, x]] = 1.0;
        }
    }
    let params = SioxParams::default().with_smoothness(0).with_multiblob(true);

    let mut mask = hints.clone();
    segment(image.view(), &mut mask, &params).unwrap();

    // Too small to survive on size alone; the hint keeps the whole blob
    for y in 19..23 {
        for x in 19..23 {
            assert_eq!(mask[[y, x]], 1.0, "pixel ({}, {})", x, y);
        }
    }
    assert_eq!(mask[[1, 1]], 0.0);
}

#[test]
fn test_smoothness_changes_outline() {
    let image = painted(20, BLUE, &[(4, 10, 2, 8, RED), (4, 10, 12, 18, RED)]);
    let mut hints = framed_hints(20);
    hints[[7, 5]] = 1.0;

    let mut rough = hints.clone();
    segment(image.view(), &mut rough, &SioxParams::default().with_smoothness(0)).unwrap();
    let mut smooth = hints.clone();
    segment(image.view(), &mut smooth, &SioxParams::default().with_smoothness(3)).unwrap();

    assert!(is_binary(&rough));
    assert!(is_binary(&smooth));
    assert_ne!(rough, smooth);
    assert_eq!(rough[[3, 3]], 0.0);
    assert_eq!(smooth[[3, 3]], 1.0);
}

#[test]
fn test_stray_foreground_hint_survives_as_own_component() {
    let image = painted(20, BLUE, &[(3, 11, 2, 10, RED), (14, 17, 14, 17, RED)]);
    let mut hints = framed_hints(20);
    hints[[7, 6]] = 1.0;
    hints[[15, 15]] = 1.0;

    let mut mask = hints.clone();
    segment(image.view(), &mut mask, &SioxParams::default()).unwrap();

    // The small square loses blob selection, only its hint pixel is restored
    assert_eq!(mask[[15, 15]], 1.0);
    assert_eq!(mask[[15, 14]], 0.0);
    assert_eq!(mask[[14, 15]], 0.0);
    assert_eq!(mask[[7, 6]], 1.0);
    assert_eq!(label_components(&mask, 0.5).component_count(), 2);
}

#[test]
fn test_adding_foreground_reclassifies_background_colours() {
    const NAVY: [u8; 3] = [0, 0, 160];
    const NAVY_KEY: u32 = 0x0000A0;

    let image = painted(20, BLUE, &[(2, 6, 2, 6, RED), (9, 18, 9, 18, NAVY)]);
    let mut hints = framed_hints(20);
    hints[[4, 4]] = 1.0;

    let mut segmenter = Segmenter::new(SioxParams::default()).unwrap();
    let mut first = hints.clone();
    segmenter
        .extract(image.view(), &mut first, Refinement::RECALCULATE)
        .unwrap();

    // Navy is nearer the blue background than the red foreground
    assert_eq!(segmenter.cache().get(NAVY_KEY).map(|r| r.foreground), Some(false));
    assert_eq!(first[[12, 14]], 0.0);

    hints[[13, 13]] = 1.0;
    let mut second = hints.clone();
    segmenter
        .extract(image.view(), &mut second, Refinement::ADD_FOREGROUND)
        .unwrap();

    assert_eq!(segmenter.cache().get(NAVY_KEY).map(|r| r.foreground), Some(true));
    assert_eq!(segmenter.foreground_signature().map(|s| s.len()), Some(2));
    assert_eq!(second[[12, 14]], 1.0);
    assert_ne!(first, second);
}

#[test]
fn test_adding_background_reclassifies_foreground_colours() {
    const CRIMSON: [u8; 3] = [200, 0, 40];
    const CRIMSON_KEY: u32 = 0xC80028;

    let image = painted(20, BLUE, &[(2, 8, 2, 8, RED), (11, 17, 11, 17, CRIMSON)]);
    let mut hints = framed_hints(20);
    hints[[5, 5]] = 1.0;

    let mut segmenter = Segmenter::new(SioxParams::default()).unwrap();
    let mut first = hints.clone();
    segmenter
        .extract(image.view(), &mut first, Refinement::RECALCULATE)
        .unwrap();

    // Crimson is nearer the red foreground
    assert_eq!(segmenter.cache().get(CRIMSON_KEY).map(|r| r.foreground), Some(true));

    // Mark the top half of the crimson square as background
    for y in 11..14 {
        for x in 11..17 {
            hints[[y, x]] = 0.0;
        }
    }
    let mut second = hints.clone();
    segmenter
        .extract(image.view(), &mut second, Refinement::ADD_BACKGROUND)
        .unwrap();

    let result = segmenter.cache().get(CRIMSON_KEY).copied().unwrap();
    assert!(!result.foreground);
    assert!(result.bg_dist < result.fg_dist);
    assert_eq!(segmenter.background_signature().map(|s| s.len()), Some(2));
    for x in 11..17 {
        assert_eq!(second[[15, x]], 0.0);
    }
}

#[test]
fn test_changing_sensitivity_rebuilds_signatures() {
    const DEEP_BLUE: [u8; 3] = [0, 0, 160];
    const RED_KEY: u32 = 0xFF0000;

    // Left half of the frame blue, right half deep blue
    let image = painted(20, BLUE, &[(0, 20, 10, 20, DEEP_BLUE), (6, 14, 6, 14, RED)]);
    let mut hints = framed_hints(20);
    hints[[10, 10]] = 1.0;

    let mut segmenter = Segmenter::new(SioxParams::default()).unwrap();
    let mut mask = hints.clone();
    segmenter
        .extract(image.view(), &mut mask, Refinement::RECALCULATE)
        .unwrap();

    assert_eq!(segmenter.background_signature().map(|s| s.len()), Some(2));
    let before = segmenter.cache().get(RED_KEY).copied().unwrap();

    // Limits wide enough to merge both blues into one cluster
    segmenter
        .set_params(SioxParams::default().with_limits([100.0, 200.0, 300.0]))
        .unwrap();
    let mut mask = hints.clone();
    segmenter
        .extract(image.view(), &mut mask, Refinement::CHANGE_SENSITIVITY)
        .unwrap();

    assert_eq!(segmenter.background_signature().map(|s| s.len()), Some(1));
    assert_eq!(segmenter.foreground_signature().map(|s| s.len()), Some(1));

    // A stale cache entry would still carry the old distance
    let after = segmenter.cache().get(RED_KEY).copied().unwrap();
    assert_ne!(after.bg_dist, before.bg_dist);
    assert!(after.foreground);
}
