use super::*;

#[test]
fn measure_scales_with_cell_size() {
    assert_eq!(measure("", 40.0), (0, 0));
    assert_eq!(cell_px(40.0), 5);
    assert_eq!(measure("AB", 40.0), (2 * 6 * 5 - 5, 35));
    assert_eq!(measure("AB", 4.0), (11, 7));
}

#[test]
fn measure_is_monotone_in_size() {
    let mut prev = (0, 0);
    for size in 8..200 {
        let m = measure("Codex Mentis", size as f32);
        assert!(m.0 >= prev.0 && m.1 >= prev.1);
        prev = m;
    }
}

#[test]
fn lowercase_matches_uppercase() {
    let a = render_layer("hello", 16.0, [255, 255, 255, 255], None);
    let b = render_layer("HELLO", 16.0, [255, 255, 255, 255], None);
    assert_eq!(a, b);
}

#[test]
fn letter_a_top_row_is_lit_in_the_middle() {
    let layer = render_layer("A", 8.0, [200, 100, 50, 255], None);
    assert_eq!((layer.width, layer.height), (5, 7));
    assert_eq!(layer.pixel(0, 0)[3], 0);
    assert_eq!(layer.pixel(1, 0), [200, 100, 50, 255]);
    assert_eq!(layer.pixel(0, 3), [200, 100, 50, 255]);
}

#[test]
fn shadow_extends_layer_and_sits_under_text() {
    let shadow = [0, 0, 0, 120];
    let layer = render_layer("I", 8.0, [255, 255, 255, 255], Some((2, shadow)));
    assert_eq!((layer.width, layer.height), (7, 9));
    // bottom row of the shadowed "I" spans x = 3..=5 at y = 8
    assert_eq!(layer.pixel(4, 8), shadow);
    assert_eq!(layer.pixel(2, 0), [255, 255, 255, 255]);
}
