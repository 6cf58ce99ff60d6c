use super::*;

fn solid(w: u32, h: u32, px: [u8; 4]) -> PreparedImage {
    let mut bytes = Vec::with_capacity((w * h * 4) as usize);
    for _ in 0..w * h {
        bytes.extend_from_slice(&px);
    }
    PreparedImage::from_premul(w, h, bytes).unwrap()
}

#[test]
fn fit_size_preserves_aspect_and_respects_upscale_flag() {
    assert_eq!(fit_size(800, 400, 400.0, 400.0, false), (400, 200));
    assert_eq!(fit_size(100, 50, 400.0, 400.0, false), (100, 50));
    assert_eq!(fit_size(100, 50, 400.0, 400.0, true), (400, 200));
    assert_eq!(fit_size(0, 50, 400.0, 400.0, true), (0, 0));
}

#[test]
fn resize_keeps_premultiplied_invariant() {
    let mut bytes = Vec::new();
    for i in 0..16u32 {
        let a = if i % 2 == 0 { 255 } else { 0 };
        bytes.extend_from_slice(&[a, a, a, a]);
    }
    let img = PreparedImage::from_premul(4, 4, bytes).unwrap();
    let out = resize(&img, 9, 7).unwrap();
    assert_eq!((out.width, out.height), (9, 7));
    for px in out.rgba8_premul.chunks_exact(4) {
        assert!(px[0] <= px[3] && px[1] <= px[3] && px[2] <= px[3]);
    }
}

#[test]
fn circle_mask_clears_corners_and_keeps_centre() {
    let img = solid(40, 40, [200, 100, 50, 255]);
    let out = circle_mask(&img);
    assert_eq!(out.pixel(0, 0)[3], 0);
    assert_eq!(out.pixel(39, 39)[3], 0);
    assert_eq!(out.pixel(20, 20), [200, 100, 50, 255]);
}

#[test]
fn pad_adds_transparent_border() {
    let img = solid(3, 2, [10, 10, 10, 255]);
    let out = pad(&img, 2).unwrap();
    assert_eq!((out.width, out.height), (7, 6));
    assert_eq!(out.pixel(0, 0), [0, 0, 0, 0]);
    assert_eq!(out.pixel(2, 2), [10, 10, 10, 255]);
    assert_eq!(out.pixel(4, 3), [10, 10, 10, 255]);
    assert_eq!(out.pixel(5, 3), [0, 0, 0, 0]);
}

#[test]
fn blur_spreads_alpha_into_padding_and_preserves_uniform_images() {
    let uniform = solid(8, 8, [90, 90, 90, 255]);
    let blurred = gaussian_blur(&uniform, 2.0).unwrap();
    assert_eq!(blurred, uniform);

    let dot = pad(&solid(2, 2, [255, 255, 255, 255]), 6).unwrap();
    let spread = gaussian_blur(&dot, 2.0).unwrap();
    assert!(spread.pixel(4, 6)[3] > 0);
    assert!(spread.pixel(6, 6)[3] < 255);
}

#[test]
fn over_px_is_identity_for_transparent_source() {
    assert_eq!(over_px([1, 2, 3, 4], [0, 0, 0, 0]), [1, 2, 3, 4]);
    assert_eq!(over_px([1, 2, 3, 4], [9, 9, 9, 255]), [9, 9, 9, 255]);
}

#[test]
fn blit_over_clips_at_edges() {
    let mut dst = vec![0u8; 4 * 4 * 4];
    let src = solid(3, 3, [255, 0, 0, 255]);
    blit_over(&mut dst, 4, 4, &src, 2, -1);
    let at = |x: usize, y: usize| dst[(y * 4 + x) * 4];
    assert_eq!(at(2, 0), 255);
    assert_eq!(at(3, 1), 255);
    assert_eq!(at(1, 0), 0);
    assert_eq!(at(2, 2), 0);
}

#[test]
fn gradient_frame_surrounds_image() {
    let img = solid(4, 4, [0, 0, 0, 255]);
    let top = Rgb8::new(255, 0, 0);
    let bottom = Rgb8::new(0, 0, 255);
    let out = gradient_frame(&img, 2, top, bottom).unwrap();
    assert_eq!((out.width, out.height), (8, 8));
    assert_eq!(out.pixel(0, 0), [255, 0, 0, 255]);
    assert_eq!(out.pixel(0, 7), [0, 0, 255, 255]);
    assert_eq!(out.pixel(3, 3), [0, 0, 0, 255]);
}

#[test]
fn letterbox_centres_on_background() {
    let img = solid(10, 10, [255, 255, 255, 255]);
    let canvas = Canvas {
        width: 40,
        height: 20,
    };
    let out = letterbox(&img, canvas, Rgb8::new(1, 2, 3)).unwrap();
    assert_eq!((out.width, out.height), (40, 20));
    assert_eq!(out.pixel(0, 10), [1, 2, 3, 255]);
    assert_eq!(out.pixel(20, 10), [255, 255, 255, 255]);
}
