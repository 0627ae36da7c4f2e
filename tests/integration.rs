use image::{Rgb, RgbImage};
use photo_watermark::geometry::{expanded_size, TileGrid};
use photo_watermark::{
    fitted_size, text_alpha, FontHandle, FontResolver, RawParams, Status, SystemFontResolver,
    WatermarkRequest, Watermarker,
};
use rstest::rstest;

fn marker() -> Watermarker {
    Watermarker::with_font(FontHandle::Builtin)
}

fn gray(w: u32, h: u32) -> RgbImage {
    RgbImage::from_pixel(w, h, Rgb([50, 50, 50]))
}

fn text_request(text: &str, params: RawParams) -> WatermarkRequest {
    WatermarkRequest {
        text: text.to_string(),
        color: "#FF0000".into(),
        params,
        ..WatermarkRequest::default()
    }
}

fn changed_pixels(before: &RgbImage, after: &RgbImage) -> Vec<(u32, u32)> {
    before
        .enumerate_pixels()
        .filter(|&(x, y, p)| after.get_pixel(x, y) != p)
        .map(|(x, y, _)| (x, y))
        .collect()
}

#[test]
fn single_text_changes_only_its_bounding_box() {
    let canvas = gray(800, 600);
    let request = text_request(
        "WATERMARK",
        RawParams {
            position_x: 100.0,
            position_y: 100.0,
            opacity: 0.4,
            angle: 0.0,
            font_size: 40.0,
            ..RawParams::default()
        },
    );

    let (out, status) = marker().composite(Some(&canvas), &request);
    assert!(status.is_applied(), "{status}");
    let out = out.unwrap();
    assert_eq!(out.dimensions(), (800, 600));

    let bounds = FontHandle::Builtin.measure("WATERMARK", 40);
    let changed = changed_pixels(&canvas, &out);
    assert!(!changed.is_empty());
    for (x, y) in changed {
        let (x, y) = (i64::from(x), i64::from(y));
        assert!((100 + bounds.left..100 + bounds.right).contains(&x), "x={x}");
        assert!((100 + bounds.top..100 + bounds.bottom).contains(&y), "y={y}");
    }

    // Red at alpha 102 over gray 50.
    assert_eq!(text_alpha(0.4), 102);
    assert_eq!(*out.get_pixel(101, 101), Rgb([132, 30, 30]));
}

#[test]
fn single_text_with_outline_font_blends_at_alpha_102() {
    let font = SystemFontResolver::default().load_font(&[]);
    if font.is_builtin() {
        eprintln!("no outline font installed, skipping");
        return;
    }
    let bounds = font.measure("WATERMARK", 40);
    let marker = Watermarker::with_font(font);

    let canvas = gray(800, 600);
    let request = text_request(
        "WATERMARK",
        RawParams {
            position_x: 100.0,
            position_y: 100.0,
            opacity: 0.4,
            font_size: 40.0,
            ..RawParams::default()
        },
    );
    let (out, status) = marker.composite(Some(&canvas), &request);
    assert!(status.is_applied(), "{status}");
    let out = out.unwrap();

    let changed = changed_pixels(&canvas, &out);
    assert!(!changed.is_empty());
    for &(x, y) in &changed {
        let (x, y) = (i64::from(x), i64::from(y));
        assert!((100 + bounds.left..100 + bounds.right).contains(&x), "x={x}");
        assert!((100 + bounds.top..100 + bounds.bottom).contains(&y), "y={y}");
    }

    // Fully covered glyph pixels reach red at alpha 102 over gray 50.
    let max_red = changed.iter().map(|&(x, y)| out.get_pixel(x, y)[0]).max();
    assert_eq!(max_red, Some(132));
    assert!(changed.iter().all(|&(x, y)| out.get_pixel(x, y)[1] >= 30));
}

#[test]
fn empty_text_is_identity() {
    let canvas = gray(64, 64);
    for text in ["", " ", "\n\t "] {
        let (out, status) =
            marker().composite(Some(&canvas), &text_request(text, RawParams::default()));
        assert_eq!(status, Status::EmptyText);
        assert_eq!(out, Some(canvas.clone()));
    }
}

#[rstest]
#[case(0.0, false)]
#[case(-45.0, false)]
#[case(180.0, false)]
#[case(30.0, true)]
#[case(-180.0, true)]
#[case(0.0, true)]
fn text_output_keeps_canvas_dimensions(#[case] angle: f64, #[case] repeat: bool) {
    let canvas = gray(333, 217);
    let request = text_request(
        "Sample",
        RawParams {
            position_x: 5000.0,
            position_y: -20.0,
            angle,
            repeat,
            font_size: 24.0,
            ..RawParams::default()
        },
    );
    let (out, status) = marker().composite(Some(&canvas), &request);
    assert!(status.is_applied(), "{status}");
    assert_eq!(out.unwrap().dimensions(), (333, 217));
}

#[rstest]
#[case(0.01, 0.2)]
#[case(0.5, 1.0)]
#[case(2.0, 0.3)]
fn image_output_keeps_canvas_dimensions(#[case] scale: f64, #[case] opacity: f64) {
    let canvas = gray(640, 480);
    let request = WatermarkRequest {
        kind: "image".to_string(),
        watermark: Some(RgbImage::from_pixel(300, 150, Rgb([200, 10, 10]))),
        params: RawParams {
            scale,
            opacity,
            angle: 15.0,
            position_x: 600.0,
            position_y: 400.0,
            ..RawParams::default()
        },
        ..WatermarkRequest::default()
    };
    let (out, status) = marker().composite(Some(&canvas), &request);
    assert!(status.is_applied(), "{status}");
    assert_eq!(out.unwrap().dimensions(), (640, 480));
}

#[test]
fn higher_opacity_moves_text_pixels_further() {
    let canvas = gray(120, 60);
    let render = |opacity: f64| {
        let request = text_request(
            "I",
            RawParams {
                position_x: 0.0,
                position_y: 0.0,
                opacity,
                font_size: 8.0,
                ..RawParams::default()
            },
        );
        let (out, _) = marker().composite(Some(&canvas), &request);
        out.unwrap().get_pixel(1, 0)[0]
    };

    let reds: Vec<u8> = [0.3, 0.5, 0.8, 1.0].into_iter().map(render).collect();
    assert!(reds.windows(2).all(|w| w[0] < w[1]), "{reds:?}");
    assert_eq!(reds[3], 255);

    // Below the alpha floor every opacity renders the same.
    assert_eq!(render(0.0), render(0.15));
    assert!(render(0.0) > 50);
}

#[test]
fn tile_grid_scenario_has_56_candidates() {
    let grid = TileGrid::new((800, 600), (100, 35), (150, 100));
    assert_eq!((grid.step_x, grid.step_y), (150, 100));
    assert_eq!((grid.cols, grid.rows), (7, 8));
    assert_eq!(grid.candidate_count(), 56);
    assert!(grid.anchors().count() <= 56);
}

#[rstest]
#[case((800, 600), (100, 35), (150, 100))]
#[case((1000, 400), (300, 40), (50, 50))]
#[case((257, 913), (20, 20), (500, 300))]
fn tiles_cover_the_whole_canvas(
    #[case] canvas: (u32, u32),
    #[case] tile: (u32, u32),
    #[case] spacing: (u32, u32),
) {
    let grid = TileGrid::new(canvas, tile, spacing);
    assert!(grid.step_x >= tile.0 + 20 && grid.step_y >= tile.1 + 20);

    let anchors: Vec<(i64, i64)> = grid.anchors().collect();
    let (sx, sy) = (i64::from(grid.step_x), i64::from(grid.step_y));
    for y in (0..i64::from(canvas.1)).step_by(7) {
        for x in (0..i64::from(canvas.0)).step_by(7) {
            assert!(
                anchors
                    .iter()
                    .any(|&(ax, ay)| (x - ax).abs() <= sx && (y - ay).abs() <= sy),
                "({x}, {y}) is not near any tile"
            );
        }
    }
}

#[rstest]
#[case(0.0)]
#[case(37.5)]
#[case(-90.0)]
#[case(135.0)]
#[case(180.0)]
fn rotated_bounds_contain_the_source(#[case] angle: f32) {
    let (w, h) = (120u32, 40u32);
    let (rw, rh) = expanded_size(w, h, angle);
    let diagonal = f64::from(w).hypot(f64::from(h)).ceil();
    assert!(f64::from(rw) <= diagonal + 1.0 && f64::from(rh) <= diagonal + 1.0);
    assert!(rw.max(rh) >= h);
    if angle == 0.0 || angle == 180.0 {
        assert_eq!((rw, rh), (w, h));
    }
}

#[rstest]
#[case(0.05)]
#[case(0.2)]
#[case(0.73)]
#[case(1.5)]
fn fitted_size_preserves_aspect(#[case] scale: f32) {
    let (w, h) = fitted_size((1000, 750), (400, 300), scale).unwrap();
    assert_eq!(u64::from(h), u64::from(w) * 300 / 400);
    let ratio = f64::from(w) / f64::from(h);
    assert!((ratio - 4.0 / 3.0).abs() < 0.05, "{ratio}");
}

#[test]
fn image_watermark_lands_top_left() {
    let canvas = RgbImage::from_pixel(1000, 1000, Rgb([0, 0, 0]));
    let request = WatermarkRequest {
        kind: "image".to_string(),
        watermark: Some(RgbImage::from_pixel(200, 100, Rgb([100, 200, 0]))),
        params: RawParams {
            scale: 0.2,
            opacity: 0.7,
            position_x: 0.0,
            position_y: 0.0,
            ..RawParams::default()
        },
        ..WatermarkRequest::default()
    };

    let (out, status) = marker().composite(Some(&canvas), &request);
    assert_eq!(status, Status::Applied { notes: vec![] });
    let out = out.unwrap();

    assert_eq!(*out.get_pixel(0, 0), Rgb([70, 140, 0]));
    assert_eq!(*out.get_pixel(199, 99), Rgb([70, 140, 0]));
    assert_eq!(*out.get_pixel(200, 0), Rgb([0, 0, 0]));
    assert_eq!(*out.get_pixel(0, 100), Rgb([0, 0, 0]));
    assert_eq!(changed_pixels(&canvas, &out).len(), 200 * 100);
}

#[test]
fn process_file_round_trips_through_disk() {
    let dir = std::env::temp_dir().join(format!("photo-watermark-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let input = dir.join("photo.png");
    let output = dir.join("nested").join("photo_out.png");
    gray(80, 40).save(&input).unwrap();

    let request = text_request(
        "OK",
        RawParams {
            position_x: 5.0,
            position_y: 5.0,
            font_size: 10.0,
            opacity: 1.0,
            ..RawParams::default()
        },
    );
    let result = marker().process_file(&input, &output, &request);
    assert!(result.success, "{}", result.message);

    let written = image::open(&output).unwrap().to_rgb8();
    assert_eq!(written.dimensions(), (80, 40));
    assert_ne!(written, gray(80, 40));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn process_file_reports_unapplied_watermark() {
    let dir = std::env::temp_dir().join(format!("photo-watermark-fail-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let input = dir.join("photo.png");
    let output = dir.join("photo_out.png");
    gray(20, 20).save(&input).unwrap();

    let result = marker().process_file(&input, &output, &text_request("", RawParams::default()));
    assert!(!result.success);
    assert!(!output.exists());

    std::fs::remove_dir_all(&dir).unwrap();
}
