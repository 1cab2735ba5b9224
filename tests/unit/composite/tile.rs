use super::*;

fn ramp(w: u32, h: u32) -> PixelBuffer {
    let data: Vec<u8> = (0..(w * h * 4) as usize).map(|i| (i % 251) as u8).collect();
    PixelBuffer::from_rgba8(w, h, data).unwrap()
}

#[test]
fn factor_zero_is_rejected() {
    let err = tile(&ramp(2, 2), 0).unwrap_err();
    assert!(matches!(err, NoiseError::InvalidArgument(_)));
}

#[test]
fn factor_one_is_pixel_identical() {
    let src = ramp(7, 3);
    assert_eq!(tile(&src, 1).unwrap(), src);
}

#[test]
fn output_dimensions_scale_with_factor() {
    let src = ramp(5, 3);
    for f in 1..=8 {
        let out = tile(&src, f).unwrap();
        assert_eq!((out.width(), out.height()), (5 * f, 3 * f));
    }
}

#[test]
fn factor_two_on_50x50_is_four_identical_copies() {
    let src = ramp(50, 50);
    let out = tile(&src, 2).unwrap();
    assert_eq!((out.width(), out.height()), (100, 100));

    for (ox, oy) in [(0, 0), (50, 0), (0, 50), (50, 50)] {
        for y in 0..50 {
            for x in 0..50 {
                assert_eq!(out.pixel(ox + x, oy + y), src.pixel(x, y));
            }
        }
    }
}
