use super::*;

#[test]
fn extent_rejects_zero_sides() {
    assert!(Extent::new(0, 10).is_err());
    assert!(Extent::new(10, 0).is_err());
    assert_eq!(Extent::new(3, 4).unwrap().pixel_count(), 12);
}

#[test]
fn working_extent_is_square_with_rotation_support() {
    let e = Extent::new(1080, 2400).unwrap();
    assert_eq!(e.working(false), e);
    assert_eq!(
        e.working(true),
        Extent {
            width: 2400,
            height: 2400
        }
    );
}

#[test]
fn argb_channels_and_premultiply() {
    let c = Argb(0x801D_0130);
    assert_eq!((c.a(), c.r(), c.g(), c.b()), (0x80, 0x1D, 0x01, 0x30));
    assert_eq!(Argb::from_channels(0x80, 0x1D, 0x01, 0x30), c);

    let opaque = Argb(0xFFFC_056C).to_premul();
    assert_eq!(opaque.to_array(), [0xFC, 0x05, 0x6C, 0xFF]);

    let half = Argb::from_channels(128, 255, 0, 0).to_premul();
    assert_eq!(half.to_array(), [128, 0, 0, 128]);
}

#[test]
fn pixel_buffer_validates_length() {
    assert!(PixelBuffer::from_rgba8(2, 2, vec![0; 15]).is_err());
    assert!(PixelBuffer::from_rgba8(2, 2, vec![0; 16]).is_ok());
    assert!(PixelBuffer::new(0, 2).is_err());
}

#[test]
fn pixel_lookup_and_bounds() {
    let mut buf = PixelBuffer::new(3, 2).unwrap();
    buf.data_mut()[(1 * 3 + 2) * 4..(1 * 3 + 2) * 4 + 4].copy_from_slice(&[1, 2, 3, 4]);
    assert_eq!(buf.pixel(2, 1), Some([1, 2, 3, 4]));
    assert_eq!(buf.pixel(3, 0), None);
    assert_eq!(buf.pixel(0, 2), None);
}

#[test]
fn crop_keeps_top_left_region() {
    let data: Vec<u8> = (0..4 * 4 * 4).map(|v| v as u8).collect();
    let buf = PixelBuffer::from_rgba8(4, 4, data).unwrap();
    let out = buf
        .crop(Extent {
            width: 2,
            height: 3,
        })
        .unwrap();
    assert_eq!(out.width(), 2);
    assert_eq!(out.height(), 3);
    assert_eq!(out.pixel(1, 2), buf.pixel(1, 2));
    assert!(
        buf.crop(Extent {
            width: 5,
            height: 1
        })
        .is_err()
    );
}
