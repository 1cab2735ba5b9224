use super::*;
use crate::foundation::core::Rgba8Premul;

fn presented(slot: usize, px: Rgba8Premul) -> PresentedFrame {
    let frame = Arc::new(PixelBuffer::filled(3, 2, px).unwrap());
    PresentedFrame {
        slot,
        frame: Arc::clone(&frame),
        background: frame,
    }
}

#[test]
fn in_memory_sink_keeps_presentation_order() {
    let mut sink = InMemorySink::new();
    for slot in [0, 1, 0, 2] {
        sink.present(&presented(slot, Rgba8Premul::transparent()))
            .unwrap();
    }
    assert_eq!(sink.slots(), vec![0, 1, 0, 2]);
}

#[test]
fn shared_sink_is_visible_through_clones() {
    let observer = SharedSink::new();
    let mut boxed: Box<dyn RenderSink> = Box::new(observer.clone());
    assert!(observer.is_empty());

    boxed
        .present(&presented(4, Rgba8Premul::transparent()))
        .unwrap();
    assert_eq!(observer.len(), 1);
    assert_eq!(observer.last().unwrap().slot, 4);
}

#[test]
fn unpremultiply_restores_straight_channels() {
    assert_eq!(unpremultiply(&[128, 0, 64, 128]), vec![255, 0, 128, 128]);
    assert_eq!(unpremultiply(&[10, 20, 30, 0]), vec![0, 0, 0, 0]);
    assert_eq!(unpremultiply(&[1, 2, 3, 255]), vec![1, 2, 3, 255]);
}

#[test]
fn png_sequence_sink_numbers_files_in_order() {
    let dir = std::env::temp_dir().join(format!("noisewall_png_seq_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);

    let mut sink = PngSequenceSink::new(&dir).unwrap();
    let px = Rgba8Premul::from_straight_rgba(200, 100, 50, 255);
    sink.present(&presented(7, px)).unwrap();
    sink.present(&presented(3, px)).unwrap();
    assert_eq!(sink.written(), 2);

    let img = image::open(dir.join("frame_0001.png")).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (3, 2));
    assert_eq!(img.get_pixel(2, 1).0, [200, 100, 50, 255]);
    assert!(!dir.join("frame_0002.png").exists());

    std::fs::remove_dir_all(&dir).unwrap();
}
