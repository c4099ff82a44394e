use iced::{Point, Rectangle, Size};

/// Aspect-preserving, non-cropping fit of an image inside `bounds`
///
/// The image is scaled to the largest size that fits and centered. Every
/// layer drawn with the same bounds gets the same rectangle for the same
/// image size, which keeps overlaid layers aligned.
pub fn contain(image: Size<u32>, bounds: Size) -> Rectangle {
    if image.width == 0 || image.height == 0 || bounds.width <= 0.0 || bounds.height <= 0.0 {
        return Rectangle::new(Point::ORIGIN, bounds);
    }

    let (w, h) = (image.width as f32, image.height as f32);
    let scale = (bounds.width / w).min(bounds.height / h);
    let size = Size::new(w * scale, h * scale);

    Rectangle::new(
        Point::new(
            (bounds.width - size.width) / 2.0,
            (bounds.height - size.height) / 2.0,
        ),
        size,
    )
}
