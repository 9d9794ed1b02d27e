/// Renders a small 24-bit BMP standing in for a camera frame.
///
/// Frames are a dim grey gradient; fire frames add an orange blob whose
/// size pulses with `frame_index`.
pub fn render_frame(width: u32, height: u32, fire: bool, frame_index: u32) -> Vec<u8> {
    let width = width.max(1);
    let height = height.max(1);
    let row_bytes = (width as usize * 3 + 3) & !3;
    let pixel_bytes = row_bytes * height as usize;
    let file_size = 54 + pixel_bytes;

    let mut out = Vec::with_capacity(file_size);
    out.extend_from_slice(b"BM");
    out.extend_from_slice(&(file_size as u32).to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&54u32.to_le_bytes());
    out.extend_from_slice(&40u32.to_le_bytes());
    out.extend_from_slice(&(width as i32).to_le_bytes());
    out.extend_from_slice(&(height as i32).to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&24u16.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&(pixel_bytes as u32).to_le_bytes());
    out.extend_from_slice(&2835u32.to_le_bytes());
    out.extend_from_slice(&2835u32.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());

    let cx = width as f32 / 2.0;
    let cy = height as f32 / 3.0;
    let radius = height as f32 / 5.0 + (frame_index % 4) as f32;

    // BMP rows run bottom-up.
    for y in 0..height {
        let start = out.len();
        for x in 0..width {
            let shade = 40 + (60 * y / height) as u8;
            let (mut r, mut g, mut b) = (shade, shade, shade + 10);
            if fire {
                let dx = x as f32 - cx;
                let dy = y as f32 - cy;
                if (dx * dx + dy * dy).sqrt() < radius {
                    r = 255;
                    g = 120;
                    b = 20;
                }
            }
            out.extend_from_slice(&[b, g, r]);
        }
        out.resize(start + row_bytes, 0);
    }

    out
}
