//! Drive-preview assembly from street imagery.
//!
//! Samples 24 points along the route (the start is excluded), checks imagery
//! availability at each, and collects street-view frames in route order. The
//! vista grid holds at most twelve image URLs; once it is full the remaining
//! points are not queried. The first ten fetched images become frames of an
//! infinitely-looping animated GIF at half a second per frame.

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame};
use log::{debug, warn};

use crate::maps::MapsClient;
use crate::{polyline, sample, DrivePreview};

const SAMPLE_SPLITS: usize = 25;
const MAX_GRID_IMAGES: usize = 12;
const MAX_GIF_FRAMES: usize = 10;
const FRAME_DELAY_MS: u32 = 500;

/// Build the preview assets for a route.
///
/// `None` when the polyline is undecodable or no imagery could be fetched;
/// there is never an empty animation.
pub async fn build_drive_preview(
    maps: &MapsClient,
    encoded_polyline: &str,
) -> Option<DrivePreview> {
    let path = match polyline::decode(encoded_polyline) {
        Ok(path) => path,
        Err(e) => {
            warn!("drive preview skipped, polyline undecodable: {e}");
            return None;
        }
    };

    let mut grid_urls: Vec<String> = Vec::new();
    let mut frames: Vec<Frame> = Vec::new();

    for index in sample::sample_indices_skip_first(path.len(), SAMPLE_SPLITS) {
        if grid_urls.len() >= MAX_GRID_IMAGES {
            break;
        }
        let point = path[index];
        if !maps.street_view_available(point).await {
            continue;
        }

        let url = maps.street_view_image_url(point);
        let Some(bytes) = maps.fetch_image(&url).await else {
            continue;
        };
        grid_urls.push(url);

        if frames.len() < MAX_GIF_FRAMES {
            match image::load_from_memory(&bytes) {
                Ok(img) => frames.push(Frame::from_parts(
                    img.to_rgba8(),
                    0,
                    0,
                    Delay::from_numer_denom_ms(FRAME_DELAY_MS, 1),
                )),
                Err(e) => warn!("street view frame not decodable: {e}"),
            }
        }
    }

    if frames.is_empty() {
        return None;
    }
    debug!(
        "drive preview: {} grid images, {} animation frames",
        grid_urls.len(),
        frames.len()
    );

    let gif = encode_gif(frames)?;
    Some(DrivePreview { gif, grid_urls })
}

/// Encode frames into an infinitely-looping GIF. `None` if encoding fails.
fn encode_gif(frames: Vec<Frame>) -> Option<Vec<u8>> {
    let mut buffer = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut buffer);
        if let Err(e) = encoder.set_repeat(Repeat::Infinite) {
            warn!("animated preview not encodable: {e}");
            return None;
        }
        if let Err(e) = encoder.encode_frames(frames) {
            warn!("animated preview not encodable: {e}");
            return None;
        }
    }
    Some(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn solid_frame(r: u8, g: u8, b: u8) -> Frame {
        let mut img = RgbaImage::new(4, 3);
        for px in img.pixels_mut() {
            *px = image::Rgba([r, g, b, 255]);
        }
        Frame::from_parts(img, 0, 0, Delay::from_numer_denom_ms(FRAME_DELAY_MS, 1))
    }

    #[test]
    fn test_encode_gif_produces_gif_bytes() {
        let gif = encode_gif(vec![solid_frame(255, 0, 0), solid_frame(0, 255, 0)]).unwrap();
        assert!(gif.starts_with(b"GIF89a"));
        assert!(gif.len() > 6);
    }

    #[test]
    fn test_encode_gif_single_frame() {
        let gif = encode_gif(vec![solid_frame(0, 0, 255)]).unwrap();
        assert!(gif.starts_with(b"GIF89a"));
    }
}
