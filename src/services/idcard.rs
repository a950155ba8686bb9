use std::io::Cursor;

use ab_glyph::{FontVec, PxScale};
use image::{imageops, DynamicImage, ImageFormat, Luma, Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use qrcode::QrCode;
use thiserror::Error;
use tracing::debug;

const CARD_WIDTH: u32 = 360;
const CARD_HEIGHT: u32 = 480;
const QR_SIZE: u32 = 240;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

#[derive(Debug, Error)]
pub enum IdCardError {
    #[error("attendance code does not fit a QR symbol: {0}")]
    Qr(#[from] qrcode::types::QrError),

    #[error("JPEG encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

/// Compose the downloadable ID card: name and school above a QR image of
/// the attendance code, on a bordered white card, encoded as JPEG.
///
/// Text needs a TTF font on disk (`IDCARD_FONT_PATH`, default
/// `assets/fonts/DejaVuSans.ttf`). Without one the card still renders,
/// QR-only, so a misconfigured deployment degrades instead of breaking
/// registration.
pub fn render_jpeg(name: &str, school: &str, code: &str) -> Result<Vec<u8>, IdCardError> {
    let qr = QrCode::new(code.as_bytes())?;
    let qr_img = qr
        .render::<Luma<u8>>()
        .min_dimensions(QR_SIZE, QR_SIZE)
        .build();
    let qr_rgb = DynamicImage::ImageLuma8(qr_img).to_rgb8();

    let mut card = RgbImage::from_pixel(CARD_WIDTH, CARD_HEIGHT, WHITE);

    let qr_x = (CARD_WIDTH.saturating_sub(qr_rgb.width())) / 2;
    let qr_y = 170;
    imageops::overlay(&mut card, &qr_rgb, i64::from(qr_x), i64::from(qr_y));

    if let Some(font) = load_font() {
        draw_centered_text(&mut card, &font, 48, PxScale::from(30.0), name);
        draw_centered_text(&mut card, &font, 96, PxScale::from(22.0), school);
    }

    draw_hollow_rect_mut(
        &mut card,
        Rect::at(8, 8).of_size(CARD_WIDTH - 16, CARD_HEIGHT - 16),
        BLACK,
    );

    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(card).write_to(&mut out, ImageFormat::Jpeg)?;
    Ok(out.into_inner())
}

/// Download filename for a registrant's card.
pub fn download_filename(name: &str) -> String {
    let safe: String = name
        .chars()
        .filter(|c| !c.is_control() && *c != '"' && *c != '/' && *c != '\\')
        .collect();
    format!("{}-idcard.jpg", safe.trim())
}

fn draw_centered_text(card: &mut RgbImage, font: &FontVec, y: i32, scale: PxScale, text: &str) {
    let (text_w, _) = text_size(scale, font, text);
    let x = ((i64::from(CARD_WIDTH) - text_w as i64) / 2).max(0) as i32;
    draw_text_mut(card, BLACK, x, y, scale, font, text);
}

fn load_font() -> Option<FontVec> {
    let path = std::env::var("IDCARD_FONT_PATH")
        .unwrap_or_else(|_| "assets/fonts/DejaVuSans.ttf".to_string());
    let bytes = match std::fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!("id card font unavailable at {path}: {e}; rendering QR-only card");
            return None;
        }
    };
    FontVec::try_from_vec(bytes).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_qr_decodes_back_to_the_attendance_code() {
        let jpeg = render_jpeg("Budi", "SMAN 4 Padang", "12562469135780").unwrap();
        assert_eq!(
            crate::services::checkin::decode_frame(&jpeg).as_deref(),
            Some("12562469135780")
        );
    }

    #[test]
    fn card_has_the_expected_canvas() {
        let jpeg = render_jpeg("Siti", "SMKN 4 Padang", "246913580").unwrap();
        let img = image::load_from_memory(&jpeg).unwrap();
        assert_eq!(img.width(), CARD_WIDTH);
        assert_eq!(img.height(), CARD_HEIGHT);
    }

    #[test]
    fn download_filename_matches_the_original_scheme() {
        assert_eq!(download_filename("Budi"), "Budi-idcard.jpg");
        assert_eq!(
            download_filename("Siti Rahma"),
            "Siti Rahma-idcard.jpg"
        );
    }

    #[test]
    fn download_filename_strips_header_breaking_characters() {
        assert_eq!(download_filename("Bu\"di\r\n"), "Budi-idcard.jpg");
        assert_eq!(download_filename("a/b\\c"), "abc-idcard.jpg");
    }
}
