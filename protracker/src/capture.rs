use std::{fs::File, io::BufWriter, path::Path};

use anyhow::{Context, Result};

/// Finds the first window whose title contains `title` (case-insensitive).
pub fn find_window(title: &str) -> Option<xcap::Window> {
	let needle = title.to_lowercase();
	let windows = match xcap::Window::all() {
		Ok(windows) => windows,
		Err(err) => {
			tracing::warn!(error = %err, "failed to enumerate windows");
			return None;
		}
	};
	windows
		.into_iter()
		.find(|window| window.title().is_ok_and(|t| t.to_lowercase().contains(&needle)))
}

/// Titles of all visible windows, for the settings picker.
pub fn window_titles() -> Vec<String> {
	let Ok(windows) = xcap::Window::all() else {
		return Vec::new();
	};
	let mut titles = windows
		.into_iter()
		.filter_map(|window| window.title().ok())
		.filter(|title| !title.trim().is_empty())
		.collect::<Vec<_>>();
	titles.sort();
	titles.dedup();
	titles
}

/// Captures a window. Minimized windows can't be captured and yield `None`.
pub fn capture_window(window: &xcap::Window, max_height: Option<u32>) -> Option<ie::OwnedImage> {
	if window.is_minimized().unwrap_or(false) {
		return None;
	}

	let img = match window.capture_image() {
		Ok(img) => img,
		Err(err) => {
			tracing::debug!(error = %err, "window capture failed");
			return None;
		}
	};
	if img.width() == 0 || img.height() == 0 {
		return None;
	}

	let mut image = ie::OwnedImage::from_rgba(img.width() as usize, img.as_raw());
	if let Some(max_height) = max_height
		&& image.height() > max_height
	{
		image.resize_h(max_height);
	}
	Some(image)
}

pub fn capture_specific(title: &str, max_height: Option<u32>) -> Option<ie::OwnedImage> {
	let window = find_window(title)?;
	capture_window(&window, max_height)
}

/// Reads the config and captures the selected window.
pub fn capture() -> Option<ie::OwnedImage> {
	let (title, max_height) = {
		let config = crate::config_read();
		(config.window_title.clone(), config.max_capture_height)
	};
	capture_specific(&title, max_height)
}

/// Writes a capture as an RGB PNG.
pub fn save_debug_png(image: ie::Image, path: &Path) -> Result<()> {
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent).with_context(|| format!("create {:?}", parent))?;
	}
	let file = File::create(path).with_context(|| format!("create {:?}", path))?;

	let mut encoder = png::Encoder::new(BufWriter::new(file), image.width(), image.height());
	encoder.set_color(png::ColorType::Rgb);
	encoder.set_depth(png::BitDepth::Eight);
	let mut writer = encoder.write_header().context("write png header")?;
	writer
		.write_image_data(&image.get_bytes())
		.context("write png data")?;
	writer.finish().context("finish png")?;
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn debug_png_decodes_back() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("debug").join("frame.png");

		let mut frame = ie::OwnedImage::new(3, 2, ie::Color::new(10, 20, 30));
		frame.set_pixel(2, 1, ie::Color::WHITE);
		save_debug_png(frame.as_image(), &path).unwrap();

		let decoded = xcap::image::open(&path).unwrap().to_rgb8();
		assert_eq!(decoded.dimensions(), (3, 2));
		assert_eq!(decoded.get_pixel(0, 0).0, [10, 20, 30]);
		assert_eq!(decoded.get_pixel(2, 1).0, [255, 255, 255]);
	}
}
