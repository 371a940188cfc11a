use crate::{consts::*, prelude::*};

/// A point of interest marker as it is drawn on the map
#[derive(Debug)]
pub struct Template {
	pub id: String,
	pub image: RgbImage,
	/// Non-zero where the template's pixels belong to the marker
	pub mask: GrayImage,
}
impl Template {
	pub fn new(id: impl Into<String>, image: RgbImage, mask: GrayImage) -> Result<Self, Error> {
		let id = id.into();
		if image.dimensions() != mask.dimensions() {
			return Err(Error::MaskSize {
				id,
				w: image.width(),
				h: image.height(),
				mask_w: mask.width(),
				mask_h: mask.height(),
			});
		}
		Ok(Self { id, image, mask })
	}

	/// Loads `<dir>/<id>/raw.png` and its mask, or `None` if the template doesn't exist
	///
	/// The mask is `<dir>/<id>/mask.png` if present, otherwise the alpha channel of `raw.png`.
	pub fn load(dir: &Path, id: &str) -> Result<Option<Self>, Error> {
		let raw_path = dir.join(id).join("raw.png");
		if !raw_path.is_file() {
			return Ok(None);
		}

		let raw = image::open(&raw_path)?;
		let mask_path = dir.join(id).join("mask.png");

		let mask = if mask_path.is_file() {
			let mut mask = image::open(&mask_path)?.to_luma8();
			mask.iter_mut().for_each(|v| *v = if *v != 0 { 255 } else { 0 });
			mask
		} else {
			let rgba = raw.to_rgba8();
			GrayImage::from_fn(rgba.width(), rgba.height(), |x, y| {
				Luma([if rgba.get_pixel(x, y).0[3] >= 128 { 255 } else { 0 }])
			})
		};

		Self::new(id, raw.to_rgb8(), mask).map(Some)
	}
}

/// Templates in the order they are searched for
#[derive(Debug, Default)]
pub struct TemplateCatalogue {
	templates: Vec<Arc<Template>>,
}
impl TemplateCatalogue {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn push(&mut self, template: Template) {
		self.templates.push(Arc::new(template));
	}

	pub fn get(&self, id: &str) -> Option<&Arc<Template>> {
		self.templates.iter().find(|template| template.id == id)
	}

	#[inline]
	pub fn iter(&self) -> std::slice::Iter<'_, Arc<Template>> {
		self.templates.iter()
	}

	#[inline]
	pub fn len(&self) -> usize {
		self.templates.len()
	}

	#[inline]
	pub fn is_empty(&self) -> bool {
		self.templates.is_empty()
	}

	/// Loads `<prefix>_01`, `<prefix>_02`, ... for each prefix, up to the first id that doesn't exist
	pub fn load_dir(dir: &Path, prefixes: &[String]) -> Result<Self, Error> {
		let mut catalogue = Self::new();
		for prefix in prefixes {
			for n in 1..=MAX_TEMPLATES_PER_PREFIX {
				let id = format!("{prefix}_{n:02}");
				match Template::load(dir, &id)? {
					Some(template) => catalogue.push(template),
					None => break,
				}
			}
		}
		log::info!("loaded {} point of interest templates from {}", catalogue.len(), dir.display());
		Ok(catalogue)
	}
}
impl<'a> IntoIterator for &'a TemplateCatalogue {
	type Item = &'a Arc<Template>;
	type IntoIter = std::slice::Iter<'a, Arc<Template>>;

	fn into_iter(self) -> Self::IntoIter {
		self.iter()
	}
}
