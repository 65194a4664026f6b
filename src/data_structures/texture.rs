//! Decoded textures and their GPU counterparts.
//!
//! [`TextureData`] is what the texture cache hands out: the decoded RGBA image
//! plus a lazily created [`Texture`]. Every renderable that uses the same
//! texture key holds the same [`TextureHandle`].

use std::sync::{Arc, OnceLock};

use anyhow::*;
use image::{DynamicImage, RgbaImage};

/// Shared reference to a cached texture.
pub type TextureHandle = Arc<TextureData>;

/// A GPU texture with a view and optional sampler.
#[derive(Clone, Debug)]
pub struct Texture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: Option<wgpu::Sampler>,
}

impl Texture {
    /// Upload an image.
    ///
    /// * `label` is used as a debug label for the GPU resource
    /// * `is_normal_map` toggles between sRGB (false) and linear (true) color space
    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        img: &RgbaImage,
        label: Option<&str>,
        is_normal_map: bool,
    ) -> Self {
        let dimensions = img.dimensions();

        let size = wgpu::Extent3d {
            width: dimensions.0,
            height: dimensions.1,
            depth_or_array_layers: 1,
        };
        let format = if is_normal_map {
            wgpu::TextureFormat::Rgba8Unorm
        } else {
            wgpu::TextureFormat::Rgba8UnormSrgb
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label,
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            img.as_raw(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * dimensions.0),
                rows_per_image: Some(dimensions.1),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = Some(create_default_sampler(device));

        Self {
            texture,
            view,
            sampler,
        }
    }
}

pub fn create_default_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        address_mode_w: wgpu::AddressMode::Repeat,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    })
}

/// A decoded texture, keyed by the path it was requested with.
#[derive(Debug)]
pub struct TextureData {
    pub key: String,
    pub image: RgbaImage,
    gpu: OnceLock<Texture>,
}

impl TextureData {
    pub fn new(key: impl Into<String>, image: RgbaImage) -> Self {
        Self {
            key: key.into(),
            image,
            gpu: OnceLock::new(),
        }
    }

    /// Decode raw image file contents; the format is guessed from the bytes.
    pub fn from_bytes(key: impl Into<String>, bytes: &[u8]) -> Result<Self> {
        let key = key.into();
        let img: DynamicImage = image::load_from_memory(bytes)
            .with_context(|| format!("Could not decode texture {key}"))?;
        Ok(Self::new(key, img.to_rgba8()))
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Returns the GPU texture, creating it on the first call.
    pub fn upload(&self, device: &wgpu::Device, queue: &wgpu::Queue, is_normal_map: bool) -> &Texture {
        self.gpu
            .get_or_init(|| Texture::from_image(device, queue, &self.image, Some(&self.key), is_normal_map))
    }

    pub fn is_uploaded(&self) -> bool {
        self.gpu.get().is_some()
    }
}
