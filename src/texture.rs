//! Texture decoding, mip generation and GPU upload.
//!
//! Images are decoded with the `image` crate, flipped vertically so that
//! v = 0 addresses the bottom row, expanded to RGBA and given a full mip chain
//! before upload. Loading never fails the caller: [`Texture::load_or_white`]
//! swaps in a 1×1 opaque white texture and logs the reason.

use std::path::{Path, PathBuf};

use image::{DynamicImage, RgbaImage};

use crate::gpu::GpuContext;

/// How the texel values should be interpreted when sampled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorSpace {
    /// Perceptual color, decoded to linear by the sampler.
    Srgb,
    /// Raw data (normals, metallic, roughness, occlusion).
    Linear,
}

impl ColorSpace {
    pub fn format(self) -> wgpu::TextureFormat {
        match self {
            ColorSpace::Srgb => wgpu::TextureFormat::Rgba8UnormSrgb,
            ColorSpace::Linear => wgpu::TextureFormat::Rgba8Unorm,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    #[error("failed to load image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("image {0} has zero size")]
    ZeroSized(PathBuf),
    #[error("image {path} is {width}x{height}, larger than the device limit of {max}")]
    TooLarge {
        path: PathBuf,
        width: u32,
        height: u32,
        max: u32,
    },
}

/// Decoded RGBA pixels with every mip level down to 1×1.
#[derive(Clone, Debug)]
pub struct TextureData {
    /// Channel count of the source image before RGBA expansion.
    pub channels: u8,
    pub mips: Vec<RgbaImage>,
}

impl TextureData {
    /// Decode an image file.
    pub fn decode(path: impl AsRef<Path>) -> Result<Self, TextureError> {
        let path = path.as_ref();
        let image = image::open(path).map_err(|source| TextureError::Image {
            path: path.to_path_buf(),
            source,
        })?;
        if image.width() == 0 || image.height() == 0 {
            return Err(TextureError::ZeroSized(path.to_path_buf()));
        }
        Ok(Self::from_image(image))
    }

    /// Flip, expand to RGBA and build the mip chain.
    pub fn from_image(image: DynamicImage) -> Self {
        let channels = image.color().channel_count();
        let base = image.flipv().to_rgba8();
        Self {
            channels,
            mips: mip_chain(base),
        }
    }

    /// A single opaque white texel.
    pub fn white() -> Self {
        Self {
            channels: 4,
            mips: vec![RgbaImage::from_pixel(1, 1, image::Rgba([255, 255, 255, 255]))],
        }
    }

    pub fn width(&self) -> u32 {
        self.mips[0].width()
    }

    pub fn height(&self) -> u32 {
        self.mips[0].height()
    }

    pub fn mip_level_count(&self) -> u32 {
        self.mips.len() as u32
    }

    /// All levels concatenated, largest first.
    fn bytes(&self) -> Vec<u8> {
        self.mips.iter().flat_map(|m| m.as_raw().iter().copied()).collect()
    }
}

/// Number of levels in a full mip chain for the given size.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

fn mip_chain(base: RgbaImage) -> Vec<RgbaImage> {
    let levels = mip_level_count(base.width(), base.height());
    let mut mips = Vec::with_capacity(levels as usize);
    mips.push(base);
    for _ in 1..levels {
        let prev = &mips[mips.len() - 1];
        let w = (prev.width() / 2).max(1);
        let h = (prev.height() / 2).max(1);
        let next = image::imageops::resize(prev, w, h, image::imageops::FilterType::Triangle);
        mips.push(next);
    }
    mips
}

/// A GPU texture that can be bound to shaders.
#[derive(Debug)]
pub struct Texture {
    pub texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
    pub(crate) sampler: wgpu::Sampler,
    pub width: u32,
    pub height: u32,
    pub color_space: ColorSpace,
    /// True when this is the white stand-in for a texture that failed to load.
    pub fallback: bool,
}

impl Texture {
    /// Upload decoded data with repeat wrapping and trilinear filtering.
    pub fn from_data(
        gpu: &GpuContext,
        data: &TextureData,
        color_space: ColorSpace,
        label: &str,
    ) -> Self {
        use wgpu::util::DeviceExt;

        let texture = gpu.device.create_texture_with_data(
            &gpu.queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width: data.width(),
                    height: data.height(),
                    depth_or_array_layers: 1,
                },
                mip_level_count: data.mip_level_count(),
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: color_space.format(),
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &data.bytes(),
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{} Sampler", label)),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
            width: data.width(),
            height: data.height(),
            color_space,
            fallback: false,
        }
    }

    /// The 1×1 opaque white stand-in.
    pub fn white(gpu: &GpuContext, label: &str) -> Self {
        let mut texture = Self::from_data(gpu, &TextureData::white(), ColorSpace::Srgb, label);
        texture.fallback = true;
        texture
    }

    /// Load a texture from an image file.
    pub fn from_file(
        gpu: &GpuContext,
        path: impl AsRef<Path>,
        color_space: ColorSpace,
    ) -> Result<Self, TextureError> {
        let path = path.as_ref();
        let data = TextureData::decode(path)?;
        let max = gpu.device.limits().max_texture_dimension_2d;
        if data.width() > max || data.height() > max {
            return Err(TextureError::TooLarge {
                path: path.to_path_buf(),
                width: data.width(),
                height: data.height(),
                max,
            });
        }
        log::info!(
            "loaded texture {} ({}x{}, {} channels, {} mips)",
            path.display(),
            data.width(),
            data.height(),
            data.channels,
            data.mip_level_count()
        );
        Ok(Self::from_data(gpu, &data, color_space, &path.display().to_string()))
    }

    /// Load a texture, substituting opaque white on any failure.
    pub fn load_or_white(
        gpu: &GpuContext,
        path: impl AsRef<Path>,
        color_space: ColorSpace,
    ) -> Self {
        let path = path.as_ref();
        match Self::from_file(gpu, path, color_space) {
            Ok(texture) => texture,
            Err(e) => {
                log::warn!("{e}; using white fallback");
                Self::white(gpu, "White Fallback Texture")
            }
        }
    }
}

/// The five material inputs of the geometry pass, in binding order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaterialSlot {
    Albedo,
    Normal,
    Metallic,
    Roughness,
    AmbientOcclusion,
}

impl MaterialSlot {
    pub const ALL: [MaterialSlot; 5] = [
        MaterialSlot::Albedo,
        MaterialSlot::Normal,
        MaterialSlot::Metallic,
        MaterialSlot::Roughness,
        MaterialSlot::AmbientOcclusion,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            MaterialSlot::Albedo => "albedo.png",
            MaterialSlot::Normal => "normal.png",
            MaterialSlot::Metallic => "metallic.png",
            MaterialSlot::Roughness => "roughness.png",
            MaterialSlot::AmbientOcclusion => "ao.png",
        }
    }

    pub fn color_space(self) -> ColorSpace {
        match self {
            MaterialSlot::Albedo => ColorSpace::Srgb,
            _ => ColorSpace::Linear,
        }
    }
}

/// Albedo plus optional secondary maps. A missing map resolves to the albedo.
#[derive(Debug)]
pub struct MaterialSet<T> {
    pub albedo: T,
    pub normal: Option<T>,
    pub metallic: Option<T>,
    pub roughness: Option<T>,
    pub ambient_occlusion: Option<T>,
}

impl<T> MaterialSet<T> {
    pub fn uniform(albedo: T) -> Self {
        Self {
            albedo,
            normal: None,
            metallic: None,
            roughness: None,
            ambient_occlusion: None,
        }
    }

    pub fn get(&self, slot: MaterialSlot) -> &T {
        let map = match slot {
            MaterialSlot::Albedo => None,
            MaterialSlot::Normal => self.normal.as_ref(),
            MaterialSlot::Metallic => self.metallic.as_ref(),
            MaterialSlot::Roughness => self.roughness.as_ref(),
            MaterialSlot::AmbientOcclusion => self.ambient_occlusion.as_ref(),
        };
        map.unwrap_or(&self.albedo)
    }

    fn set(&mut self, slot: MaterialSlot, value: T) {
        match slot {
            MaterialSlot::Albedo => self.albedo = value,
            MaterialSlot::Normal => self.normal = Some(value),
            MaterialSlot::Metallic => self.metallic = Some(value),
            MaterialSlot::Roughness => self.roughness = Some(value),
            MaterialSlot::AmbientOcclusion => self.ambient_occlusion = Some(value),
        }
    }
}

pub type MaterialTextures = MaterialSet<Texture>;

impl MaterialTextures {
    /// Load the five maps from `dir`. Never fails; see [`MaterialSet::get`].
    pub fn load(gpu: &GpuContext, dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let albedo_path = dir.join(MaterialSlot::Albedo.file_name());
        let mut set = Self::uniform(Texture::load_or_white(gpu, albedo_path, ColorSpace::Srgb));

        for slot in &MaterialSlot::ALL[1..] {
            let path = dir.join(slot.file_name());
            match Texture::from_file(gpu, &path, slot.color_space()) {
                Ok(texture) => set.set(*slot, texture),
                Err(e) => log::info!("{:?} map unavailable ({e}); using albedo", slot),
            }
        }
        set
    }
}
