/// Storage class of a format's channels. Selects the comparison strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelClass {
    FloatingPoint,
    UnsignedFixedPoint,
    SignedFixedPoint,
    SignedInteger,
    UnsignedInteger,
}

/// Exact per-channel storage encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelEncoding {
    Float32,
    Float16,
    UfloatR11G11B10,
    Unorm8,
    UnormR10G10B10A2,
    Sint8,
    Sint16,
    Sint32,
    Uint8,
    Uint16,
    Uint32,
    UintR10G10B10A2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelOrder {
    R,
    Rg,
    Rgb,
    Rgba,
    /// RGBA with sRGB-encoded color channels and a linear alpha.
    SRgba,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    Rgba32Float,
    Rgba32Sint,
    Rgba32Uint,
    Rgba16Float,
    Rgba16Sint,
    Rgba16Uint,
    Rgba8Unorm,
    Rgba8Sint,
    Rgba8Uint,
    Rgba8UnormSrgb,
    Rgb10a2Unorm,
    Rgb10a2Uint,
    Rg11b10Float,
    Rg32Float,
    Rg32Sint,
    Rg32Uint,
    Rg16Float,
    Rg16Sint,
    Rg16Uint,
    Rg8Unorm,
    Rg8Sint,
    Rg8Uint,
    R32Float,
    R32Sint,
    R32Uint,
    R16Float,
    R16Sint,
    R16Uint,
    R8Unorm,
    R8Sint,
    R8Uint,
}

impl PixelFormat {
    pub const ALL: [PixelFormat; 31] = [
        PixelFormat::Rgba32Float,
        PixelFormat::Rgba32Sint,
        PixelFormat::Rgba32Uint,
        PixelFormat::Rgba16Float,
        PixelFormat::Rgba16Sint,
        PixelFormat::Rgba16Uint,
        PixelFormat::Rgba8Unorm,
        PixelFormat::Rgba8Sint,
        PixelFormat::Rgba8Uint,
        PixelFormat::Rgba8UnormSrgb,
        PixelFormat::Rgb10a2Unorm,
        PixelFormat::Rgb10a2Uint,
        PixelFormat::Rg11b10Float,
        PixelFormat::Rg32Float,
        PixelFormat::Rg32Sint,
        PixelFormat::Rg32Uint,
        PixelFormat::Rg16Float,
        PixelFormat::Rg16Sint,
        PixelFormat::Rg16Uint,
        PixelFormat::Rg8Unorm,
        PixelFormat::Rg8Sint,
        PixelFormat::Rg8Uint,
        PixelFormat::R32Float,
        PixelFormat::R32Sint,
        PixelFormat::R32Uint,
        PixelFormat::R16Float,
        PixelFormat::R16Sint,
        PixelFormat::R16Uint,
        PixelFormat::R8Unorm,
        PixelFormat::R8Sint,
        PixelFormat::R8Uint,
    ];

    pub fn order(self) -> ChannelOrder {
        use PixelFormat::*;
        match self {
            Rgba32Float | Rgba32Sint | Rgba32Uint | Rgba16Float | Rgba16Sint | Rgba16Uint
            | Rgba8Unorm | Rgba8Sint | Rgba8Uint | Rgb10a2Unorm | Rgb10a2Uint => ChannelOrder::Rgba,
            Rgba8UnormSrgb => ChannelOrder::SRgba,
            Rg11b10Float => ChannelOrder::Rgb,
            Rg32Float | Rg32Sint | Rg32Uint | Rg16Float | Rg16Sint | Rg16Uint | Rg8Unorm
            | Rg8Sint | Rg8Uint => ChannelOrder::Rg,
            R32Float | R32Sint | R32Uint | R16Float | R16Sint | R16Uint | R8Unorm | R8Sint
            | R8Uint => ChannelOrder::R,
        }
    }

    pub fn encoding(self) -> ChannelEncoding {
        use PixelFormat::*;
        match self {
            Rgba32Float | Rg32Float | R32Float => ChannelEncoding::Float32,
            Rgba16Float | Rg16Float | R16Float => ChannelEncoding::Float16,
            Rg11b10Float => ChannelEncoding::UfloatR11G11B10,
            Rgba8Unorm | Rgba8UnormSrgb | Rg8Unorm | R8Unorm => ChannelEncoding::Unorm8,
            Rgb10a2Unorm => ChannelEncoding::UnormR10G10B10A2,
            Rgba8Sint | Rg8Sint | R8Sint => ChannelEncoding::Sint8,
            Rgba16Sint | Rg16Sint | R16Sint => ChannelEncoding::Sint16,
            Rgba32Sint | Rg32Sint | R32Sint => ChannelEncoding::Sint32,
            Rgba8Uint | Rg8Uint | R8Uint => ChannelEncoding::Uint8,
            Rgba16Uint | Rg16Uint | R16Uint => ChannelEncoding::Uint16,
            Rgba32Uint | Rg32Uint | R32Uint => ChannelEncoding::Uint32,
            Rgb10a2Uint => ChannelEncoding::UintR10G10B10A2,
        }
    }

    pub fn channel_count(self) -> usize {
        match self.order() {
            ChannelOrder::R => 1,
            ChannelOrder::Rg => 2,
            ChannelOrder::Rgb => 3,
            ChannelOrder::Rgba | ChannelOrder::SRgba => 4,
        }
    }

    pub fn channel_class(self) -> ChannelClass {
        match self.encoding() {
            ChannelEncoding::Float32
            | ChannelEncoding::Float16
            | ChannelEncoding::UfloatR11G11B10 => ChannelClass::FloatingPoint,
            ChannelEncoding::Unorm8 | ChannelEncoding::UnormR10G10B10A2 => {
                ChannelClass::UnsignedFixedPoint
            }
            ChannelEncoding::Sint8 | ChannelEncoding::Sint16 | ChannelEncoding::Sint32 => {
                ChannelClass::SignedInteger
            }
            ChannelEncoding::Uint8
            | ChannelEncoding::Uint16
            | ChannelEncoding::Uint32
            | ChannelEncoding::UintR10G10B10A2 => ChannelClass::UnsignedInteger,
        }
    }

    pub fn is_srgb(self) -> bool {
        self.order() == ChannelOrder::SRgba
    }

    /// Bits per channel; absent channels report 0.
    pub fn bit_depth(self) -> [u32; 4] {
        let bits = match self.encoding() {
            ChannelEncoding::Float32 | ChannelEncoding::Sint32 | ChannelEncoding::Uint32 => {
                [32; 4]
            }
            ChannelEncoding::Float16 | ChannelEncoding::Sint16 | ChannelEncoding::Uint16 => {
                [16; 4]
            }
            ChannelEncoding::Unorm8 | ChannelEncoding::Sint8 | ChannelEncoding::Uint8 => [8; 4],
            ChannelEncoding::UfloatR11G11B10 => [11, 11, 10, 0],
            ChannelEncoding::UnormR10G10B10A2 | ChannelEncoding::UintR10G10B10A2 => {
                [10, 10, 10, 2]
            }
        };
        self.mask_channels(bits, 0)
    }

    /// Representable value range per channel, as `(min, max)`. Absent channels
    /// report `[0, 0]`.
    pub fn value_range(self) -> ([f32; 4], [f32; 4]) {
        let (min, max) = match self.encoding() {
            ChannelEncoding::Float32 => ([-1e5; 4], [1e5; 4]),
            ChannelEncoding::Float16 => ([-1e3; 4], [1e3; 4]),
            ChannelEncoding::UfloatR11G11B10 => ([0.0; 4], [1e4, 1e4, 1e4, 0.0]),
            ChannelEncoding::Unorm8 | ChannelEncoding::UnormR10G10B10A2 => ([0.0; 4], [1.0; 4]),
            ChannelEncoding::Sint8 => ([-128.0; 4], [127.0; 4]),
            ChannelEncoding::Sint16 => ([-32768.0; 4], [32767.0; 4]),
            ChannelEncoding::Sint32 => ([i32::MIN as f32; 4], [i32::MAX as f32; 4]),
            ChannelEncoding::Uint8 => ([0.0; 4], [255.0; 4]),
            ChannelEncoding::Uint16 => ([0.0; 4], [65535.0; 4]),
            ChannelEncoding::Uint32 => ([0.0; 4], [u32::MAX as f32; 4]),
            ChannelEncoding::UintR10G10B10A2 => ([0.0; 4], [1023.0, 1023.0, 1023.0, 3.0]),
        };
        (self.mask_channels(min, 0.0), self.mask_channels(max, 0.0))
    }

    fn mask_channels<T: Copy>(self, mut values: [T; 4], absent: T) -> [T; 4] {
        for value in values.iter_mut().skip(self.channel_count()) {
            *value = absent;
        }
        values
    }

    /// Format the reference image is rendered into. Fixed-point formats are
    /// promoted to 32-bit float so the oracle does not add its own rounding
    /// on top of the GPU's.
    pub fn reference_format(self) -> PixelFormat {
        match self.channel_class() {
            ChannelClass::UnsignedFixedPoint | ChannelClass::SignedFixedPoint => {
                PixelFormat::Rgba32Float
            }
            _ => self,
        }
    }

    /// Format the attachment contents are transferred to on the CPU side.
    pub fn read_format(self) -> PixelFormat {
        match self.channel_class() {
            ChannelClass::FloatingPoint => PixelFormat::Rgba32Float,
            ChannelClass::UnsignedFixedPoint | ChannelClass::SignedFixedPoint => {
                PixelFormat::Rgba8Unorm
            }
            ChannelClass::SignedInteger => PixelFormat::Rgba32Sint,
            ChannelClass::UnsignedInteger => PixelFormat::Rgba32Uint,
        }
    }

    pub fn to_wgpu(self) -> wgpu::TextureFormat {
        use wgpu::TextureFormat as Tf;
        match self {
            PixelFormat::Rgba32Float => Tf::Rgba32Float,
            PixelFormat::Rgba32Sint => Tf::Rgba32Sint,
            PixelFormat::Rgba32Uint => Tf::Rgba32Uint,
            PixelFormat::Rgba16Float => Tf::Rgba16Float,
            PixelFormat::Rgba16Sint => Tf::Rgba16Sint,
            PixelFormat::Rgba16Uint => Tf::Rgba16Uint,
            PixelFormat::Rgba8Unorm => Tf::Rgba8Unorm,
            PixelFormat::Rgba8Sint => Tf::Rgba8Sint,
            PixelFormat::Rgba8Uint => Tf::Rgba8Uint,
            PixelFormat::Rgba8UnormSrgb => Tf::Rgba8UnormSrgb,
            PixelFormat::Rgb10a2Unorm => Tf::Rgb10a2Unorm,
            PixelFormat::Rgb10a2Uint => Tf::Rgb10a2Uint,
            PixelFormat::Rg11b10Float => Tf::Rg11b10Ufloat,
            PixelFormat::Rg32Float => Tf::Rg32Float,
            PixelFormat::Rg32Sint => Tf::Rg32Sint,
            PixelFormat::Rg32Uint => Tf::Rg32Uint,
            PixelFormat::Rg16Float => Tf::Rg16Float,
            PixelFormat::Rg16Sint => Tf::Rg16Sint,
            PixelFormat::Rg16Uint => Tf::Rg16Uint,
            PixelFormat::Rg8Unorm => Tf::Rg8Unorm,
            PixelFormat::Rg8Sint => Tf::Rg8Sint,
            PixelFormat::Rg8Uint => Tf::Rg8Uint,
            PixelFormat::R32Float => Tf::R32Float,
            PixelFormat::R32Sint => Tf::R32Sint,
            PixelFormat::R32Uint => Tf::R32Uint,
            PixelFormat::R16Float => Tf::R16Float,
            PixelFormat::R16Sint => Tf::R16Sint,
            PixelFormat::R16Uint => Tf::R16Uint,
            PixelFormat::R8Unorm => Tf::R8Unorm,
            PixelFormat::R8Sint => Tf::R8Sint,
            PixelFormat::R8Uint => Tf::R8Uint,
        }
    }

    /// Lowercase GL-style internal format name, used in case names and logs.
    pub fn name(self) -> &'static str {
        match self {
            PixelFormat::Rgba32Float => "rgba32f",
            PixelFormat::Rgba32Sint => "rgba32i",
            PixelFormat::Rgba32Uint => "rgba32ui",
            PixelFormat::Rgba16Float => "rgba16f",
            PixelFormat::Rgba16Sint => "rgba16i",
            PixelFormat::Rgba16Uint => "rgba16ui",
            PixelFormat::Rgba8Unorm => "rgba8",
            PixelFormat::Rgba8Sint => "rgba8i",
            PixelFormat::Rgba8Uint => "rgba8ui",
            PixelFormat::Rgba8UnormSrgb => "srgb8_alpha8",
            PixelFormat::Rgb10a2Unorm => "rgb10_a2",
            PixelFormat::Rgb10a2Uint => "rgb10_a2ui",
            PixelFormat::Rg11b10Float => "r11f_g11f_b10f",
            PixelFormat::Rg32Float => "rg32f",
            PixelFormat::Rg32Sint => "rg32i",
            PixelFormat::Rg32Uint => "rg32ui",
            PixelFormat::Rg16Float => "rg16f",
            PixelFormat::Rg16Sint => "rg16i",
            PixelFormat::Rg16Uint => "rg16ui",
            PixelFormat::Rg8Unorm => "rg8",
            PixelFormat::Rg8Sint => "rg8i",
            PixelFormat::Rg8Uint => "rg8ui",
            PixelFormat::R32Float => "r32f",
            PixelFormat::R32Sint => "r32i",
            PixelFormat::R32Uint => "r32ui",
            PixelFormat::R16Float => "r16f",
            PixelFormat::R16Sint => "r16i",
            PixelFormat::R16Uint => "r16ui",
            PixelFormat::R8Unorm => "r8",
            PixelFormat::R8Sint => "r8i",
            PixelFormat::R8Uint => "r8ui",
        }
    }
}

impl std::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
