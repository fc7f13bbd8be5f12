use crate::error::{Error, Result};
use crate::format::{ChannelClass, PixelFormat};
use ahash::{HashSet, HashSetExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Precision {
    Lowp,
    Mediump,
    Highp,
}

impl Precision {
    pub const ALL: [Precision; 3] = [Precision::Lowp, Precision::Mediump, Precision::Highp];

    pub fn name(self) -> &'static str {
        match self {
            Precision::Lowp => "lowp",
            Precision::Mediump => "mediump",
            Precision::Highp => "highp",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Float,
    Int,
    Uint,
}

impl ScalarKind {
    pub fn wgsl(self) -> &'static str {
        match self {
            ScalarKind::Float => "f32",
            ScalarKind::Int => "i32",
            ScalarKind::Uint => "u32",
        }
    }

    /// Whether an output of this kind may be written to a format of `class`.
    pub fn is_compatible_with(self, class: ChannelClass) -> bool {
        match self {
            ScalarKind::Float => matches!(
                class,
                ChannelClass::FloatingPoint
                    | ChannelClass::UnsignedFixedPoint
                    | ChannelClass::SignedFixedPoint
            ),
            ScalarKind::Int => class == ChannelClass::SignedInteger,
            ScalarKind::Uint => class == ChannelClass::UnsignedInteger,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputType {
    Float,
    Vec2,
    Vec3,
    Vec4,
    Int,
    IVec2,
    IVec3,
    IVec4,
    Uint,
    UVec2,
    UVec3,
    UVec4,
}

impl OutputType {
    pub const ALL: [OutputType; 12] = [
        OutputType::Float,
        OutputType::Vec2,
        OutputType::Vec3,
        OutputType::Vec4,
        OutputType::Int,
        OutputType::IVec2,
        OutputType::IVec3,
        OutputType::IVec4,
        OutputType::Uint,
        OutputType::UVec2,
        OutputType::UVec3,
        OutputType::UVec4,
    ];

    pub fn from_parts(kind: ScalarKind, components: usize) -> OutputType {
        match (kind, components) {
            (ScalarKind::Float, 1) => OutputType::Float,
            (ScalarKind::Float, 2) => OutputType::Vec2,
            (ScalarKind::Float, 3) => OutputType::Vec3,
            (ScalarKind::Float, _) => OutputType::Vec4,
            (ScalarKind::Int, 1) => OutputType::Int,
            (ScalarKind::Int, 2) => OutputType::IVec2,
            (ScalarKind::Int, 3) => OutputType::IVec3,
            (ScalarKind::Int, _) => OutputType::IVec4,
            (ScalarKind::Uint, 1) => OutputType::Uint,
            (ScalarKind::Uint, 2) => OutputType::UVec2,
            (ScalarKind::Uint, 3) => OutputType::UVec3,
            (ScalarKind::Uint, _) => OutputType::UVec4,
        }
    }

    pub fn scalar_kind(self) -> ScalarKind {
        match self {
            OutputType::Float | OutputType::Vec2 | OutputType::Vec3 | OutputType::Vec4 => {
                ScalarKind::Float
            }
            OutputType::Int | OutputType::IVec2 | OutputType::IVec3 | OutputType::IVec4 => {
                ScalarKind::Int
            }
            OutputType::Uint | OutputType::UVec2 | OutputType::UVec3 | OutputType::UVec4 => {
                ScalarKind::Uint
            }
        }
    }

    pub fn component_count(self) -> usize {
        match self {
            OutputType::Float | OutputType::Int | OutputType::Uint => 1,
            OutputType::Vec2 | OutputType::IVec2 | OutputType::UVec2 => 2,
            OutputType::Vec3 | OutputType::IVec3 | OutputType::UVec3 => 3,
            OutputType::Vec4 | OutputType::IVec4 | OutputType::UVec4 => 4,
        }
    }

    /// WGSL spelling, e.g. `vec3<i32>`.
    pub fn wgsl(self) -> String {
        let scalar = self.scalar_kind().wgsl();
        match self.component_count() {
            1 => scalar.to_string(),
            n => format!("vec{n}<{scalar}>"),
        }
    }

    /// GLSL-style name, used in case names.
    pub fn name(self) -> &'static str {
        match self {
            OutputType::Float => "float",
            OutputType::Vec2 => "vec2",
            OutputType::Vec3 => "vec3",
            OutputType::Vec4 => "vec4",
            OutputType::Int => "int",
            OutputType::IVec2 => "ivec2",
            OutputType::IVec3 => "ivec3",
            OutputType::IVec4 => "ivec4",
            OutputType::Uint => "uint",
            OutputType::UVec2 => "uvec2",
            OutputType::UVec3 => "uvec3",
            OutputType::UVec4 => "uvec4",
        }
    }
}

/// One fragment shader output variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FragmentOutputDecl {
    pub ty: OutputType,
    pub precision: Precision,
    pub location: u32,
    /// 0 means a plain (non-array) output.
    pub array_length: u32,
}

impl FragmentOutputDecl {
    pub fn new(ty: OutputType, precision: Precision, location: u32) -> Self {
        Self {
            ty,
            precision,
            location,
            array_length: 0,
        }
    }

    pub fn array(ty: OutputType, precision: Precision, location: u32, array_length: u32) -> Self {
        Self {
            ty,
            precision,
            location,
            array_length,
        }
    }

    pub fn is_array(&self) -> bool {
        self.array_length > 0
    }

    /// Attachment slots written by this output, one per array element.
    pub fn locations(&self) -> impl Iterator<Item = u32> {
        let count = self.array_length.max(1);
        self.location..self.location + count
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachmentSpec {
    pub format: PixelFormat,
    pub width: u32,
    pub height: u32,
    pub samples: u32,
}

impl AttachmentSpec {
    pub fn new(format: PixelFormat, width: u32, height: u32) -> Self {
        Self {
            format,
            width,
            height,
            samples: 1,
        }
    }
}

/// A complete fragment output configuration: attachments indexed by location
/// (with gaps allowed) and the outputs that write to them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentOutputSpec {
    pub attachments: Vec<Option<AttachmentSpec>>,
    pub outputs: Vec<FragmentOutputDecl>,
}

impl FragmentOutputSpec {
    pub fn new(attachments: Vec<Option<AttachmentSpec>>, outputs: Vec<FragmentOutputDecl>) -> Self {
        Self {
            attachments,
            outputs,
        }
    }

    pub fn attachment(&self, location: u32) -> Option<&AttachmentSpec> {
        self.attachments
            .get(location as usize)
            .and_then(|attachment| attachment.as_ref())
    }

    /// Size of the smallest render area covering every attachment.
    pub fn render_size(&self) -> (u32, u32) {
        self.attachments
            .iter()
            .flatten()
            .fold((0, 0), |(width, height), attachment| {
                (width.max(attachment.width), height.max(attachment.height))
            })
    }

    pub fn validate(&self) -> Result<()> {
        if self.outputs.is_empty() {
            return Err(Error::InvalidOutput("no outputs declared".into()));
        }

        let (width, height) = self.render_size();
        for attachment in self.attachments.iter().flatten() {
            if attachment.width == 0 || attachment.height == 0 {
                return Err(Error::InvalidOutput(format!(
                    "{} attachment has empty size {}x{}",
                    attachment.format, attachment.width, attachment.height
                )));
            }
            if (attachment.width, attachment.height) != (width, height) {
                return Err(Error::InvalidOutput(format!(
                    "attachments must share one size, found {}x{} and {width}x{height}",
                    attachment.width, attachment.height
                )));
            }
        }

        let mut written = HashSet::new();
        for output in &self.outputs {
            for location in output.locations() {
                let attachment = self.attachment(location).ok_or_else(|| {
                    Error::InvalidOutput(format!(
                        "output at location {} writes to location {location}, which has no attachment",
                        output.location
                    ))
                })?;

                if !written.insert(location) {
                    return Err(Error::InvalidOutput(format!(
                        "location {location} is written by more than one output"
                    )));
                }

                let class = attachment.format.channel_class();
                if !output.ty.scalar_kind().is_compatible_with(class) {
                    return Err(Error::InvalidOutput(format!(
                        "{} output cannot be written to {} attachment at location {location}",
                        output.ty.name(),
                        attachment.format
                    )));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgba8(size: u32) -> Option<AttachmentSpec> {
        Some(AttachmentSpec::new(PixelFormat::Rgba8Unorm, size, size))
    }

    #[test]
    fn array_output_covers_consecutive_locations() {
        let decl = FragmentOutputDecl::array(OutputType::Vec2, Precision::Highp, 2, 3);
        assert_eq!(decl.locations().collect::<Vec<_>>(), vec![2, 3, 4]);

        let scalar = FragmentOutputDecl::new(OutputType::Int, Precision::Lowp, 1);
        assert_eq!(scalar.locations().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn validate_rejects_missing_attachment() {
        let spec = FragmentOutputSpec::new(
            vec![rgba8(16), None],
            vec![FragmentOutputDecl::array(
                OutputType::Vec4,
                Precision::Mediump,
                0,
                2,
            )],
        );
        assert!(matches!(spec.validate(), Err(Error::InvalidOutput(_))));
    }

    #[test]
    fn validate_rejects_mismatched_kind_and_double_writes() {
        let spec = FragmentOutputSpec::new(
            vec![rgba8(16)],
            vec![FragmentOutputDecl::new(OutputType::IVec4, Precision::Highp, 0)],
        );
        assert!(spec.validate().is_err());

        let spec = FragmentOutputSpec::new(
            vec![rgba8(16), rgba8(16)],
            vec![
                FragmentOutputDecl::array(OutputType::Vec4, Precision::Highp, 0, 2),
                FragmentOutputDecl::new(OutputType::Vec4, Precision::Highp, 1),
            ],
        );
        assert!(spec.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_attachments() {
        let spec = FragmentOutputSpec::new(
            vec![rgba8(0)],
            vec![FragmentOutputDecl::new(OutputType::Vec4, Precision::Highp, 0)],
        );
        assert!(matches!(spec.validate(), Err(Error::InvalidOutput(_))));

        let spec = FragmentOutputSpec::new(
            vec![Some(AttachmentSpec::new(PixelFormat::R32Uint, 16, 0))],
            vec![FragmentOutputDecl::new(OutputType::Uint, Precision::Highp, 0)],
        );
        assert!(spec.validate().is_err());
    }

    #[test]
    fn attachments_must_share_one_size() {
        let spec = FragmentOutputSpec::new(
            vec![
                Some(AttachmentSpec::new(PixelFormat::R8Unorm, 32, 8)),
                None,
                Some(AttachmentSpec::new(PixelFormat::R8Unorm, 16, 64)),
            ],
            vec![FragmentOutputDecl::new(OutputType::Float, Precision::Lowp, 0)],
        );
        assert_eq!(spec.render_size(), (32, 64));
        assert!(spec.validate().is_err());

        let spec = FragmentOutputSpec::new(
            vec![rgba8(16), None, rgba8(16)],
            vec![FragmentOutputDecl::new(OutputType::Float, Precision::Lowp, 2)],
        );
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn wgsl_type_names() {
        assert_eq!(OutputType::Uint.wgsl(), "u32");
        assert_eq!(OutputType::IVec3.wgsl(), "vec3<i32>");
        for ty in OutputType::ALL {
            assert_eq!(
                OutputType::from_parts(ty.scalar_kind(), ty.component_count()),
                ty
            );
        }
    }
}
