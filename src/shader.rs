use crate::grid::VertexGrid;
use crate::output::ScalarKind;
use crate::values::GeneratedInput;
use std::fmt::Write;

/// Shader location of the vertex position; inputs follow from location 1.
pub const POSITION_LOCATION: u32 = 0;

/// Interleaved vertex buffer layout: a `vec2<f32>` position followed by every
/// input, all stored as 4-byte words.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexLayout {
    pub stride: u64,
    pub attributes: Vec<wgpu::VertexAttribute>,
}

impl VertexLayout {
    pub fn new(inputs: &[GeneratedInput]) -> Self {
        let mut attributes = vec![wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x2,
            offset: 0,
            shader_location: POSITION_LOCATION,
        }];
        let mut offset = 8;

        for (index, input) in inputs.iter().enumerate() {
            attributes.push(wgpu::VertexAttribute {
                format: vertex_format(input.ty.scalar_kind(), input.component_count()),
                offset,
                shader_location: index as u32 + 1,
            });
            offset += 4 * input.component_count() as u64;
        }

        Self {
            stride: offset,
            attributes,
        }
    }

    pub fn buffer_layout(&self) -> wgpu::VertexBufferLayout<'_> {
        wgpu::VertexBufferLayout {
            array_stride: self.stride,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &self.attributes,
        }
    }
}

fn vertex_format(kind: ScalarKind, components: usize) -> wgpu::VertexFormat {
    use wgpu::VertexFormat as Vf;
    match (kind, components) {
        (ScalarKind::Float, 1) => Vf::Float32,
        (ScalarKind::Float, 2) => Vf::Float32x2,
        (ScalarKind::Float, 3) => Vf::Float32x3,
        (ScalarKind::Float, _) => Vf::Float32x4,
        (ScalarKind::Int, 1) => Vf::Sint32,
        (ScalarKind::Int, 2) => Vf::Sint32x2,
        (ScalarKind::Int, 3) => Vf::Sint32x3,
        (ScalarKind::Int, _) => Vf::Sint32x4,
        (ScalarKind::Uint, 1) => Vf::Uint32,
        (ScalarKind::Uint, 2) => Vf::Uint32x2,
        (ScalarKind::Uint, 3) => Vf::Uint32x3,
        (ScalarKind::Uint, _) => Vf::Uint32x4,
    }
}

/// Interleaves grid positions and input values into the words of
/// [`VertexLayout`].
pub fn pack_vertices(grid: &VertexGrid, inputs: &[GeneratedInput]) -> Vec<u32> {
    let words_per_vertex = 2 + inputs.iter().map(|input| input.component_count()).sum::<usize>();
    let mut words = Vec::with_capacity(grid.vertex_count() * words_per_vertex);

    for (vertex, position) in grid.positions().iter().enumerate() {
        words.push(position[0].to_bits());
        words.push(position[1].to_bits());
        for input in inputs {
            let components = input.component_count();
            for component in 0..components {
                words.push(input.values.word(vertex * components + component));
            }
        }
    }

    words
}

/// The channels an output with `components` components writes to an
/// attachment with `channels` channels.
pub fn write_mask(components: usize, channels: usize) -> wgpu::ColorWrites {
    const CHANNELS: [wgpu::ColorWrites; 4] = [
        wgpu::ColorWrites::RED,
        wgpu::ColorWrites::GREEN,
        wgpu::ColorWrites::BLUE,
        wgpu::ColorWrites::ALPHA,
    ];
    CHANNELS
        .iter()
        .take(components.min(channels))
        .fold(wgpu::ColorWrites::empty(), |mask, channel| mask | *channel)
}

fn zero_literal(kind: ScalarKind) -> &'static str {
    match kind {
        ScalarKind::Float => "0.0",
        ScalarKind::Int => "0i",
        ScalarKind::Uint => "0u",
    }
}

/// Builds the module with `vs_main` and `fs_main` for `inputs`.
pub fn generate_shader(inputs: &[GeneratedInput]) -> String {
    let mut src = String::new();

    src.push_str("struct VertexInput {\n");
    let _ = writeln!(src, "    @location({POSITION_LOCATION}) position: vec2<f32>,");
    for (index, input) in inputs.iter().enumerate() {
        let _ = writeln!(src, "    @location({}) in{index}: {},", index + 1, input.ty.wgsl());
    }
    src.push_str("}\n\n");

    src.push_str("struct VertexOutput {\n    @builtin(position) position: vec4<f32>,\n");
    for (index, input) in inputs.iter().enumerate() {
        let interpolation = match input.ty.scalar_kind() {
            ScalarKind::Float => "",
            ScalarKind::Int | ScalarKind::Uint => " @interpolate(flat)",
        };
        let _ = writeln!(src, "    @location({index}){interpolation} v{index}: {},", input.ty.wgsl());
    }
    src.push_str("}\n\n");

    src.push_str("struct FragmentOutput {\n");
    for input in inputs {
        let _ = writeln!(
            src,
            "    @location({0}) out{0}: vec4<{1}>,",
            input.location,
            input.ty.scalar_kind().wgsl()
        );
    }
    src.push_str("}\n\n");

    // Grid row 0 sits at NDC y = -1, flipping puts it on texture row 0.
    src.push_str(
        "@vertex\nfn vs_main(in: VertexInput) -> VertexOutput {\n    var out: VertexOutput;\n    \
         out.position = vec4<f32>(in.position.x, -in.position.y, 0.0, 1.0);\n",
    );
    for index in 0..inputs.len() {
        let _ = writeln!(src, "    out.v{index} = in.in{index};");
    }
    src.push_str("    return out;\n}\n\n");

    src.push_str("@fragment\nfn fs_main(in: VertexOutput) -> FragmentOutput {\n    var out: FragmentOutput;\n");
    for (index, input) in inputs.iter().enumerate() {
        let kind = input.ty.scalar_kind();
        let padding = vec![zero_literal(kind); 4 - input.component_count()];
        let mut arguments = format!("in.v{index}");
        for zero in padding {
            arguments.push_str(", ");
            arguments.push_str(zero);
        }
        let _ = writeln!(
            src,
            "    out.out{} = vec4<{}>({arguments});",
            input.location,
            kind.wgsl()
        );
    }
    src.push_str("    return out;\n}\n");

    src
}
