use crate::catalogue::output_kind;
use fragcheck::gpu::color_attachment_bytes_per_sample;
use fragcheck::{
    AttachmentSpec, FragmentOutputCase, FragmentOutputDecl, FragmentOutputSpec, OutputType,
    PixelFormat, Precision,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Color attachment bytes per sample every WebGPU device supports.
pub const PORTABLE_BYTES_PER_SAMPLE: u32 = 32;
/// Color attachments every WebGPU device supports.
pub const PORTABLE_COLOR_ATTACHMENTS: usize = 8;

const MAX_OUTPUTS: usize = 4;

/// Generates `count` random multi-output cases. The same seed always yields
/// the same cases.
pub fn random_cases(seed: u64, count: usize) -> Vec<FragmentOutputCase> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|index| {
            let spec = loop {
                let spec = random_spec(&mut rng);
                let formats: Vec<PixelFormat> = spec
                    .attachments
                    .iter()
                    .flatten()
                    .map(|attachment| attachment.format)
                    .collect();
                if color_attachment_bytes_per_sample(&formats) <= PORTABLE_BYTES_PER_SAMPLE {
                    break spec;
                }
            };
            let name = format!("random.{seed}_{index}");
            let description = describe(&spec);
            FragmentOutputCase::new(name, description, spec)
        })
        .collect()
}

/// One random output set. Outputs occupy increasing locations, possibly
/// with unused slots between them.
pub fn random_spec(rng: &mut StdRng) -> FragmentOutputSpec {
    let width = rng.gen_range(1..=12) * 8;
    let height = rng.gen_range(1..=12) * 8;
    let output_count = rng.gen_range(1..=MAX_OUTPUTS);

    let mut attachments = Vec::new();
    let mut outputs = Vec::new();

    for _ in 0..output_count {
        if attachments.len() >= PORTABLE_COLOR_ATTACHMENTS {
            break;
        }
        let has_room_for_gap = attachments.len() + 2 <= PORTABLE_COLOR_ATTACHMENTS;
        if !attachments.is_empty() && has_room_for_gap && rng.gen_bool(0.2) {
            attachments.push(None);
        }

        let remaining = PORTABLE_COLOR_ATTACHMENTS - attachments.len();
        let format = *PixelFormat::ALL
            .choose(rng)
            .unwrap_or(&PixelFormat::Rgba8Unorm);
        let kind = output_kind(format);
        let ty = OutputType::from_parts(kind, rng.gen_range(1..=4));
        let precision = Precision::ALL[rng.gen_range(0..Precision::ALL.len())];
        let array_length = if remaining >= 2 && rng.gen_bool(0.3) {
            rng.gen_range(2..=remaining.min(3)) as u32
        } else {
            0
        };

        let location = attachments.len() as u32;
        for _ in 0..array_length.max(1) {
            attachments.push(Some(AttachmentSpec::new(format, width, height)));
        }
        outputs.push(if array_length > 0 {
            FragmentOutputDecl::array(ty, precision, location, array_length)
        } else {
            FragmentOutputDecl::new(ty, precision, location)
        });
    }

    FragmentOutputSpec::new(attachments, outputs)
}

fn describe(spec: &FragmentOutputSpec) -> String {
    spec.outputs
        .iter()
        .map(|output| {
            let format = spec
                .attachment(output.location)
                .map(|attachment| attachment.format.name())
                .unwrap_or("none");
            let array = if output.is_array() {
                format!("[{}]", output.array_length)
            } else {
                String::new()
            };
            format!(
                "{} {}{array} at location {} to {format}",
                output.precision.name(),
                output.ty.name(),
                output.location
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use fragcheck::TestCase;

    #[test]
    fn random_cases_are_reproducible() {
        let first: Vec<_> = random_cases(7, 16).iter().map(|case| case.spec().clone()).collect();
        let second: Vec<_> = random_cases(7, 16).iter().map(|case| case.spec().clone()).collect();
        assert_eq!(first, second);

        let other: Vec<_> = random_cases(8, 16).iter().map(|case| case.spec().clone()).collect();
        assert_ne!(first, other);
    }

    #[test]
    fn random_specs_are_valid_and_portable() {
        for case in random_cases(1234, 64) {
            let spec = case.spec();
            spec.validate()
                .unwrap_or_else(|err| panic!("{}: {err}", case.name()));
            assert!(spec.attachments.len() <= PORTABLE_COLOR_ATTACHMENTS);
            assert!(!spec.outputs.is_empty() && spec.outputs.len() <= MAX_OUTPUTS);
        }
    }
}
