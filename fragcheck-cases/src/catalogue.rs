use fragcheck::{
    AttachmentSpec, ChannelClass, FragmentOutputCase, FragmentOutputDecl, FragmentOutputSpec,
    OutputType, PixelFormat, Precision, ScalarKind, SubmissionSyncCase,
};

/// Attachment edge used by the basic and array cases.
pub const CASE_SIZE: u32 = 64;

/// Group name of the cases writing to `format`.
pub fn category(format: PixelFormat) -> &'static str {
    match format.channel_class() {
        ChannelClass::FloatingPoint => "float",
        ChannelClass::UnsignedFixedPoint | ChannelClass::SignedFixedPoint => "fixed",
        ChannelClass::SignedInteger => "int",
        ChannelClass::UnsignedInteger => "uint",
    }
}

/// Scalar kind of the outputs that can write to `format`.
pub fn output_kind(format: PixelFormat) -> ScalarKind {
    match format.channel_class() {
        ChannelClass::SignedInteger => ScalarKind::Int,
        ChannelClass::UnsignedInteger => ScalarKind::Uint,
        _ => ScalarKind::Float,
    }
}

/// Output types that can write to `format`, scalar first.
pub fn output_types(format: PixelFormat) -> impl Iterator<Item = OutputType> {
    let kind = output_kind(format);
    (1..=4).map(move |components| OutputType::from_parts(kind, components))
}

// ── Basic: one output, one attachment ───────────────────────────────────────

pub fn basic_cases() -> Vec<FragmentOutputCase> {
    let mut cases = Vec::new();
    for format in PixelFormat::ALL {
        for precision in Precision::ALL {
            for ty in output_types(format) {
                let name = format!(
                    "basic.{}.{}_{}_{}",
                    category(format),
                    format.name(),
                    precision.name(),
                    ty.name()
                );
                let description = format!(
                    "{} {} output to a {} attachment",
                    precision.name(),
                    ty.name(),
                    format
                );
                let spec = FragmentOutputSpec::new(
                    vec![Some(AttachmentSpec::new(format, CASE_SIZE, CASE_SIZE))],
                    vec![FragmentOutputDecl::new(ty, precision, 0)],
                );
                cases.push(FragmentOutputCase::new(name, description, spec));
            }
        }
    }
    cases
}

// ── Arrays: one array output over consecutive attachments ──────────────────

/// Formats for the array cases. Four of each fit the default per-sample
/// attachment budget.
const ARRAY_FORMATS: [PixelFormat; 4] = [
    PixelFormat::Rgba16Float,
    PixelFormat::Rgba8Unorm,
    PixelFormat::Rgba16Sint,
    PixelFormat::Rgba16Uint,
];

pub fn array_cases() -> Vec<FragmentOutputCase> {
    let mut cases = Vec::new();
    for format in ARRAY_FORMATS {
        for ty in output_types(format) {
            for length in 2..=4u32 {
                let name = format!(
                    "array.{}.{}_highp_{}_x{length}",
                    category(format),
                    format.name(),
                    ty.name()
                );
                let description = format!(
                    "highp {}[{length}] output to {length} {} attachments",
                    ty.name(),
                    format
                );
                let attachments = (0..length)
                    .map(|_| Some(AttachmentSpec::new(format, CASE_SIZE, CASE_SIZE)))
                    .collect();
                let spec = FragmentOutputSpec::new(
                    attachments,
                    vec![FragmentOutputDecl::array(ty, Precision::Highp, 0, length)],
                );
                cases.push(FragmentOutputCase::new(name, description, spec));
            }
        }
    }
    cases
}

// ── Synchronization ──────────────────────────────────────────────────────────

pub fn sync_cases() -> Vec<SubmissionSyncCase> {
    [1, 3, 8]
        .into_iter()
        .map(|rounds| {
            SubmissionSyncCase::new(
                format!("sync.submission_rounds_{rounds}"),
                format!("{rounds} draw submissions, each awaited without blocking"),
                rounds,
            )
        })
        .collect()
}
