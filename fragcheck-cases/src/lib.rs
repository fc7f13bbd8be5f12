pub mod catalogue;
pub mod random;

pub use catalogue::{array_cases, basic_cases, sync_cases, CASE_SIZE};
pub use random::random_cases;

use fragcheck::TestCase;

/// Seed of the random cases in [`all_cases`].
pub const RANDOM_SEED: u64 = 0x5eed;
/// Number of random cases in [`all_cases`].
pub const RANDOM_CASE_COUNT: usize = 32;

/// Every case of the catalogue, in run order.
pub fn all_cases() -> Vec<Box<dyn TestCase>> {
    let mut cases: Vec<Box<dyn TestCase>> = Vec::new();
    cases.extend(
        basic_cases()
            .into_iter()
            .map(|case| Box::new(case) as Box<dyn TestCase>),
    );
    cases.extend(
        array_cases()
            .into_iter()
            .map(|case| Box::new(case) as Box<dyn TestCase>),
    );
    cases.extend(
        random_cases(RANDOM_SEED, RANDOM_CASE_COUNT)
            .into_iter()
            .map(|case| Box::new(case) as Box<dyn TestCase>),
    );
    cases.extend(
        sync_cases()
            .into_iter()
            .map(|case| Box::new(case) as Box<dyn TestCase>),
    );
    cases
}

#[cfg(test)]
mod tests {
    use super::*;
    use ahash::{HashSet, HashSetExt};

    #[test]
    fn case_names_are_unique() {
        let cases = all_cases();
        let mut names = HashSet::new();
        for case in &cases {
            assert!(names.insert(case.name().to_string()), "duplicate {}", case.name());
        }
    }

    #[test]
    fn basic_cases_cover_every_format_and_precision() {
        let cases = basic_cases();
        assert_eq!(cases.len(), fragcheck::PixelFormat::ALL.len() * 3 * 4);
        assert!(cases
            .iter()
            .any(|case| case.name() == "basic.float.rgba16f_mediump_vec4"));
        assert!(cases
            .iter()
            .any(|case| case.name() == "basic.uint.rgb10_a2ui_lowp_uvec3"));
        for case in &cases {
            case.spec().validate().unwrap();
        }
    }

    #[test]
    fn array_cases_fill_consecutive_attachments() {
        for case in array_cases() {
            let spec = case.spec();
            spec.validate().unwrap();
            let output = spec.outputs[0];
            assert_eq!(output.array_length as usize, spec.attachments.len());
        }
    }
}
