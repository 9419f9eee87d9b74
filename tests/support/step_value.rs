use std::convert::Infallible;
use std::str::FromStr;

/// Wrapper for string values supplied via behaviour-driven test steps.
#[derive(Clone, Debug)]
pub struct StepValue {
    raw: String,
}

impl FromStr for StepValue {
    type Err = Infallible;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let raw = input
            .trim()
            .trim_matches(|candidate| matches!(candidate, '"' | '\''))
            .to_owned();

        Ok(Self { raw })
    }
}

impl StepValue {
    /// Consumes the step value, yielding the unquoted string.
    pub fn into_inner(self) -> String {
        self.raw
    }
}
