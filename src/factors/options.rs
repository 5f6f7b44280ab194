#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FactorOptions {
    log_scale: bool,          // initial scale of the factor values
    validate_alignment: bool, // check the dimension-subset precondition when preparing alignments
}

impl FactorOptions {
    pub fn set_log_scale(&mut self, value: bool) -> &mut Self {
        self.log_scale = value;
        self
    }

    pub fn set_validate_alignment(&mut self, value: bool) -> &mut Self {
        self.validate_alignment = value;
        self
    }

    pub fn log_scale(&self) -> bool {
        self.log_scale
    }

    pub fn validate_alignment(&self) -> bool {
        self.validate_alignment
    }
}

impl Default for FactorOptions {
    fn default() -> Self {
        FactorOptions {
            log_scale: false,
            validate_alignment: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_chained_setters() {
        let defaults = FactorOptions::default();
        assert!(!defaults.log_scale());
        assert!(defaults.validate_alignment());

        let mut options = FactorOptions::default();
        options.set_log_scale(true).set_validate_alignment(false);
        assert!(options.log_scale());
        assert!(!options.validate_alignment());
    }
}
